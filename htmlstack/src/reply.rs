use std::io::{self, Write};

use futures::StreamExt;
use log::warn;

use crate::error::RenderError;
use crate::layout::{RequestContext, Scope};
use crate::stream::{AsyncValue, HtmlStream};
use crate::template::Template;

/// The response a page is written to.
pub trait HtmlSink {
    fn set_content_type(&mut self, content_type: &str);

    fn write_chunk(&mut self, chunk: &str) -> io::Result<()>;

    /// Marks everything written so far as incomplete.
    fn abort(&mut self, error: &RenderError);
}

/// Collects the response in memory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferSink {
    pub content_type: Option<String>,
    pub chunks: Vec<String>,
    /// Message of the error the response was aborted with.
    pub aborted: Option<String>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(&self) -> String {
        self.chunks.concat()
    }

    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }
}

impl HtmlSink for BufferSink {
    fn set_content_type(&mut self, content_type: &str) {
        self.content_type = Some(content_type.to_owned());
    }

    fn write_chunk(&mut self, chunk: &str) -> io::Result<()> {
        self.chunks.push(chunk.to_owned());
        Ok(())
    }

    fn abort(&mut self, error: &RenderError) {
        self.aborted = Some(error.to_string());
    }
}

/// Writes the body to any `io::Write`, flushing after every chunk.
pub struct WriteSink<W> {
    writer: W,
    content_type: Option<String>,
    aborted: bool,
}

impl<W: Write> WriteSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            content_type: None,
            aborted: false,
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> HtmlSink for WriteSink<W> {
    fn set_content_type(&mut self, content_type: &str) {
        self.content_type = Some(content_type.to_owned());
    }

    fn write_chunk(&mut self, chunk: &str) -> io::Result<()> {
        self.writer.write_all(chunk.as_bytes())?;
        self.writer.flush()
    }

    fn abort(&mut self, _error: &RenderError) {
        self.aborted = true;
    }
}

impl<C: RequestContext + ?Sized> Scope<String, C> {
    /// Renders `template` and wraps it in this scope's layouts.
    pub fn render(&self, template: &Template, context: &C) -> String {
        self.apply_layouts(template.render(), context)
    }

    /// Wraps an already rendered leaf fragment in the layouts and writes the page.
    pub fn send(&self, html: String, context: &C, sink: &mut impl HtmlSink) -> crate::Result<()> {
        let page = self.apply_layouts(html, context);
        sink.set_content_type(&self.config().content_type);
        if let Err(err) = sink.write_chunk(&page) {
            let err = RenderError::from(err);
            warn!("sending page failed: {err}");
            sink.abort(&err);
            return Err(err);
        }
        Ok(())
    }
}

impl<C: RequestContext + ?Sized> Scope<HtmlStream, C> {
    pub fn render(&self, template: Template<AsyncValue>, context: &C) -> HtmlStream {
        self.apply_layouts(template.render_stream(), context)
    }

    /// Writes each chunk as soon as it is ready. Chunks already written stay
    /// written when the sink is aborted.
    pub async fn send(
        &self,
        html: HtmlStream,
        context: &C,
        sink: &mut impl HtmlSink,
    ) -> crate::Result<()> {
        let mut page = self.apply_layouts(html, context);
        sink.set_content_type(&self.config().content_type);
        while let Some(chunk) = page.next().await {
            let written = chunk.and_then(|chunk| sink.write_chunk(&chunk).map_err(RenderError::from));
            if let Err(err) = written {
                warn!("streaming page aborted: {err}");
                sink.abort(&err);
                return Err(err);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Headers, HtmlScope, LayoutOptions};
    use crate::stream::StreamScope;
    use crate::value::Value;
    use futures::future;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Takes the first `n` writes, then fails like a closed connection.
    struct ClosesAfter(usize, Vec<u8>);

    impl Write for ClosesAfter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.0 == 0 {
                return Err(io::Error::from(io::ErrorKind::BrokenPipe));
            }
            self.0 -= 1;
            self.1.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn page_scope() -> HtmlScope {
        let mut scope = HtmlScope::new();
        scope.add_layout(
            |inner, _: &Headers| format!("<html>{inner}</html>"),
            LayoutOptions::skip_on_header("hx-request"),
        );
        scope
    }

    #[test]
    fn test_send_sets_content_type() {
        let mut sink = BufferSink::new();
        page_scope().send("<h1>Hi</h1>".into(), &Headers::new(), &mut sink).expect("send");
        assert_eq!(sink.content_type.as_deref(), Some("text/html; charset=utf-8"));
        assert_eq!(sink.body(), "<html><h1>Hi</h1></html>");
        assert!(sink.is_complete());
    }

    #[test]
    fn test_render_applies_layouts() {
        let template = Template::new(vec!["<h1>", "</h1>"], vec![Value::from("&")]).expect("segments");
        let htmx = Headers::new().with("HX-Request", "true");
        assert_eq!(page_scope().render(&template, &htmx), "<h1>&amp;</h1>");
    }

    #[test]
    fn test_write_sink() {
        let mut sink = WriteSink::new(Vec::new());
        page_scope().send("x".into(), &Headers::new(), &mut sink).expect("send");
        assert_eq!(sink.content_type(), Some("text/html; charset=utf-8"));
        assert_eq!(sink.into_inner(), b"<html>x</html>");
    }

    #[test]
    fn test_write_failure_aborts() {
        let mut sink = WriteSink::new(BrokenPipe);
        let err = page_scope().send("x".into(), &Headers::new(), &mut sink).unwrap_err();
        assert!(matches!(err, RenderError::Sink(_)));
        assert!(sink.is_aborted());
    }

    #[tokio::test]
    async fn test_stream_send() {
        let mut scope = StreamScope::new();
        scope.add_layout(
            |inner: HtmlStream, _: &Headers| {
                Template::new(vec!["<body>!", "</body>"], vec![AsyncValue::from(inner)])
                    .expect("segments")
                    .render_stream()
            },
            LayoutOptions::default(),
        );
        let leaf = Template::new(
            vec!["<p>", "</p>"],
            vec![AsyncValue::future(future::ok::<_, io::Error>("<ok>"))],
        )
        .expect("segments");
        let mut sink = BufferSink::new();
        scope
            .send(leaf.render_stream(), &Headers::new(), &mut sink)
            .await
            .expect("send");
        assert_eq!(sink.body(), "<body><p>&lt;ok&gt;</p></body>");
        assert_eq!(sink.content_type.as_deref(), Some("text/html; charset=utf-8"));
    }

    #[tokio::test]
    async fn test_stream_failure_aborts_sink() {
        let scope = StreamScope::<Headers>::new();
        let leaf = Template::new(
            vec!["<p>", "</p>"],
            vec![AsyncValue::future(future::err::<&str, _>(io::Error::other("timeout")))],
        )
        .expect("segments");
        let mut sink = BufferSink::new();
        let err = scope
            .send(leaf.render_stream(), &Headers::new(), &mut sink)
            .await
            .unwrap_err();
        assert_eq!(err.position(), Some(0));
        assert_eq!(sink.body(), "<p>");
        assert!(!sink.is_complete());
        assert!(sink.aborted.as_deref().is_some_and(|m| m.contains("timeout")));
    }

    #[tokio::test]
    async fn test_stream_write_failure_aborts() {
        let scope = StreamScope::<Headers>::new();
        let leaf = Template::new(vec!["<p>", "</p>"], vec![AsyncValue::from("x")]).expect("segments");
        let mut sink = WriteSink::new(ClosesAfter(1, Vec::new()));
        let err = scope
            .send(leaf.render_stream(), &Headers::new(), &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Sink(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
        assert!(sink.is_aborted());
        assert_eq!(sink.into_inner().1, b"<p>");
    }
}
