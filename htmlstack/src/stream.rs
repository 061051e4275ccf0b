//! Streaming rendering.
use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::{self, BoxFuture, FutureExt};
use futures::stream::{self, BoxStream, FuturesOrdered, Stream, StreamExt, TryStreamExt};
use log::trace;

use crate::error::{BoxError, RenderError};
use crate::escape::escape;
use crate::layout::{Headers, Scope};
use crate::template::{split_marker, Template, RAW_MARKER};
use crate::value::Value;

/// A value for a streaming template, possibly not available yet.
pub enum AsyncValue {
    Ready(Value),
    /// Resolves to another value, which may itself be pending.
    Future(BoxFuture<'static, Result<AsyncValue, BoxError>>),
    /// Concatenated, then decoded as UTF-8.
    Bytes(BoxStream<'static, Result<Vec<u8>, BoxError>>),
    Text(BoxStream<'static, Result<String, BoxError>>),
    /// Elements resolve concurrently and are joined in order.
    Array(Vec<AsyncValue>),
    /// Output of another streaming render.
    Fragment(HtmlStream),
}

impl AsyncValue {
    pub fn future<Fut, T, E>(fut: Fut) -> Self
    where
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Into<AsyncValue> + 'static,
        E: Into<BoxError> + 'static,
    {
        AsyncValue::Future(
            fut.map(|r: Result<T, E>| -> Result<AsyncValue, BoxError> {
                r.map(Into::into).map_err(Into::into)
            })
            .boxed(),
        )
    }

    pub fn bytes<S, B, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<B, E>> + Send + 'static,
        B: AsRef<[u8]> + 'static,
        E: Into<BoxError> + 'static,
    {
        AsyncValue::Bytes(
            stream
                .map(|r: Result<B, E>| -> Result<Vec<u8>, BoxError> {
                    r.map(|b| b.as_ref().to_vec()).map_err(Into::into)
                })
                .boxed(),
        )
    }

    pub fn text<S, T, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<T, E>> + Send + 'static,
        T: Into<String> + 'static,
        E: Into<BoxError> + 'static,
    {
        AsyncValue::Text(
            stream
                .map(|r: Result<T, E>| -> Result<String, BoxError> {
                    r.map(Into::into).map_err(Into::into)
                })
                .boxed(),
        )
    }
}

impl fmt::Debug for AsyncValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsyncValue::Ready(v) => f.debug_tuple("Ready").field(v).finish(),
            AsyncValue::Future(_) => f.write_str("Future(..)"),
            AsyncValue::Bytes(_) => f.write_str("Bytes(..)"),
            AsyncValue::Text(_) => f.write_str("Text(..)"),
            AsyncValue::Array(items) => f.debug_tuple("Array").field(items).finish(),
            AsyncValue::Fragment(_) => f.write_str("Fragment(..)"),
        }
    }
}

macro_rules! async_value_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for AsyncValue {
                fn from(v: $t) -> Self {
                    AsyncValue::Ready(Value::from(v))
                }
            }
        )*
    };
}

async_value_from!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char,
    &str, &String, String, Cow<'static, str>, ()
);

impl From<Value> for AsyncValue {
    fn from(v: Value) -> Self {
        AsyncValue::Ready(v)
    }
}

impl From<HtmlStream> for AsyncValue {
    fn from(v: HtmlStream) -> Self {
        AsyncValue::Fragment(v)
    }
}

impl<T: Into<AsyncValue>> From<Option<T>> for AsyncValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(AsyncValue::Ready(Value::Null), Into::into)
    }
}

impl<T: Into<AsyncValue>> From<Vec<T>> for AsyncValue {
    fn from(v: Vec<T>) -> Self {
        AsyncValue::Array(v.into_iter().map(Into::into).collect())
    }
}

/// Lazily produced HTML chunks. Ends after the first error.
pub struct HtmlStream {
    inner: BoxStream<'static, Result<String, RenderError>>,
}

pub type StreamScope<C = Headers> = Scope<HtmlStream, C>;

impl HtmlStream {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<String, RenderError>> + Send + 'static,
    {
        Self {
            inner: stream.boxed(),
        }
    }

    /// Drains the stream into one string.
    pub async fn into_string(self) -> Result<String, RenderError> {
        self.try_fold(String::new(), |mut acc, chunk| {
            acc.push_str(&chunk);
            future::ready(Ok(acc))
        })
        .await
    }
}

impl Stream for HtmlStream {
    type Item = Result<String, RenderError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl From<String> for HtmlStream {
    fn from(html: String) -> Self {
        HtmlStream::new(stream::once(future::ready(Ok(html))))
    }
}

impl fmt::Debug for HtmlStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HtmlStream(..)")
    }
}

type Pending = BoxFuture<'static, Result<String, RenderError>>;

/// Resolves a value to its string form, before escaping.
fn resolve(value: AsyncValue, position: usize) -> Pending {
    match value {
        AsyncValue::Ready(v) => future::ready(Ok(v.coerce().into_owned())).boxed(),
        AsyncValue::Future(fut) => async move {
            let next = fut
                .await
                .map_err(|source| RenderError::Resolve { position, source })?;
            resolve(next, position).await
        }
        .boxed(),
        AsyncValue::Bytes(chunks) => async move {
            // Decode once at the end so multibyte chars may span chunks.
            let bytes = chunks
                .try_fold(Vec::new(), |mut acc, chunk| {
                    acc.extend_from_slice(&chunk);
                    future::ready(Ok(acc))
                })
                .await
                .map_err(|source| RenderError::Resolve { position, source })?;
            String::from_utf8(bytes).map_err(|source| RenderError::Utf8 { position, source })
        }
        .boxed(),
        AsyncValue::Text(chunks) => chunks
            .try_fold(String::new(), |mut acc, chunk| {
                acc.push_str(&chunk);
                future::ready(Ok(acc))
            })
            .map(move |r| r.map_err(|source| RenderError::Resolve { position, source }))
            .boxed(),
        AsyncValue::Array(items) => {
            future::try_join_all(items.into_iter().map(|item| resolve(item, position)))
                .map(|parts| parts.map(|parts| parts.concat()))
                .boxed()
        }
        AsyncValue::Fragment(html) => html
            .into_string()
            .map(move |r| {
                r.map_err(|e| RenderError::Nested {
                    position,
                    source: Box::new(e),
                })
            })
            .boxed(),
    }
}

fn strip_marker(literal: Cow<'static, str>) -> (Cow<'static, str>, bool) {
    match literal {
        Cow::Borrowed(text) => {
            let (text, raw) = split_marker(text);
            (Cow::Borrowed(text), raw)
        }
        Cow::Owned(mut text) => {
            let raw = text.ends_with(RAW_MARKER);
            if raw {
                text.pop();
            }
            (Cow::Owned(text), raw)
        }
    }
}

/// Alternates literals with resolved values in template order.
struct Interleave {
    literals: std::vec::IntoIter<Cow<'static, str>>,
    pending: FuturesOrdered<Pending>,
    literal_next: bool,
    done: bool,
}

impl Stream for Interleave {
    type Item = Result<String, RenderError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if this.done {
                return Poll::Ready(None);
            }
            if this.literal_next {
                this.literal_next = false;
                match this.literals.next() {
                    Some(literal) if literal.is_empty() => {}
                    Some(literal) => return Poll::Ready(Some(Ok(literal.into_owned()))),
                    None => {
                        this.done = true;
                        return Poll::Ready(None);
                    }
                }
            }
            match this.pending.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    this.literal_next = true;
                    if !chunk.is_empty() {
                        return Poll::Ready(Some(Ok(chunk)));
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    this.done = true;
                    return Poll::Ready(Some(Err(e)));
                }
                // every value is out, only the closing literal is left
                Poll::Ready(None) => this.literal_next = true,
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Template<AsyncValue> {
    /// Renders into a lazy chunk sequence.
    ///
    /// Escaping follows [`Template::render`]: the raw marker is a property of
    /// the literal, whether the value behind it is ready or pending.
    pub fn render_stream(self) -> HtmlStream {
        let (literals, values) = self.into_parts();
        trace!("streaming template of {} values", values.len());
        let mut literals = literals.into_iter();
        let mut stripped = Vec::with_capacity(values.len() + 1);
        let mut pending = FuturesOrdered::new();
        for (position, value) in values.into_iter().enumerate() {
            let (literal, raw) = strip_marker(literals.next().unwrap_or_default());
            stripped.push(literal);
            let site = resolve(value, position)
                .map(move |r| r.map(|s| if raw { s } else { escape(&s) }))
                .boxed();
            pending.push_back(site);
        }
        stripped.extend(literals);
        HtmlStream::new(Interleave {
            literals: stripped.into_iter(),
            pending,
            literal_next: true,
            done: false,
        })
    }
}
