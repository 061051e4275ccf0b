use std::error::Error;
use std::io;

use htmlstack::{
    html, html_stream, AsyncValue, Headers, HtmlConfig, HtmlScope, HtmlStream, LayoutOptions,
    StreamScope, WriteSink,
};
use log::info;
use tokio::fs::{self, File};
use tokio_util::io::ReaderStream;

const MANIFEST: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml");
const SOURCE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/src/main.rs");

fn page(inner: String, _: &Headers) -> String {
    html!(
        "<!DOCTYPE html>
<html lang=\"en\">
  <head>
    <script src=\"https://unpkg.com/htmx.org@1.9.5\"></script>
  </head>
  <body>
    !${inner}
  </body>
</html>"
    )
}

fn streamed_page(inner: HtmlStream, _: &Headers) -> HtmlStream {
    html_stream!("<!DOCTYPE html><html><body>!${inner}</body></html>")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => HtmlConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => HtmlConfig::default(),
    };
    info!("serving {}", config.content_type);

    let mut scope = HtmlScope::with_config(config.clone());
    scope.add_layout(page, LayoutOptions::skip_on_header("hx-request"));
    let mut out = WriteSink::new(io::stdout());

    let name = "World & <friends>";
    let button = html!("<button hx-post=\"/clicked\" hx-swap=\"outerHTML\">Click Me</button>");
    scope.send(html!("<h1>Hello ${name}</h1>!${button}"), &Headers::new(), &mut out)?;
    println!();

    // A partial update: htmx asks without the surrounding document.
    let htmx = Headers::new().with("HX-Request", "true");
    scope.send(html!("<h1>Clicked</h1>"), &htmx, &mut out)?;
    println!();

    let mut streaming = StreamScope::with_config(config);
    streaming.add_layout(streamed_page, LayoutOptions::skip_on_header("hx-request"));
    let manifest = AsyncValue::future(fs::read_to_string(MANIFEST));
    let source = AsyncValue::future(async {
        let file = File::open(SOURCE).await?;
        Ok::<_, io::Error>(AsyncValue::bytes(ReaderStream::new(file)))
    });
    let body = html_stream!("<h2>Cargo.toml</h2><pre>${manifest}</pre><h2>main.rs</h2><pre>${source}</pre>");
    streaming.send(body, &Headers::new(), &mut out).await?;
    println!();
    Ok(())
}
