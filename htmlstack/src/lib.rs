//! Escaping HTML templates with layouts.
//!
//! ```
//! use htmlstack::{html, Headers, HtmlScope, LayoutOptions};
//!
//! let mut scope = HtmlScope::new();
//! scope.add_layout(
//!     |inner, _: &Headers| html!("<body>!${inner}</body>"),
//!     LayoutOptions::skip_on_header("hx-request"),
//! );
//!
//! let name = "<World>";
//! let page = scope.apply_layouts(html!("<h1>Hello ${name}</h1>"), &Headers::new());
//! assert_eq!(page, "<body><h1>Hello &lt;World&gt;</h1></body>");
//! ```
extern crate self as htmlstack;

pub mod config;
pub mod error;
pub mod escape;
pub mod layout;
pub mod reply;
pub mod stream;
pub mod template;
pub mod value;

pub use htmlstack_macros::{html, html_stream};

pub use config::HtmlConfig;
pub use error::RenderError;
pub use escape::escape;
pub use layout::{Headers, HtmlScope, LayoutOptions, RequestContext, Scope};
pub use reply::{BufferSink, HtmlSink, WriteSink};
pub use stream::{AsyncValue, HtmlStream, StreamScope};
pub use template::Template;
pub use value::Value;

pub type Result<T, E = RenderError> = std::result::Result<T, E>;
