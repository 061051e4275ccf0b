use htmlstack::{html, BufferSink, Headers, HtmlScope, LayoutOptions, RequestContext};

fn strip_ws(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn document_layout(scope: &mut HtmlScope) {
    scope.add_layout(
        |inner, _| {
            html!(
                "
                <!DOCTYPE html>
                <html lang=\"en\">
                  <body>
                    !${inner}
                  </body>
                </html>
                "
            )
        },
        LayoutOptions::default(),
    );
}

fn div_layout(scope: &mut HtmlScope) {
    scope.add_layout(|inner, _| html!("<div>!${inner}</div>"), LayoutOptions::default());
}

fn hello(name: Option<&str>) -> String {
    let name = name.unwrap_or("World");
    html!("<h1>Hello ${name}</h1>")
}

#[test]
fn render_html() {
    let scope = HtmlScope::<Headers>::new();
    let mut sink = BufferSink::new();
    scope.send(hello(None), &Headers::new(), &mut sink).expect("send");
    assert_eq!(sink.content_type.as_deref(), Some("text/html; charset=utf-8"));
    assert_eq!(sink.body(), "<h1>Hello World</h1>");

    let mut sink = BufferSink::new();
    scope.send(hello(Some("Matteo")), &Headers::new(), &mut sink).expect("send");
    assert_eq!(sink.body(), "<h1>Hello Matteo</h1>");
}

#[test]
fn escapes_values() {
    let name = "<script>alert('x')</script>";
    assert_eq!(
        html!("<p title=\"${name}\">${name}</p>"),
        "<p title=\"&lt;script&gt;alert(&apos;x&apos;)&lt;/script&gt;\">\
         &lt;script&gt;alert(&apos;x&apos;)&lt;/script&gt;</p>"
    );
}

#[test]
fn literals_only() {
    assert_eq!(html!(""), "");
    assert_eq!(html!("<p>😀 & 𝄞 <b>'\"</b></p>"), "<p>😀 & 𝄞 <b>'\"</b></p>");
}

#[test]
fn expression_kinds() {
    let missing: Option<&str> = None;
    let count = 3usize;
    let ratio = 0.25;
    let big = 1u128 << 100;
    assert_eq!(
        html!("${missing}|${count}|${ratio}|${big}|${count * 2}|${()}"),
        "|3|0.25|1267650600228229401496703205376|6|"
    );
}

#[test]
fn arrays_join() {
    assert_eq!(html!("<h1>${vec![\"Hello\", \" \", \"World\"]}</h1>"), "<h1>Hello World</h1>");
}

#[test]
fn nested_fragments_need_raw_site() {
    let items = ["a&b", "c"];
    let lis: Vec<String> = items.iter().map(|i| html!("<li>${*i}</li>")).collect();
    assert_eq!(html!("<ul>!${lis.clone()}</ul>"), "<ul><li>a&amp;b</li><li>c</li></ul>");
    // Without the marker the joined fragments are escaped once more.
    assert_eq!(
        html!("<ul>${lis}</ul>"),
        "<ul>&lt;li&gt;a&amp;amp;b&lt;/li&gt;&lt;li&gt;c&lt;/li&gt;</ul>"
    );
}

#[test]
fn one_level_layout() {
    let mut scope = HtmlScope::<Headers>::new();
    document_layout(&mut scope);
    let page = scope.apply_layouts(hello(Some("Matteo")), &Headers::new());
    assert_eq!(
        strip_ws(&page),
        strip_ws("<!DOCTYPE html><html lang=\"en\"><body><h1>Hello Matteo</h1></body></html>")
    );
}

#[test]
fn two_levels_layout() {
    let mut scope = HtmlScope::<Headers>::new();
    document_layout(&mut scope);
    div_layout(&mut scope);
    let page = scope.apply_layouts(hello(None), &Headers::new());
    assert_eq!(
        strip_ws(&page),
        strip_ws("<!DOCTYPE html><html lang=\"en\"><body><div><h1>Hello World</h1></div></body></html>")
    );
}

#[test]
fn two_levels_layout_with_nested_scope() {
    let mut root = HtmlScope::<Headers>::new();
    document_layout(&mut root);
    let mut inner = root.child();
    div_layout(&mut inner);

    let at_root = root.apply_layouts(hello(None), &Headers::new());
    assert_eq!(
        strip_ws(&at_root),
        strip_ws("<!DOCTYPE html><html lang=\"en\"><body><h1>Hello World</h1></body></html>")
    );
    let nested = inner.apply_layouts(hello(Some("Matteo")), &Headers::new());
    assert_eq!(
        strip_ws(&nested),
        strip_ws("<!DOCTYPE html><html lang=\"en\"><body><div><h1>Hello Matteo</h1></div></body></html>")
    );
}

#[test]
fn layout_uses_context() {
    let mut scope = HtmlScope::<Headers>::new();
    scope.add_layout(
        |inner, ctx: &Headers| {
            let lang = ctx.header("accept-language").unwrap_or("en");
            html!("<html lang=\"${lang}\">!${inner}</html>")
        },
        LayoutOptions::default(),
    );
    let ctx = Headers::new().with("Accept-Language", "de");
    assert_eq!(scope.apply_layouts(hello(None), &ctx), "<html lang=\"de\"><h1>Hello World</h1></html>");
}

#[test]
fn skip_layout_with_hx_request() {
    let mut scope = HtmlScope::<Headers>::new();
    scope.add_layout(
        |inner, _| html!("<html><body>!${inner}</body></html>"),
        LayoutOptions::skip_on_header("hx-request"),
    );
    div_layout(&mut scope);

    let mut sink = BufferSink::new();
    let htmx = Headers::new().with("hx-request", "true");
    scope.send(hello(None), &htmx, &mut sink).expect("send");
    assert_eq!(sink.body(), "<div><h1>Hello World</h1></div>");

    let mut sink = BufferSink::new();
    scope.send(hello(None), &Headers::new(), &mut sink).expect("send");
    assert_eq!(sink.body(), "<html><body><div><h1>Hello World</h1></div></body></html>");
}
