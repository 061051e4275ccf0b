use std::str::CharIndices;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Expr, LitStr, Result};

/// Renders an HTML template string to a `String`.
///
/// `${expr}` interpolates a Rust expression, escaped. A `!` right before the
/// hole (`!${expr}`) inserts it verbatim.
#[proc_macro]
pub fn html(input: TokenStream) -> TokenStream {
    let template = parse_macro_input!(input as LitStr);
    expand(&template, Mode::Html)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Like `html!`, but values may be pending and the result is an `HtmlStream`.
#[proc_macro]
pub fn html_stream(input: TokenStream) -> TokenStream {
    let template = parse_macro_input!(input as LitStr);
    expand(&template, Mode::Stream)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

enum Mode {
    Html,
    Stream,
}

fn expand(template: &LitStr, mode: Mode) -> Result<TokenStream2> {
    let source = template.value();
    let parts = split(&source).map_err(|msg| syn::Error::new(template.span(), msg))?;
    let values = parts
        .holes
        .iter()
        .map(|hole| {
            syn::parse_str::<Expr>(hole).map_err(|error| {
                syn::Error::new(template.span(), format!("invalid expression `{hole}`: {error}"))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let literals = &parts.literals;

    let tokens = match mode {
        Mode::Html => quote! {
            ::htmlstack::Template::<::htmlstack::Value>::from_parts(
                ::std::vec![#( #literals ),*],
                ::std::vec![#( ::htmlstack::Value::from(#values) ),*],
            )
            .render()
        },
        Mode::Stream => quote! {
            ::htmlstack::Template::<::htmlstack::AsyncValue>::from_parts(
                ::std::vec![#( #literals ),*],
                ::std::vec![#( ::htmlstack::AsyncValue::from(#values) ),*],
            )
            .render_stream()
        },
    };
    Ok(tokens)
}

const START: &str = "${";

#[derive(Debug, PartialEq)]
struct Parts {
    literals: Vec<String>,
    holes: Vec<String>,
}

/// Splits a template into literal text and hole expressions.
///
/// There is always one literal more than holes.
fn split(source: &str) -> std::result::Result<Parts, String> {
    let mut literals = Vec::new();
    let mut holes = Vec::new();
    let mut rem = source;
    while let Some(start) = rem.find(START) {
        literals.push(rem[..start].to_string());
        let offset = source.len() - rem.len() + start;
        let code = &rem[start + START.len()..];
        let Some(end) = closing_brace(code) else {
            return Err(format!("`${{` at byte {offset} is not closed"));
        };
        let hole = code[..end].trim();
        if hole.is_empty() {
            return Err(format!("empty `${{}}` at byte {offset}"));
        }
        holes.push(hole.to_string());
        rem = &code[end + 1..];
    }
    literals.push(rem.to_string());
    Ok(Parts { literals, holes })
}

/// Finds the `}` closing a hole, skipping nested braces, string and char
/// literals.
fn closing_brace(code: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut chars = code.char_indices();
    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => skip_string(&mut chars)?,
            '\'' => skip_char_literal(&mut chars),
            '{' => depth += 1,
            '}' if depth == 0 => return Some(idx),
            '}' => depth -= 1,
            _ => {}
        }
    }
    None
}

fn skip_string(chars: &mut CharIndices<'_>) -> Option<()> {
    let mut escaped = false;
    for (_, c) in chars.by_ref() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(()),
            _ => {}
        }
    }
    None
}

/// Consumes `'x'` or `'\x'`; a lifetime such as `'static` is left alone.
fn skip_char_literal(chars: &mut CharIndices<'_>) {
    let mut ahead = chars.clone();
    let is_literal = match ahead.next() {
        Some((_, '\\')) => ahead.next().is_some() && ahead.any(|(_, c)| c == '\''),
        Some((_, _)) => matches!(ahead.next(), Some((_, '\''))),
        None => false,
    };
    if is_literal {
        *chars = ahead;
    }
}
