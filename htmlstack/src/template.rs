use std::borrow::Cow;

use log::trace;

use crate::error::RenderError;
use crate::escape::{Escape, Html, NoEscape};
use crate::value::Value;

/// Trailing character on a literal segment that marks the next value raw.
pub const RAW_MARKER: char = '!';

/// Literal segments interleaved with interpolated values.
///
/// There is always exactly one more literal than values: value `i` sits
/// between literal `i` and literal `i + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Template<V = Value> {
    literals: Vec<Cow<'static, str>>,
    values: Vec<V>,
}

impl<V> Template<V> {
    pub fn new<L>(literals: Vec<L>, values: Vec<V>) -> Result<Self, RenderError>
    where
        L: Into<Cow<'static, str>>,
    {
        if literals.len() != values.len() + 1 {
            return Err(RenderError::SegmentCount {
                literals: literals.len(),
                values: values.len(),
            });
        }
        Ok(Self::from_parts(literals, values))
    }

    /// Builds a template whose segment count is known to be right, as the
    /// `html!` macros guarantee.
    #[doc(hidden)]
    pub fn from_parts<L>(literals: Vec<L>, values: Vec<V>) -> Self
    where
        L: Into<Cow<'static, str>>,
    {
        debug_assert_eq!(literals.len(), values.len() + 1);
        Self {
            literals: literals.into_iter().map(Into::into).collect(),
            values,
        }
    }

    /// A template of a single literal and no values.
    pub fn literal(text: impl Into<Cow<'static, str>>) -> Self {
        Self {
            literals: vec![text.into()],
            values: Vec::new(),
        }
    }

    pub fn literals(&self) -> &[Cow<'static, str>] {
        &self.literals
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub(crate) fn into_parts(self) -> (Vec<Cow<'static, str>>, Vec<V>) {
        (self.literals, self.values)
    }
}

/// Strips the raw marker from a literal, reporting whether it was there.
pub(crate) fn split_marker(literal: &str) -> (&str, bool) {
    match literal.strip_suffix(RAW_MARKER) {
        Some(stripped) => (stripped, true),
        None => (literal, false),
    }
}

impl Template<Value> {
    /// Renders into a complete HTML string.
    ///
    /// Values are escaped unless the literal in front of them ends with
    /// [`RAW_MARKER`], which is dropped from the output. Literal text is
    /// never escaped.
    pub fn render(&self) -> String {
        let capacity = self.literals.iter().map(|l| l.len()).sum::<usize>();
        let mut acc = String::with_capacity(capacity);
        for (literal, value) in self.literals.iter().zip(&self.values) {
            let (literal, raw) = split_marker(literal);
            acc.push_str(literal);
            let exp = value.coerce();
            // Writing into a String cannot fail.
            let _ = if raw {
                NoEscape.write(&mut acc, &exp)
            } else {
                Html.write(&mut acc, &exp)
            };
        }
        if let Some(last) = self.literals.last() {
            acc.push_str(last);
        }
        trace!("rendered template of {} values into {} bytes", self.values.len(), acc.len());
        acc
    }
}
