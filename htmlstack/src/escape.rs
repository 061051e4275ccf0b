use std::fmt::{Result, Write};

/// The five reserved characters and the entities they are replaced with.
pub const ESCAPE_DICTIONARY: [(char, &str); 5] = [
    ('"', "&quot;"),
    ('\'', "&apos;"),
    ('&', "&amp;"),
    ('<', "&lt;"),
    ('>', "&gt;"),
];

pub trait Escape {
    fn write(&self, to: &mut impl Write, val: &str) -> Result;
}

/// Writes values verbatim. Used for interpolation sites marked raw.
pub struct NoEscape;

impl Escape for NoEscape {
    fn write(&self, to: &mut impl Write, val: &str) -> Result {
        to.write_str(val)
    }
}

pub struct Html;

impl Html {
    fn entity(c: char) -> Option<&'static str> {
        ESCAPE_DICTIONARY
            .iter()
            .find(|(reserved, _)| *reserved == c)
            .map(|(_, entity)| *entity)
    }
}

impl Escape for Html {
    fn write(&self, to: &mut impl Write, val: &str) -> Result {
        let mut rem = val;
        // The predicate sees whole chars, so slicing at `idx` never splits a code point.
        while let Some(idx) = rem.find(|c: char| Self::entity(c).is_some()) {
            to.write_str(&rem[..idx])?;
            let c = rem[idx..].chars().next().unwrap_or_default();
            to.write_str(Self::entity(c).unwrap_or_default())?;
            rem = &rem[idx + c.len_utf8()..];
        }
        to.write_str(rem)
    }
}

/// Escapes `input` for inclusion in HTML text or attribute values.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    // Writing into a String cannot fail.
    let _ = Html.write(&mut out, input);
    out
}
