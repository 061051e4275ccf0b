use std::borrow::Cow;
use std::fmt::{self, Display, Write};

/// A value interpolated into a template.
///
/// Every variant has a defined string form, see [`Value::write_to`].
/// `Null` stands for both a missing and an undefined value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(Cow<'static, str>),
    Int(i64),
    UInt(u64),
    BigInt(i128),
    BigUint(u128),
    Number(f64),
    Bool(bool),
    Null,
    /// Elements are coerced one by one and concatenated without a separator.
    /// The joined string is escaped as a unit, elements are not escaped
    /// individually, so nested rendered fragments need a raw site.
    Array(Vec<Value>),
    Other(String),
}

impl Value {
    /// Captures the `Display` form of any value without a dedicated variant.
    pub fn display(value: impl Display) -> Self {
        Value::Other(value.to_string())
    }

    /// Appends the string form of this value.
    pub fn write_to(&self, to: &mut String) {
        match self {
            Value::Str(s) => to.push_str(s),
            Value::Null => {}
            Value::Array(items) => items.iter().for_each(|item| item.write_to(to)),
            Value::Number(n) => write_number(to, *n),
            // Writing into a String cannot fail.
            Value::Int(n) => {
                let _ = write!(to, "{n}");
            }
            Value::UInt(n) => {
                let _ = write!(to, "{n}");
            }
            Value::BigInt(n) => {
                let _ = write!(to, "{n}");
            }
            Value::BigUint(n) => {
                let _ = write!(to, "{n}");
            }
            Value::Bool(b) => to.push_str(if *b { "true" } else { "false" }),
            Value::Other(s) => to.push_str(s),
        }
    }

    /// The string form of this value, before escaping.
    pub fn coerce(&self) -> Cow<'_, str> {
        match self {
            Value::Str(s) => Cow::Borrowed(s.as_ref()),
            Value::Other(s) => Cow::Borrowed(s.as_str()),
            Value::Null => Cow::Borrowed(""),
            _ => {
                let mut out = String::new();
                self.write_to(&mut out);
                Cow::Owned(out)
            }
        }
    }
}

fn write_number(to: &mut String, n: f64) {
    if n.is_nan() {
        to.push_str("NaN");
    } else if n.is_infinite() {
        to.push_str(if n > 0.0 { "Infinity" } else { "-Infinity" });
    } else if n == 0.0 {
        // covers negative zero
        to.push('0');
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        let exp = format!("{n:e}");
        match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => {
                let _ = write!(to, "{mantissa}e+{power}");
            }
            _ => to.push_str(&exp),
        }
    } else {
        let _ = write!(to, "{n}");
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.coerce())
    }
}

macro_rules! value_from {
    ($variant:ident: $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

value_from!(Int: i8, i16, i32, i64);
value_from!(UInt: u8, u16, u32, u64);
value_from!(Number: f64);
value_from!(Bool: bool);
value_from!(BigInt: i128);
value_from!(BigUint: u128);

// Widening first would print the f64 digits of the nearest f32.
impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Number(v.to_string().parse().unwrap_or(f64::from(v)))
    }
}

impl From<isize> for Value {
    fn from(v: isize) -> Self {
        Value::Int(v as i64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::UInt(v as u64)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Str(Cow::Owned(v.to_string()))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(Cow::Owned(v.to_owned()))
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Str(Cow::Owned(v.clone()))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(Cow::Owned(v))
    }
}

impl From<Cow<'static, str>> for Value {
    fn from(v: Cow<'static, str>) -> Self {
        Value::Str(v)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(v: [T; N]) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Value {
    fn from(v: &[T]) -> Self {
        Value::Array(v.iter().cloned().map(Into::into).collect())
    }
}
