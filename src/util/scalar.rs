//! Scalar kinds and their text encoding.
//!
//! Every primitive value in a project document is stored as decimal text.
//! Booleans use the exact tokens `true` / `false`.

use std::fmt;

/// Primitive kind of a scalar property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Free text
    String,
    /// Signed integer
    Integer,
    /// Double precision float
    Float,
    /// `true` / `false`
    Boolean,
}

impl ScalarKind {
    /// Returns the name of this kind as a string.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
        }
    }

    /// Check whether `text` coerces to this kind.
    pub fn accepts(self, text: &str) -> bool {
        match self {
            Self::String => true,
            Self::Integer => i64::from_text(text).is_some(),
            Self::Float => f64::from_text(text).is_some(),
            Self::Boolean => bool::from_text(text).is_some(),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A Rust type that maps onto one [`ScalarKind`].
pub trait ScalarValue: Sized {
    /// Declared kind this type coerces from.
    const KIND: ScalarKind;

    /// Parse from document text. Returns None if the text is not valid.
    fn from_text(text: &str) -> Option<Self>;

    /// Encode as document text.
    fn to_text(&self) -> String;
}

impl ScalarValue for String {
    const KIND: ScalarKind = ScalarKind::String;

    fn from_text(text: &str) -> Option<Self> {
        Some(text.to_string())
    }

    fn to_text(&self) -> String {
        self.clone()
    }
}

impl ScalarValue for i64 {
    const KIND: ScalarKind = ScalarKind::Integer;

    fn from_text(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }

    fn to_text(&self) -> String {
        self.to_string()
    }
}

impl ScalarValue for f64 {
    const KIND: ScalarKind = ScalarKind::Float;

    fn from_text(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }

    fn to_text(&self) -> String {
        format_float(*self)
    }
}

impl ScalarValue for bool {
    const KIND: ScalarKind = ScalarKind::Boolean;

    fn from_text(text: &str) -> Option<Self> {
        match text.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    fn to_text(&self) -> String {
        let token = if *self { "true" } else { "false" };
        token.to_string()
    }
}

/// Shortest decimal text that parses back to the same float.
///
/// Integral values are written without a fractional part (`86400`, not
/// `86400.0`), matching what GeoStudio itself emits.
pub fn format_float(value: f64) -> String {
    if value == 0.0 {
        // Collapse -0 so deltas between equal times read as plain 0
        return "0".to_string();
    }
    value.to_string()
}
