//! Presence and shape guards.
//!
//! # Responsibilities
//! - Classify values as present/absent without failing
//! - Recognize non-empty strings, numbers (including numeric strings), and sequences
//!
//! # Design Decisions
//! - `None` is the "absent" sentinel, `Value::Null` the "null" sentinel
//! - Predicates are total: they never panic and never return errors
//! - Numeric text means finite decimal notation: `""`, hex (`"0x10"`), and
//!   `inf`/`infinity` in any casing are not numbers

use serde_json::Value;

/// Shape probes used by the guards below.
///
/// Implement this for any type a guard should be able to classify. Every
/// method defaults to "not that shape".
pub trait Inspect {
    /// True for the explicit null sentinel.
    fn is_null(&self) -> bool {
        false
    }

    /// String view, if the value is textual.
    fn as_text(&self) -> Option<&str> {
        None
    }

    /// Numeric view of the value, possibly `NaN`.
    fn as_number(&self) -> Option<f64> {
        None
    }

    fn is_sequence(&self) -> bool {
        false
    }
}

impl Inspect for str {
    fn as_text(&self) -> Option<&str> {
        Some(self)
    }

    /// Finite decimal text only; surrounding whitespace is ignored.
    fn as_number(&self) -> Option<f64> {
        self.trim().parse::<f64>().ok().filter(|n| n.is_finite())
    }
}

impl Inspect for String {
    fn as_text(&self) -> Option<&str> {
        Some(self.as_str())
    }

    fn as_number(&self) -> Option<f64> {
        self.as_str().as_number()
    }
}

impl Inspect for f64 {
    fn as_number(&self) -> Option<f64> {
        Some(*self)
    }
}

impl Inspect for i64 {
    fn as_number(&self) -> Option<f64> {
        Some(*self as f64)
    }
}

impl Inspect for u64 {
    fn as_number(&self) -> Option<f64> {
        Some(*self as f64)
    }
}

impl<T> Inspect for [T] {
    fn is_sequence(&self) -> bool {
        true
    }
}

impl<T> Inspect for Vec<T> {
    fn is_sequence(&self) -> bool {
        true
    }
}

impl Inspect for Value {
    fn is_null(&self) -> bool {
        Value::is_null(self)
    }

    fn as_text(&self) -> Option<&str> {
        self.as_str()
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.as_number(),
            _ => None,
        }
    }

    fn is_sequence(&self) -> bool {
        self.is_array()
    }
}

/// Returns false for the absent or null sentinel.
pub fn is_present<T: Inspect + ?Sized>(value: Option<&T>) -> bool {
    matches!(value, Some(v) if !v.is_null())
}

/// Present, textual, and not empty.
pub fn is_non_empty_string<T: Inspect + ?Sized>(value: Option<&T>) -> bool {
    match value {
        Some(v) if is_present(Some(v)) => v.as_text().is_some_and(|s| !s.is_empty()),
        _ => false,
    }
}

/// Present and convertible to a number that is not `NaN`, numeric strings included.
pub fn is_valid_number<T: Inspect + ?Sized>(value: Option<&T>) -> bool {
    match value {
        Some(v) if is_present(Some(v)) => v.as_number().is_some_and(|n| !n.is_nan()),
        _ => false,
    }
}

/// Present and a sequence, even if empty.
pub fn is_valid_array<T: Inspect + ?Sized>(value: Option<&T>) -> bool {
    match value {
        Some(v) if is_present(Some(v)) => v.is_sequence(),
        _ => false,
    }
}

/// A valid number strictly greater than zero.
pub fn is_positive_number<T: Inspect + ?Sized>(value: Option<&T>) -> bool {
    if !is_valid_number(value) {
        return false;
    }
    value.and_then(|v| v.as_number()).is_some_and(|n| n > 0.0)
}
