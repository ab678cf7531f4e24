//! Compile-time constant values

use std::cmp::Ordering;
use std::fmt;

/// The value of a constant: integer, floating point, string or boolean.
///
/// Integers are exact within `i128`. Floating-point constants are held as
/// `f64`, which is narrower than Go's arbitrary precision.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i128),
    Float(f64),
    String(String),
    Bool(bool),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer view of a numeric value; floats qualify only when integral
    pub fn as_exact_int(&self) -> Option<i128> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 => {
                let i = *f as i128;
                (i as f64 == *f).then_some(i)
            }
            _ => None,
        }
    }

    /// Ordering for comparison operators; `None` when the values are incomparable
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) if a == b => Some(Ordering::Equal),
            (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Parse a Go integer literal: decimal, `0x`, `0o`, `0b` or legacy `0` octal,
/// with optional `_` digit separators
pub fn parse_int(lexeme: &str) -> Option<i128> {
    let digits: String = lexeme.chars().filter(|c| *c != '_').collect();
    let lower = digits.to_ascii_lowercase();

    let (radix, body) = if let Some(rest) = lower.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (8, rest)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (2, rest)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..])
    } else {
        (10, lower.as_str())
    };

    if body.is_empty() {
        return None;
    }
    i128::from_str_radix(body, radix).ok()
}

/// Parse a decimal Go floating-point literal
pub fn parse_float(lexeme: &str) -> Option<f64> {
    let digits: String = lexeme.chars().filter(|c| *c != '_').collect();
    digits.parse::<f64>().ok().filter(|f| f.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_bases() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("0x2A"), Some(42));
        assert_eq!(parse_int("0o52"), Some(42));
        assert_eq!(parse_int("052"), Some(42));
        assert_eq!(parse_int("0b101010"), Some(42));
        assert_eq!(parse_int("1_000"), Some(1000));
        assert_eq!(parse_int("0"), Some(0));
    }

    #[test]
    fn test_parse_int_rejects_bad_digits() {
        assert_eq!(parse_int("09"), None);
        assert_eq!(parse_int("0x"), None);
        assert_eq!(parse_int("0b2"), None);
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float("1.5"), Some(1.5));
        assert_eq!(parse_float(".25"), Some(0.25));
        assert_eq!(parse_float("1e3"), Some(1000.0));
        assert_eq!(parse_float("1_0.0"), Some(10.0));
    }

    #[test]
    fn test_exact_int_from_float() {
        assert_eq!(Value::Float(3.0).as_exact_int(), Some(3));
        assert_eq!(Value::Float(3.5).as_exact_int(), None);
        assert_eq!(Value::String("3".into()).as_exact_int(), None);
    }

    #[test]
    fn test_compare_mixed_numeric() {
        assert_eq!(Value::Int(2).compare(&Value::Float(2.5)), Some(Ordering::Less));
        assert_eq!(Value::Bool(true).compare(&Value::Bool(false)), None);
    }
}
