use std::str::FromStr;

use crate::num::JsNumber;

/// A primitive JavaScript value as seen by the constant folder. Only shapes
/// the compressor can prove are represented; anything else stays symbolic in
/// the tree.
#[derive(Clone, Debug, PartialEq)]
pub enum JsValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(JsNumber),
    String(String),
}

impl JsValue {
    /// ECMA-262 §9.2 ToBoolean.
    pub fn to_boolean(&self) -> bool {
        match self {
            JsValue::Undefined | JsValue::Null => false,
            JsValue::Boolean(b) => *b,
            JsValue::Number(n) => !(n.0 == 0.0 || n.0.is_nan()),
            JsValue::String(s) => !s.is_empty(),
        }
    }

    /// ECMA-262 §9.3 ToNumber.
    pub fn to_number(&self) -> JsNumber {
        match self {
            JsValue::Undefined => JsNumber(f64::NAN),
            JsValue::Null => JsNumber(0.0),
            JsValue::Boolean(b) => JsNumber(if *b { 1.0 } else { 0.0 }),
            JsValue::Number(n) => *n,
            JsValue::String(s) => JsNumber(string_to_number(s)),
        }
    }

    /// ECMA-262 §9.8 ToString, for the value shapes we fold.
    pub fn to_js_string(&self) -> String {
        match self {
            JsValue::Undefined => "undefined".to_string(),
            JsValue::Null => "null".to_string(),
            JsValue::Boolean(b) => b.to_string(),
            JsValue::Number(n) => number_to_string(n.0),
            JsValue::String(s) => s.clone(),
        }
    }
}

/// §9.3.1 ToNumber applied to the String type: optional whitespace, an
/// optional sign on decimal forms, `Infinity`, radix-prefixed integers, or a
/// decimal literal with optional exponent. The empty (or all-whitespace)
/// string is zero; overflow is ±∞; anything unparseable is NaN.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(|c: char| c.is_ascii_whitespace());
    if trimmed.is_empty() {
        return 0.0;
    };
    let (signed, sign, unsigned) = match trimmed.as_bytes()[0] {
        b'+' => (true, 1.0, &trimmed[1..]),
        b'-' => (true, -1.0, &trimmed[1..]),
        _ => (false, 1.0, trimmed),
    };
    if unsigned == "Infinity" {
        return sign * f64::INFINITY;
    };
    // Radix-prefixed forms allow no sign and no fraction.
    if !signed && unsigned.len() > 2 {
        let radix = match &unsigned[..2] {
            "0x" | "0X" => Some(16),
            "0o" | "0O" => Some(8),
            "0b" | "0B" => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            return match u64::from_str_radix(&unsigned[2..], radix) {
                Ok(v) => v as f64,
                Err(_) => f64::NAN,
            };
        };
    };
    match f64::from_str(unsigned) {
        // `from_str` accepts forms like `nan`, `inf` and `1e` rejections differ; filter the
        // JS-invalid spellings it would otherwise tolerate.
        Ok(v) if !unsigned.contains(|c: char| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => {
            sign * v
        }
        _ => f64::NAN,
    }
}

/// §9.8.1 ToString applied to the Number type, to the extent the folder needs
/// it (shortest round-trip formatting is the emitter's concern).
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        // Both zeros print as "0".
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn str_val(s: &str) -> JsValue {
        JsValue::String(s.to_string())
    }

    #[test]
    fn test_to_boolean() {
        assert_eq!(JsValue::Undefined.to_boolean(), false);
        assert_eq!(JsValue::Null.to_boolean(), false);
        assert_eq!(JsValue::Number(JsNumber(f64::NAN)).to_boolean(), false);
        assert_eq!(JsValue::Number(JsNumber(0.0)).to_boolean(), false);
        assert_eq!(JsValue::Number(JsNumber(-0.0)).to_boolean(), false);
        assert_eq!(str_val("").to_boolean(), false);
        assert_eq!(JsValue::Boolean(false).to_boolean(), false);

        assert_eq!(JsValue::Number(JsNumber(42.0)).to_boolean(), true);
        assert_eq!(str_val("0").to_boolean(), true);
        assert_eq!(str_val("false").to_boolean(), true);
    }

    #[test]
    fn test_to_number_strings() {
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number(" 42 "), 42.0);
        assert_eq!(string_to_number("0x10"), 16.0);
        assert_eq!(string_to_number("0o20"), 16.0);
        assert_eq!(string_to_number("0b100"), 4.0);
        assert_eq!(string_to_number("+Infinity"), f64::INFINITY);
        assert_eq!(string_to_number("-Infinity"), f64::NEG_INFINITY);
        assert_eq!(string_to_number("-1.5e2"), -150.0);
        assert!(string_to_number("abc").is_nan());
        assert!(string_to_number("12px").is_nan());
        assert!(string_to_number("+0x10").is_nan());
        // Explicit -0 preservation.
        let neg_zero = string_to_number("-0");
        assert_eq!(neg_zero, 0.0);
        assert!(neg_zero.is_sign_negative());
        // Overflow goes to infinity.
        assert_eq!(string_to_number("1e999"), f64::INFINITY);
    }

    #[test]
    fn test_to_number_values() {
        assert_eq!(JsValue::Null.to_number().0, 0.0);
        assert!(JsValue::Undefined.to_number().0.is_nan());
        assert_eq!(JsValue::Boolean(true).to_number().0, 1.0);
        assert_eq!(JsValue::Boolean(false).to_number().0, 0.0);
    }

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::INFINITY), "Infinity");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(42.0), "42");
        assert_eq!(number_to_string(1.5), "1.5");
    }
}
