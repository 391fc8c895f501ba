use crate::error::{ErrorKind, PResult, ParseError};
use crate::num::JsNumber;
use crate::parse::parser::Parser;
use crate::source::Span;
use crate::token::Tok;

/// Evaluates a numeric literal's spelling. Radix forms hold integers; the
/// decimal form leans on Rust's float parser, whose grammar covers the
/// shapes the lexer admits.
pub fn number_value(span: &Span) -> PResult<JsNumber> {
    let text = span.text();
    let radix = match text.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    let value = match radix {
        // Conversion through u64 is as lossy as the language itself is above
        // 2^53.
        Some(radix) => u64::from_str_radix(&text[2..], radix)
            .ok()
            .map(|v| v as f64),
        None => text.parse::<f64>().ok(),
    };
    match value {
        Some(value) => Ok(JsNumber(value)),
        None => Err(ParseError::at_span(ErrorKind::BadNumber, span, None)),
    }
}

/// Decodes a string literal body, resolving the single-character escapes.
/// Unicode escapes pass through verbatim.
pub fn string_value(span: &Span) -> String {
    let bytes = span.bytes();
    let inner = &bytes[1..bytes.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut i = 0;
    while i < inner.len() {
        let b = inner[i];
        if b != b'\\' {
            out.push(b as char);
            i += 1;
            continue;
        };
        i += 1;
        match inner.get(i) {
            Some(b'n') => out.push('\n'),
            Some(b'r') => out.push('\r'),
            Some(b't') => out.push('\t'),
            Some(b'b') => out.push('\x08'),
            Some(b'f') => out.push('\x0c'),
            Some(b'v') => out.push('\x0b'),
            Some(b'0') => out.push('\0'),
            // An escaped line break continues the string.
            Some(b'\n') => {}
            Some(&other) => out.push(other as char),
            None => {}
        };
        i += 1;
    }
    out
}

/// Requires a string literal and yields its decoded value; module specifiers
/// come through here.
pub fn expect_string_value(parser: &mut Parser) -> PResult<String> {
    let token = parser.expect(Tok::Str)?;
    Ok(string_value(&token.span))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_of(raw: &str) -> f64 {
        number_value(&Span::synthetic(raw)).unwrap().0
    }

    #[test]
    fn test_number_value() {
        assert_eq!(value_of("42"), 42.0);
        assert_eq!(value_of("0x10"), 16.0);
        assert_eq!(value_of("0o17"), 15.0);
        assert_eq!(value_of("0b101"), 5.0);
        assert_eq!(value_of("1.5e3"), 1500.0);
        assert_eq!(value_of(".25"), 0.25);
        assert!(number_value(&Span::synthetic("0xzz")).is_err());
    }

    #[test]
    fn test_string_value() {
        assert_eq!(string_value(&Span::synthetic("'a\\nb'")), "a\nb");
        assert_eq!(string_value(&Span::synthetic("\"q\\\"q\"")), "q\"q");
        assert_eq!(string_value(&Span::synthetic("'a\\\nb'")), "ab");
    }
}
