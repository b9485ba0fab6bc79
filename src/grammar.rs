//! Grammar validation helpers for MIME tokens, header fields and boundaries.
//!
//! Based on RFC 2045, RFC 2046 and RFC 5322 definitions.

use crate::error::{Error, Result};

/// Maximum boundary length allowed by RFC 2046.
pub const MAX_BOUNDARY_LEN: usize = 70;

/// Reports whether the character is in 'tspecials' as defined by RFC 1521 and RFC 2045.
///
/// tspecials := "(" / ")" / "<" / ">" / "@" / "," / ";" / ":" / "\" / <">
///              / "/" / "[" / "]" / "?" / "="
pub fn is_tspecial(c: char) -> bool {
    matches!(
        c,
        '(' | ')' | '<' | '>' | '@' | ',' | ';' | ':' | '\\' | '"' | '/' | '[' | ']' | '?' | '='
    )
}

/// Reports whether the character is in 'token' as defined by RFC 1521 and RFC 2045.
///
/// token := 1*<any (US-ASCII) CHAR except SPACE, CTLs, or tspecials>
pub fn is_token_char(c: char) -> bool {
    c > '\x20' && c < '\x7f' && !is_tspecial(c)
}

/// Reports whether the string is a valid 'token' as defined by RFC 1521 and RFC 2045.
pub fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_token_char)
}

/// Reports whether the character is in 'bchars' as defined by RFC 2046.
///
/// bcharsnospace := DIGIT / ALPHA / "'" / "(" / ")" / "+" / "_" / "," / "-" / "."
///                  / "/" / ":" / "=" / "?"
pub fn is_boundary_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '\'' | '(' | ')' | '+' | '_' | ',' | '-' | '.' | '/' | ':' | '=' | '?' | ' ')
}

/// Checks a multipart boundary against RFC 2046.
///
/// The boundary must be 1-70 characters from the bchars set and must not end with a space.
pub fn validate_boundary(boundary: &str) -> Result<()> {
    if boundary.is_empty() || boundary.len() > MAX_BOUNDARY_LEN {
        return Err(Error::InvalidArgument(format!(
            "invalid boundary length: {}",
            boundary.len()
        )));
    }

    if let Some(ch) = boundary.chars().find(|&c| !is_boundary_char(c)) {
        return Err(Error::InvalidArgument(format!(
            "invalid boundary character: {:?}",
            ch
        )));
    }

    if boundary.ends_with(' ') {
        return Err(Error::InvalidArgument(
            "boundary must not end with a space".to_string(),
        ));
    }

    Ok(())
}

/// Reports whether a boundary must be quoted when used as a parameter value.
pub fn boundary_needs_quoting(boundary: &str) -> bool {
    !is_token(boundary)
}

/// Reports whether the string is a valid header field name (RFC 5322 ftext).
///
/// ftext := %d33-57 / %d59-126 (printable US-ASCII except colon)
pub fn is_header_name(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| (33..=126).contains(&b) && b != b':')
}

/// Reports whether the string can be written as a header field value.
///
/// Line breaks are only accepted as folding (CRLF followed by a space or tab).
pub fn is_header_value(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                if bytes.get(i + 1) != Some(&b'\n')
                    || !matches!(bytes.get(i + 2), Some(b' ' | b'\t'))
                {
                    return false;
                }
                i += 2;
            }
            b'\n' | 0 => return false,
            _ => {}
        }
        i += 1;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_tspecial() {
        for c in ['(', ')', '<', '>', '@', ',', ';', ':', '\\', '"', '/', '[', ']', '?', '='] {
            assert!(is_tspecial(c), "{c:?} should be a tspecial");
        }

        assert!(!is_tspecial('a'));
        assert!(!is_tspecial('Z'));
        assert!(!is_tspecial('0'));
    }

    #[test]
    fn test_is_token() {
        assert!(is_token("text"));
        assert!(is_token("test-value"));

        assert!(!is_token(""));
        assert!(!is_token("text/plain"));
        assert!(!is_token("with space"));
        assert!(!is_token("with(paren"));
        assert!(!is_token("ctl\x1f"));
    }

    #[test]
    fn test_validate_boundary() {
        assert!(validate_boundary("simple-boundary").is_ok());
        assert!(validate_boundary("with space inside").is_ok());
        assert!(validate_boundary("=_Part_1.2:3").is_ok());

        assert!(validate_boundary("").is_err());
        assert!(validate_boundary(&"a".repeat(71)).is_err());
        assert!(validate_boundary("trailing ").is_err());
        assert!(validate_boundary("semi;colon").is_err());
        assert!(validate_boundary("line\r\nbreak").is_err());
    }

    #[test]
    fn test_boundary_needs_quoting() {
        assert!(!boundary_needs_quoting("abc-123"));
        assert!(boundary_needs_quoting("a=b"));
        assert!(boundary_needs_quoting("with space"));
    }

    #[test]
    fn test_header_name_and_value() {
        assert!(is_header_name("Content-Type"));
        assert!(is_header_name("X-Custom_1"));
        assert!(!is_header_name(""));
        assert!(!is_header_name("Bad:Name"));
        assert!(!is_header_name("Bad Name"));

        assert!(is_header_value(""));
        assert!(is_header_value("text/plain"));
        assert!(is_header_value("folded\r\n value"));
        assert!(!is_header_value("bare\nnewline"));
        assert!(!is_header_value("bare\rreturn"));
        assert!(!is_header_value("crlf\r\nnot folded"));
    }
}
