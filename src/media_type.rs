//! Media type parsing and formatting.
//!
//! Implements the RFC 2045 and RFC 2231 subset needed to read and rewrite
//! `Content-Type` parameters. Parameters keep their order so a rewritten
//! header reads like the one the caller supplied.

use crate::error::{Error, Result};
use crate::grammar::{is_token, is_tspecial};

const UPPER_HEX: &[u8] = b"0123456789ABCDEF";

/// Ordered media type parameters.
pub type Params = Vec<(String, String)>;

/// Parses a media type value and any optional parameters, per RFC 1521.
///
/// Returns the media type converted to lowercase and the parameters in
/// source order, with lowercase names and unquoted values.
///
/// # Examples
///
/// ```
/// use tokio_mime_entity::parse_media_type;
///
/// let (media_type, params) = parse_media_type("multipart/mixed; boundary=\"a;b\"").unwrap();
/// assert_eq!(media_type, "multipart/mixed");
/// assert_eq!(params, vec![("boundary".to_string(), "a;b".to_string())]);
/// ```
pub fn parse_media_type(v: &str) -> Result<(String, Params)> {
    let mut segments = split_params(v).into_iter();
    let mediatype = segments.next().unwrap_or_default().trim().to_lowercase();

    match mediatype.split_once('/') {
        Some((major, sub)) if is_token(major) && is_token(sub) => {}
        Some(_) => return Err(Error::MediaType("invalid media type format".to_string())),
        None => return Err(Error::MediaType("no media type".to_string())),
    }

    let mut params = Params::new();
    for segment in segments {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }

        let (key, value) = segment
            .split_once('=')
            .ok_or_else(|| Error::MediaType(format!("invalid parameter {:?}", segment)))?;
        let key = key.trim().to_lowercase();
        if !is_token(&key) {
            return Err(Error::MediaType(format!("invalid parameter name {:?}", key)));
        }
        if params.iter().any(|(k, _)| *k == key) {
            return Err(Error::MediaType(format!("duplicate parameter {:?}", key)));
        }
        params.push((key, unquote(value.trim())));
    }

    Ok((mediatype, params))
}

/// Returns the value of the named parameter, matching names case-insensitively.
pub fn get_param<'p>(params: &'p Params, name: &str) -> Option<&'p str> {
    params
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Serializes a media type and parameters as a media type conforming to RFC 2045 and RFC 2616.
///
/// The type and parameter names are written in lower-case. Returns an error
/// if the type or a parameter name is not a valid token.
///
/// # Examples
///
/// ```
/// use tokio_mime_entity::format_media_type;
///
/// let params = vec![("charset".to_string(), "utf-8".to_string())];
/// let formatted = format_media_type("text/html", &params).unwrap();
/// assert_eq!(formatted, "text/html; charset=utf-8");
/// ```
pub fn format_media_type(t: &str, params: &Params) -> Result<String> {
    let mut result = String::new();

    match t.split_once('/') {
        Some((major, sub)) if is_token(major) && is_token(sub) => {
            result.push_str(&major.to_lowercase());
            result.push('/');
            result.push_str(&sub.to_lowercase());
        }
        _ => return Err(Error::MediaType(format!("invalid media type {:?}", t))),
    }

    for (key, value) in params {
        result.push_str("; ");
        result.push_str(&format_param(key, value, false)?);
    }

    Ok(result)
}

/// Serializes a single `name=value` parameter.
///
/// Values that are not tokens are quoted, values outside printable ASCII use
/// RFC 2231 extended notation. `force_quote` quotes token values as well.
pub fn format_param(key: &str, value: &str, force_quote: bool) -> Result<String> {
    if !is_token(key) {
        return Err(Error::MediaType(format!("invalid parameter name {:?}", key)));
    }

    let mut result = key.to_lowercase();

    if needs_encoding(value) {
        result.push_str("*=utf-8''");
        for &b in value.as_bytes() {
            if b <= b' '
                || b >= 0x7F
                || b == b'*'
                || b == b'\''
                || b == b'%'
                || is_tspecial(b as char)
            {
                result.push('%');
                result.push(UPPER_HEX[(b >> 4) as usize] as char);
                result.push(UPPER_HEX[(b & 0x0F) as usize] as char);
            } else {
                result.push(b as char);
            }
        }
    } else if is_token(value) && !force_quote {
        result.push('=');
        result.push_str(value);
    } else {
        result.push_str("=\"");
        for ch in value.chars() {
            if ch == '"' || ch == '\\' {
                result.push('\\');
            }
            result.push(ch);
        }
        result.push('"');
    }

    Ok(result)
}

/// Splits a header value on semicolons that are not inside a quoted string.
pub(crate) fn split_params(v: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, ch) in v.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                segments.push(&v[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&v[start..]);
    segments
}

/// Removes surrounding quotes and backslash escapes from a parameter value.
fn unquote(value: &str) -> String {
    if value.len() < 2 || !value.starts_with('"') || !value.ends_with('"') {
        return value.to_string();
    }

    let mut result = String::with_capacity(value.len() - 2);
    let mut chars = value[1..value.len() - 1].chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                result.push(next);
            }
        } else {
            result.push(ch);
        }
    }
    result
}

/// Checks if a string needs encoding per RFC 2231.
fn needs_encoding(s: &str) -> bool {
    s.chars().any(|ch| (ch < ' ' || ch > '~') && ch != '\t')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_parse_media_type_simple() {
        let (media_type, params) = parse_media_type("Text/HTML").unwrap();
        assert_eq!(media_type, "text/html");
        assert!(params.is_empty());
    }

    #[test]
    fn test_parse_media_type_keeps_order() {
        let (media_type, parsed) = parse_media_type(
            "multipart/signed; protocol=\"application/pkcs7-signature\"; \
             micalg=sha-512; boundary=xyz",
        )
        .unwrap();
        assert_eq!(media_type, "multipart/signed");
        assert_eq!(
            parsed,
            params(&[
                ("protocol", "application/pkcs7-signature"),
                ("micalg", "sha-512"),
                ("boundary", "xyz"),
            ])
        );
    }

    #[test]
    fn test_parse_media_type_quoted_semicolon() {
        let (_, parsed) = parse_media_type("multipart/mixed; boundary=\"a;b\\\"c\"").unwrap();
        assert_eq!(get_param(&parsed, "BOUNDARY"), Some("a;b\"c"));
    }

    #[test]
    fn test_parse_media_type_errors() {
        assert!(parse_media_type("").is_err());
        assert!(parse_media_type("text").is_err());
        assert!(parse_media_type("text/plain; charset").is_err());
        assert!(parse_media_type("text/plain; a=1; A=2").is_err());
    }

    #[test]
    fn test_format_media_type_with_params() {
        let formatted =
            format_media_type("text/html", &params(&[("charset", "utf-8")])).unwrap();
        assert_eq!(formatted, "text/html; charset=utf-8");
    }

    #[test]
    fn test_format_media_type_quoted() {
        let formatted =
            format_media_type("text/plain", &params(&[("name", "hello world")])).unwrap();
        assert_eq!(formatted, "text/plain; name=\"hello world\"");
    }

    #[test]
    fn test_format_media_type_invalid() {
        assert!(format_media_type("plain", &Params::new()).is_err());
        assert!(format_media_type("text/plain", &params(&[("bad key", "v")])).is_err());
    }

    #[test]
    fn test_format_param() {
        assert_eq!(format_param("boundary", "abc", false).unwrap(), "boundary=abc");
        assert_eq!(format_param("boundary", "abc", true).unwrap(), "boundary=\"abc\"");
        assert_eq!(format_param("boundary", "a=b", false).unwrap(), "boundary=\"a=b\"");
        assert_eq!(
            format_param("filename", "caf\u{e9}", false).unwrap(),
            "filename*=utf-8''caf%C3%A9"
        );
    }
}
