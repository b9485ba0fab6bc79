//! MIME headers and the functions that query header lists.

use crate::error::{Error, Result};
use crate::grammar::is_header_name;
use crate::media_type::split_params;
use std::collections::HashMap;
use std::fmt;

/// An immutable header: a name, a value and the `;`-separated comments that follow it.
///
/// `Content-Type: multipart/mixed; boundary=abc` is the header named
/// `Content-Type` with value `multipart/mixed` and the comment `boundary=abc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    name: String,
    value: String,
    comments: Vec<String>,
}

impl Header {
    /// Creates a header without comments.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_mime_entity::Header;
    ///
    /// let header = Header::new("Content-Type", "text/plain").unwrap();
    /// assert!(header.is("content-type"));
    /// assert!(Header::new("", "text/plain").is_err());
    /// ```
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        Self::with_comments(name, value, Vec::<String>::new())
    }

    /// Creates a header with comments.
    ///
    /// Fails with [`Error::InvalidArgument`] when the name is empty or contains
    /// characters outside printable ASCII, spaces or a colon.
    pub fn with_comments<I, S>(
        name: impl Into<String>,
        value: impl Into<String>,
        comments: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidArgument("header name must not be empty".to_string()));
        }
        if !is_header_name(&name) {
            return Err(Error::InvalidArgument(format!("invalid header name {:?}", name)));
        }

        Ok(Self {
            name,
            value: value.into(),
            comments: comments.into_iter().map(Into::into).collect(),
        })
    }

    /// Parses a raw `Name: value; comment; comment` line.
    ///
    /// Semicolons inside quoted strings do not start a new comment.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (name, rest) = line
            .split_once(':')
            .ok_or_else(|| Error::InvalidArgument(format!("missing colon in header {:?}", line)))?;

        let mut segments = split_params(rest).into_iter().map(str::trim);
        let value = segments.next().unwrap_or_default();
        let comments: Vec<&str> = segments.filter(|s| !s.is_empty()).collect();

        Self::with_comments(name.trim(), value, comments)
    }

    /// Builds a header whose name is known to be valid.
    pub(crate) fn known(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            comments: Vec::new(),
        }
    }

    /// Returns the header name as supplied.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the header value without comments.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the comments in order.
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Reports whether this header has the given name, ignoring ASCII case.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Returns the value followed by each comment as `"; " + comment`.
    pub fn full_value(&self) -> String {
        let mut full = self.value.clone();
        for comment in &self.comments {
            full.push_str("; ");
            full.push_str(comment);
        }
        full
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.full_value())
    }
}

/// Returns all headers with the given name, in their original order.
///
/// # Examples
///
/// ```
/// use tokio_mime_entity::{get_headers, Header};
///
/// let headers = vec![
///     Header::new("Received", "a").unwrap(),
///     Header::new("Subject", "hi").unwrap(),
///     Header::new("received", "b").unwrap(),
/// ];
/// let received = get_headers("RECEIVED", &headers);
/// assert_eq!(received.len(), 2);
/// assert_eq!(received[1].value(), "b");
/// ```
pub fn get_headers<'h>(name: &str, headers: &'h [Header]) -> Vec<&'h Header> {
    headers.iter().filter(|h| h.is(name)).collect()
}

/// Returns the first header with the given name.
pub fn get_header<'h>(name: &str, headers: &'h [Header]) -> Option<&'h Header> {
    headers.iter().find(|h| h.is(name))
}

/// Returns the value of a header followed by its comments.
pub fn get_full_header_value(header: &Header) -> String {
    header.full_value()
}

/// Extracts cookies from `Cookie` and `Set-Cookie` headers.
///
/// A `Cookie` header contributes every `name=value` pair, a `Set-Cookie`
/// header only its first pair (the rest are attributes). When a name repeats
/// the first occurrence wins.
pub fn get_cookies(headers: &[Header]) -> HashMap<String, String> {
    let mut cookies = HashMap::new();

    for header in headers {
        let pairs = if header.is("Cookie") {
            split_params(&header.full_value())
                .into_iter()
                .map(str::to_string)
                .collect::<Vec<_>>()
        } else if header.is("Set-Cookie") {
            split_params(&header.full_value())
                .into_iter()
                .take(1)
                .map(str::to_string)
                .collect()
        } else {
            continue;
        };

        for pair in pairs {
            if let Some((name, value)) = pair.split_once('=') {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                cookies
                    .entry(name.to_string())
                    .or_insert_with(|| value.trim().trim_matches('"').to_string());
            }
        }
    }

    cookies
}

/// Returns the full value of the first `User-Agent` header.
pub fn get_user_agent(headers: &[Header]) -> Option<String> {
    get_header("User-Agent", headers).map(Header::full_value)
}

/// Writes a header block: one CRLF-terminated line per header and a blank line.
pub(crate) fn write_header_block<'h, I>(headers: I, out: &mut Vec<u8>)
where
    I: IntoIterator<Item = &'h Header>,
{
    for header in headers {
        out.extend_from_slice(header.name.as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(header.value.as_bytes());
        for comment in &header.comments {
            out.extend_from_slice(b"; ");
            out.extend_from_slice(comment.as_bytes());
        }
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(name: &str, value: &str) -> Header {
        Header::new(name, value).unwrap()
    }

    #[test]
    fn test_new_rejects_empty_name() {
        assert!(matches!(Header::new("", "x"), Err(Error::InvalidArgument(_))));
        assert!(matches!(Header::new("  ", "x"), Err(Error::InvalidArgument(_))));
        assert!(Header::new("X-Empty", "").is_ok());
    }

    #[test]
    fn test_new_rejects_invalid_name() {
        assert!(matches!(Header::new("Bad Name", "x"), Err(Error::InvalidArgument(_))));
        assert!(matches!(Header::new("Bad:Name", "x"), Err(Error::InvalidArgument(_))));
        assert!(matches!(Header::new("Caf\u{e9}", "x"), Err(Error::InvalidArgument(_))));
        assert!(matches!(Header::parse("Bad Name: x"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_full_value() {
        let h = Header::with_comments(
            "Content-Type",
            "text/plain",
            ["charset=utf-8", "format=flowed"],
        )
        .unwrap();
        assert_eq!(h.full_value(), "text/plain; charset=utf-8; format=flowed");
        assert_eq!(get_full_header_value(&h), h.full_value());
        assert_eq!(h.to_string(), "Content-Type: text/plain; charset=utf-8; format=flowed");
    }

    #[test]
    fn test_parse() {
        let h = Header::parse("Content-Type: multipart/mixed; boundary=\"a;b\"\r\n").unwrap();
        assert_eq!(h.name(), "Content-Type");
        assert_eq!(h.value(), "multipart/mixed");
        assert_eq!(h.comments(), &["boundary=\"a;b\"".to_string()]);

        let h = Header::parse("Subject:").unwrap();
        assert_eq!(h.value(), "");

        assert!(Header::parse("no colon here").is_err());
        assert!(Header::parse(": value").is_err());
    }

    #[test]
    fn test_get_headers() {
        let headers = vec![header("A", "1"), header("b", "2"), header("a", "3")];
        let found = get_headers("a", &headers);
        assert_eq!(found.iter().map(|h| h.value()).collect::<Vec<_>>(), vec!["1", "3"]);
        assert!(get_headers("missing", &headers).is_empty());
        assert_eq!(get_header("B", &headers).map(Header::value), Some("2"));
    }

    #[test]
    fn test_get_cookies_first_wins() {
        let headers = vec![
            header("Cookie", "a=1"),
            header("Cookie", "a=2"),
            header("Cookie", "b=3"),
        ];
        let cookies = get_cookies(&headers);
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies["a"], "1");
        assert_eq!(cookies["b"], "3");
    }

    #[test]
    fn test_get_cookies_pairs_and_attributes() {
        let headers = vec![
            Header::parse("Cookie: session=abc; theme=dark").unwrap(),
            Header::parse("Set-Cookie: token=\"xyz\"; Path=/; HttpOnly").unwrap(),
            header("X-Other", "ignored=1"),
        ];
        let cookies = get_cookies(&headers);
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies["session"], "abc");
        assert_eq!(cookies["theme"], "dark");
        assert_eq!(cookies["token"], "xyz");
        assert!(!cookies.contains_key("Path"));
    }

    #[test]
    fn test_get_user_agent() {
        let headers = vec![Header::with_comments(
            "User-Agent",
            "Mozilla/5.0",
            ["X11", "Linux x86_64"],
        )
        .unwrap()];
        assert_eq!(get_user_agent(&headers).as_deref(), Some("Mozilla/5.0; X11; Linux x86_64"));
        assert_eq!(get_user_agent(&[]), None);
    }

    #[test]
    fn test_write_header_block() {
        let headers = vec![
            header("Content-Type", "text/plain"),
            Header::with_comments("Content-Disposition", "attachment", ["filename=a.txt"]).unwrap(),
        ];
        let mut out = Vec::new();
        write_header_block(&headers, &mut out);
        assert_eq!(
            out,
            b"Content-Type: text/plain\r\nContent-Disposition: attachment; filename=a.txt\r\n\r\n"
        );
    }
}
