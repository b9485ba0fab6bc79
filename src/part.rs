//! The MIME entity tree.
//!
//! A [`Part`] is one of three variants: an [`EmptyPart`] carrying headers
//! only, a [`ContentPart`] carrying headers and a body source, or a
//! [`MultiPart`] carrying headers and ordered children separated by a
//! boundary. Children are owned by their parent.

use crate::error::{Error, Result};
use crate::grammar::validate_boundary;
use crate::header::{get_header, Header};
use crate::media_type::{format_param, get_param, parse_media_type, split_params};
use bytes::Bytes;
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use tokio::io::AsyncRead;
use uuid::Uuid;

/// A readable body handed out by a [`ContentPart`].
pub type BodyReader = Box<dyn AsyncRead + Send + Unpin>;

/// A node in the MIME entity tree.
#[derive(Debug)]
pub enum Part {
    /// Headers only.
    Empty(EmptyPart),
    /// Headers and a body.
    Content(ContentPart),
    /// Headers and child parts.
    Multi(MultiPart),
}

/// A part without a body.
#[derive(Debug, Default)]
pub struct EmptyPart {
    headers: Vec<Header>,
}

/// A part with a body backed by a buffer or a stream.
#[derive(Debug)]
pub struct ContentPart {
    headers: Vec<Header>,
    body: Body,
}

/// A part containing child parts.
#[derive(Debug)]
pub struct MultiPart {
    headers: Vec<Header>,
    children: Vec<Part>,
    boundary: String,
}

enum Body {
    Buffer(Bytes),
    Stream(Option<BodyReader>),
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffer(bytes) => f.debug_tuple("Buffer").field(&bytes.len()).finish(),
            Self::Stream(Some(_)) => f.write_str("Stream"),
            Self::Stream(None) => f.write_str("Stream(consumed)"),
        }
    }
}

impl Part {
    /// Creates a part without a body.
    pub fn empty(headers: Vec<Header>) -> Self {
        let mut part = EmptyPart::default();
        replace_headers(&mut part.headers, headers);
        Self::Empty(part)
    }

    /// Creates a content part over a stream. The stream is not read until formatting.
    ///
    /// The body can be read once; the part is not reopenable.
    pub fn content<R>(body: R, headers: Vec<Header>) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let mut part = ContentPart {
            headers: Vec::new(),
            body: Body::Stream(Some(Box::new(body))),
        };
        replace_headers(&mut part.headers, headers);
        Self::Content(part)
    }

    /// Creates a reopenable content part over an in-memory buffer.
    ///
    /// Any `Content-Length` among `headers` is discarded and replaced by the
    /// actual buffer length.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_mime_entity::{Header, Part};
    ///
    /// let part = Part::bytes("hello", vec![Header::new("Content-Length", "999").unwrap()]);
    /// let length = part.get_header(&["Content-Length"]);
    /// assert_eq!(length.len(), 1);
    /// assert_eq!(length[0].value(), "5");
    /// ```
    pub fn bytes(content: impl Into<Bytes>, headers: Vec<Header>) -> Self {
        let content = content.into();
        let mut part = ContentPart {
            headers: Vec::new(),
            body: Body::Buffer(content),
        };
        replace_headers(&mut part.headers, headers);
        part.sync_content_length();
        Self::Content(part)
    }

    /// Creates a content part streaming a file from disk.
    pub async fn file(path: impl AsRef<Path>, headers: Vec<Header>) -> Result<Self> {
        let file = tokio::fs::File::open(path.as_ref()).await?;
        Ok(Self::content(file, headers))
    }

    /// Creates a multipart with the given children, kept in order.
    ///
    /// The boundary is taken from a `boundary` parameter of the `Content-Type`
    /// header when present, and generated otherwise.
    pub fn multi(children: Vec<Part>, headers: Vec<Header>) -> Self {
        let mut part = MultiPart {
            headers: Vec::new(),
            children,
            boundary: generate_boundary(),
        };
        replace_headers(&mut part.headers, headers);
        Self::Multi(part)
    }

    /// Returns the headers in order.
    pub fn headers(&self) -> &[Header] {
        match self {
            Self::Empty(p) => &p.headers,
            Self::Content(p) => &p.headers,
            Self::Multi(p) => &p.headers,
        }
    }

    fn headers_mut(&mut self) -> &mut Vec<Header> {
        match self {
            Self::Empty(p) => &mut p.headers,
            Self::Content(p) => &mut p.headers,
            Self::Multi(p) => &mut p.headers,
        }
    }

    /// Replaces every header sharing a name with one of `headers`, then appends `headers`.
    ///
    /// Returns the resulting header list. Empty input leaves the part untouched.
    pub fn set_header<I>(&mut self, headers: I) -> &[Header]
    where
        I: IntoIterator<Item = Header>,
    {
        replace_headers(self.headers_mut(), headers.into_iter().collect());
        if let Self::Content(part) = self {
            part.sync_content_length();
        }
        self.headers()
    }

    /// Removes every header matching one of `names`, ignoring case.
    ///
    /// Returns the resulting header list.
    pub fn remove_header<S: AsRef<str>>(&mut self, names: &[S]) -> &[Header] {
        self.headers_mut()
            .retain(|h| !names.iter().any(|name| h.is(name.as_ref())));
        if let Self::Content(part) = self {
            part.sync_content_length();
        }
        self.headers()
    }

    /// Returns, for each name in order, all matching headers.
    pub fn get_header<S: AsRef<str>>(&self, names: &[S]) -> Vec<&Header> {
        names
            .iter()
            .flat_map(|name| self.headers().iter().filter(move |h| h.is(name.as_ref())))
            .collect()
    }

    /// Reports whether this part is a multipart.
    pub fn has_children(&self) -> bool {
        matches!(self, Self::Multi(_))
    }

    /// Reports whether this part carries a body.
    pub fn has_content(&self) -> bool {
        matches!(self, Self::Content(_))
    }

    /// Returns the children of a multipart.
    pub fn children(&self) -> Option<&[Part]> {
        match self {
            Self::Multi(p) => Some(&p.children),
            _ => None,
        }
    }

    /// Opens a reader over the body of a content part.
    ///
    /// Returns `None` for parts without a body. A stream body can only be
    /// opened once; later calls fail with [`Error::BodyConsumed`].
    pub fn content_reader(&mut self) -> Result<Option<BodyReader>> {
        match self {
            Self::Content(p) => p.open().map(Some),
            _ => Ok(None),
        }
    }
}

impl ContentPart {
    /// Returns the headers in order.
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// Reports whether the body can be read more than once.
    pub fn is_reopenable(&self) -> bool {
        matches!(self.body, Body::Buffer(_))
    }

    /// Returns the body when it is held in memory.
    pub fn buffer(&self) -> Option<&Bytes> {
        match &self.body {
            Body::Buffer(bytes) => Some(bytes),
            Body::Stream(_) => None,
        }
    }

    /// Opens a reader over the body.
    ///
    /// Buffers are reopened from the start on every call; a stream is handed
    /// out once and released when the returned reader is dropped.
    pub fn open(&mut self) -> Result<BodyReader> {
        match &mut self.body {
            Body::Buffer(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            Body::Stream(stream) => stream.take().ok_or(Error::BodyConsumed),
        }
    }

    fn sync_content_length(&mut self) {
        if let Body::Buffer(bytes) = &self.body {
            let length = bytes.len().to_string();
            self.headers.retain(|h| !h.is("Content-Length"));
            self.headers.push(Header::known("Content-Length", length));
        }
    }
}

impl EmptyPart {
    /// Returns the headers in order.
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }
}

impl MultiPart {
    /// Returns the headers in order.
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// Returns the children in order.
    pub fn children(&self) -> &[Part] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut [Part] {
        &mut self.children
    }

    /// Appends a child after the existing ones.
    pub fn push(&mut self, child: Part) {
        self.children.push(child);
    }

    /// Returns the boundary used when formatting.
    ///
    /// A `boundary` parameter on the `Content-Type` header takes precedence
    /// over the generated one.
    pub fn boundary(&self) -> String {
        get_header("Content-Type", &self.headers)
            .and_then(|h| parse_media_type(&h.full_value()).ok())
            .and_then(|(_, params)| get_param(&params, "boundary").map(str::to_string))
            .unwrap_or_else(|| self.boundary.clone())
    }

    /// Sets the boundary, validating it against RFC 2046.
    ///
    /// A `boundary` parameter already present on the `Content-Type` header is
    /// rewritten so the header and the delimiters stay in step.
    pub fn set_boundary(&mut self, boundary: impl Into<String>) -> Result<()> {
        let boundary = boundary.into();
        validate_boundary(&boundary)?;

        if let Some(index) = self.headers.iter().position(|h| h.is("Content-Type")) {
            let name = self.headers[index].name().to_string();
            let full = self.headers[index].full_value();
            let mut segments = split_params(&full).into_iter().map(str::trim);
            let value = segments.next().unwrap_or_default().to_string();
            let mut replaced = false;
            let comments: Vec<String> = segments
                .filter(|s| !s.is_empty())
                .map(|segment| match segment.split_once('=') {
                    Some((key, _)) if key.trim().eq_ignore_ascii_case("boundary") => {
                        replaced = true;
                        format_param("boundary", &boundary, false)
                    }
                    _ => Ok(segment.to_string()),
                })
                .collect::<Result<_>>()?;

            if replaced {
                self.headers[index] = Header::with_comments(name, value, comments)?;
            }
        }

        self.boundary = boundary;
        Ok(())
    }
}

/// Removes headers named like any of `headers`, then appends `headers`.
fn replace_headers(existing: &mut Vec<Header>, headers: Vec<Header>) {
    if headers.is_empty() {
        return;
    }
    existing.retain(|h| !headers.iter().any(|new| new.is(h.name())));
    existing.extend(headers);
}

/// Generates a random boundary string.
pub(crate) fn generate_boundary() -> String {
    format!("mime-part-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    fn header(name: &str, value: &str) -> Header {
        Header::new(name, value).unwrap()
    }

    #[test]
    fn test_bytes_forces_content_length() {
        let part = Part::bytes(
            &b"abcdef"[..],
            vec![header("Content-Length", "999"), header("Content-Type", "text/plain")],
        );
        let lengths = part.get_header(&["content-length"]);
        assert_eq!(lengths.len(), 1);
        assert_eq!(lengths[0].value(), "6");
        assert!(part.has_content());
        assert!(!part.has_children());
    }

    #[test]
    fn test_set_header_after_bytes_keeps_length() {
        let mut part = Part::bytes("abc", Vec::new());
        part.set_header([header("Content-Length", "1")]);
        assert_eq!(part.get_header(&["Content-Length"])[0].value(), "3");
    }

    #[test]
    fn test_set_header_replaces_by_name() {
        let mut part = Part::empty(vec![
            header("X-A", "1"),
            header("x-a", "2"),
            header("X-B", "3"),
        ]);
        let new = header("X-a", "new");
        part.set_header([new.clone()]);
        assert_eq!(part.get_header(&["X-A"]), vec![&new]);
        assert_eq!(part.headers().len(), 2);

        let before = part.headers().to_vec();
        part.set_header(Vec::new());
        assert_eq!(part.headers(), &before[..]);
    }

    #[test]
    fn test_remove_header() {
        let mut part = Part::empty(vec![
            header("X-A", "1"),
            header("X-B", "2"),
            header("x-c", "3"),
        ]);
        let remaining = part.remove_header(&["x-a", "X-C"]);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name(), "X-B");
    }

    #[test]
    fn test_get_header_concatenates_in_name_order() {
        let part = Part::empty(vec![header("A", "1"), header("B", "2"), header("A", "3")]);
        let values: Vec<&str> = part.get_header(&["B", "A"]).iter().map(|h| h.value()).collect();
        assert_eq!(values, vec!["2", "1", "3"]);
        assert!(part.get_header::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_variant_queries() {
        let multi = Part::multi(vec![Part::empty(Vec::new())], Vec::new());
        assert!(multi.has_children());
        assert!(!multi.has_content());
        assert_eq!(multi.children().map(<[Part]>::len), Some(1));

        let empty = Part::empty(Vec::new());
        assert!(!empty.has_children());
        assert!(!empty.has_content());
        assert!(empty.children().is_none());
    }

    #[test]
    fn test_multi_boundary_from_header() {
        let part = Part::multi(
            Vec::new(),
            vec![Header::with_comments(
                "Content-Type",
                "multipart/mixed",
                ["boundary=\"given\""],
            )
            .unwrap()],
        );
        match part {
            Part::Multi(multi) => assert_eq!(multi.boundary(), "given"),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_generated_boundaries_differ() {
        let a = generate_boundary();
        let b = generate_boundary();
        assert_ne!(a, b);
        assert!(validate_boundary(&a).is_ok());
    }

    #[test]
    fn test_set_boundary_rewrites_header() {
        let mut part = Part::multi(
            Vec::new(),
            vec![Header::with_comments(
                "Content-Type",
                "multipart/mixed",
                ["charset=x", "boundary=old"],
            )
            .unwrap()],
        );
        let Part::Multi(multi) = &mut part else { unreachable!() };
        multi.set_boundary("fresh").unwrap();
        assert_eq!(multi.boundary(), "fresh");
        assert_eq!(
            multi.headers()[0].full_value(),
            "multipart/mixed; charset=x; boundary=fresh"
        );
        assert!(multi.set_boundary("bad;boundary").is_err());
    }

    #[tokio::test]
    async fn test_buffer_is_reopenable() {
        let mut part = Part::bytes("again", Vec::new());
        for _ in 0..2 {
            let mut reader = part.content_reader().unwrap().unwrap();
            let mut body = String::new();
            reader.read_to_string(&mut body).await.unwrap();
            assert_eq!(body, "again");
        }
    }

    #[tokio::test]
    async fn test_stream_is_single_pass() {
        let mut part = Part::content(&b"once"[..], Vec::new());
        let Part::Content(content) = &part else { unreachable!() };
        assert!(!content.is_reopenable());

        let mut reader = part.content_reader().unwrap().unwrap();
        let mut body = Vec::new();
        reader.read_to_end(&mut body).await.unwrap();
        assert_eq!(body, b"once");

        assert!(matches!(part.content_reader(), Err(Error::BodyConsumed)));
        assert!(Part::empty(Vec::new()).content_reader().unwrap().is_none());
    }
}
