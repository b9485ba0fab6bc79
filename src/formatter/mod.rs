//! Streaming MIME formatter.
//!
//! Serializes a [`Part`] tree into the RFC 2045/2046 wire format. The
//! output is produced on demand by a [`MimeStream`]: each pull computes the
//! next chunk, reading at most `chunk_size` bytes from a body source, so a
//! message of any size can be forwarded without being held in memory.
//!
//! A boundary that would occur at the start of a line inside the content it
//! delimits is an error. The formatter never renames a boundary, since the
//! caller may already have published it in a `Content-Type` header.

mod guard;
mod stream;

pub use stream::{MimeReader, MimeStream};

use crate::encoding::{is_text_safe, BodyEncoder, TransferEncoding};
use crate::error::{Error, Result};
use crate::grammar::{boundary_needs_quoting, is_header_value, validate_boundary};
use crate::header::{get_header, write_header_block, Header};
use crate::media_type::{format_media_type, format_param, parse_media_type};
use crate::part::{ContentPart, MultiPart, Part};
use guard::LineGuard;

/// Default number of body bytes read per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Options controlling serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    /// Emit bodies verbatim even when they are not text-safe.
    pub allow_binary: bool,
    /// Maximum number of body bytes read from a source per chunk.
    pub chunk_size: usize,
    /// Always quote the boundary parameter of multipart `Content-Type` headers.
    pub quote_boundary: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            allow_binary: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            quote_boundary: false,
        }
    }
}

/// Builds [`MimeStream`]s for part trees.
///
/// # Examples
///
/// ```
/// use tokio_mime_entity::{Formatter, Header, Part};
///
/// # async fn example() -> tokio_mime_entity::Result<()> {
/// let mut part = Part::bytes("Hello", vec![Header::new("Content-Type", "text/plain")?]);
/// let output = Formatter::new().format(&mut part)?.to_vec().await?;
/// assert_eq!(output, b"Content-Type: text/plain\r\nContent-Length: 5\r\n\r\nHello");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    options: FormatOptions,
}

impl Formatter {
    /// Creates a formatter with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a formatter from explicit options.
    pub fn with_options(options: FormatOptions) -> Self {
        Self { options }
    }

    /// Sets whether non-text bodies may be emitted unencoded (default `true`).
    pub fn allow_binary(mut self, allow_binary: bool) -> Self {
        self.options.allow_binary = allow_binary;
        self
    }

    /// Sets how many body bytes are read per chunk (default 8192).
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.options.chunk_size = chunk_size;
        self
    }

    /// Sets whether boundaries are always quoted (default `false`).
    ///
    /// Boundaries containing characters outside the token set are quoted
    /// regardless of this setting.
    pub fn quote_boundary(mut self, quote_boundary: bool) -> Self {
        self.options.quote_boundary = quote_boundary;
        self
    }

    /// Returns the current options.
    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    /// Starts formatting a part tree.
    ///
    /// The tree is borrowed mutably for the whole pass, so it cannot change
    /// while output is being produced. Structural problems (invalid header
    /// values, invalid or nested-colliding boundaries, in-memory bodies whose
    /// encoded form contains a delimiter line) are reported here before any
    /// output exists; collisions inside streamed bodies are reported by the
    /// chunk that would contain them.
    pub fn format<'a>(&self, part: &'a mut Part) -> Result<MimeStream<'a>> {
        if self.options.chunk_size == 0 {
            return Err(Error::InvalidArgument("chunk size must be positive".to_string()));
        }

        validate(part, &self.options, &mut Vec::new())?;
        tracing::debug!(
            allow_binary = self.options.allow_binary,
            chunk_size = self.options.chunk_size,
            quote_boundary = self.options.quote_boundary,
            "formatting part tree"
        );
        Ok(MimeStream::new(part, self.options))
    }
}

/// Checks a subtree before any output is produced.
fn validate(part: &Part, options: &FormatOptions, ancestors: &mut Vec<String>) -> Result<()> {
    for header in part.headers() {
        if !is_header_value(&header.full_value()) {
            return Err(Error::Format(format!(
                "invalid line break in value of header {:?}",
                header.name()
            )));
        }
    }

    let mut guards: Vec<LineGuard> = ancestors.iter().map(|b| LineGuard::new(b)).collect();
    let check = |guards: &mut Vec<LineGuard>, bytes: &[u8]| -> Result<()> {
        for (guard, boundary) in guards.iter_mut().zip(ancestors.iter()) {
            if guard.scan(bytes) {
                return Err(collision(boundary));
            }
        }
        Ok(())
    };

    match part {
        Part::Empty(_) => {
            let mut block = Vec::new();
            write_header_block(part.headers(), &mut block);
            check(&mut guards, &block)
        }
        Part::Content(content) => {
            let (block, mut encoder) = content_header_block(content, options)?;
            check(&mut guards, &block)?;
            match (&mut encoder, content.buffer()) {
                (BodyEncoder::Identity, Some(body)) => check(&mut guards, &body[..]),
                (encoder, Some(body)) => {
                    let mut encoded = Vec::new();
                    encoder.encode(body, &mut encoded);
                    encoder.finish(&mut encoded);
                    check(&mut guards, &encoded)
                }
                (_, None) => Ok(()),
            }
        }
        Part::Multi(multi) => {
            let (boundary, block) = multipart_header_block(multi, options)?;
            check(&mut guards, &block)?;

            // The closing line `--B--` must not read as an enclosing delimiter either
            let terminator = format!("{}--", boundary);
            if let Some(outer) = ancestors
                .iter()
                .find(|outer| terminator.starts_with(outer.as_str()))
            {
                return Err(Error::Format(format!(
                    "boundary {:?} collides with enclosing boundary {:?}",
                    boundary, outer
                )));
            }

            ancestors.push(boundary);
            let result = multi
                .children()
                .iter()
                .try_for_each(|child| validate(child, options, ancestors));
            ancestors.pop();
            result
        }
    }
}

/// Error for a delimiter found inside delimited content.
pub(crate) fn collision(boundary: &str) -> Error {
    Error::Format(format!(
        "boundary {:?} occurs at the start of a line inside the content it delimits",
        boundary
    ))
}

/// Decides how a content part's body goes on the wire and renders its header block.
///
/// A declared base64 or quoted-printable transfer encoding means the body is
/// stored decoded and must be encoded here. Otherwise the body is emitted as
/// is, unless binary output is disallowed and the body is not known to be
/// text-safe, in which case it is base64-encoded and the emitted
/// `Content-Transfer-Encoding` says so. `Content-Length` is dropped from the
/// output whenever the formatter encodes, as it no longer matches.
pub(crate) fn content_header_block(
    part: &ContentPart,
    options: &FormatOptions,
) -> Result<(Vec<u8>, BodyEncoder)> {
    let headers = part.headers();
    let declared = get_header("Content-Transfer-Encoding", headers)
        .map(|h| TransferEncoding::parse(h.value()));

    let (encoding, rewrite) = match declared {
        Some(Some(encoding)) if encoding.is_encoding() => (Some(encoding), false),
        _ if options.allow_binary => (None, false),
        _ => match part.buffer() {
            Some(body) if is_text_safe(body) => (None, false),
            Some(_) => (Some(TransferEncoding::Base64), true),
            // Streams cannot be scanned: 7bit and unknown tokens are taken at their word
            None if matches!(declared, Some(Some(TransferEncoding::SevenBit)) | Some(None)) => {
                (None, false)
            }
            None => (Some(TransferEncoding::Base64), true),
        },
    };

    let mut block = Vec::new();
    let encoder = match encoding {
        None => {
            write_header_block(headers, &mut block);
            BodyEncoder::Identity
        }
        Some(encoding) => {
            let binary_qp = get_header("Content-Type", headers)
                .map(|h| !h.value().trim().to_ascii_lowercase().starts_with("text/"))
                .unwrap_or(false);
            tracing::debug!(%encoding, rewrite, "encoding content body");

            let mut emitted: Vec<Header> = headers
                .iter()
                .filter(|h| {
                    !h.is("Content-Length") && !(rewrite && h.is("Content-Transfer-Encoding"))
                })
                .cloned()
                .collect();
            if rewrite {
                emitted.push(Header::known("Content-Transfer-Encoding", encoding.to_string()));
            }
            write_header_block(&emitted, &mut block);
            BodyEncoder::for_encoding(encoding, binary_qp)
        }
    };

    Ok((block, encoder))
}

/// Renders a multipart's header block with the boundary parameter in place.
///
/// Returns the boundary and the block. The first `Content-Type` header must
/// be a `multipart/*` type; when there is none, `multipart/mixed` is added.
pub(crate) fn multipart_header_block(
    part: &MultiPart,
    options: &FormatOptions,
) -> Result<(String, Vec<u8>)> {
    let boundary = part.boundary();
    validate_boundary(&boundary).map_err(|e| Error::Format(e.to_string()))?;

    let quote = options.quote_boundary || boundary_needs_quoting(&boundary);
    let boundary_param = format_param("boundary", &boundary, quote)?;

    let mut headers = Vec::with_capacity(part.headers().len() + 1);
    let mut has_content_type = false;
    for header in part.headers() {
        if has_content_type || !header.is("Content-Type") {
            headers.push(header.clone());
            continue;
        }
        has_content_type = true;

        let invalid = |e: Error| Error::Format(format!("invalid multipart Content-Type: {}", e));
        let (media_type, params) = parse_media_type(&header.full_value()).map_err(invalid)?;
        if !media_type.starts_with("multipart/") {
            return Err(Error::Format(format!(
                "multipart declared with Content-Type {:?}",
                media_type
            )));
        }
        let params = params
            .into_iter()
            .filter(|(key, _)| key != "boundary")
            .collect();
        let value = format_media_type(&media_type, &params).map_err(invalid)?;
        headers.push(Header::with_comments(header.name(), value, [boundary_param.clone()])?);
    }

    if !has_content_type {
        headers.push(Header::with_comments(
            "Content-Type",
            "multipart/mixed",
            [boundary_param],
        )?);
    }

    let mut block = Vec::new();
    write_header_block(&headers, &mut block);
    Ok((boundary, block))
}
