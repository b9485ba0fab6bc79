//! Content transfer encodings (RFC 2045).
//!
//! Encoders here are incremental: they accept the body one chunk at a time
//! and carry the few bytes of state needed between chunks, so a body never
//! has to be held in memory as a whole.

pub mod base64;
pub mod quotedprintable;

pub use self::base64::Base64Encoder;
pub use self::quotedprintable::QuotedPrintableEncoder;

use std::fmt;

/// Line length limit for encoded output, excluding CRLF.
pub const LINE_MAX_LEN: usize = 76;

/// Transfer encoding declared by a `Content-Transfer-Encoding` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit text.
    EightBit,
    /// Arbitrary bytes.
    Binary,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
}

impl TransferEncoding {
    /// Parses a header value; unknown tokens yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "7bit" => Some(Self::SevenBit),
            "8bit" => Some(Self::EightBit),
            "binary" => Some(Self::Binary),
            "base64" => Some(Self::Base64),
            "quoted-printable" => Some(Self::QuotedPrintable),
            _ => None,
        }
    }

    /// Reports whether the formatter has to encode the body for this encoding.
    pub fn is_encoding(self) -> bool {
        matches!(self, Self::Base64 | Self::QuotedPrintable)
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Binary => write!(f, "binary"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
        }
    }
}

/// Reports whether the bytes can travel unencoded through a text-oriented channel.
///
/// Control bytes other than TAB, CR and LF (and DEL) make the content unsafe.
/// Bytes above 0x7F are accepted as 8-bit text.
pub fn is_text_safe(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .all(|&b| !(b < 0x20 || b == 0x7F) || matches!(b, b'\t' | b'\r' | b'\n'))
}

/// A body encoder applied chunk by chunk.
#[derive(Debug)]
pub enum BodyEncoder {
    /// Bytes pass through unchanged.
    Identity,
    /// Base64 with 76-column lines.
    Base64(Base64Encoder),
    /// Quoted-printable with soft line breaks.
    QuotedPrintable(QuotedPrintableEncoder),
}

impl BodyEncoder {
    /// Creates the encoder for a transfer encoding.
    ///
    /// `binary_qp` makes quoted-printable escape line breaks instead of
    /// normalizing them, which is required for non-text content.
    pub fn for_encoding(encoding: TransferEncoding, binary_qp: bool) -> Self {
        match encoding {
            TransferEncoding::Base64 => Self::Base64(Base64Encoder::new()),
            TransferEncoding::QuotedPrintable => {
                let mut encoder = QuotedPrintableEncoder::new();
                encoder.binary = binary_qp;
                Self::QuotedPrintable(encoder)
            }
            _ => Self::Identity,
        }
    }

    /// Encodes one chunk of input, appending to `out`.
    pub fn encode(&mut self, input: &[u8], out: &mut Vec<u8>) {
        match self {
            Self::Identity => out.extend_from_slice(input),
            Self::Base64(encoder) => encoder.encode(input, out),
            Self::QuotedPrintable(encoder) => encoder.encode(input, out),
        }
    }

    /// Flushes any state held back at the end of the body.
    pub fn finish(&mut self, out: &mut Vec<u8>) {
        match self {
            Self::Identity => {}
            Self::Base64(encoder) => encoder.finish(out),
            Self::QuotedPrintable(encoder) => encoder.finish(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transfer_encoding() {
        assert_eq!(TransferEncoding::parse("BASE64"), Some(TransferEncoding::Base64));
        assert_eq!(
            TransferEncoding::parse(" quoted-printable "),
            Some(TransferEncoding::QuotedPrintable)
        );
        assert_eq!(TransferEncoding::parse("7bit"), Some(TransferEncoding::SevenBit));
        assert_eq!(TransferEncoding::parse("x-uuencode"), None);
        assert_eq!(TransferEncoding::Base64.to_string(), "base64");
        assert!(TransferEncoding::QuotedPrintable.is_encoding());
        assert!(!TransferEncoding::Binary.is_encoding());
    }

    #[test]
    fn test_is_text_safe() {
        assert!(is_text_safe(b"plain text\r\n\twith tabs"));
        assert!(is_text_safe("utf-8 caf\u{e9}".as_bytes()));
        assert!(is_text_safe(b""));
        assert!(!is_text_safe(b"nul\x00byte"));
        assert!(!is_text_safe(b"escape\x1b[0m"));
        assert!(!is_text_safe(b"del\x7f"));
    }

    #[test]
    fn test_identity_encoder() {
        let mut encoder = BodyEncoder::for_encoding(TransferEncoding::Binary, false);
        let mut out = Vec::new();
        encoder.encode(b"\x00\x01", &mut out);
        encoder.finish(&mut out);
        assert_eq!(out, b"\x00\x01");
    }
}
