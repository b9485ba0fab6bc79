//! Incremental quoted-printable encoder.
//!
//! Implements RFC 2045 quoted-printable encoding over chunked input.

use super::LINE_MAX_LEN;

const UPPER_HEX: &[u8] = b"0123456789ABCDEF";

/// A quoted-printable encoder that can be fed a body in arbitrary chunks.
///
/// Whitespace is held back until the next byte shows whether it ends a line,
/// because trailing whitespace has to be encoded.
#[derive(Debug, Default)]
pub struct QuotedPrintableEncoder {
    /// Binary mode treats input as pure binary (line breaks are encoded too).
    pub binary: bool,
    line_len: usize,
    pending_ws: Option<u8>,
    pending_cr: bool,
}

impl QuotedPrintableEncoder {
    /// Creates a new text-mode encoder.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_mime_entity::encoding::QuotedPrintableEncoder;
    ///
    /// let mut encoder = QuotedPrintableEncoder::new();
    /// let mut out = Vec::new();
    /// encoder.encode(b"a=b ", &mut out);
    /// encoder.finish(&mut out);
    /// assert_eq!(out, b"a=3Db=20");
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes a chunk, appending to `out`.
    pub fn encode(&mut self, input: &[u8], out: &mut Vec<u8>) {
        for &b in input {
            if !self.binary && (b == b'\r' || b == b'\n') {
                // CRLF, lone CR and lone LF all become one hard line break
                if b == b'\n' && self.pending_cr {
                    self.pending_cr = false;
                    continue;
                }
                self.pending_cr = b == b'\r';
                self.flush_whitespace(out, true);
                out.extend_from_slice(b"\r\n");
                self.line_len = 0;
                continue;
            }
            self.pending_cr = false;

            if is_whitespace(b) {
                self.flush_whitespace(out, false);
                self.pending_ws = Some(b);
            } else {
                self.flush_whitespace(out, false);
                if (b'!'..=b'~').contains(&b) && b != b'=' {
                    self.put(&[b], out);
                } else {
                    self.put(&escape(b), out);
                }
            }
        }
    }

    /// Writes any held-back whitespace, encoded since it ends the body.
    pub fn finish(&mut self, out: &mut Vec<u8>) {
        self.flush_whitespace(out, true);
    }

    fn flush_whitespace(&mut self, out: &mut Vec<u8>, at_line_end: bool) {
        if let Some(ws) = self.pending_ws.take() {
            if at_line_end {
                self.put(&escape(ws), out);
            } else {
                self.put(&[ws], out);
            }
        }
    }

    /// Appends encoded bytes, inserting a soft line break when the line would overflow.
    fn put(&mut self, bytes: &[u8], out: &mut Vec<u8>) {
        if self.line_len + bytes.len() > LINE_MAX_LEN - 1 {
            out.extend_from_slice(b"=\r\n");
            self.line_len = 0;
        }
        out.extend_from_slice(bytes);
        self.line_len += bytes.len();
    }
}

fn escape(b: u8) -> [u8; 3] {
    [b'=', UPPER_HEX[(b >> 4) as usize], UPPER_HEX[(b & 0x0F) as usize]]
}

/// Checks if a byte is whitespace (space or tab).
fn is_whitespace(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(input: &[u8], binary: bool) -> Vec<u8> {
        let mut encoder = QuotedPrintableEncoder::new();
        encoder.binary = binary;
        let mut out = Vec::new();
        encoder.encode(input, &mut out);
        encoder.finish(&mut out);
        out
    }

    #[test]
    fn test_encode_simple() {
        assert_eq!(encode(b"Hello World", false), b"Hello World");
    }

    #[test]
    fn test_encode_special_chars() {
        assert_eq!(encode(b"test=test", false), b"test=3Dtest");
        assert_eq!(encode("caf\u{e9}".as_bytes(), false), b"caf=C3=A9");
    }

    #[test]
    fn test_encode_with_newlines() {
        assert_eq!(encode(b"Line1\r\nLine2\nLine3", false), b"Line1\r\nLine2\r\nLine3");
    }

    #[test]
    fn test_trailing_whitespace() {
        assert_eq!(encode(b"end \r\nnext\t", false), b"end=20\r\nnext=09");
        assert_eq!(encode(b"two  spaces", false), b"two  spaces");
    }

    #[test]
    fn test_binary_mode() {
        assert_eq!(encode(b"\r\n", true), b"=0D=0A");
    }

    #[test]
    fn test_soft_line_breaks() {
        let out = encode(&[b'a'; 200], false);
        let text = String::from_utf8(out).unwrap();
        for line in text.split("\r\n") {
            assert!(line.len() <= LINE_MAX_LEN);
        }
        assert_eq!(text.replace("=\r\n", ""), "a".repeat(200));
    }

    #[test]
    fn test_chunked_input_matches_whole() {
        let data = b"some text = with  trailing \r\nand more\tdata ";
        let whole = encode(data, false);

        let mut encoder = QuotedPrintableEncoder::new();
        let mut out = Vec::new();
        for chunk in data.chunks(3) {
            encoder.encode(chunk, &mut out);
        }
        encoder.finish(&mut out);
        assert_eq!(out, whole);
    }
}
