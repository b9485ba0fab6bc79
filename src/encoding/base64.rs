//! Incremental base64 encoder producing 76-column CRLF lines.

use super::LINE_MAX_LEN;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// A base64 encoder that can be fed a body in arbitrary chunks.
///
/// Up to two input bytes are held back between calls so every call encodes
/// whole 3-byte groups; padding is only written by [`finish`](Self::finish).
/// Lines are separated by CRLF; the last line has no terminator.
#[derive(Debug, Default)]
pub struct Base64Encoder {
    pending: Vec<u8>,
    column: usize,
}

impl Base64Encoder {
    /// Creates a new encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes a chunk, appending complete groups to `out`.
    pub fn encode(&mut self, input: &[u8], out: &mut Vec<u8>) {
        if input.is_empty() {
            return;
        }

        let mut data = std::mem::take(&mut self.pending);
        data.extend_from_slice(input);

        let whole = data.len() - data.len() % 3;
        self.pending = data.split_off(whole);
        self.emit(&data, out);
    }

    /// Encodes the held-back bytes with padding.
    pub fn finish(&mut self, out: &mut Vec<u8>) {
        let pending = std::mem::take(&mut self.pending);
        self.emit(&pending, out);
    }

    fn emit(&mut self, data: &[u8], out: &mut Vec<u8>) {
        if data.is_empty() {
            return;
        }

        let encoded = STANDARD.encode(data);
        let mut rest = encoded.as_bytes();
        while !rest.is_empty() {
            if self.column == LINE_MAX_LEN {
                out.extend_from_slice(b"\r\n");
                self.column = 0;
            }
            let take = rest.len().min(LINE_MAX_LEN - self.column);
            out.extend_from_slice(&rest[..take]);
            self.column += take;
            rest = &rest[take..];
        }
    }
}
