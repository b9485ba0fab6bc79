//! Detection of boundary delimiters inside serialized content.

/// Watches a byte stream for lines that begin with `--boundary`.
///
/// The scan is incremental: a delimiter split across two chunks is still
/// found. Only line starts are compared, so the state is the length of the
/// delimiter prefix matched since the last LF, or `None` once the current
/// line can no longer match.
#[derive(Debug, Clone)]
pub(crate) struct LineGuard {
    delimiter: Vec<u8>,
    matched: Option<usize>,
}

impl LineGuard {
    /// Creates a guard positioned at the start of a line.
    pub(crate) fn new(boundary: &str) -> Self {
        let mut delimiter = Vec::with_capacity(boundary.len() + 2);
        delimiter.extend_from_slice(b"--");
        delimiter.extend_from_slice(boundary.as_bytes());
        Self {
            delimiter,
            matched: Some(0),
        }
    }

    /// Marks the guard as being at the start of a line.
    pub(crate) fn reset(&mut self) {
        self.matched = Some(0);
    }

    /// Feeds bytes through the guard. Returns `true` if a line starting with
    /// the delimiter was completed.
    pub(crate) fn scan(&mut self, bytes: &[u8]) -> bool {
        for &b in bytes {
            self.matched = match self.matched {
                Some(n) if self.delimiter[n] == b => {
                    if n + 1 == self.delimiter.len() {
                        return true;
                    }
                    Some(n + 1)
                }
                _ => None,
            };
            if b == b'\n' {
                self.matched = Some(0);
            }
        }
        false
    }
}
