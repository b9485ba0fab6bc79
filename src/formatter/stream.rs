//! The pull-based output of a formatting pass.

use super::guard::LineGuard;
use super::{collision, content_header_block, multipart_header_block, FormatOptions};
use crate::encoding::BodyEncoder;
use crate::error::{Error, Result};
use crate::header::write_header_block;
use crate::part::{BodyReader, Part};
use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};
use std::io;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::io::StreamReader;

/// A formatted message exposed as `AsyncRead`.
pub type MimeReader<'a> = StreamReader<BoxStream<'a, io::Result<Bytes>>, Bytes>;

/// Lazily produced MIME output for one part tree.
///
/// Each call to [`next_chunk`](Self::next_chunk) emits a header block, a
/// delimiter line, or one body chunk. Children are emitted in order. The
/// stream cannot be restarted; after an error it is exhausted. Dropping it
/// releases any body source that is still open.
pub struct MimeStream<'a> {
    options: FormatOptions,
    stack: Vec<Frame<'a>>,
    buffer: Vec<u8>,
    emitted: u64,
}

enum Frame<'a> {
    /// A part whose header block has not been written yet.
    Part(&'a mut Part),
    /// An open body being drained.
    Body(BodyFrame),
    /// A multipart between delimiters.
    Multi(MultiFrame<'a>),
}

struct BodyFrame {
    reader: BodyReader,
    encoder: BodyEncoder,
}

struct MultiFrame<'a> {
    boundary: String,
    children: std::slice::IterMut<'a, Part>,
    started: bool,
    guard: LineGuard,
}

impl<'a> MimeStream<'a> {
    pub(crate) fn new(part: &'a mut Part, options: FormatOptions) -> Self {
        Self {
            options,
            stack: vec![Frame::Part(part)],
            buffer: Vec::new(),
            emitted: 0,
        }
    }

    /// Returns the number of bytes emitted so far.
    pub fn bytes_emitted(&self) -> u64 {
        self.emitted
    }

    /// Produces the next chunk, or `None` once the message is complete.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        let result = self.advance().await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, emitted = self.emitted, "formatting aborted");
            self.stack.clear();
        }
        result
    }

    async fn advance(&mut self) -> Result<Option<Bytes>> {
        while let Some(frame) = self.stack.pop() {
            // Frames below this index enclose whatever the popped frame emits
            let depth = self.stack.len();

            match frame {
                Frame::Part(part) => {
                    let block = self.open(part)?;
                    return self.emit(depth, block).map(Some);
                }
                Frame::Body(mut body) => {
                    if self.buffer.len() != self.options.chunk_size {
                        self.buffer.resize(self.options.chunk_size, 0);
                    }

                    let n = body.reader.read(&mut self.buffer).await?;
                    let mut out = Vec::with_capacity(n + n / 2);
                    if n == 0 {
                        body.encoder.finish(&mut out);
                    } else {
                        body.encoder.encode(&self.buffer[..n], &mut out);
                        self.stack.push(Frame::Body(body));
                    }

                    if out.is_empty() {
                        continue;
                    }
                    return self.emit(depth, out).map(Some);
                }
                Frame::Multi(mut multi) => {
                    let mut line = Vec::with_capacity(multi.boundary.len() + 8);
                    if multi.started {
                        line.extend_from_slice(b"\r\n");
                    }
                    line.extend_from_slice(b"--");
                    line.extend_from_slice(multi.boundary.as_bytes());

                    match multi.children.next() {
                        Some(child) => {
                            line.extend_from_slice(b"\r\n");
                            multi.started = true;
                            multi.guard.reset();
                            self.stack.push(Frame::Multi(multi));
                            self.stack.push(Frame::Part(child));
                        }
                        None => {
                            line.extend_from_slice(b"--\r\n");
                            tracing::trace!(boundary = %multi.boundary, "multipart closed");
                        }
                    }
                    return self.emit(depth, line).map(Some);
                }
            }
        }

        Ok(None)
    }

    /// Renders a part's header block and pushes the frame that emits its body.
    fn open(&mut self, part: &'a mut Part) -> Result<Vec<u8>> {
        let block = match part {
            Part::Empty(empty) => {
                let mut block = Vec::new();
                write_header_block(empty.headers(), &mut block);
                block
            }
            Part::Content(content) => {
                let (block, encoder) = content_header_block(content, &self.options)?;
                let reader = content.open()?;
                self.stack.push(Frame::Body(BodyFrame { reader, encoder }));
                block
            }
            Part::Multi(multi) => {
                let (boundary, block) = multipart_header_block(multi, &self.options)?;
                tracing::trace!(%boundary, children = multi.children().len(), "multipart opened");
                self.stack.push(Frame::Multi(MultiFrame {
                    guard: LineGuard::new(&boundary),
                    boundary,
                    children: multi.children_mut().iter_mut(),
                    started: false,
                }));
                block
            }
        };
        Ok(block)
    }

    /// Checks bytes against the guards of the enclosing multiparts and hands them out.
    fn emit(&mut self, depth: usize, bytes: Vec<u8>) -> Result<Bytes> {
        for frame in &mut self.stack[..depth] {
            if let Frame::Multi(multi) = frame {
                if multi.guard.scan(&bytes) {
                    return Err(collision(&multi.boundary));
                }
            }
        }

        self.emitted += bytes.len() as u64;
        tracing::trace!(len = bytes.len(), total = self.emitted, "chunk");
        Ok(Bytes::from(bytes))
    }

    /// Adapts the formatter into a `Stream` of chunks.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes>> + Send + 'a {
        stream::try_unfold(self, |mut this| async move {
            let chunk = this.next_chunk().await?;
            Ok::<_, Error>(chunk.map(|chunk| (chunk, this)))
        })
    }

    /// Adapts the formatter into an `AsyncRead`.
    ///
    /// Formatting errors surface as `io::ErrorKind::InvalidData`.
    pub fn into_reader(self) -> MimeReader<'a> {
        StreamReader::new(self.into_stream().map_err(io::Error::from).boxed())
    }

    /// Drains the formatter into a writer, returning the number of bytes written.
    pub async fn write_to<W>(mut self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        while let Some(chunk) = self.next_chunk().await? {
            writer.write_all(&chunk).await?;
        }
        writer.flush().await?;
        Ok(self.emitted)
    }

    /// Collects the whole output in memory.
    pub async fn to_vec(mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(chunk) = self.next_chunk().await? {
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }
}

impl std::fmt::Debug for MimeStream<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MimeStream")
            .field("options", &self.options)
            .field("depth", &self.stack.len())
            .field("emitted", &self.emitted)
            .finish()
    }
}
