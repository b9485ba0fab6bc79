//! MIME entity model with an async, pull-based formatter.
//!
//! This crate provides:
//! - Headers with comments and case-insensitive lookup (RFC 2822)
//! - A part tree of empty, content and multipart entities (RFC 2045, RFC 2046)
//! - Streaming serialization of a part tree with bounded memory use
//! - Base64 and quoted-printable transfer encoding
//! - S/MIME signing and encryption through injected providers
//! - Content type lookup by file extension
//!
//! All I/O is async-first using tokio.
//!
//! # Examples
//!
//! ```
//! use tokio_mime_entity::{Formatter, Header, Part};
//!
//! # async fn example() -> tokio_mime_entity::Result<()> {
//! let mut message = Part::multi(
//!     vec![
//!         Part::bytes("Hello", vec![Header::new("Content-Type", "text/plain")?]),
//!         Part::bytes(
//!             vec![0u8, 1, 2],
//!             vec![Header::new("Content-Type", "application/octet-stream")?],
//!         ),
//!     ],
//!     vec![Header::parse("Content-Type: multipart/mixed; boundary=frontier")?],
//! );
//!
//! let mut stream = Formatter::new().allow_binary(false).format(&mut message)?;
//! while let Some(chunk) = stream.next_chunk().await? {
//!     // forward `chunk` to a socket
//!     # let _ = chunk;
//! }
//! # Ok(())
//! # }
//! ```

pub mod crypto;
pub mod encoding;
pub mod error;
pub mod formatter;
pub mod grammar;
pub mod header;
pub mod media_type;
pub mod mime_type;
pub mod part;
pub mod services;

// Re-export commonly used types
pub use crypto::{CryptoBridge, CryptoProvider, Keystore, KeystoreResolver, SignatureAlgorithm};
pub use error::{Error, Result};
pub use formatter::{FormatOptions, Formatter, MimeReader, MimeStream};
pub use header::{get_cookies, get_full_header_value, get_headers, get_user_agent, Header};
pub use media_type::{format_media_type, parse_media_type};
pub use mime_type::{all_content_types_for, all_extensions_for, content_type_for};
pub use part::{ContentPart, EmptyPart, MultiPart, Part};
