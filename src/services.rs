//! Entry points for callers whose inputs may be absent.
//!
//! These mirror the operation set exposed by service layers built on this
//! crate: an absent header list is answered with an absent result, an absent
//! part is a caller error.

use crate::error::{Error, Result};
use crate::formatter::{FormatOptions, Formatter, MimeStream};
use crate::header::{self, Header};
use crate::part::Part;
use std::collections::HashMap;

fn require(part: Option<&Part>) -> Result<&Part> {
    part.ok_or_else(|| Error::InvalidArgument("a part is required".to_string()))
}

/// Returns the headers named `name`, or `None` when there is no header list.
pub fn get_headers(headers: Option<&[Header]>, name: &str) -> Option<Vec<Header>> {
    headers.map(|headers| header::get_headers(name, headers).into_iter().cloned().collect())
}

/// Returns the cookies found in the headers; empty when there are none.
pub fn get_cookies(headers: Option<&[Header]>) -> HashMap<String, String> {
    headers.map(header::get_cookies).unwrap_or_default()
}

/// Returns the full value of a header, or `None` without one.
pub fn get_full_header_value(header: Option<&Header>) -> Option<String> {
    header.map(Header::full_value)
}

/// Returns the user agent, or `None` without a header list or header.
pub fn get_user_agent(headers: Option<&[Header]>) -> Option<String> {
    headers.and_then(header::get_user_agent)
}

/// Reports whether the part is a multipart. Fails on an absent part.
pub fn has_children(part: Option<&Part>) -> Result<bool> {
    require(part).map(Part::has_children)
}

/// Reports whether the part carries a body. Fails on an absent part.
pub fn has_content(part: Option<&Part>) -> Result<bool> {
    require(part).map(Part::has_content)
}

/// Starts formatting a part with optional settings; unset values use the defaults.
pub fn format(
    part: &mut Part,
    allow_binary: Option<bool>,
    chunk_size: Option<usize>,
    quote_boundary: Option<bool>,
) -> Result<MimeStream<'_>> {
    let defaults = FormatOptions::default();
    Formatter::with_options(FormatOptions {
        allow_binary: allow_binary.unwrap_or(defaults.allow_binary),
        chunk_size: chunk_size.unwrap_or(defaults.chunk_size),
        quote_boundary: quote_boundary.unwrap_or(defaults.quote_boundary),
    })
    .format(part)
}
