//! Content type lookup by file name or extension.
//!
//! A built-in table maps extensions to content types in both directions.
//! An extension may map to several content types (`xml` is both `text/xml`
//! and `application/xml`); the first one listed is the preferred type.
//! Additional mappings can be registered at runtime.

use crate::error::{Error, Result};
use crate::media_type::parse_media_type;
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};

/// Built-in mappings, lowercase extensions without a leading dot.
static BUILTIN_TYPES: &[(&str, &str)] = &[
    ("avif", "image/avif"),
    ("bin", "application/octet-stream"),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("eml", "message/rfc822"),
    ("gif", "image/gif"),
    ("gz", "application/gzip"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("ics", "text/calendar"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("js", "text/javascript"),
    ("json", "application/json"),
    ("mjs", "text/javascript"),
    ("p7m", "application/pkcs7-mime"),
    ("p7s", "application/pkcs7-signature"),
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("svg", "image/svg+xml"),
    ("txt", "text/plain"),
    ("wasm", "application/wasm"),
    ("webp", "image/webp"),
    ("xml", "text/xml"),
    ("xml", "application/xml"),
    ("zip", "application/zip"),
];

#[derive(Default)]
struct Tables {
    /// Extension to content types, preferred first.
    types: HashMap<String, Vec<String>>,
    /// Content type to extensions.
    extensions: HashMap<String, Vec<String>>,
}

impl Tables {
    fn insert(&mut self, ext: &str, content_type: &str) {
        let types = self.types.entry(ext.to_string()).or_default();
        if !types.iter().any(|t| t == content_type) {
            types.push(content_type.to_string());
        }

        let exts = self.extensions.entry(content_type.to_string()).or_default();
        if !exts.iter().any(|e| e == ext) {
            exts.push(ext.to_string());
        }
    }
}

static TABLES: Lazy<RwLock<Tables>> = Lazy::new(|| {
    let mut tables = Tables::default();
    for (ext, content_type) in BUILTIN_TYPES {
        tables.insert(ext, content_type);
    }
    RwLock::new(tables)
});

/// Normalizes a file name, `.ext` or `ext` to a lowercase extension.
fn extension_of(name: &str) -> Option<String> {
    let name = name.trim();
    let ext = match name.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => name,
    };
    (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

/// Returns every content type known for the extension of `name`.
///
/// `name` may be a file name (`report.PDF`), an extension with a dot
/// (`.pdf`) or a bare extension (`pdf`). Unknown extensions yield an empty set.
///
/// # Examples
///
/// ```
/// use tokio_mime_entity::all_content_types_for;
///
/// let types = all_content_types_for("feed.xml");
/// assert!(types.contains("application/xml"));
/// assert!(types.contains("text/xml"));
/// ```
pub fn all_content_types_for(name: &str) -> BTreeSet<String> {
    let Some(ext) = extension_of(name) else {
        return BTreeSet::new();
    };
    let tables = TABLES.read().unwrap_or_else(PoisonError::into_inner);
    tables
        .types
        .get(&ext)
        .map(|types| types.iter().cloned().collect())
        .unwrap_or_default()
}

/// Returns the preferred content type for the extension of `name`.
pub fn content_type_for(name: &str) -> Option<String> {
    let ext = extension_of(name)?;
    let tables = TABLES.read().unwrap_or_else(PoisonError::into_inner);
    tables.types.get(&ext).and_then(|types| types.first().cloned())
}

/// Returns every extension (without a leading dot) known for a content type.
///
/// Parameters such as `charset` are ignored. Invalid media types yield an empty set.
pub fn all_extensions_for(content_type: &str) -> BTreeSet<String> {
    let Ok((just_type, _)) = parse_media_type(content_type) else {
        return BTreeSet::new();
    };
    let tables = TABLES.read().unwrap_or_else(PoisonError::into_inner);
    tables
        .extensions
        .get(&just_type)
        .map(|exts| exts.iter().cloned().collect())
        .unwrap_or_default()
}

/// Registers an extension for a content type.
///
/// The extension may carry a leading dot. Parameters on the content type are dropped.
pub fn add_extension_type(ext: &str, content_type: &str) -> Result<()> {
    let ext = ext.strip_prefix('.').unwrap_or(ext);
    if ext.is_empty() || ext.contains(['.', '/']) {
        return Err(Error::InvalidArgument(format!("invalid extension {:?}", ext)));
    }
    let (just_type, _) = parse_media_type(content_type)?;

    let mut tables = TABLES.write().unwrap_or_else(PoisonError::into_inner);
    tables.insert(&ext.to_ascii_lowercase(), &just_type);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_content_types_for() {
        assert_eq!(
            all_content_types_for("report.PDF").into_iter().collect::<Vec<_>>(),
            vec!["application/pdf"]
        );
        assert!(all_content_types_for(".jpg").contains("image/jpeg"));
        assert!(all_content_types_for("png").contains("image/png"));
        assert!(all_content_types_for("archive.unknown").is_empty());
        assert!(all_content_types_for("").is_empty());
    }

    #[test]
    fn test_content_type_for_prefers_first() {
        assert_eq!(content_type_for("a.xml").as_deref(), Some("text/xml"));
        assert_eq!(content_type_for("smime.p7s").as_deref(), Some("application/pkcs7-signature"));
        assert_eq!(content_type_for("noext."), None);
    }

    #[test]
    fn test_all_extensions_for() {
        let exts = all_extensions_for("image/jpeg");
        assert!(exts.contains("jpg"));
        assert!(exts.contains("jpeg"));

        assert!(all_extensions_for("text/html; charset=utf-8").contains("html"));
        assert!(all_extensions_for("not a type").is_empty());
    }

    #[test]
    fn test_add_extension_type() {
        assert!(add_extension_type("", "application/foo").is_err());
        assert!(add_extension_type(".foo", "invalid").is_err());

        add_extension_type(".Test-Ext", "application/x-test; charset=utf-8").unwrap();
        assert!(all_content_types_for("file.test-ext").contains("application/x-test"));
        assert!(all_extensions_for("application/x-test").contains("test-ext"));
    }
}
