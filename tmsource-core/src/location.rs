//! Helpers for resolving paths relative to a source document.

use std::path::PathBuf;

use url::Url;

/// Whether a datasource path is absolute.
///
/// A path starting with `/` or with a drive letter (`C:`) is absolute,
/// everything else is relative to the document that references it.
#[must_use]
pub fn is_absolute(path: &str) -> bool {
    if path.starts_with('/') {
        return true;
    }
    let mut chars = path.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(letter), Some(':')) if letter.is_ascii_alphabetic()
    )
}

/// Directory that relative datasource paths of a document resolve against.
///
/// This is the unescaped path component of the document id, e.g.
/// `tmsource:///srv/my%20project` resolves to `/srv/my project`.
/// Ids that are not URLs are treated as plain paths.
#[must_use]
pub fn base_dir(id: &str) -> Option<PathBuf> {
    let path = match Url::parse(id) {
        Ok(url) => url.path().to_string(),
        Err(_) => id.to_string(),
    };
    if path.is_empty() {
        return None;
    }
    let unescaped = urlencoding::decode(&path).map_or(path.clone(), |p| p.into_owned());
    Some(PathBuf::from(unescaped))
}
