//! Filename convention for tags: each tag is a whitespace separated `@name`
//! token appended after the base name, before the extension.
//!
//! Decoding drops every token that contains `@` anywhere, so a base name that
//! legitimately contains such a token (`me@home.jpg`) loses it. There is no
//! escaping scheme; callers should treat this as a known limitation.
//!
//! A stem made only of tags (`@a.jpg`) has an empty base. Removing its last tag
//! yields the dotfile `.jpg`, which has no extension and is not enumerated again.

use crate::core::{Result, TagError};

pub const TAG_MARKER: char = '@';

/* ================================ Encoding ================================= */

/// Builds `base @t1 @t2 ... ext`, keeping tag order as given.
#[must_use]
pub fn encode<S: AsRef<str>>(base: &str, tags: &[S], ext: &str) -> String {
    let extra: usize = tags.iter().map(|t| t.as_ref().len() + 2).sum();
    let mut out = String::with_capacity(base.len() + extra + ext.len());
    out.push_str(base);
    for t in tags {
        out.push(' ');
        out.push(TAG_MARKER);
        out.push_str(t.as_ref());
    }
    out.push_str(ext);
    out
}

/* ================================ Decoding ================================= */

/// Recovers the untagged base from an encoded stem (no extension).
///
/// Runs of whitespace collapse to a single space in the result.
#[must_use]
pub fn decode(stem: &str) -> String {
    stem.split_whitespace()
        .filter(|tok| !tok.contains(TAG_MARKER))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tag names carried by an encoded stem, in order, without the leading `@`.
///
/// Only tokens that start with `@` and contain no further `@` count; repeated
/// names are reported once.
#[must_use]
pub fn tags_in_stem(stem: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tok in stem.split_whitespace() {
        let Some(name) = tok.strip_prefix(TAG_MARKER) else {
            continue;
        };
        if name.is_empty() || name.contains(TAG_MARKER) {
            continue;
        }
        if !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
    }
    out
}

/// Splits `file_name` at its last `.`; the extension keeps the dot.
pub fn split_name_and_extension(file_name: &str) -> Result<(&str, &str)> {
    match file_name.rfind('.') {
        Some(idx) => Ok(file_name.split_at(idx)),
        None => Err(TagError::malformed(file_name)),
    }
}
