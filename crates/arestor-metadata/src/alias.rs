//! Segment alias resolution
//!
//! HTTP front ends of the mocked providers rewrite `-` to `_` in path
//! segments before dispatch. Trees are authored with the providers' real
//! names, so a lookup that misses retries with the punctuation swapped.

use crate::error::{MetadataError, Result};
use std::borrow::Cow;

/// Resolve `segment` against a container's child names
///
/// Tries the segment as given, then with `_` replaced by `-`, then with `-`
/// replaced by `_`. `contains` reports whether a name is a registered child.
/// Returns the child name that matched.
pub fn resolve_alias<'a, F>(segment: &'a str, contains: F) -> Result<Cow<'a, str>>
where
    F: Fn(&str) -> bool,
{
    if contains(segment) {
        return Ok(Cow::Borrowed(segment));
    }

    for (from, to) in [('_', "-"), ('-', "_")] {
        if segment.contains(from) {
            let candidate = segment.replace(from, to);
            if contains(&candidate) {
                return Ok(Cow::Owned(candidate));
            }
        }
    }

    Err(MetadataError::UnknownResource(segment.to_string()))
}
