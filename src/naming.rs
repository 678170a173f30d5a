//! Filename rules shared by every stage.
//!
//! Photos are identified purely by file name: the name is the cache key, the
//! manifest `title`/`alt` are derived from it, and the ignore-list is matched
//! against it.
//!
//! ## Titles
//!
//! The title is the file name with its final extension removed. Inner dots
//! are kept, and a name without any extension is its own title:
//! - `sunset.jpg` → "sunset"
//! - `2024.03.beach.png` → "2024.03.beach"
//! - `README` → "README"

/// Suffix of in-progress encoder output; see [`partial_name`].
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Hidden sibling name an encoder writes to before renaming into place.
pub fn partial_name(name: &str) -> String {
    format!(".{name}{PARTIAL_SUFFIX}")
}

/// Whether a name is leftover encoder output rather than a photo.
pub fn is_partial(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(PARTIAL_SUFFIX)
}

/// Whether a file name matches any ignore-list entry.
///
/// Matching is by substring, so `"hidden"` excludes both `hidden.jpg` and
/// `my-hidden-shot.png`. An empty pattern is ignored rather than matching
/// every name.
pub fn is_ignored(name: &str, ignore: &[String]) -> bool {
    ignore
        .iter()
        .any(|pattern| !pattern.is_empty() && name.contains(pattern.as_str()))
}

/// Display title for a photo: the file name without its final extension.
pub fn photo_title(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Lower-cased extension of a file name, without the dot.
pub fn extension(name: &str) -> Option<String> {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext.to_ascii_lowercase()),
        _ => None,
    }
}
