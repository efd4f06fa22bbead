//! Output layout under the destination folder and filename sanitization.

use reqwest::Url;
use std::path::{Path, PathBuf};

pub const BOOKS_DIR: &str = "books";
pub const IMAGES_DIR: &str = "images";
pub const MANIFEST_FILE: &str = "books_details.json";

const MAX_FILENAME_BYTES: usize = 255;
const TEXT_EXT: &str = ".txt";
const RESERVED_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Make a book name safe to use as a single path component.
///
/// Drops path separators, characters reserved on Windows and control characters,
/// trims trailing dots and spaces, and keeps the result within 255 bytes. Unicode
/// letters are kept as they are.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !RESERVED_CHARS.contains(c) && !c.is_control())
        .collect();
    let mut s = cleaned.trim().trim_end_matches(['.', ' ']).to_string();
    truncate_bytes(&mut s, MAX_FILENAME_BYTES);

    let stem_len = s.split('.').next().map_or(0, str::len);
    if RESERVED_NAMES
        .iter()
        .any(|r| r.eq_ignore_ascii_case(&s[..stem_len]))
    {
        s.insert(stem_len, '_');
        truncate_bytes(&mut s, MAX_FILENAME_BYTES);
    }
    if s.is_empty() {
        s = "untitled".to_string();
    }
    s
}

/// Cut `s` to at most `max` bytes on a char boundary, then drop trailing dots and spaces.
fn truncate_bytes(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
    let kept = s.trim_end_matches(['.', ' ']).len();
    s.truncate(kept);
}

/// `{dest}/books/{id}. {sanitized_name}.txt`. The whole file name stays within 255 bytes.
pub fn book_text_path(dest: &Path, id: u32, name: &str) -> PathBuf {
    let prefix = format!("{}. ", id);
    let mut stem = sanitize_filename(name);
    truncate_bytes(&mut stem, MAX_FILENAME_BYTES - prefix.len() - TEXT_EXT.len());
    dest.join(BOOKS_DIR).join(format!("{}{}{}", prefix, stem, TEXT_EXT))
}

/// `{dest}/images/{basename of the URL path}`. None when the URL path has no file name.
pub fn image_path(dest: &Path, image_url: &Url) -> Option<PathBuf> {
    let basename = image_url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())?;
    Some(dest.join(IMAGES_DIR).join(sanitize_filename(basename)))
}

pub fn manifest_path(dest: &Path) -> PathBuf {
    dest.join(MANIFEST_FILE)
}
