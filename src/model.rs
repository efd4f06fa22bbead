//! Book metadata extracted from one detail page.
//!
//! This is the shape written to `books_details.json`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One parsed book. `name` and `author` are never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: u32,
    pub name: String,
    pub author: String,
    pub genres: Vec<String>,
    /// Absolute cover URL, resolved against the detail page URL.
    pub image_url: String,
    /// Where the cover was saved. Absent when images were skipped or the download failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_image_path: Option<PathBuf>,
    pub comments: Vec<String>,
}

impl BookRecord {
    /// Copy of the record with the saved cover location filled in.
    pub fn with_local_image(&self, path: Option<PathBuf>) -> Self {
        Self {
            local_image_path: path,
            ..self.clone()
        }
    }
}
