//! Run manifest (`books_details.json`) and the file writes of the download pipeline.

use crate::model::BookRecord;
use crate::paths::manifest_path;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid manifest JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn create_dir(dir: &Path) -> Result<(), PersistError> {
    fs::create_dir_all(dir).map_err(|e| PersistError::CreateDir {
        path: dir.to_path_buf(),
        source: e,
    })
}

/// Write `bytes` to `path`, creating the parent directory. Existing files are overwritten.
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir(parent)?;
        }
    }
    fs::write(path, bytes).map_err(|e| PersistError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Books processed in this run, in processing order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Manifest {
    records: Vec<BookRecord>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: BookRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[BookRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write all records as an indented UTF-8 JSON array to `{dest}/books_details.json`.
    pub fn flush(&self, dest: &Path) -> Result<PathBuf, PersistError> {
        create_dir(dest)?;
        let path = manifest_path(dest);
        let write_err = |source: std::io::Error| PersistError::Write {
            path: path.clone(),
            source,
        };
        let file = File::create(&path).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.records).map_err(|e| {
            PersistError::Json {
                path: path.clone(),
                source: e,
            }
        })?;
        writer.write_all(b"\n").map_err(write_err)?;
        writer.flush().map_err(write_err)?;
        Ok(path)
    }

    /// Read a manifest previously written by [Manifest::flush].
    pub fn load(path: &Path) -> Result<Self, PersistError> {
        let s = fs::read_to_string(path).map_err(|e| PersistError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let records = serde_json::from_str(&s).map_err(|e| PersistError::Json {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self { records })
    }
}

impl From<Vec<BookRecord>> for Manifest {
    fn from(records: Vec<BookRecord>) -> Self {
        Self { records }
    }
}
