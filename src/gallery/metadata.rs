//! JSON metadata document mapping image filenames to descriptive records.
//!
//! The document is read in full and written back in full. Loading never
//! fails: a missing or unparsable document reads as empty, and entries that
//! don't parse are dropped one by one.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

/// Filename to record mapping, as stored on disk.
pub type Metadata = BTreeMap<String, ImageRecord>;

/// Descriptive metadata for one saved image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Prompt the image was generated from
    pub prompt: String,
    /// Model label
    pub model: String,
    /// Generation duration in seconds
    pub generation_time: f64,
    /// RFC 3339 creation timestamp
    pub created: String,
}

impl ImageRecord {
    /// Builds a record stamped with the current time.
    pub fn new(width: u32, height: u32, prompt: &str, model: &str, generation_time: f64) -> Self {
        Self {
            width,
            height,
            prompt: prompt.to_string(),
            model: model.to_string(),
            generation_time,
            created: timestamp_now(),
        }
    }
}

/// Microsecond precision in UTC, so timestamps sort as strings.
fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Errors writing the metadata document.
#[derive(Debug)]
pub enum MetadataError {
    /// The mapping couldn't be serialized.
    Serialize(serde_json::Error),
    /// The document couldn't be written.
    Write(std::io::Error),
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serialize(err) => write!(f, "Failed to serialize metadata: {err}"),
            Self::Write(err) => write!(f, "Failed to write metadata: {err}"),
        }
    }
}

impl std::error::Error for MetadataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Serialize(err) => Some(err),
            Self::Write(err) => Some(err),
        }
    }
}

/// Result of [`MetadataStore::add`].
#[derive(Clone, Debug)]
pub struct MetadataWrite {
    /// The record as inserted
    pub record: ImageRecord,
    /// Set when the document couldn't be saved; the record only exists in this value
    pub warning: Option<String>,
}

/// The metadata document on disk.
#[derive(Debug)]
pub struct MetadataStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl MetadataStore {
    /// A store backed by the document at `path`; nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the metadata document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the document, treating anything unreadable as empty.
    pub async fn load(&self) -> Metadata {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Metadata::new(),
            Err(err) => {
                warn!("Failed to read {}: {}", self.path.display(), err);
                return Metadata::new();
            }
        };
        parse_document(&self.path, &bytes)
    }

    /// Overwrites the document with `metadata`.
    pub async fn save(&self, metadata: &Metadata) -> Result<(), MetadataError> {
        let bytes = serde_json::to_vec_pretty(metadata).map_err(|err| {
            error!("Failed to serialize metadata: {}", err);
            MetadataError::Serialize(err)
        })?;
        tokio::fs::write(&self.path, bytes).await.map_err(|err| {
            error!("Failed to save metadata to {}: {}", self.path.display(), err);
            MetadataError::Write(err)
        })
    }

    /// Inserts or replaces the record for `filename` and saves the document.
    ///
    /// Adds are serialized within this process. A failed save comes back as a
    /// warning on the result, never as an error.
    pub async fn add(
        &self,
        filename: &str,
        width: u32,
        height: u32,
        prompt: &str,
        model: &str,
        generation_time: f64,
    ) -> MetadataWrite {
        let record = ImageRecord::new(width, height, prompt, model, generation_time);
        let _guard = self.write_lock.lock().await;
        let mut metadata = self.load().await;
        metadata.insert(filename.to_string(), record.clone());
        let warning = self.save(&metadata).await.err().map(|err| err.to_string());
        MetadataWrite { record, warning }
    }
}

fn parse_document(path: &Path, bytes: &[u8]) -> Metadata {
    let raw: BTreeMap<String, Value> = match serde_json::from_slice(bytes) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(
                "Ignoring unparsable metadata document {}: {}",
                path.display(),
                err
            );
            return Metadata::new();
        }
    };

    let mut metadata = Metadata::new();
    for (filename, value) in raw {
        match serde_json::from_value::<ImageRecord>(value) {
            Ok(record) => {
                metadata.insert(filename, record);
            }
            Err(err) => warn!("Dropping metadata entry {}: {}", filename, err),
        }
    }
    debug!("Loaded {} metadata entries", metadata.len());
    metadata
}
