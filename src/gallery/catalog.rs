//! Listing saved images joined with their metadata.

use std::io::ErrorKind;

use serde::{Serialize, Serializer};
use tracing::debug;

use super::{Gallery, GalleryError};
use crate::constants::{IMAGE_EXTENSION, UNKNOWN};

/// One saved image as shown in the catalog.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CatalogEntry {
    /// Filename inside the image directory
    pub filename: String,
    /// File size in bytes
    pub size: u64,
    /// Width, `"Unknown"` without metadata
    #[serde(serialize_with = "known_or_unknown")]
    pub width: Option<u32>,
    /// Height, `"Unknown"` without metadata
    #[serde(serialize_with = "known_or_unknown")]
    pub height: Option<u32>,
    /// Prompt or `"Unknown"`
    pub prompt: String,
    /// Model label or `"Unknown"`
    pub model: String,
    /// Generation duration in seconds, 0 without metadata
    pub generation_time: f64,
    /// Creation timestamp or `"Unknown"`
    pub created: String,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde hands us a reference
fn known_or_unknown<S: Serializer>(value: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => serializer.serialize_u32(*value),
        None => serializer.serialize_str(UNKNOWN),
    }
}

impl Gallery {
    /// Scans the image directory, newest first.
    ///
    /// Files without a metadata record get placeholder fields. Metadata for
    /// files that no longer exist is ignored.
    pub async fn list(&self) -> Result<Vec<CatalogEntry>, GalleryError> {
        let metadata = self.metadata.load().await;

        let mut dir = match tokio::fs::read_dir(&self.image_dir).await {
            Ok(dir) => dir,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let Some(filename) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !filename.ends_with(IMAGE_EXTENSION) {
                continue;
            }
            // follows symlinks, so a linked image is listed like a real one
            let file_meta = match tokio::fs::metadata(entry.path()).await {
                Ok(file_meta) => file_meta,
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            };
            if !file_meta.is_file() {
                continue;
            }

            let entry = match metadata.get(&filename) {
                Some(record) => CatalogEntry {
                    filename,
                    size: file_meta.len(),
                    width: Some(record.width),
                    height: Some(record.height),
                    prompt: record.prompt.clone(),
                    model: record.model.clone(),
                    generation_time: record.generation_time,
                    created: record.created.clone(),
                },
                None => CatalogEntry {
                    filename,
                    size: file_meta.len(),
                    width: None,
                    height: None,
                    prompt: UNKNOWN.to_string(),
                    model: UNKNOWN.to_string(),
                    generation_time: 0.0,
                    created: UNKNOWN.to_string(),
                },
            };
            entries.push(entry);
        }

        sort_newest_first(&mut entries);
        debug!("Listed {} images", entries.len());
        Ok(entries)
    }
}

/// String order on `created`, filename as tie-break so listings are stable.
fn sort_newest_first(entries: &mut [CatalogEntry]) {
    entries.sort_by(|a, b| {
        b.created
            .cmp(&a.created)
            .then_with(|| b.filename.cmp(&a.filename))
    });
}
