//! The on-disk gallery: saved images plus their metadata document.
//!
//! [`Gallery`] owns the image directory and the [`MetadataStore`] that lives
//! inside it. Saving goes through [`Gallery::save`], listing through
//! [`Gallery::list`].

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::constants::METADATA_FILE_NAME;

mod catalog;
mod materialize;
pub mod metadata;

pub use catalog::CatalogEntry;
pub use materialize::{SaveRequest, SaveResult};
pub use metadata::{ImageRecord, Metadata, MetadataError, MetadataStore, MetadataWrite};

/// Errors returned by gallery operations.
#[derive(Debug)]
pub enum GalleryError {
    /// The save request carried no image data.
    MissingPayload,
    /// The payload was not valid base64.
    InvalidEncoding(base64::DecodeError),
    /// The requested output size is zero or too large.
    InvalidDimensions {
        /// requested width
        width: u32,
        /// requested height
        height: u32,
    },
    /// The filename isn't a plain name inside the image directory.
    InvalidFilename(String),
    /// Local file system failure.
    Io(std::io::Error),
}

impl std::fmt::Display for GalleryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPayload => write!(f, "No image data provided"),
            Self::InvalidEncoding(err) => write!(f, "Invalid base64 data: {err}"),
            Self::InvalidDimensions { width, height } => {
                write!(f, "Invalid image dimensions: {width}x{height}")
            }
            Self::InvalidFilename(name) => write!(f, "Invalid filename: {name}"),
            Self::Io(err) => write!(f, "Error saving image: {err}"),
        }
    }
}

impl std::error::Error for GalleryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidEncoding(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GalleryError {
    fn from(err: std::io::Error) -> Self {
        GalleryError::Io(err)
    }
}

/// A directory of generated images with a metadata side table.
#[derive(Debug)]
pub struct Gallery {
    image_dir: PathBuf,
    metadata: MetadataStore,
}

impl Gallery {
    /// Opens the gallery, creating the image directory if needed.
    pub async fn open(image_dir: impl Into<PathBuf>) -> Result<Self, GalleryError> {
        let image_dir = image_dir.into();
        tokio::fs::create_dir_all(&image_dir).await?;
        debug!("Gallery opened at {}", image_dir.display());
        let metadata = MetadataStore::new(image_dir.join(METADATA_FILE_NAME));
        Ok(Self {
            image_dir,
            metadata,
        })
    }

    /// Directory holding the images.
    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// The metadata store for this gallery.
    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    /// Resolves a client-supplied filename to a path inside the image directory.
    pub fn file_path(&self, filename: &str) -> Result<PathBuf, GalleryError> {
        if !is_plain_filename(filename) {
            return Err(GalleryError::InvalidFilename(filename.to_string()));
        }
        Ok(self.image_dir.join(filename))
    }
}

/// One normal path component, not hidden.
fn is_plain_filename(filename: &str) -> bool {
    if filename.is_empty() || filename.starts_with('.') || filename.contains('\\') {
        return false;
    }
    let mut components = Path::new(filename).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
