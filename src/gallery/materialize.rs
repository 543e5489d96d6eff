//! Turning a base64 payload into a saved, normalized PNG.

use std::io::Cursor;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::{Gallery, GalleryError};
use crate::constants::{IMAGE_EXTENSION, MAX_DIMENSION, MODEL_LABEL};

/// What to save.
#[derive(Clone, Debug)]
pub struct SaveRequest {
    /// Base64 image payload, optionally a `data:` URL
    pub image_b64: String,
    /// Prompt the image came from
    pub prompt: String,
    /// Target width in pixels
    pub width: u32,
    /// Target height in pixels
    pub height: u32,
}

/// What was saved.
#[derive(Clone, Debug, Serialize)]
pub struct SaveResult {
    /// Always true, errors don't produce a result
    pub success: bool,
    /// Generated filename inside the image directory
    pub filename: String,
    /// Recorded width
    pub width: u32,
    /// Recorded height
    pub height: u32,
    /// Model label
    pub model: String,
    /// Generation duration in seconds
    pub generation_time: f64,
    /// Size of the written file in bytes
    pub file_size: u64,
    /// Prompt as recorded
    pub prompt: String,
    /// Creation timestamp as recorded
    pub created: String,
    /// Non-fatal problems, eg the metadata document couldn't be written
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Gallery {
    /// Decodes, normalizes and writes an image, then records its metadata.
    ///
    /// Bytes that don't decode as an image are written verbatim, with the
    /// requested size recorded.
    #[instrument(skip_all, fields(width = request.width, height = request.height))]
    pub async fn save(&self, request: &SaveRequest) -> Result<SaveResult, GalleryError> {
        validate_dimensions(request.width, request.height)?;
        let decoded = decode_payload(&request.image_b64)?;

        let filename = unique_filename();
        let path = self.image_dir.join(&filename);

        // the PNG path always comes out at exactly the requested size
        let (width, height) = (request.width, request.height);
        let normalized = tokio::task::spawn_blocking(move || {
            normalize_image(&decoded, width, height).map_err(|err| (err, decoded))
        })
        .await
        .map_err(std::io::Error::other)?;
        let bytes = match normalized {
            Ok(png) => png,
            Err((err, decoded)) => {
                warn!("Writing {} unprocessed: {}", filename, err);
                decoded
            }
        };
        tokio::fs::write(&path, &bytes).await?;

        let write = self
            .metadata
            .add(
                &filename,
                request.width,
                request.height,
                &request.prompt,
                MODEL_LABEL,
                0.0,
            )
            .await;
        let file_size = tokio::fs::metadata(&path).await?.len();
        info!("Saved {} ({} bytes)", filename, file_size);

        Ok(SaveResult {
            success: true,
            filename,
            width: write.record.width,
            height: write.record.height,
            model: write.record.model,
            generation_time: write.record.generation_time,
            file_size,
            prompt: write.record.prompt,
            created: write.record.created,
            warnings: write.warning.into_iter().collect(),
        })
    }
}

fn validate_dimensions(width: u32, height: u32) -> Result<(), GalleryError> {
    let valid = 1..=MAX_DIMENSION;
    if valid.contains(&width) && valid.contains(&height) {
        Ok(())
    } else {
        Err(GalleryError::InvalidDimensions { width, height })
    }
}

/// Strips ASCII whitespace anywhere in the payload and an optional
/// `data:...;base64,` prefix, then decodes.
pub(crate) fn decode_payload(payload: &str) -> Result<Vec<u8>, GalleryError> {
    let payload: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let payload = payload.as_str();
    let payload = match payload.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(";base64,")
            .map(|(_, data)| data)
            .unwrap_or(payload),
        None => payload,
    };
    if payload.is_empty() {
        return Err(GalleryError::MissingPayload);
    }
    general_purpose::STANDARD
        .decode(payload)
        .map_err(GalleryError::InvalidEncoding)
}

/// `image_<8 hex>_<unix seconds>.png`
pub(crate) fn unique_filename() -> String {
    let suffix = format!("{:08x}", rand::random::<u32>());
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("image_{suffix}_{ts}{IMAGE_EXTENSION}")
}

/// Decodes any supported format, converts to RGB and crops-to-fill to the
/// exact target size, returning PNG bytes.
pub(crate) fn normalize_image(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> Result<Vec<u8>, image::ImageError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    debug!("Guessed image format: {:?}", reader.format());
    let image = reader.decode()?;

    let rgb = if matches!(image, DynamicImage::ImageRgb8(_)) {
        image
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    };
    let fitted = rgb.resize_to_fill(width, height, FilterType::Lanczos3);

    let mut output = Vec::new();
    fitted.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
