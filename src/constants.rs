//! Shared constants for things
//!

use std::sync::LazyLock;

/// Where saved images land unless told otherwise
pub const DEFAULT_IMAGE_DIR: &str = "./generated_images";

/// Where the static assets for the index page live
pub const DEFAULT_STATIC_DIR: &str = "./static";

/// Name of the metadata document inside the image directory
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// Extension used for persisted images
pub const IMAGE_EXTENSION: &str = ".png";

/// Width used when a save request doesn't say
pub const DEFAULT_WIDTH: u32 = 1024;

/// Height used when a save request doesn't say
pub const DEFAULT_HEIGHT: u32 = 1024;

/// Largest width or height we'll resize to
pub const MAX_DIMENSION: u32 = 8192;

/// Prompt recorded when a save request doesn't carry one
pub const DEFAULT_PROMPT: &str = "Unknown prompt";

/// Model label stored against every saved image
pub const MODEL_LABEL: &str = "Gemini 2.5 Flash";

/// Placeholder for catalog fields that have no metadata
pub const UNKNOWN: &str = "Unknown";

/// Default Gemini model identifier
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-image-preview";

/// Default Gemini API base, must end with a slash
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// Header carrying the Gemini API key
pub const GEMINI_API_KEY_HEADER: &str = "x-goog-api-key";

/// Default timeout (in seconds) for the outbound generation call.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 60;

/// Max age (in seconds) for image cache entries.
pub const IMAGE_CACHE_MAX_AGE_SECONDS: u64 = 60 * 60;

/// Stale-while-revalidate window (in seconds) for image cache entries.
pub const IMAGE_CACHE_STALE_WHILE_REVALIDATE_SECONDS: u64 = 60 * 60 * 24;

/// Cache-Control value for image responses.
pub static IMAGE_CACHE_CONTROL: LazyLock<String> = LazyLock::new(|| {
    format!(
        "public, max-age={}, stale-while-revalidate={}",
        IMAGE_CACHE_MAX_AGE_SECONDS, IMAGE_CACHE_STALE_WHILE_REVALIDATE_SECONDS
    )
});
