//! CLI parser
use clap::Parser;
use std::num::NonZeroU16;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_GEMINI_API_BASE, DEFAULT_GEMINI_MODEL, DEFAULT_IMAGE_DIR,
    DEFAULT_REQUEST_TIMEOUT_SECONDS, DEFAULT_STATIC_DIR,
};

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "GENSTUDIO_DEBUG")]
    /// Enable debug logging. Env: GENSTUDIO_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "8083", env = "GENSTUDIO_PORT")]
    /// http listener, defaults to `8083`.
    /// Env: GENSTUDIO_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "GENSTUDIO_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: GENSTUDIO_LISTEN_ADDRESS
    pub listen_address: String,

    #[clap(long, default_value = DEFAULT_IMAGE_DIR, env = "GENSTUDIO_IMAGE_DIR")]
    /// Where saved images and `metadata.json` live.
    /// Env: GENSTUDIO_IMAGE_DIR
    pub image_dir: PathBuf,

    #[clap(long, default_value = DEFAULT_STATIC_DIR, env = "GENSTUDIO_STATIC_DIR")]
    /// Static assets served under `/static`.
    /// Env: GENSTUDIO_STATIC_DIR
    pub static_dir: PathBuf,

    #[clap(flatten)]
    /// Outbound generation API settings
    pub gemini: GeminiOptions,
}

/// Settings for the Gemini API, shared by the server and the CLI tool
#[derive(clap::Args, Clone, Debug)]
pub struct GeminiOptions {
    #[clap(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    /// Gemini API key. The server starts without it but `/generate` fails.
    /// Env: GEMINI_API_KEY
    pub gemini_api_key: Option<String>,

    #[clap(long, default_value = DEFAULT_GEMINI_MODEL, env = "GEMINI_MODEL")]
    /// Gemini model identifier.
    /// Env: GEMINI_MODEL
    pub gemini_model: String,

    #[clap(long, default_value = DEFAULT_GEMINI_API_BASE, env = "GEMINI_API_BASE")]
    /// Gemini API base URL.
    /// Env: GEMINI_API_BASE
    pub gemini_api_base: String,

    #[clap(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECONDS, env = "GENSTUDIO_REQUEST_TIMEOUT")]
    /// Timeout in seconds for the generation call.
    /// Env: GENSTUDIO_REQUEST_TIMEOUT
    pub request_timeout: u64,
}
