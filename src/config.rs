//! Config handling

use std::time::Duration;

use tracing::log::LevelFilter;
use url::Url;

use crate::cli::GeminiOptions;

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Resolved settings for the outbound generation client
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    /// API key, `None` means every generate call reports misconfiguration
    pub api_key: Option<String>,
    /// Base URL, always ends with `/`
    pub api_base: Url,
    /// Model identifier used in the request path
    pub model: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl GeneratorConfig {
    /// Validates the CLI/env options into a usable config.
    pub fn from_options(options: &GeminiOptions) -> Result<Self, url::ParseError> {
        let api_key = options
            .gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string);
        Ok(Self {
            api_key,
            api_base: parse_api_base(&options.gemini_api_base)?,
            model: options.gemini_model.trim().to_string(),
            timeout: Duration::from_secs(options.request_timeout),
        })
    }
}

/// `Url::join` drops the last path segment unless the base ends with a slash.
fn parse_api_base(raw: &str) -> Result<Url, url::ParseError> {
    let raw = raw.trim();
    if raw.ends_with('/') {
        Url::parse(raw)
    } else {
        Url::parse(&format!("{raw}/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEFAULT_GEMINI_API_BASE, DEFAULT_GEMINI_MODEL};

    fn options(key: Option<&str>, base: &str) -> GeminiOptions {
        GeminiOptions {
            gemini_api_key: key.map(str::to_string),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_api_base: base.to_string(),
            request_timeout: 12,
        }
    }

    #[test]
    fn api_base_gets_trailing_slash() {
        let config = GeneratorConfig::from_options(&options(
            Some("key"),
            "https://generativelanguage.googleapis.com/v1beta",
        ))
        .expect("valid config");
        assert_eq!(config.api_base.as_str(), DEFAULT_GEMINI_API_BASE);
        assert_eq!(config.timeout, Duration::from_secs(12));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let config = GeneratorConfig::from_options(&options(Some("  "), DEFAULT_GEMINI_API_BASE))
            .expect("valid config");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn invalid_api_base_is_rejected() {
        assert!(GeneratorConfig::from_options(&options(None, "not a url")).is_err());
    }
}
