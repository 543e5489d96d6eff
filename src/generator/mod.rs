//! Outbound client for the Gemini image generation API.

use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::GeneratorConfig;
use crate::constants::GEMINI_API_KEY_HEADER;

mod api;

use api::{GenerateContentRequest, GenerateContentResponse};

/// Longest slice of an upstream error body we pass on.
const MAX_ERROR_BODY: usize = 2000;

/// Errors from the generation API.
#[derive(Debug)]
pub enum GenerateError {
    /// No API key configured.
    MissingApiKey,
    /// The configured base URL and model don't make a valid endpoint.
    Endpoint(url::ParseError),
    /// Network failure or timeout talking to the API.
    Request(reqwest::Error),
    /// The API answered with a non-success status.
    Status {
        /// upstream status code
        status: StatusCode,
        /// upstream response body
        body: String,
    },
    /// The API answered 2xx with a body we couldn't parse.
    Decode(serde_json::Error),
    /// The response carried no inline image.
    NoImage,
}

impl std::fmt::Display for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "GEMINI_API_KEY not set"),
            Self::Endpoint(err) => write!(f, "Invalid Gemini endpoint: {err}"),
            Self::Request(err) => write!(f, "Request to Gemini failed: {err}"),
            Self::Status { status, body } => write!(f, "HTTP Error: {status}: {body}"),
            Self::Decode(err) => write!(f, "Failed to parse Gemini response: {err}"),
            Self::NoImage => write!(f, "No image in response"),
        }
    }
}

impl std::error::Error for GenerateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Endpoint(err) => Some(err),
            Self::Request(err) => Some(err),
            Self::Decode(err) => Some(err),
            _ => None,
        }
    }
}

/// A generated image, still base64 encoded.
#[derive(Clone, Debug, Serialize)]
pub struct GeneratedImage {
    /// Base64 image payload as returned by the API
    pub image_b64: String,
    /// MIME type reported by the API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Client for `models/{model}:generateContent`.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl GeminiClient {
    /// Builds the HTTP client and resolves the endpoint.
    pub fn new(config: &GeneratorConfig) -> Result<Self, GenerateError> {
        let endpoint = config
            .api_base
            .join(&format!("models/{}:generateContent", config.model))
            .map_err(GenerateError::Endpoint)?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GenerateError::Request)?;
        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }

    /// The URL generation requests go to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fails with [`GenerateError::MissingApiKey`] when no key is configured.
    pub fn check_configured(&self) -> Result<&str, GenerateError> {
        self.api_key.as_deref().ok_or(GenerateError::MissingApiKey)
    }

    /// Asks the API for an image. Nothing is retried.
    #[instrument(skip_all)]
    pub async fn generate(&self, prompt: &str) -> Result<GeneratedImage, GenerateError> {
        let api_key = self.check_configured()?;

        info!("Requesting image from {}", self.endpoint);
        let resp = self
            .client
            .post(self.endpoint.clone())
            .header(GEMINI_API_KEY_HEADER, api_key)
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await
            .map_err(GenerateError::Request)?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(GenerateError::Request)?;
        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(GenerateError::Status { status, body });
        }
        debug!("Gemini response: {} bytes", bytes.len());

        let parsed: GenerateContentResponse =
            serde_json::from_slice(&bytes).map_err(GenerateError::Decode)?;
        let inline = parsed.into_first_image().ok_or(GenerateError::NoImage)?;
        let image_b64 = inline.data.ok_or(GenerateError::NoImage)?;
        Ok(GeneratedImage {
            image_b64,
            mime_type: inline.mime_type,
        })
    }
}
