use std::io::ErrorKind;
use std::path::Path as StdPath;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::header::{
    CACHE_CONTROL, CONTENT_DISPOSITION, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED,
};
use axum::http::response::Builder;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header::CONTENT_TYPE};
use axum::response::Response;
use httpdate::{fmt_http_date, parse_http_date};

use crate::constants::IMAGE_CACHE_CONTROL;
use crate::error::StudioError;

/// How a stored file is handed to the client.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Delivery {
    /// Shown in the browser, typed by extension
    Inline,
    /// Saved by the browser under its own name
    Attachment,
}

/// Cache headers derived from file metadata.
#[derive(Clone, Debug)]
pub(crate) struct ImageCacheHeaders {
    etag: Option<HeaderValue>,
    last_modified: Option<HeaderValue>,
    modified_at: Option<SystemTime>,
}

impl ImageCacheHeaders {
    /// Builds cache headers from filesystem metadata.
    pub(crate) fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        let modified_at = metadata.modified().ok();
        let etag = build_etag(metadata.len(), modified_at);
        let last_modified =
            modified_at.and_then(|modified| HeaderValue::from_str(&fmt_http_date(modified)).ok());
        Self {
            etag,
            last_modified,
            modified_at,
        }
    }
}

/// Applies image cache headers to a response builder.
fn apply_cache_headers(mut builder: Builder, cache: &ImageCacheHeaders) -> Builder {
    builder = builder.header(CACHE_CONTROL, IMAGE_CACHE_CONTROL.as_str());
    if let Some(etag) = &cache.etag {
        builder = builder.header(ETAG, etag.clone());
    }
    if let Some(last_modified) = &cache.last_modified {
        builder = builder.header(LAST_MODIFIED, last_modified.clone());
    }
    builder
}

/// Returns true when the request matches a not-modified response.
fn is_not_modified(headers: &HeaderMap, cache: &ImageCacheHeaders) -> bool {
    if let Some(if_none_match) = headers.get(IF_NONE_MATCH) {
        if let Ok(value) = if_none_match.to_str() {
            let value = value.trim();
            if value == "*" {
                return true;
            }
            if let Some(etag) = cache.etag.as_ref().and_then(|value| value.to_str().ok())
                && value.split(',').any(|candidate| candidate.trim() == etag)
            {
                return true;
            }
        }
        return false;
    }

    if let (Some(if_modified_since), Some(modified_at)) =
        (headers.get(IF_MODIFIED_SINCE), cache.modified_at)
        && let Ok(value) = if_modified_since.to_str()
        && let Ok(since) = parse_http_date(value)
        && modified_at <= since
    {
        return true;
    }

    false
}

fn build_etag(size: u64, modified_at: Option<SystemTime>) -> Option<HeaderValue> {
    let suffix = match modified_at {
        Some(modified) => modified
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_secs().to_string())
            .unwrap_or_else(|_| "0".to_string()),
        None => "0".to_string(),
    };
    let value = format!("W/\"{}-{}\"", size, suffix);
    HeaderValue::from_str(&value).ok()
}

/// Content type from the file extension; raw-fallback files may not really be PNGs.
fn content_type_for(filename: &str) -> &'static str {
    let extension = StdPath::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

/// Reads a stored file into a response, honoring conditional request headers.
pub(crate) async fn file_response(
    path: &StdPath,
    filename: &str,
    request_headers: &HeaderMap,
    delivery: Delivery,
) -> Result<Response, StudioError> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => return Err(StudioError::NotFound(filename.to_string())),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(StudioError::NotFound(filename.to_string()));
        }
        Err(err) => return Err(StudioError::InternalServerError(err.to_string())),
    };

    let cache_headers = ImageCacheHeaders::from_metadata(&metadata);
    if is_not_modified(request_headers, &cache_headers) {
        let builder = Response::builder().status(StatusCode::NOT_MODIFIED);
        return apply_cache_headers(builder, &cache_headers)
            .body(Body::empty())
            .map_err(StudioError::from);
    }

    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(StudioError::NotFound(filename.to_string()));
        }
        Err(err) => return Err(StudioError::InternalServerError(err.to_string())),
    };

    let mut builder = Response::builder();
    builder = match delivery {
        Delivery::Inline => builder.header(CONTENT_TYPE, content_type_for(filename)),
        Delivery::Attachment => {
            let disposition = HeaderValue::from_str(&format!(
                "attachment; filename=\"{}\"",
                filename.replace(['"', '\r', '\n'], "_")
            ))
            .map_err(|err| StudioError::InternalServerError(err.to_string()))?;
            builder
                .header(CONTENT_TYPE, "application/octet-stream")
                .header(CONTENT_DISPOSITION, disposition)
        }
    };
    builder = apply_cache_headers(builder, &cache_headers);
    builder.body(Body::from(bytes)).map_err(StudioError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for("image_0123abcd_1.png"), "image/png");
        assert_eq!(content_type_for("photo.JPG"), "image/jpeg");
        assert_eq!(content_type_for("metadata.json"), "application/json");
        assert_eq!(content_type_for("blob"), "application/octet-stream");
    }

    #[test]
    fn etag_matches_if_none_match() {
        let cache = ImageCacheHeaders {
            etag: build_etag(10, Some(UNIX_EPOCH + std::time::Duration::from_secs(42))),
            last_modified: None,
            modified_at: None,
        };
        let mut headers = HeaderMap::new();
        headers.insert(IF_NONE_MATCH, HeaderValue::from_static("\"x\", W/\"10-42\""));
        assert!(is_not_modified(&headers, &cache));

        headers.insert(IF_NONE_MATCH, HeaderValue::from_static("W/\"10-43\""));
        assert!(!is_not_modified(&headers, &cache));
    }

    #[test]
    fn if_modified_since_uses_mtime() {
        let modified = UNIX_EPOCH + std::time::Duration::from_secs(1_700_000_000);
        let cache = ImageCacheHeaders {
            etag: None,
            last_modified: None,
            modified_at: Some(modified),
        };
        let mut headers = HeaderMap::new();
        let later = fmt_http_date(modified + std::time::Duration::from_secs(60));
        headers.insert(
            IF_MODIFIED_SINCE,
            HeaderValue::from_str(&later).expect("header"),
        );
        assert!(is_not_modified(&headers, &cache));

        let earlier = fmt_http_date(modified - std::time::Duration::from_secs(60));
        headers.insert(
            IF_MODIFIED_SINCE,
            HeaderValue::from_str(&earlier).expect("header"),
        );
        assert!(!is_not_modified(&headers, &cache));
    }
}
