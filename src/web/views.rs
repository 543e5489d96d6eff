use axum::extract::rejection::JsonRejection;

use super::images::{Delivery, file_response};
use super::prelude::*;
use crate::constants::{DEFAULT_HEIGHT, DEFAULT_PROMPT, DEFAULT_WIDTH, MODEL_LABEL};
use crate::gallery::{CatalogEntry, SaveRequest, SaveResult};
use crate::generator::GeneratedImage;

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub(crate) struct IndexTemplate {
    pub(crate) model_label: &'static str,
    pub(crate) has_api_key: bool,
    pub(crate) default_width: u32,
    pub(crate) default_height: u32,
}

#[derive(Deserialize)]
pub(crate) struct GenerateForm {
    prompt: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct SaveImageForm {
    image_b64: Option<String>,
    prompt: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Serialize)]
pub(crate) struct ImageList {
    images: Vec<CatalogEntry>,
}

fn bad_json(rejection: &JsonRejection) -> StudioError {
    StudioError::BadRequest(rejection.body_text())
}

/// handles the / GET
pub(crate) async fn root_handler(State(state): State<AppState>) -> IndexTemplate {
    IndexTemplate {
        model_label: MODEL_LABEL,
        has_api_key: state.generator.check_configured().is_ok(),
        default_width: DEFAULT_WIDTH,
        default_height: DEFAULT_HEIGHT,
    }
}

/// Relays the generated payload without persisting it.
pub(crate) async fn generate_handler(
    State(state): State<AppState>,
    payload: Result<Json<GenerateForm>, JsonRejection>,
) -> Result<Json<GeneratedImage>, StudioError> {
    state.generator.check_configured()?;
    let Json(form) = payload.map_err(|err| bad_json(&err))?;
    let prompt = form
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|prompt| !prompt.is_empty())
        .ok_or_else(|| StudioError::BadRequest("Prompt missing".to_string()))?;

    let image = state.generator.generate(prompt).await?;
    info!("Generated image for a {} character prompt", prompt.len());
    Ok(Json(image))
}

pub(crate) async fn save_image_handler(
    State(state): State<AppState>,
    payload: Result<Json<SaveImageForm>, JsonRejection>,
) -> Result<Json<SaveResult>, StudioError> {
    let Json(form) = payload.map_err(|err| bad_json(&err))?;
    let request = SaveRequest {
        image_b64: form.image_b64.unwrap_or_default(),
        prompt: form.prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
        width: form.width.unwrap_or(DEFAULT_WIDTH),
        height: form.height.unwrap_or(DEFAULT_HEIGHT),
    };
    let result = state.gallery.save(&request).await?;
    Ok(Json(result))
}

pub(crate) async fn list_images_handler(
    State(state): State<AppState>,
) -> Result<Json<ImageList>, StudioError> {
    let images = state.gallery.list().await?;
    debug!("Catalog has {} images", images.len());
    Ok(Json(ImageList { images }))
}

pub(crate) async fn serve_image_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(filename): Path<String>,
) -> Result<Response, StudioError> {
    let path = state.gallery.file_path(&filename)?;
    file_response(&path, &filename, &headers, Delivery::Inline).await
}

pub(crate) async fn download_image_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(filename): Path<String>,
) -> Result<Response, StudioError> {
    let path = state.gallery.file_path(&filename)?;
    file_response(&path, &filename, &headers, Delivery::Attachment).await
}
