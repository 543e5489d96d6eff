//! HTTP surface: routes, shared state and server startup.

use std::num::NonZeroU16;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::gallery::Gallery;
use crate::generator::GeminiClient;

mod images;
mod prelude;
mod views;

use views::{
    download_image_handler, generate_handler, list_images_handler, root_handler,
    save_image_handler, serve_image_handler,
};

/// State shared by every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    gallery: Arc<Gallery>,
    generator: Arc<GeminiClient>,
}

impl AppState {
    /// Bundles the gallery and the generation client.
    pub fn new(gallery: Gallery, generator: GeminiClient) -> Self {
        Self {
            gallery: Arc::new(gallery),
            generator: Arc::new(generator),
        }
    }
}

/// Builds the router; static assets come from `static_dir`.
pub fn create_router(static_dir: &Path) -> Router<AppState> {
    Router::new()
        .route("/", get(root_handler))
        .route("/generate", post(generate_handler))
        .route("/save_image", post(save_image_handler))
        .route("/images", get(list_images_handler))
        .route("/generated_images/{filename}", get(serve_image_handler))
        .route("/download/{filename}", get(download_image_handler))
        .nest_service("/static", ServeDir::new(static_dir))
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutting down");
}

/// Binds the listener and serves until Ctrl-C or SIGTERM.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    static_dir: &Path,
    state: AppState,
) -> Result<(), anyhow::Error> {
    let app = create_router(static_dir).with_state(state);

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}
