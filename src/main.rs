use clap::Parser;
use genstudio::config::{GeneratorConfig, setup_logging};
use genstudio::gallery::Gallery;
use genstudio::generator::GeminiClient;
use genstudio::web::AppState;
use tracing::{error, warn};

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = genstudio::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return;
    }

    let config = match GeneratorConfig::from_options(&cli.gemini) {
        Ok(config) => config,
        Err(err) => {
            error!("Invalid Gemini API base URL: {}", err);
            return;
        }
    };
    if config.api_key.is_none() {
        warn!("GEMINI_API_KEY not set, /generate will fail until it is configured");
    }

    let generator = match GeminiClient::new(&config) {
        Ok(generator) => generator,
        Err(err) => {
            error!("Failed to set up the Gemini client: {}", err);
            return;
        }
    };

    let gallery = match Gallery::open(&cli.image_dir).await {
        Ok(gallery) => gallery,
        Err(err) => {
            error!(
                "Failed to open image directory {}: {}",
                cli.image_dir.display(),
                err
            );
            return;
        }
    };

    if let Err(err) = genstudio::web::setup_server(
        &cli.listen_address,
        cli.port,
        &cli.static_dir,
        AppState::new(gallery, generator),
    )
    .await
    {
        error!("Application error: {}", err);
    }
}
