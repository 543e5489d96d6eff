use anyhow::{Context, Result};
use clap::Parser;
use genstudio::cli::GeminiOptions;
use genstudio::config::{GeneratorConfig, setup_logging};
use genstudio::constants::{DEFAULT_HEIGHT, DEFAULT_IMAGE_DIR, DEFAULT_WIDTH};
use genstudio::gallery::{Gallery, SaveRequest};
use genstudio::generator::GeminiClient;
use std::path::PathBuf;

/// Generate one image from a prompt and save it into the gallery.
///
/// Minimal UX:
///   gemini_generate "a lighthouse at dusk" --width 768 --height 512
#[derive(Parser, Debug)]
#[command(name = "gemini_generate")]
struct Args {
    /// What to draw
    prompt: String,

    /// Output width in pixels
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    width: u32,

    /// Output height in pixels
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    height: u32,

    /// Gallery directory, shared with the web server
    #[arg(long, default_value = DEFAULT_IMAGE_DIR, env = "GENSTUDIO_IMAGE_DIR")]
    image_dir: PathBuf,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    #[command(flatten)]
    gemini: GeminiOptions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.debug).map_err(|err| anyhow::anyhow!(err))?;

    let config =
        GeneratorConfig::from_options(&args.gemini).context("Invalid Gemini API base URL")?;
    let client = GeminiClient::new(&config).context("Failed to set up the Gemini client")?;
    let gallery = Gallery::open(&args.image_dir)
        .await
        .with_context(|| format!("Failed to open {}", args.image_dir.display()))?;

    let generated = client
        .generate(&args.prompt)
        .await
        .context("Image generation failed")?;

    let saved = gallery
        .save(&SaveRequest {
            image_b64: generated.image_b64,
            prompt: args.prompt.clone(),
            width: args.width,
            height: args.height,
        })
        .await
        .context("Failed to save image")?;

    for warning in &saved.warnings {
        eprintln!("Warning: {warning}");
    }
    eprintln!(
        "Saved: {} ({}x{}, {} bytes)",
        gallery.image_dir().join(&saved.filename).display(),
        saved.width,
        saved.height,
        saved.file_size
    );
    Ok(())
}
