use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose;
use genstudio::config::setup_logging;
use genstudio::constants::{METADATA_FILE_NAME, MODEL_LABEL};
use genstudio::gallery::{Gallery, GalleryError, SaveRequest};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};

fn request(image_b64: String, width: u32, height: u32) -> SaveRequest {
    SaveRequest {
        image_b64,
        prompt: "sunset".to_string(),
        width,
        height,
    }
}

fn png_b64(width: u32, height: u32) -> String {
    let mut output = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 120, 40])))
        .write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
        .expect("encode png");
    general_purpose::STANDARD.encode(output)
}

#[tokio::test]
async fn valid_images_come_out_at_the_requested_size() {
    let _ = setup_logging(true);
    let dir = tempfile::tempdir().expect("tempdir");
    let gallery = Gallery::open(dir.path()).await.expect("open");
    let pattern = regex::Regex::new(r"^image_[0-9a-f]{8}_\d+\.png$").expect("regex");

    for (source, target) in [((64, 64), (512, 768)), ((300, 50), (40, 40)), ((7, 90), (90, 7))] {
        let saved = gallery
            .save(&request(png_b64(source.0, source.1), target.0, target.1))
            .await
            .expect("save");
        assert!(pattern.is_match(&saved.filename), "{}", saved.filename);
        assert_eq!((saved.width, saved.height), target);

        let path = gallery.image_dir().join(&saved.filename);
        let written = image::open(&path).expect("open written image");
        assert_eq!(written.dimensions(), target);
        assert_eq!(
            saved.file_size,
            std::fs::metadata(&path).expect("stat").len()
        );

        let record = gallery
            .metadata()
            .load()
            .await
            .remove(&saved.filename)
            .expect("metadata entry");
        assert_eq!((record.width, record.height), target);
        assert_eq!(record.model, MODEL_LABEL);
        assert_eq!(record.generation_time, 0.0);
    }
}

#[tokio::test]
async fn non_image_bytes_are_written_verbatim() {
    let dir = tempfile::tempdir().expect("tempdir");
    let gallery = Gallery::open(dir.path()).await.expect("open");

    let saved = gallery
        .save(&request(general_purpose::STANDARD.encode(b"PNGDATA"), 512, 768))
        .await
        .expect("save");
    assert_eq!((saved.width, saved.height), (512, 768));
    assert_eq!(saved.file_size, 7);

    let bytes = tokio::fs::read(gallery.image_dir().join(&saved.filename))
        .await
        .expect("read back");
    assert_eq!(bytes, b"PNGDATA");

    let listed = gallery.list().await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].width, Some(512));
    assert_eq!(listed[0].height, Some(768));
    assert_eq!(listed[0].prompt, "sunset");
}

#[tokio::test]
async fn invalid_base64_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let gallery = Gallery::open(dir.path()).await.expect("open");

    let result = gallery
        .save(&request("this is not base64 @@".to_string(), 10, 10))
        .await;
    assert!(matches!(result, Err(GalleryError::InvalidEncoding(_))));
    assert!(gallery.list().await.expect("list").is_empty());
    assert!(gallery.metadata().load().await.is_empty());
    assert!(!dir.path().join(METADATA_FILE_NAME).exists());
}

#[tokio::test]
async fn listing_is_newest_first_and_repeatable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let gallery = Gallery::open(dir.path()).await.expect("open");

    let mut saved = Vec::new();
    for _ in 0..3 {
        saved.push(
            gallery
                .save(&request(png_b64(4, 4), 4, 4))
                .await
                .expect("save")
                .filename,
        );
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let first = gallery.list().await.expect("list");
    let second = gallery.list().await.expect("list");
    assert_eq!(first, second);

    let listed: Vec<String> = first.into_iter().map(|entry| entry.filename).collect();
    saved.reverse();
    assert_eq!(listed, saved);
}

#[tokio::test]
async fn save_proceeds_over_corrupt_metadata() {
    let dir = tempfile::tempdir().expect("tempdir");
    let gallery = Gallery::open(dir.path()).await.expect("open");
    let first = gallery
        .save(&request(png_b64(4, 4), 4, 4))
        .await
        .expect("first save");

    tokio::fs::write(gallery.metadata().path(), b"\x00\x01 not json")
        .await
        .expect("corrupt");

    let second = gallery
        .save(&request(png_b64(4, 4), 8, 8))
        .await
        .expect("second save");
    assert!(second.warnings.is_empty());

    let metadata = gallery.metadata().load().await;
    assert!(metadata.contains_key(&second.filename));
    assert!(!metadata.contains_key(&first.filename));
}

#[tokio::test]
async fn other_image_formats_are_normalized_to_png() {
    let dir = tempfile::tempdir().expect("tempdir");
    let gallery = Gallery::open(dir.path()).await.expect("open");

    let mut gif = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([0, 0, 0])))
        .write_to(&mut Cursor::new(&mut gif), ImageFormat::Gif)
        .expect("encode gif");

    let saved = gallery
        .save(&request(general_purpose::STANDARD.encode(&gif), 16, 8))
        .await
        .expect("save");
    let bytes = tokio::fs::read(gallery.image_dir().join(&saved.filename))
        .await
        .expect("read back");
    assert_ne!(bytes, gif);
    assert_eq!(image::guess_format(&bytes).expect("format"), ImageFormat::Png);
    let written = image::load_from_memory(&bytes).expect("decode written");
    assert_eq!(written.dimensions(), (16, 8));
}

#[tokio::test]
async fn unwritable_metadata_is_a_warning() {
    let dir = tempfile::tempdir().expect("tempdir");
    let gallery = Gallery::open(dir.path()).await.expect("open");
    tokio::fs::create_dir(gallery.metadata().path())
        .await
        .expect("block metadata path");

    let saved = gallery
        .save(&request(png_b64(4, 4), 8, 8))
        .await
        .expect("save still succeeds");
    assert!(saved.success);
    assert_eq!(saved.warnings.len(), 1);
    assert!(
        gallery.image_dir().join(&saved.filename).is_file(),
        "image should stay on disk"
    );

    let listed = gallery.list().await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].filename, saved.filename);
    assert_eq!(listed[0].width, None);
}
