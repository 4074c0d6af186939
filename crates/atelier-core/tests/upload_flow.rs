//! End-to-end upload flows against the in-memory store.

use std::io::Cursor;
use std::sync::Arc;

use atelier_core::config::Config;
use atelier_core::multipart::{self, FilePart, MultipartForm};
use atelier_core::{
    MemoryStore, PageFolder, PortfolioSection, StorageTarget, UploadError, UploadPipeline,
    UploadRequest, ValidationRule,
};
use image::{DynamicImage, ImageFormat};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::new_rgb8(width, height)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

fn png_part(filename: &str, width: u32, height: u32) -> FilePart {
    FilePart {
        field_name: "file".into(),
        filename: filename.into(),
        content_type: "image/png".into(),
        data: png_bytes(width, height),
    }
}

fn pipeline() -> (UploadPipeline, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let pipeline = UploadPipeline::new(&Config::default(), store.clone());
    (pipeline, store)
}

fn request(file: FilePart, folder: PageFolder, keep_original: bool) -> UploadRequest {
    UploadRequest {
        file,
        folder,
        keep_original,
    }
}

#[tokio::test]
async fn test_multipart_body_to_stored_image() {
    let (pipeline, store) = pipeline();

    let mut form = MultipartForm::default();
    form.fields.insert("page".into(), "portfolio".into());
    form.fields.insert("section".into(), "weddings".into());
    form.fields.insert("keepOriginal".into(), "true".into());
    form.files.push(png_part("Big Day.png", 3000, 2000));
    let body = multipart::encode(&form, "XyZ");

    let mut decoded = multipart::decode(&body, &multipart::content_type_for("XyZ")).unwrap();
    let folder = PageFolder::resolve(decoded.field("page"), decoded.field("section")).unwrap();
    assert_eq!(folder, PageFolder::Portfolio(PortfolioSection::Weddings));
    let keep_original = decoded.flag("keepOriginal");
    let file = decoded.take_upload_file().unwrap();

    let outcome = pipeline
        .upload(request(file, folder, keep_original))
        .await
        .unwrap();

    assert_eq!((outcome.width, outcome.height), (2000, 1333));
    assert!(outcome.optimized_path.starts_with("portfolio/weddings/Big_Day_"));
    assert!(outcome.optimized_path.ends_with(".jpg"));
    assert!(outcome.filename.ends_with(".jpg"));
    assert!(outcome.optimized_path.ends_with(&outcome.filename));

    let optimized = store
        .get("portfolio-images", &outcome.optimized_path)
        .unwrap();
    assert_eq!(optimized.content_type, "image/jpeg");
    assert_eq!(optimized.data.len() as u64, outcome.size);
    let decoded_output = image::load_from_memory(&optimized.data).unwrap();
    assert_eq!(decoded_output.width(), 2000);

    let original_path = outcome.original_path.clone().unwrap();
    assert!(original_path.ends_with(".png"));
    let original = store.get("portfolio-originals", &original_path).unwrap();
    assert_eq!(original.content_type, "image/png");
    assert_eq!(original.data, png_bytes(3000, 2000));
    assert_eq!(
        outcome.original_url.as_deref(),
        Some(format!("memory://portfolio-originals/{original_path}").as_str())
    );
}

#[tokio::test]
async fn test_same_name_concurrent_uploads_get_distinct_keys() {
    let (pipeline, store) = pipeline();

    let (a, b) = tokio::join!(
        pipeline.upload(request(png_part("dup.png", 32, 32), PageFolder::Home, false)),
        pipeline.upload(request(png_part("dup.png", 32, 32), PageFolder::Home, false)),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a.optimized_path, b.optimized_path);
    assert_eq!(store.keys("portfolio-images").len(), 2);
    assert!(a.original_url.is_none());
    assert!(store.keys("portfolio-originals").is_empty());
}

#[tokio::test]
async fn test_optimized_write_failure_skips_original() {
    let (pipeline, store) = pipeline();
    store.fail_writes_to("portfolio-images");

    let err = pipeline
        .upload(request(png_part("a.png", 16, 16), PageFolder::About, true))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        UploadError::StorageWriteFailed {
            target: StorageTarget::Optimized,
            ..
        }
    ));
    assert_eq!(err.status_code(), 500);
    let attempts = store.upload_attempts();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].0, "portfolio-images");
}

#[tokio::test]
async fn test_original_write_failure_still_succeeds() {
    let (pipeline, store) = pipeline();
    store.fail_writes_to("portfolio-originals");

    let outcome = pipeline
        .upload(request(png_part("a.png", 16, 16), PageFolder::Journal, true))
        .await
        .unwrap();

    assert!(outcome.original_url.is_none());
    assert!(outcome.original_path.is_none());
    assert!(store.get("portfolio-images", &outcome.optimized_path).is_some());
    assert_eq!(store.upload_attempts().len(), 2);
}

#[tokio::test]
async fn test_validation_failure_touches_no_storage() {
    let (pipeline, store) = pipeline();
    let mut file = png_part("anim.gif", 16, 16);
    file.content_type = "image/png".into();

    let err = pipeline
        .upload(request(file, PageFolder::General, true))
        .await
        .unwrap_err();

    assert_eq!(err.rule(), Some(ValidationRule::Extension));
    assert!(store.upload_attempts().is_empty());
}

#[tokio::test]
async fn test_batch_partitions_results() {
    let (pipeline, store) = pipeline();
    let mut bad = png_part("broken.png", 16, 16);
    bad.data.truncate(40);

    let outcome = pipeline
        .upload_batch(vec![
            request(png_part("one.png", 16, 16), PageFolder::Home, false),
            request(bad, PageFolder::Home, false),
            request(png_part("two.png", 16, 16), PageFolder::Home, false),
        ])
        .await
        .unwrap();

    assert!(!outcome.is_complete());
    assert_eq!(outcome.succeeded.len(), 2);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].filename, "broken.png");
    assert_eq!(outcome.failed[0].error, "Image processing failed");
    assert!(outcome.succeeded[0].optimized_path.contains("one_"));
    assert!(outcome.succeeded[1].optimized_path.contains("two_"));
    assert_eq!(store.keys("portfolio-images").len(), 2);
}

#[tokio::test]
async fn test_batch_limits() {
    let (pipeline, _store) = pipeline();

    let err = pipeline.upload_batch(Vec::new()).await.unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::File));

    let too_many = (0..21)
        .map(|i| request(png_part(&format!("{i}.png"), 4, 4), PageFolder::Home, false))
        .collect();
    let err = pipeline.upload_batch(too_many).await.unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::Count));
}

#[tokio::test]
async fn test_remove_targets_the_right_bucket() {
    let (pipeline, store) = pipeline();
    let outcome = pipeline
        .upload(request(png_part("a.png", 8, 8), PageFolder::Home, true))
        .await
        .unwrap();
    let original_path = outcome.original_path.unwrap();

    pipeline
        .remove(StorageTarget::Original, &original_path)
        .await
        .unwrap();
    assert!(store.get("portfolio-originals", &original_path).is_none());
    assert!(store.get("portfolio-images", &outcome.optimized_path).is_some());

    assert!(pipeline
        .remove(StorageTarget::Original, &original_path)
        .await
        .is_err());
}
