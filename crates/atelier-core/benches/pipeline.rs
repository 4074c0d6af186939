//! Benchmarks for the Atelier upload pipeline.
//!
//! Run with: cargo bench -p atelier-core

use std::io::Cursor;

use atelier_core::config::{LimitsConfig, TranscodeConfig, UploadConfig};
use atelier_core::multipart::{self, FilePart, MultipartForm};
use atelier_core::pipeline::{FilenameGenerator, Transcoder, UploadPolicy};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, ImageFormat};

const BOUNDARY: &str = "----AtelierBench";

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::new_rgb8(width, height)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

fn benchmark_multipart_decode(c: &mut Criterion) {
    let mut form = MultipartForm::default();
    form.fields.insert("page".into(), "portfolio".into());
    form.fields.insert("section".into(), "weddings".into());
    form.files.push(FilePart {
        field_name: "file".into(),
        filename: "large.png".into(),
        content_type: "image/png".into(),
        data: vec![0x5A; 8 * 1024 * 1024],
    });
    let body = multipart::encode(&form, BOUNDARY);
    let content_type = multipart::content_type_for(BOUNDARY);

    c.bench_function("multipart_decode_8mb", |b| {
        b.iter(|| {
            let _ = multipart::decode(black_box(&body), black_box(&content_type));
        })
    });
}

fn benchmark_validate(c: &mut Criterion) {
    let policy = UploadPolicy::new(&LimitsConfig::default(), &UploadConfig::default());
    let data = png_bytes(64, 64);

    c.bench_function("validate_upload", |b| {
        b.iter(|| {
            let _ = policy.validate(black_box("photo.png"), black_box("image/png"), &data);
        })
    });
}

fn benchmark_unique_name(c: &mut Criterion) {
    let generator = FilenameGenerator::new(50);

    c.bench_function("unique_name", |b| {
        b.iter(|| generator.unique_name(black_box("../My Summer Photo (1).JPG")))
    });
}

fn benchmark_transcode(c: &mut Criterion) {
    let transcoder = Transcoder::new(TranscodeConfig::default(), LimitsConfig::default());
    let input = png_bytes(3000, 2000);
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("transcode");
    group.sample_size(10);
    group.bench_function("png_3000x2000_to_jpeg_2000w", |b| {
        b.iter(|| {
            let _ = rt.block_on(transcoder.transcode(black_box(input.clone())));
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_multipart_decode,
    benchmark_validate,
    benchmark_unique_name,
    benchmark_transcode,
);
criterion_main!(benches);
