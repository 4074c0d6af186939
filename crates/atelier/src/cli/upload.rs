//! The `atelier upload` command: push files from disk through the pipeline.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use atelier_core::multipart::{FilePart, UPLOAD_FIELD};
use atelier_core::pipeline::{DiscoveredFile, FileDiscovery};
use atelier_core::{
    BatchFailure, BatchOutcome, Config, PageFolder, UploadError, UploadPipeline, UploadRequest,
};
use clap::Args;

/// Arguments for the `upload` command.
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Image file or directory to upload
    #[arg(required = true)]
    pub input: PathBuf,

    /// Site page the images belong to (home, about, journal, portfolio, general)
    #[arg(long)]
    pub page: Option<String>,

    /// Portfolio section (required when --page is portfolio)
    #[arg(long)]
    pub section: Option<String>,

    /// Also store the untouched originals
    #[arg(long)]
    pub keep_original: bool,

    /// Write results to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn execute(args: UploadArgs, config: Config) -> anyhow::Result<()> {
    let input = Config::expand_path(&args.input.to_string_lossy());
    if !input.exists() {
        anyhow::bail!("Input path does not exist: {}", input.display());
    }

    let folder = PageFolder::resolve(args.page.as_deref(), args.section.as_deref())?;
    let pipeline = UploadPipeline::from_config(&config)?;
    let discovery = FileDiscovery::new(pipeline.policy().clone());

    let files = discovery.discover(&input);
    if files.is_empty() {
        anyhow::bail!("No uploadable images found at {}", input.display());
    }
    tracing::info!(
        "Found {} images ({:.1} MB) for {}",
        files.len(),
        FileDiscovery::total_size(&files) as f64 / 1_000_000.0,
        folder
    );

    let start = Instant::now();
    let outcome = if input.is_file() {
        upload_all(&pipeline, &discovery, files, folder, args.keep_original, None).await
    } else {
        let progress = create_progress_bar(files.len() as u64);
        let outcome = upload_all(
            &pipeline,
            &discovery,
            files,
            folder,
            args.keep_original,
            Some(&progress),
        )
        .await;
        progress.finish_and_clear();
        outcome
    };

    let json = serde_json::to_string_pretty(&outcome)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)?;
            tracing::info!("Output written to {:?}", path);
        }
        None => println!("{json}"),
    }
    print_summary(&outcome, start.elapsed());

    if !outcome.is_complete() {
        anyhow::bail!("{} of the uploads failed", outcome.failed.len());
    }
    Ok(())
}

/// Upload files one at a time, in discovery order.
async fn upload_all(
    pipeline: &UploadPipeline,
    discovery: &FileDiscovery,
    files: Vec<DiscoveredFile>,
    folder: PageFolder,
    keep_original: bool,
    progress: Option<&indicatif::ProgressBar>,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for file in files {
        let name = file_name(&file.path);
        let result = match read_part(pipeline, discovery, &file).await {
            Ok(part) => {
                pipeline
                    .upload(UploadRequest {
                        file: part,
                        folder,
                        keep_original,
                    })
                    .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(uploaded) => {
                if let Some(pb) = progress {
                    pb.set_message(uploaded.filename.clone());
                }
                outcome.succeeded.push(uploaded);
            }
            Err(e) => {
                tracing::error!("Failed: {:?} - {}", file.path, e);
                outcome.failed.push(BatchFailure::new(name, &e));
            }
        }

        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    outcome
}

/// Load a file from disk as if it had arrived in an upload form.
///
/// Files over the size limit are rejected before they are read.
async fn read_part(
    pipeline: &UploadPipeline,
    discovery: &FileDiscovery,
    file: &DiscoveredFile,
) -> Result<FilePart, UploadError> {
    let path = file.path.as_path();
    pipeline.policy().check_size(file.size)?;
    let data = tokio::fs::read(path)
        .await
        .map_err(|source| UploadError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
    let content_type = discovery
        .content_type(path)
        .unwrap_or("application/octet-stream")
        .to_string();

    Ok(FilePart {
        field_name: UPLOAD_FIELD.to_string(),
        filename: file_name(path),
        content_type,
        data,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

fn print_summary(outcome: &BatchOutcome, elapsed: Duration) {
    let stored: u64 = outcome.succeeded.iter().map(|o| o.size).sum();
    let originals = outcome
        .succeeded
        .iter()
        .filter(|o| o.original_path.is_some())
        .count();

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Uploaded:     {:>8}", outcome.succeeded.len());
    if originals > 0 {
        eprintln!("    Originals:    {:>8}", originals);
    }
    if !outcome.failed.is_empty() {
        eprintln!("    Failed:       {:>8}", outcome.failed.len());
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Stored:       {:>7.1} MB", stored as f64 / 1_000_000.0);
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("  ====================================");
}
