//! Pipeline orchestration - wires together all upload stages.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use tokio::sync::Semaphore;

use crate::config::{BatchConfig, Config};
use crate::error::{ConfigError, StorageError, StorageTarget, UploadError, UploadResult, ValidationRule};
use crate::folders::PageFolder;
use crate::multipart::FilePart;
use crate::storage::{create_store, ObjectStore};
use crate::types::{BatchFailure, BatchOutcome, UploadOutcome};

use super::filename::{original_extension, FilenameGenerator};
use super::transcode::{Transcoder, OUTPUT_CONTENT_TYPE, OUTPUT_EXTENSION};
use super::validate::{normalize_mime, UploadPolicy};

/// Progress of a single upload, reported in log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Received,
    Validated,
    Processed,
    StoredOptimized,
    StoredOriginal,
    Succeeded,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadStage::Received => "received",
            UploadStage::Validated => "validated",
            UploadStage::Processed => "processed",
            UploadStage::StoredOptimized => "stored_optimized",
            UploadStage::StoredOriginal => "stored_original",
            UploadStage::Succeeded => "succeeded",
        };
        f.write_str(name)
    }
}

/// One file to upload and where to put it.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file: FilePart,
    pub folder: PageFolder,
    /// Also store the untouched input in the private bucket
    pub keep_original: bool,
}

/// The upload pipeline: validate, name, transcode, store.
pub struct UploadPipeline {
    policy: UploadPolicy,
    names: FilenameGenerator,
    transcoder: Transcoder,
    store: Arc<dyn ObjectStore>,
    optimized_bucket: String,
    original_bucket: String,
    batch: BatchConfig,
}

impl UploadPipeline {
    /// Create a pipeline over an existing store.
    pub fn new(config: &Config, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            policy: UploadPolicy::new(&config.limits, &config.upload),
            names: FilenameGenerator::new(config.upload.max_filename_length),
            transcoder: Transcoder::new(config.transcode.clone(), config.limits.clone()),
            store,
            optimized_bucket: config.storage.optimized_bucket.clone(),
            original_bucket: config.storage.original_bucket.clone(),
            batch: config.batch.clone(),
        }
    }

    /// Create a pipeline with the store named in `[storage]`.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let store = create_store(&config.storage)?;
        tracing::info!(backend = store.name(), "Storage backend ready");
        Ok(Self::new(config, store))
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Maximum files accepted by [`UploadPipeline::upload_batch`].
    pub fn max_batch_files(&self) -> usize {
        self.batch.max_files
    }

    /// Run one upload through every stage.
    pub async fn upload(&self, request: UploadRequest) -> UploadResult<UploadOutcome> {
        let filename = request.file.filename.clone();
        let mut stage = UploadStage::Received;
        let result = self.run(request, &mut stage).await;
        if let Err(e) = &result {
            tracing::warn!(file = %filename, %stage, error = %e, "Upload failed");
        }
        result
    }

    async fn run(
        &self,
        request: UploadRequest,
        stage: &mut UploadStage,
    ) -> UploadResult<UploadOutcome> {
        let start = Instant::now();
        let UploadRequest {
            file,
            folder,
            keep_original,
        } = request;
        tracing::debug!(
            file = %file.filename,
            size = file.data.len(),
            %folder,
            keep_original,
            %stage,
            "Upload received"
        );

        self.policy
            .validate(&file.filename, &file.content_type, &file.data)?;
        *stage = UploadStage::Validated;
        tracing::trace!(%stage, elapsed = ?start.elapsed());

        let input_bytes = file.data.len();
        let unique = self.names.unique_name(&file.filename);
        let original_content_type = normalize_mime(&file.content_type);
        let original_ext = original_extension(&file.filename);
        let (input, original) = if keep_original {
            (file.data.clone(), Some(file.data))
        } else {
            (file.data, None)
        };

        let transcoded = self.transcoder.transcode(input).await?;
        *stage = UploadStage::Processed;
        tracing::trace!(
            %stage,
            width = transcoded.width,
            height = transcoded.height,
            elapsed = ?start.elapsed()
        );

        let stored_name = format!("{unique}.{OUTPUT_EXTENSION}");
        let optimized_path = format!("{}/{stored_name}", folder.path());
        let size = transcoded.data.len() as u64;
        self.store
            .upload(
                &self.optimized_bucket,
                &optimized_path,
                transcoded.data,
                OUTPUT_CONTENT_TYPE,
            )
            .await
            .map_err(|source| UploadError::StorageWriteFailed {
                target: StorageTarget::Optimized,
                source,
            })?;
        *stage = UploadStage::StoredOptimized;
        let optimized_url = self.store.public_url(&self.optimized_bucket, &optimized_path);
        tracing::trace!(%stage, path = %optimized_path, elapsed = ?start.elapsed());

        let mut original_url = None;
        let mut original_path = None;
        if let Some(bytes) = original {
            let path = format!("{}/{unique}{original_ext}", folder.path());
            match self
                .store
                .upload(&self.original_bucket, &path, bytes, &original_content_type)
                .await
            {
                Ok(()) => {
                    *stage = UploadStage::StoredOriginal;
                    original_url = Some(self.store.public_url(&self.original_bucket, &path));
                    original_path = Some(path);
                }
                Err(e) => {
                    // The optimized copy is what the site serves; keep the upload.
                    let err = UploadError::StorageWriteFailed {
                        target: StorageTarget::Original,
                        source: e,
                    };
                    tracing::warn!(file = %file.filename, path = %path, error = %err, "Original not preserved");
                }
            }
        }

        *stage = UploadStage::Succeeded;
        tracing::info!(
            file = %file.filename,
            path = %optimized_path,
            width = transcoded.width,
            height = transcoded.height,
            input_bytes,
            output_bytes = size,
            original = original_path.is_some(),
            elapsed = ?start.elapsed(),
            "Upload stored"
        );

        Ok(UploadOutcome {
            optimized_url,
            original_url,
            optimized_path,
            original_path,
            filename: stored_name,
            width: transcoded.width,
            height: transcoded.height,
            size,
        })
    }

    /// Upload several files concurrently and partition the results.
    ///
    /// Files are independent: a failure never cancels its siblings. Results
    /// keep request order within each partition.
    pub async fn upload_batch(&self, requests: Vec<UploadRequest>) -> UploadResult<BatchOutcome> {
        if requests.is_empty() {
            return Err(UploadError::validation(
                ValidationRule::File,
                "No files were uploaded",
            ));
        }
        if requests.len() > self.batch.max_files {
            return Err(UploadError::validation(
                ValidationRule::Count,
                format!(
                    "{} files uploaded, the limit is {} per batch",
                    requests.len(),
                    self.batch.max_files
                ),
            ));
        }

        let total = requests.len();
        let semaphore = Semaphore::new(self.batch.parallel);
        let uploads = requests.into_iter().map(|request| {
            let semaphore = &semaphore;
            async move {
                let _permit = semaphore.acquire().await.ok();
                let filename = request.file.filename.clone();
                (filename, self.upload(request).await)
            }
        });

        let mut outcome = BatchOutcome::default();
        for (filename, result) in join_all(uploads).await {
            match result {
                Ok(uploaded) => outcome.succeeded.push(uploaded),
                Err(e) => outcome.failed.push(BatchFailure::new(filename, &e)),
            }
        }

        tracing::info!(
            total,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Batch upload finished"
        );
        Ok(outcome)
    }

    /// Delete a stored object from the bucket that holds `target` images.
    pub async fn remove(&self, target: StorageTarget, path: &str) -> Result<(), StorageError> {
        let bucket = match target {
            StorageTarget::Optimized => &self.optimized_bucket,
            StorageTarget::Original => &self.original_bucket,
        };
        self.store.remove(bucket, path).await?;
        tracing::info!(%target, path, "Removed stored image");
        Ok(())
    }
}
