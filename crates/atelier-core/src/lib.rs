//! Atelier Core - upload handling for a portfolio site.
//!
//! Atelier takes images posted as `multipart/form-data`, validates them,
//! produces a web-sized JPEG and writes it (plus, optionally, the untouched
//! original) to object storage.
//!
//! # Architecture
//!
//! ```text
//! Body → Multipart decode → Validate → Unique name → Transcode → Store → URLs
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use atelier_core::{Config, PageFolder, UploadPipeline, UploadRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_or_default(&Config::default_path())?;
//!     let pipeline = UploadPipeline::from_config(&config)?;
//!
//!     let mut form = atelier_core::multipart::decode(&body, &content_type)?;
//!     let file = form.take_upload_file().expect("a file part");
//!     let outcome = pipeline
//!         .upload(UploadRequest { file, folder: PageFolder::Home, keep_original: false })
//!         .await?;
//!     println!("{}", outcome.optimized_url);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod folders;
pub mod multipart;
pub mod pipeline;
pub mod ratelimit;
pub mod storage;
pub mod types;

pub use config::Config;
pub use error::{
    ConfigError, StorageError, StorageTarget, UploadError, UploadResult, ValidationRule,
};
pub use folders::{FolderError, PageFolder, PortfolioSection};
pub use multipart::{FilePart, MultipartForm};
pub use pipeline::{UploadPipeline, UploadRequest};
pub use ratelimit::{RateDecision, RateLimiter, SlidingWindowLimiter, Unlimited};
pub use storage::{MemoryStore, ObjectStore};
pub use types::{BatchFailure, BatchOutcome, UploadOutcome};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
