//! Image upload pipeline components.
//!
//! Each upload passes through these stages in order:
//! - **validate**: size, type, extension and signature checks
//! - **filename**: sanitize the client name and make it unique
//! - **transcode**: decode, downscale and recompress
//! - **processor**: orchestrates the stages and writes to storage
//!
//! **discovery** finds uploadable files on disk for the CLI.

pub mod discovery;
pub mod filename;
pub mod processor;
pub mod transcode;
pub mod validate;

pub use discovery::{DiscoveredFile, FileDiscovery};
pub use filename::{sanitize_filename, FilenameGenerator};
pub use processor::{UploadPipeline, UploadRequest, UploadStage};
pub use transcode::{TranscodedImage, Transcoder};
pub use validate::UploadPolicy;
