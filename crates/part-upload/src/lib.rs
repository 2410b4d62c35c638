//! Parallel multipart uploads to S3-compatible object storage
//!
//! This crate is organized into modules:
//! - `plan`: part boundaries for a file size and chunk size
//! - `progress`: byte counter shared by concurrent workers
//! - `client`: the HTTP requests of the upload protocol
//! - `pool`: bounded part dispatch with fail-fast fan-in
//! - `upload`: simple vs multipart orchestration

mod client;
mod config;
mod error;
mod plan;
mod pool;
mod progress;
mod types;
mod upload;
mod xml;

pub use client::StoreClient;
pub use config::{
    effective_chunk_size, UploadConfig, DEFAULT_CHUNK_SIZE, DEFAULT_ENDPOINT,
    DEFAULT_MULTIPART_THRESHOLD, DEFAULT_PARALLEL, MIN_PART_SIZE, USER_AGENT,
};
pub use error::{UploadError, UploadResult};
pub use plan::{plan_parts, Part};
pub use pool::run_parts;
pub use progress::{ProgressSnapshot, ProgressTracker};
pub use types::{CompletedPart, PartResult, UploadMode, UploadPhase, UploadSession, UploadSummary};
pub use upload::{source_size, UploadStarted, Uploader};
pub use xml::{completion_body, parse_upload_id};

pub use tokio_util::sync::CancellationToken;
