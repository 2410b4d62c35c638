//! Upload orchestration (simple, multipart)

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures_util::TryStreamExt;
use log::{debug, info, warn};
use reqwest::Body;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;

use crate::client::StoreClient;
use crate::config::UploadConfig;
use crate::error::{excerpt, UploadError, UploadResult, PART_LOG_EXCERPT_LEN};
use crate::plan::{plan_parts, Part};
use crate::pool::run_parts;
use crate::progress::ProgressTracker;
use crate::types::{PartResult, UploadMode, UploadPhase, UploadSession, UploadSummary};

/// Handed to the caller once the upload has been planned and is about to send data.
#[derive(Debug, Clone)]
pub struct UploadStarted {
    pub mode: UploadMode,
    pub file_size: u64,
    pub parts: usize,
    pub chunk_size: u64,
    pub parallel: usize,
    pub progress: Arc<ProgressTracker>,
}

/// Uploads files to one endpoint, picking simple or multipart by size.
#[derive(Debug, Clone)]
pub struct Uploader {
    client: Arc<StoreClient>,
    config: UploadConfig,
    chunk_size: u64,
}

fn log_phase(destination: &str, phase: UploadPhase) {
    debug!("upload_phase: {} -> {}", destination, phase);
}

/// Size of the file at `path`, rejecting missing paths and non-files.
pub async fn source_size(path: &Path) -> UploadResult<u64> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(UploadError::NotFound(path.to_path_buf()))
        }
        Err(err) => return Err(err.into()),
    };

    if !metadata.is_file() {
        return Err(UploadError::NotAFile(path.to_path_buf()));
    }
    Ok(metadata.len())
}

async fn read_part(source: &Path, part: Part) -> UploadResult<Vec<u8>> {
    let mut file = File::open(source).await?;
    file.seek(SeekFrom::Start(part.start)).await?;

    let mut buffer = vec![0u8; part.len() as usize];
    file.read_exact(&mut buffer).await?;
    Ok(buffer)
}

async fn transfer_part(
    client: &StoreClient,
    session: &UploadSession,
    source: &Path,
    part: Part,
) -> UploadResult<String> {
    let data = read_part(source, part).await?;
    client.upload_part(session, part.number, data).await
}

/// Worker body for one part: read, PUT, then count the bytes.
async fn upload_one_part(
    client: Arc<StoreClient>,
    session: Arc<UploadSession>,
    source: Arc<PathBuf>,
    tracker: Arc<ProgressTracker>,
    part: Part,
    stop: CancellationToken,
) -> PartResult {
    debug!(
        "multipart_part_start: {} part={} range={}..{}",
        session.destination, part.number, part.start, part.end
    );
    let part_timer = Instant::now();

    let outcome = tokio::select! {
        biased;
        _ = stop.cancelled() => Err(UploadError::Cancelled),
        result = transfer_part(&client, &session, &source, part) => result,
    };

    match outcome {
        Ok(etag) => {
            let uploaded = tracker.add(part.len());
            debug!(
                "multipart_part_done: {} part={} etag={} uploaded={} elapsed_ms={}",
                session.destination,
                part.number,
                etag,
                uploaded,
                part_timer.elapsed().as_millis()
            );
            PartResult::success(part.number, etag)
        }
        Err(err) => {
            debug!(
                "multipart_part_failed: {} part={} error={}",
                session.destination,
                part.number,
                excerpt(&err.to_string(), PART_LOG_EXCERPT_LEN)
            );
            PartResult::failure(part.number, err.to_string())
        }
    }
}

impl Uploader {
    pub fn new(config: UploadConfig) -> UploadResult<Self> {
        let client = StoreClient::new(&config)?;
        let chunk_size = config.effective_chunk_size();
        if chunk_size != config.chunk_size {
            warn!(
                "Chunk size increased to {} bytes (S3 minimum), requested {}",
                chunk_size, config.chunk_size
            );
        }

        Ok(Self {
            client: Arc::new(client),
            config,
            chunk_size,
        })
    }

    /// Chunk size used for planning, after the protocol floor was applied.
    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Whether the configured chunk size had to be raised.
    pub fn chunk_size_raised(&self) -> bool {
        self.chunk_size != self.config.chunk_size
    }

    pub fn mode_for(&self, file_size: u64) -> UploadMode {
        if file_size > 0 && file_size >= self.config.multipart_threshold {
            UploadMode::Multipart
        } else {
            UploadMode::Simple
        }
    }

    pub async fn upload(
        &self,
        path: &Path,
        destination: &str,
        cancel: &CancellationToken,
    ) -> UploadResult<UploadSummary> {
        self.upload_with_progress(path, destination, cancel, |_| {})
            .await
    }

    /// Uploads `path` to `destination`. `on_start` runs once, right before data is sent.
    pub async fn upload_with_progress<F>(
        &self,
        path: &Path,
        destination: &str,
        cancel: &CancellationToken,
        on_start: F,
    ) -> UploadResult<UploadSummary>
    where
        F: FnOnce(&UploadStarted),
    {
        log_phase(destination, UploadPhase::Deciding);
        let file_size = match source_size(path).await {
            Ok(size) => size,
            Err(err) => {
                log_phase(destination, UploadPhase::Failed);
                return Err(err);
            }
        };

        let mode = self.mode_for(file_size);
        let start_time = Instant::now();
        let result = match mode {
            UploadMode::Simple => {
                log_phase(destination, UploadPhase::SimpleUpload);
                self.simple_upload(path, destination, file_size, cancel, on_start)
                    .await
            }
            UploadMode::Multipart => {
                log_phase(destination, UploadPhase::MultipartUpload);
                self.multipart_upload(path, destination, file_size, cancel, on_start)
                    .await
            }
        };

        match result {
            Ok(parts) => {
                log_phase(destination, UploadPhase::Completed);
                info!(
                    "upload_finish: {} bytes={} parts={} elapsed_ms={}",
                    destination,
                    file_size,
                    parts,
                    start_time.elapsed().as_millis()
                );
                Ok(UploadSummary {
                    mode,
                    bytes: file_size,
                    parts,
                    elapsed: start_time.elapsed(),
                })
            }
            Err(err) => {
                log_phase(destination, UploadPhase::Failed);
                Err(err)
            }
        }
    }

    /// Streams the whole file in one PUT, counting bytes as they are read.
    async fn simple_upload<F>(
        &self,
        path: &Path,
        destination: &str,
        file_size: u64,
        cancel: &CancellationToken,
        on_start: F,
    ) -> UploadResult<usize>
    where
        F: FnOnce(&UploadStarted),
    {
        let tracker = Arc::new(ProgressTracker::new(file_size));
        let file = File::open(path).await?;

        on_start(&UploadStarted {
            mode: UploadMode::Simple,
            file_size,
            parts: 1,
            chunk_size: file_size,
            parallel: 1,
            progress: Arc::clone(&tracker),
        });

        let counter = Arc::clone(&tracker);
        let stream = ReaderStream::new(file.take(file_size)).inspect_ok(move |chunk| {
            counter.add(chunk.len() as u64);
        });

        info!("single_put_start: {} total_bytes={}", destination, file_size);
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(UploadError::Cancelled),
            result = self.client.put_object(destination, Body::wrap_stream(stream), file_size) => result,
        };

        result.map(|()| 1)
    }

    async fn multipart_upload<F>(
        &self,
        path: &Path,
        destination: &str,
        file_size: u64,
        cancel: &CancellationToken,
        on_start: F,
    ) -> UploadResult<usize>
    where
        F: FnOnce(&UploadStarted),
    {
        // Step 1: Initiate multipart upload
        let session = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(UploadError::Cancelled),
            result = self.client.initiate_multipart_upload(destination) => result,
        }?;
        info!(
            "multipart_start: {} upload_id={} total_bytes={}",
            destination, session.upload_id, file_size
        );

        // Step 2: Calculate parts
        let parts = plan_parts(file_size, self.chunk_size);
        let total_parts = parts.len();
        let parallel = self.config.parallelism();
        info!(
            "multipart_plan: {} total_parts={} part_size={} parallel={}",
            destination, total_parts, self.chunk_size, parallel
        );

        let tracker = Arc::new(ProgressTracker::new(file_size));
        on_start(&UploadStarted {
            mode: UploadMode::Multipart,
            file_size,
            parts: total_parts,
            chunk_size: self.chunk_size,
            parallel,
            progress: Arc::clone(&tracker),
        });

        // Step 3: Upload parts in parallel
        let session = Arc::new(session);
        let worker = {
            let client = Arc::clone(&self.client);
            let session = Arc::clone(&session);
            let source = Arc::new(path.to_path_buf());
            move |part: Part, stop: CancellationToken| {
                upload_one_part(
                    Arc::clone(&client),
                    Arc::clone(&session),
                    Arc::clone(&source),
                    Arc::clone(&tracker),
                    part,
                    stop,
                )
            }
        };

        let completed = match run_parts(parts, parallel, cancel, worker).await {
            Ok(completed) => completed,
            Err(err) => {
                match &err {
                    UploadError::Cancelled => info!("Upload interrupted, aborting: {}", destination),
                    other => warn!("multipart_part_error: {} error={}", destination, other),
                }
                self.abort(&session).await;
                return Err(err);
            }
        };

        // Step 4: Complete multipart upload
        debug!(
            "Completing multipart upload {} with {} parts",
            session.upload_id,
            completed.len()
        );
        let completion = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(UploadError::Cancelled),
            result = self.client.complete_multipart_upload(&session, &completed) => result,
        };
        match completion {
            Ok(()) => {}
            Err(UploadError::Cancelled) => {
                info!("Upload interrupted, aborting: {}", destination);
                self.abort(&session).await;
                return Err(UploadError::Cancelled);
            }
            Err(err) => {
                warn!(
                    "multipart_complete_failed: {} upload_id={} left open",
                    destination, session.upload_id
                );
                return Err(err);
            }
        }
        info!("multipart_complete: {}", destination);

        Ok(total_parts)
    }

    /// Best-effort abort; a failure here is logged and otherwise ignored.
    async fn abort(&self, session: &UploadSession) {
        match self.client.abort_multipart_upload(session).await {
            Ok(()) => {
                log_phase(&session.destination, UploadPhase::Aborted);
                debug!("Multipart upload aborted successfully: {}", session.upload_id);
            }
            Err(err) => warn!(
                "Failed to abort multipart upload {}: {}",
                session.upload_id, err
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIN_PART_SIZE;
    use std::io::Write;

    fn uploader(chunk_size: u64, threshold: u64) -> Uploader {
        Uploader::new(UploadConfig {
            chunk_size,
            multipart_threshold: threshold,
            ..UploadConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn mode_switches_at_threshold() {
        let u = uploader(10_000_000, 50_000_000);
        assert_eq!(u.mode_for(1000), UploadMode::Simple);
        assert_eq!(u.mode_for(49_999_999), UploadMode::Simple);
        assert_eq!(u.mode_for(50_000_000), UploadMode::Multipart);
        assert_eq!(u.mode_for(120_000_000), UploadMode::Multipart);
    }

    #[test]
    fn empty_file_never_goes_multipart() {
        let u = uploader(10_000_000, 0);
        assert_eq!(u.mode_for(0), UploadMode::Simple);
        assert_eq!(u.mode_for(1), UploadMode::Multipart);
    }

    #[test]
    fn small_chunk_size_is_raised() {
        let u = uploader(1024, 50_000_000);
        assert_eq!(u.chunk_size(), MIN_PART_SIZE);
        assert!(u.chunk_size_raised());

        let u = uploader(10_000_000, 50_000_000);
        assert_eq!(u.chunk_size(), 10_000_000);
        assert!(!u.chunk_size_raised());
    }

    #[tokio::test]
    async fn source_size_rejects_missing_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.bin");
        assert!(matches!(
            source_size(&missing).await,
            Err(UploadError::NotFound(_))
        ));
        assert!(matches!(
            source_size(dir.path()).await,
            Err(UploadError::NotAFile(_))
        ));

        let file_path = dir.path().join("data.bin");
        std::fs::File::create(&file_path)
            .unwrap()
            .write_all(&[7u8; 1234])
            .unwrap();
        assert_eq!(source_size(&file_path).await.unwrap(), 1234);
    }

    #[tokio::test]
    async fn read_part_returns_exact_range() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        file.write_all(&data).unwrap();

        let part = Part {
            number: 2,
            start: 300,
            end: 550,
        };
        let bytes = read_part(file.path(), part).await.unwrap();
        assert_eq!(bytes, &data[300..550]);
    }

    #[tokio::test]
    async fn read_part_fails_on_short_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[1u8; 100]).unwrap();

        let part = Part {
            number: 1,
            start: 50,
            end: 150,
        };
        assert!(matches!(
            read_part(file.path(), part).await,
            Err(UploadError::Io(_))
        ));
    }
}
