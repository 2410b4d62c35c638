use std::time::Duration;

use tokio::sync::Semaphore;

// Smallest part the S3 protocol accepts (except for the last part): 5MB
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;
// Part size: 10MB per chunk
pub const DEFAULT_CHUNK_SIZE: u64 = 10 * 1024 * 1024;
// Multipart upload threshold: 50MB
pub const DEFAULT_MULTIPART_THRESHOLD: u64 = 50 * 1024 * 1024;
// Concurrent uploads: 4 parts in parallel
pub const DEFAULT_PARALLEL: usize = 4;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080";
pub const USER_AGENT: &str = "mizuchi-uploader/1.0";

/// Settings for one uploader. Immutable for the duration of an upload.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub endpoint: String,
    pub auth_token: Option<String>,
    pub chunk_size: u64,
    pub multipart_threshold: u64,
    pub max_parallel: usize,
    /// Whole-request timeout handed to the HTTP client.
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            auth_token: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            multipart_threshold: DEFAULT_MULTIPART_THRESHOLD,
            max_parallel: DEFAULT_PARALLEL,
            timeout: None,
            connect_timeout: None,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl UploadConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Endpoint without trailing slashes, ready to have a destination appended.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }

    /// Chunk size actually used for planning.
    pub fn effective_chunk_size(&self) -> u64 {
        effective_chunk_size(self.chunk_size)
    }

    /// Worker count, kept within what a tokio semaphore can hand out.
    pub fn parallelism(&self) -> usize {
        self.max_parallel.clamp(1, Semaphore::MAX_PERMITS)
    }
}

/// Raises a requested chunk size to the protocol minimum.
pub fn effective_chunk_size(requested: u64) -> u64 {
    requested.max(MIN_PART_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_chunk_sizes_become_the_minimum() {
        for requested in [0, 1, 1024, MIN_PART_SIZE - 1] {
            assert_eq!(effective_chunk_size(requested), MIN_PART_SIZE);
        }
    }

    #[test]
    fn large_chunk_sizes_are_kept() {
        assert_eq!(effective_chunk_size(MIN_PART_SIZE), MIN_PART_SIZE);
        assert_eq!(effective_chunk_size(20 * 1024 * 1024), 20 * 1024 * 1024);
    }

    #[test]
    fn base_url_strips_trailing_slashes() {
        let config = UploadConfig::new("http://localhost:8080//");
        assert_eq!(config.base_url(), "http://localhost:8080");
    }

    #[test]
    fn zero_parallelism_runs_one_worker() {
        let config = UploadConfig {
            max_parallel: 0,
            ..UploadConfig::default()
        };
        assert_eq!(config.parallelism(), 1);
    }

    #[test]
    fn huge_parallelism_is_capped() {
        let config = UploadConfig {
            max_parallel: usize::MAX,
            ..UploadConfig::default()
        };
        assert_eq!(config.parallelism(), Semaphore::MAX_PERMITS);
    }
}
