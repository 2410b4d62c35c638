//! Upload session, part result and summary types

use std::time::Duration;

/// Server-side multipart session for one destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    pub destination: String,
    pub upload_id: String,
}

/// A stored part as listed in the completion manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    pub part_number: u32,
    /// ETag with the surrounding quotes removed.
    pub etag: String,
}

/// What one worker reports for its part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartResult {
    pub part_number: u32,
    pub outcome: Result<String, String>,
}

impl PartResult {
    pub fn success(part_number: u32, etag: impl Into<String>) -> Self {
        Self {
            part_number,
            outcome: Ok(etag.into()),
        }
    }

    pub fn failure(part_number: u32, reason: impl Into<String>) -> Self {
        Self {
            part_number,
            outcome: Err(reason.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    Simple,
    Multipart,
}

/// Orchestrator states, used for logging transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    Deciding,
    SimpleUpload,
    MultipartUpload,
    Completed,
    Aborted,
    Failed,
}

impl std::fmt::Display for UploadPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadPhase::Idle => write!(f, "idle"),
            UploadPhase::Deciding => write!(f, "deciding"),
            UploadPhase::SimpleUpload => write!(f, "simple"),
            UploadPhase::MultipartUpload => write!(f, "multipart"),
            UploadPhase::Completed => write!(f, "completed"),
            UploadPhase::Aborted => write!(f, "aborted"),
            UploadPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Returned by a successful upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadSummary {
    pub mode: UploadMode,
    pub bytes: u64,
    /// Number of parts; 1 for a simple upload.
    pub parts: usize,
    pub elapsed: Duration,
}

impl UploadSummary {
    pub fn average_speed(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.bytes as f64 / secs
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_phase_display_matches_expected_strings() {
        assert_eq!(UploadPhase::Idle.to_string(), "idle");
        assert_eq!(UploadPhase::Deciding.to_string(), "deciding");
        assert_eq!(UploadPhase::SimpleUpload.to_string(), "simple");
        assert_eq!(UploadPhase::MultipartUpload.to_string(), "multipart");
        assert_eq!(UploadPhase::Completed.to_string(), "completed");
        assert_eq!(UploadPhase::Aborted.to_string(), "aborted");
        assert_eq!(UploadPhase::Failed.to_string(), "failed");
    }

    #[test]
    fn average_speed_handles_zero_elapsed() {
        let summary = UploadSummary {
            mode: UploadMode::Simple,
            bytes: 1000,
            parts: 1,
            elapsed: Duration::ZERO,
        };
        assert_eq!(summary.average_speed(), 0.0);

        let summary = UploadSummary {
            elapsed: Duration::from_secs(4),
            ..summary
        };
        assert_eq!(summary.average_speed(), 250.0);
    }
}
