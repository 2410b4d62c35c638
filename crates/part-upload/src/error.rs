//! Upload error types

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Longest response body excerpt kept in an error message.
pub const BODY_EXCERPT_LEN: usize = 500;
// Part failures are logged per part, keep those shorter
pub(crate) const PART_LOG_EXCERPT_LEN: usize = 200;

pub type UploadResult<T> = Result<T, UploadError>;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to {operation}: {status}\n  Response: {body}")]
    Status {
        operation: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("Could not parse upload ID from response")]
    MissingUploadId,

    #[error("No ETag returned for part {0}")]
    MissingEtag(u32),

    #[error("Part {part_number} failed: {reason}")]
    PartFailed { part_number: u32, reason: String },

    #[error("Only {received} of {expected} parts reported back")]
    Incomplete { received: usize, expected: usize },

    #[error("Upload cancelled")]
    Cancelled,
}

impl UploadError {
    /// Builds a `Status` error, keeping only the head of the response body.
    pub(crate) fn status(operation: &'static str, status: StatusCode, body: &str) -> Self {
        UploadError::Status {
            operation,
            status,
            body: excerpt(body, BODY_EXCERPT_LEN),
        }
    }
}

/// Truncates `text` to at most `max` characters on a char boundary.
pub(crate) fn excerpt(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_keeps_short_bodies_intact() {
        assert_eq!(excerpt("NoSuchBucket", 500), "NoSuchBucket");
    }

    #[test]
    fn excerpt_cuts_on_char_boundary() {
        let body = "é".repeat(10);
        assert_eq!(excerpt(&body, 3), "ééé");
    }

    #[test]
    fn status_error_truncates_body() {
        let body = "x".repeat(2_000);
        let err = UploadError::status("upload part", StatusCode::INTERNAL_SERVER_ERROR, &body);
        match err {
            UploadError::Status { body, .. } => assert_eq!(body.len(), BODY_EXCERPT_LEN),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
