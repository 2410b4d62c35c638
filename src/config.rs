//! Command-line settings resolved into engine configuration

use std::path::PathBuf;
use std::time::Duration;

use part_upload::UploadConfig;

use crate::cli::UploadArg;
use crate::size::{parse_size, SizeParseError};

// Connecting should never take as long as sending a part
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub file: PathBuf,
    pub destination: String,
    pub upload: UploadConfig,
    pub verbose: bool,
}

impl AppConfig {
    pub fn from_args(arg: UploadArg) -> Result<Self, SizeParseError> {
        let chunk_size = parse_size(&arg.chunk_size)?;
        let multipart_threshold = parse_size(&arg.threshold)?;

        let upload = UploadConfig {
            auth_token: arg.token.filter(|t| !t.trim().is_empty()),
            chunk_size,
            multipart_threshold,
            max_parallel: arg.parallel,
            timeout: arg.timeout.map(Duration::from_secs),
            connect_timeout: Some(CONNECT_TIMEOUT),
            ..UploadConfig::new(arg.endpoint)
        };

        Ok(Self {
            file: arg.file,
            destination: arg.destination,
            upload,
            verbose: arg.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg() -> UploadArg {
        UploadArg {
            file: PathBuf::from("a.bin"),
            destination: "/b/a.bin".into(),
            endpoint: "http://localhost:8080".into(),
            token: None,
            chunk_size: "10M".into(),
            threshold: "50M".into(),
            parallel: 4,
            timeout: None,
            verbose: false,
        }
    }

    #[test]
    fn defaults_resolve_to_byte_counts() {
        let config = AppConfig::from_args(arg()).unwrap();
        assert_eq!(config.upload.chunk_size, 10 * 1024 * 1024);
        assert_eq!(config.upload.multipart_threshold, 50 * 1024 * 1024);
        assert_eq!(config.upload.max_parallel, 4);
        assert_eq!(config.upload.timeout, None);
        assert!(config.upload.auth_token.is_none());
    }

    #[test]
    fn timeout_and_token_are_carried() {
        let config = AppConfig::from_args(UploadArg {
            token: Some("jwt".into()),
            timeout: Some(45),
            ..arg()
        })
        .unwrap();
        assert_eq!(config.upload.auth_token.as_deref(), Some("jwt"));
        assert_eq!(config.upload.timeout, Some(Duration::from_secs(45)));
    }

    #[test]
    fn blank_token_is_dropped() {
        let config = AppConfig::from_args(UploadArg {
            token: Some("  ".into()),
            ..arg()
        })
        .unwrap();
        assert!(config.upload.auth_token.is_none());
    }

    #[test]
    fn bad_size_is_reported() {
        let err = AppConfig::from_args(UploadArg {
            threshold: "lots".into(),
            ..arg()
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid size format: lots");
    }
}
