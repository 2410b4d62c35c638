use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand};
use part_upload::DEFAULT_ENDPOINT;

// Upper bound for --parallel
const MAX_PARALLEL: u64 = 256;

#[derive(Clone, Debug, Parser)]
#[command(
    name = "mizuchi-upload",
    version = env!("CARGO_PKG_VERSION"),
    about = "Upload files to Mizuchi Uploadr or any S3-compatible endpoint",
    long_about = None,
    propagate_version = true
)]
pub struct App {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "up", name = "upload", about = "Upload a file, in parallel parts when large")]
    Upload(UploadArg),
}

#[derive(Clone, Debug, Args)]
pub struct UploadArg {
    /// Local file to upload
    pub file: PathBuf,

    /// Destination path, e.g. /bucket/key.bin
    pub destination: String,

    /// Server endpoint URL
    #[arg(short = 'e', long, env = "MIZUCHI_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Bearer token sent as Authorization header
    #[arg(short = 't', long, env = "MIZUCHI_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Part size for multipart uploads (e.g. 5M, 10MB)
    #[arg(short = 'c', long, value_name = "SIZE", default_value = "10M")]
    pub chunk_size: String,

    /// Files at or above this size use multipart upload
    #[arg(short = 'T', long, value_name = "SIZE", default_value = "50M")]
    pub threshold: String,

    /// Number of parts uploaded concurrently
    #[arg(
        short = 'p',
        long,
        value_name = "N",
        default_value_t = 4,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..=MAX_PARALLEL)
    )]
    pub parallel: usize,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}
