//! mizuchi-upload command line
//!
//! This crate is organized into modules:
//! - `cli`: argument definitions
//! - `config`: arguments resolved into engine settings
//! - `size`: human-readable sizes and durations
//! - `render`: banner, progress bar and summary output

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{debug, error};
use part_upload::{CancellationToken, UploadError, UploadSummary, Uploader};

mod cli;
mod config;
mod render;
mod size;

pub use cli::{App, Commands, UploadArg};
pub use config::AppConfig;
pub use size::{format_duration, format_size, parse_size, SizeParseError};

use render::ProgressRenderer;

fn init_logger(verbose: bool) {
    let default_filter = if verbose {
        "warn,part_upload=debug,mizuchi_upload_lib=debug"
    } else {
        "warn"
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .try_init();
}

pub fn run() -> ExitCode {
    let app = match App::try_parse() {
        Ok(app) => app,
        Err(err) => {
            let _ = err.print();
            return if err.exit_code() == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
        }
    };

    match app.cmd {
        Commands::Upload(arg) => upload_command(arg),
    }
}

fn upload_command(arg: UploadArg) -> ExitCode {
    let config = match AppConfig::from_args(arg) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            return ExitCode::FAILURE;
        }
    };
    init_logger(config.verbose);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: failed to start runtime: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(upload(&config)) {
        Ok(summary) => {
            render::print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("✗ Upload failed: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn upload(config: &AppConfig) -> Result<UploadSummary, UploadError> {
    let uploader = Uploader::new(config.upload.clone())?;
    debug!(
        "upload_config: endpoint={} chunk_size={} threshold={} parallel={}",
        config.upload.endpoint,
        uploader.chunk_size(),
        config.upload.multipart_threshold,
        config.upload.parallelism()
    );

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    eprintln!();
                    eprintln!("Upload interrupted, aborting...");
                    cancel.cancel();
                }
                Err(err) => error!("Failed to listen for Ctrl-C: {}", err),
            }
        })
    };

    let mut renderer: Option<ProgressRenderer> = None;
    let result = uploader
        .upload_with_progress(&config.file, &config.destination, &cancel, |started| {
            render::print_banner(&config.file, &config.destination, started);
            renderer = Some(ProgressRenderer::start(Arc::clone(&started.progress)));
        })
        .await;

    if let Some(renderer) = renderer {
        renderer.finish().await;
    }
    interrupt.abort();

    result
}
