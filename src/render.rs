//! Console output: banner, progress bar and summary

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use part_upload::{
    CancellationToken, ProgressSnapshot, ProgressTracker, UploadMode, UploadStarted, UploadSummary,
};
use tokio::task::JoinHandle;

use crate::size::{format_duration, format_size};

const PB_STYLE: &str =
    "{spinner:.blue} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} {msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

fn bar_style() -> ProgressStyle {
    match ProgressStyle::with_template(PB_STYLE) {
        Ok(style) => style.tick_chars(TICK).progress_chars(PB_CHARS),
        Err(_) => ProgressStyle::default_bar(),
    }
}

/// Percent, average speed and time left, e.g. `(42.0%, 3.1 MB/s, 12.5s)`.
fn progress_message(snapshot: &ProgressSnapshot) -> String {
    let eta = snapshot
        .eta()
        .map(format_duration)
        .unwrap_or_else(|| "--".to_string());
    format!(
        "({:.1}%, {}/s, {})",
        snapshot.percent(),
        format_size(snapshot.bytes_per_second()),
        eta
    )
}

fn refresh(pb: &ProgressBar, snapshot: &ProgressSnapshot) {
    pb.set_position(snapshot.transferred_bytes);
    pb.set_message(progress_message(snapshot));
}

/// Progress bar that follows a tracker on a timer until finished.
pub struct ProgressRenderer {
    pb: ProgressBar,
    tracker: Arc<ProgressTracker>,
    stop: CancellationToken,
    ticker: JoinHandle<()>,
}

impl ProgressRenderer {
    /// Must be called from within a tokio runtime.
    pub fn start(tracker: Arc<ProgressTracker>) -> Self {
        let pb = ProgressBar::new(tracker.total_bytes());
        pb.set_style(bar_style());

        let stop = CancellationToken::new();
        let ticker = {
            let pb = pb.clone();
            let tracker = Arc::clone(&tracker);
            let stop = stop.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(REFRESH_INTERVAL);
                loop {
                    tokio::select! {
                        _ = stop.cancelled() => break,
                        _ = interval.tick() => refresh(&pb, &tracker.snapshot()),
                    }
                }
            })
        };

        Self {
            pb,
            tracker,
            stop,
            ticker,
        }
    }

    pub async fn finish(self) {
        self.stop.cancel();
        let _ = self.ticker.await;

        let snapshot = self.tracker.snapshot();
        refresh(&self.pb, &snapshot);
        if snapshot.is_complete() {
            self.pb.finish();
        } else {
            self.pb.abandon();
        }
    }
}

pub fn print_banner(file: &Path, destination: &str, started: &UploadStarted) {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    println!("Uploading: {}", name);
    println!("Size: {}", format_size(started.file_size as f64));
    println!("Destination: {}", destination);
    println!();

    if started.mode == UploadMode::Multipart {
        println!(
            "Uploading in {} parts ({} each)",
            started.parts,
            format_size(started.chunk_size as f64)
        );
        println!("Parallel uploads: {}", started.parallel);
        println!();
    }
}

pub fn print_summary(summary: &UploadSummary) {
    println!("✓ Upload successful!");
    println!("  Time: {}", format_duration(summary.elapsed));
    println!(
        "  Average speed: {}/s",
        format_size(summary.average_speed())
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_template_is_valid() {
        assert!(ProgressStyle::with_template(PB_STYLE).is_ok());
    }

    #[test]
    fn message_shows_percent_speed_and_eta() {
        let snapshot = ProgressSnapshot {
            transferred_bytes: 512 * 1024,
            total_bytes: 2048 * 1024,
            elapsed: Duration::from_secs(2),
        };
        assert_eq!(progress_message(&snapshot), "(25.0%, 256.0 KB/s, 6.0s)");
    }

    #[test]
    fn message_without_progress_has_no_eta() {
        let snapshot = ProgressSnapshot {
            transferred_bytes: 0,
            total_bytes: 100,
            elapsed: Duration::from_secs(1),
        };
        assert_eq!(progress_message(&snapshot), "(0.0%, 0.0 B/s, --)");
    }

    #[tokio::test(start_paused = true)]
    async fn renderer_follows_tracker() {
        let tracker = Arc::new(ProgressTracker::new(1_000));
        let renderer = ProgressRenderer::start(Arc::clone(&tracker));

        tracker.add(400);
        tokio::time::sleep(REFRESH_INTERVAL * 2).await;
        assert_eq!(renderer.pb.position(), 400);
        assert!(renderer.pb.message().starts_with("(40.0%"));

        tracker.add(600);
        let pb = renderer.pb.clone();
        renderer.finish().await;
        assert_eq!(pb.position(), 1_000);
        assert!(pb.is_finished());
    }
}
