//! Bounded part dispatch with fail-fast fan-in
//!
//! Parts are handed out in ascending order to at most `max_parallel` workers at
//! a time. Results are consumed in completion order; the first failure (or a
//! cancellation of the caller's token) ends the wait and tells the remaining
//! workers to stop. Late results are dropped with the channel.

use std::future::Future;
use std::sync::Arc;

use log::debug;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::error::{UploadError, UploadResult};
use crate::plan::Part;
use crate::types::{CompletedPart, PartResult};

/// Runs `worker` once per part and returns the completed parts sorted by part number.
///
/// Each worker receives a token that is cancelled when the pool gives up; a
/// worker should race its I/O against it.
pub async fn run_parts<F, Fut>(
    parts: Vec<Part>,
    max_parallel: usize,
    cancel: &CancellationToken,
    worker: F,
) -> UploadResult<Vec<CompletedPart>>
where
    F: Fn(Part, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = PartResult> + Send + 'static,
{
    let expected = parts.len();
    let stop = cancel.child_token();
    let (tx, mut rx) = mpsc::channel::<PartResult>(expected.max(1));

    let dispatcher = {
        let stop = stop.clone();
        let permits = max_parallel.min(expected).clamp(1, Semaphore::MAX_PERMITS);
        let semaphore = Arc::new(Semaphore::new(permits));
        let worker = Arc::new(worker);

        tokio::spawn(async move {
            for part in parts {
                let permit = tokio::select! {
                    biased;
                    _ = stop.cancelled() => break,
                    permit = semaphore.clone().acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => break,
                    },
                };

                let tx = tx.clone();
                let worker = Arc::clone(&worker);
                let stop = stop.clone();
                debug!("part_dispatch: part={}", part.number);

                tokio::spawn(async move {
                    let _permit = permit; // Hold permit until done
                    let result = worker(part, stop).await;
                    // Receiver is gone once the pool has given up
                    let _ = tx.send(result).await;
                });
            }
        })
    };

    let mut completed: Vec<CompletedPart> = Vec::with_capacity(expected);
    let outcome = loop {
        if completed.len() == expected {
            break Ok(());
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break Err(UploadError::Cancelled),
            received = rx.recv() => match received {
                Some(PartResult { part_number, outcome: Ok(etag) }) => {
                    completed.push(CompletedPart { part_number, etag });
                }
                Some(PartResult { part_number, outcome: Err(reason) }) => {
                    break Err(UploadError::PartFailed { part_number, reason });
                }
                None => {
                    break Err(UploadError::Incomplete {
                        received: completed.len(),
                        expected,
                    });
                }
            },
        }
    };

    stop.cancel();
    drop(rx);

    if outcome.is_err() {
        dispatcher.abort();
    }

    outcome.map(|()| {
        completed.sort_by_key(|part| part.part_number);
        completed
    })
}
