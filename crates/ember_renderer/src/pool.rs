//! Fixed-size worker pool draining a queue of tiles.
//!
//! Every tile is queued up front and the queue is closed before any worker
//! starts, so workers simply pull until the queue runs dry. The pool runs on
//! its own rayon thread pool and returns once every worker has exited.

use crate::renderer::{RenderError, TileFailure};
use crate::tile::Tile;
use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Summary of a finished pool run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStats {
    pub tiles: usize,
    pub workers: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// Create a pool with `workers` threads (at least one).
    pub fn new(workers: usize) -> Self {
        Self { workers: workers.max(1) }
    }

    /// One worker per core, leaving a core free for the caller.
    pub fn from_available_parallelism() -> Self {
        let cores = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        Self::new(cores.saturating_sub(1))
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `work` once for every tile, spread across the workers.
    ///
    /// A panic inside `work` is caught and logged, and the remaining tiles
    /// still run. If any tile panicked the whole run fails with
    /// [`RenderError::TilesPanicked`].
    pub fn run<F>(&self, tiles: Vec<Tile>, work: F) -> Result<RenderStats, RenderError>
    where
        F: Fn(&Tile) + Sync,
    {
        let total = tiles.len();
        let (sender, receiver) = mpsc::sync_channel(total.max(1));
        for tile in tiles {
            sender.send(tile).map_err(|_| RenderError::QueueClosed)?;
        }
        drop(sender);

        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("ember-worker-{i}"))
            .build()?;

        let queue = Mutex::new(receiver);
        let remaining = AtomicUsize::new(total);
        let failures = Mutex::new(Vec::new());
        let start = Instant::now();

        thread_pool.scope(|scope| {
            for worker in 0..self.workers {
                let (queue, remaining, failures, work) = (&queue, &remaining, &failures, &work);
                scope.spawn(move |_| {
                    while let Some(tile) = next_tile(queue) {
                        let tile_start = Instant::now();
                        let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(&tile)));
                        let left = remaining.fetch_sub(1, Ordering::Relaxed) - 1;

                        match outcome {
                            Ok(()) => log::debug!(
                                "worker {worker}: tile {} done in {:.2?}, {left}/{total} remaining",
                                tile.index,
                                tile_start.elapsed()
                            ),
                            Err(payload) => {
                                let message = panic_message(payload.as_ref());
                                log::error!("worker {worker}: tile {} panicked: {message}", tile.index);
                                failures
                                    .lock()
                                    .unwrap_or_else(PoisonError::into_inner)
                                    .push(TileFailure {
                                        index: tile.index,
                                        message,
                                    });
                            }
                        }
                    }
                });
            }
        });

        let mut failures = failures.into_inner().unwrap_or_else(PoisonError::into_inner);
        if !failures.is_empty() {
            failures.sort_by_key(|failure| failure.index);
            return Err(RenderError::TilesPanicked { failures, total });
        }

        Ok(RenderStats {
            tiles: total,
            workers: self.workers,
            elapsed: start.elapsed(),
        })
    }
}

/// Pull the next tile, or `None` once the queue is drained.
fn next_tile(queue: &Mutex<Receiver<Tile>>) -> Option<Tile> {
    queue.lock().unwrap_or_else(PoisonError::into_inner).recv().ok()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
