//! Progress reporting for long-running invocations.
//!
//! This module provides [`ProgressCallback`] for monitoring copy and
//! download progress and [`ProgressInfo`] for detailed snapshots.
//! Callbacks observe but cannot halt an operation — once started, an
//! invocation runs to completion.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use rebundle::{
//!     Downloader, FetchOptions, ProgressCallback, ProgressInfo, RebundleError,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{:?}] {pct:.1}% complete", info.operation);
//!         }
//!     }
//! }
//!
//! let options = FetchOptions::new().with_progress(Arc::new(PrintProgress));
//! let bytes = Downloader::new("https://example.com/clip.mp4", "clip.mp4")?
//!     .with_options(options)
//!     .run()?;
//! # Ok::<(), RebundleError>(())
//! ```

use std::time::{Duration, Instant};

/// The kind of operation currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Combining a video track and an audio track into one container.
    Combine,
    /// Extracting an audio track into an audio-only container.
    AudioExtract,
    /// Streaming a remote resource to disk.
    Download,
}

/// A snapshot of invocation progress.
///
/// For remux operations `current` counts samples copied on the track
/// being drained; for downloads it counts bytes written. `total` is only
/// known when the transport supplies a length up front.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// How many items (samples / bytes) have been processed so far.
    pub current: u64,
    /// Total items expected, if known ahead of time.
    pub total: Option<u64>,
    /// Completion percentage (0.0 - 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the operation started.
    pub elapsed: Duration,
}

/// Trait for receiving progress updates during an invocation.
///
/// Implementations must be [`Send`] and [`Sync`] because callbacks may be
/// invoked from worker threads.
///
/// Progress callbacks are **infallible** — they observe but cannot halt
/// the operation. Invocations are not cancellable mid-flight.
pub trait ProgressCallback: Send + Sync {
    /// Called at regular intervals during an operation.
    fn on_progress(&self, info: &ProgressInfo);
}

/// A no-op implementation that discards all progress notifications.
///
/// This is the default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Internal helper that batches callback invocations.
///
/// Fires the callback every `batch_size` ticks and once more on
/// [`finish`](ProgressReporter::finish) so the final count is always
/// observed.
pub(crate) struct ProgressReporter<'a> {
    callback: &'a dyn ProgressCallback,
    operation: OperationType,
    total: Option<u64>,
    batch_size: u64,
    started: Instant,
    ticks: u64,
}

impl<'a> ProgressReporter<'a> {
    pub(crate) fn new(
        callback: &'a dyn ProgressCallback,
        operation: OperationType,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            batch_size: batch_size.max(1),
            started: Instant::now(),
            ticks: 0,
        }
    }

    /// Record progress up to `current`, firing the callback on batch
    /// boundaries.
    pub(crate) fn tick(&mut self, current: u64) {
        self.ticks += 1;
        if self.ticks % self.batch_size == 0 {
            self.emit(current);
        }
    }

    /// Fire the callback one final time with the finished count.
    pub(crate) fn finish(&mut self, current: u64) {
        self.emit(current);
    }

    fn emit(&self, current: u64) {
        let percentage = self.total.filter(|total| *total > 0).map(|total| {
            ((current as f64 / total as f64) * 100.0).min(100.0) as f32
        });
        self.callback.on_progress(&ProgressInfo {
            operation: self.operation,
            current,
            total: self.total,
            percentage,
            elapsed: self.started.elapsed(),
        });
    }
}
