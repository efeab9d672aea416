//! Progress reporting and cancellation.
//!
//! A pipeline run reports through a [`ProgressCallback`] and can be stopped
//! with a [`CancellationToken`]. Both are carried by
//! [`ExportOptions`](crate::ExportOptions).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use gif_maker::{
//!     CancellationToken, ExportOptions, ProgressCallback, ProgressInfo, TransformParameters,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{:?}] {pct:.1}%", info.stage);
//!         }
//!     }
//! }
//!
//! let bytes = std::fs::read("input.mp4")?;
//! let token = CancellationToken::new();
//! let options = ExportOptions::new()
//!     .with_progress(Arc::new(PrintProgress))
//!     .with_cancellation(token.clone());
//!
//! let gif = gif_maker::run_with_options(&bytes, &TransformParameters::new(), &options)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// The pipeline stage a progress report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PipelineStage {
    /// Spooling and opening the input.
    Loading,
    /// Validating parameters and planning the output.
    Transforming,
    /// Sampling frames and encoding them into the GIF.
    Rendering,
}

/// A snapshot of pipeline progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Stage being reported.
    pub stage: PipelineStage,
    /// Frames rendered so far (zero outside [`PipelineStage::Rendering`]).
    pub current: u64,
    /// Frames expected in total, if known.
    pub total: Option<u64>,
    /// Completion percentage (0.0 to 100.0), if `total` is known and non-zero.
    pub percentage: Option<f32>,
    /// Time since the stage started.
    pub elapsed: Duration,
    /// Estimated time left in the stage, from current throughput.
    pub estimated_remaining: Option<Duration>,
}

/// Receiver for progress updates.
///
/// Callbacks observe the run and cannot stop it; use a
/// [`CancellationToken`] for that. `Send + Sync` because a run may be
/// driven from a blocking worker thread.
pub trait ProgressCallback: Send + Sync {
    /// Called at stage boundaries and every `batch_size` rendered frames.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Default callback; discards everything.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation flag shared between clones.
///
/// The pipeline checks the token between stages and before each frame.
///
/// ```
/// use gif_maker::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Tracks one stage's timing and fires the callback.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    stage: PipelineStage,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        stage: PipelineStage,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            stage,
            total,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            since_last_report: 0,
        }
    }

    /// Record one rendered frame, reporting once per batch.
    pub(crate) fn advance(&mut self) {
        self.current += 1;
        self.since_last_report += 1;

        if self.since_last_report >= self.batch_size {
            self.report();
            self.since_last_report = 0;
        }
    }

    /// Emit a report regardless of batching.
    pub(crate) fn report(&self) {
        let elapsed = self.start_time.elapsed();

        let percentage = self
            .total
            .filter(|&total| total > 0)
            .map(|total| (self.current as f32 / total as f32) * 100.0);

        let estimated_remaining = match (self.total, self.current) {
            (Some(total), current) if current > 0 => {
                let remaining = total.saturating_sub(current);
                Some(elapsed.div_f64(current as f64).mul_f64(remaining as f64))
            }
            _ => None,
        };

        self.callback.on_progress(&ProgressInfo {
            stage: self.stage,
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
        });
    }
}
