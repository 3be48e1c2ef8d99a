//! Progress reporting and cancellation.
//!
//! A dump of a live capture device never reaches end-of-input on its own,
//! so [`CancellationToken`] gives callers (a Ctrl-C handler, a UI) a way to
//! stop it, and [`ProgressCallback`] lets them watch frames go by.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use rawdump::{DumpOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{} frames, {} packets", info.frames_written, info.packets_read);
//!     }
//! }
//!
//! let options = DumpOptions::new().with_progress(Arc::new(PrintProgress));
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// A snapshot of dump progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Frames written to the output so far.
    pub frames_written: u64,
    /// Packets read from the input so far (all streams).
    pub packets_read: u64,
    /// Packet limit of the run, if any.
    pub packet_limit: Option<u64>,
    /// Wall-clock time since the run started.
    pub elapsed: Duration,
    /// Presentation time of the most recent frame, if it had one.
    pub current_timestamp: Option<Duration>,
    /// `true` for the final report of a run.
    pub finished: bool,
}

/// Receives progress updates during a dump.
///
/// Callbacks observe only; use [`CancellationToken`] to stop a run.
pub trait ProgressCallback: Send + Sync {
    /// Called every `batch_size` frames and once when the run ends.
    fn on_progress(&self, info: &ProgressInfo);
}

pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation flag shared between clones.
///
/// ```
/// use rawdump::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation; every clone observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    packet_limit: Option<u64>,
    batch_size: u64,
    start_time: Instant,
    frames_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        packet_limit: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            packet_limit,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            frames_since_last_report: 0,
        }
    }

    /// Record one written frame; reports once the batch threshold is hit.
    pub(crate) fn frame_written(
        &mut self,
        frames_written: u64,
        packets_read: u64,
        timestamp: Option<Duration>,
    ) {
        self.frames_since_last_report += 1;
        if self.frames_since_last_report >= self.batch_size {
            self.report(frames_written, packets_read, timestamp, false);
            self.frames_since_last_report = 0;
        }
    }

    pub(crate) fn finish(&mut self, frames_written: u64, packets_read: u64) {
        self.report(frames_written, packets_read, None, true);
    }

    fn report(
        &self,
        frames_written: u64,
        packets_read: u64,
        current_timestamp: Option<Duration>,
        finished: bool,
    ) {
        self.callback.on_progress(&ProgressInfo {
            frames_written,
            packets_read,
            packet_limit: self.packet_limit,
            elapsed: self.start_time.elapsed(),
            current_timestamp,
            finished,
        });
    }
}
