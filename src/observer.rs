//! Progress reporting, kept out of the numeric code.  Renderers call
//! an observer at row-band and batch boundaries; nothing they compute
//! depends on it.

use std::ops::ControlFlow;

use tracing::info;

/// Receives progress from a render.  Called from worker threads.
pub trait Observer: Sync {
    /// `done` of `height` rows of an escape-time render are finished.
    fn rows_done(&self, _done: usize, _height: usize) {}

    /// Batch `batch` (one-based) of `batches` has been exposed.  Breaking
    /// stops the render; the histograms accumulated so far are kept.
    fn batch_done(&self, _batch: usize, _batches: usize) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

/// Says nothing, never stops anything.
#[derive(Copy, Clone, Debug, Default)]
pub struct Silent;

impl Observer for Silent {}

/// Forwards progress to `tracing` at info level.
#[derive(Copy, Clone, Debug, Default)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn rows_done(&self, done: usize, height: usize) {
        info!(done, height, "rows finished");
    }

    fn batch_done(&self, batch: usize, batches: usize) -> ControlFlow<()> {
        info!(batch, batches, "batch exposed");
        ControlFlow::Continue(())
    }
}
