use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

#[derive(Debug, Default)]
struct Counters {
    active_cursors: AtomicU64,
    source_pulls: AtomicU64,
    peak_buffered: AtomicU64,
}

/// Runtime metrics for one split.
///
/// A lightweight, read-only view shared by every cursor of the split. Obtain a `Stats`
/// handle via `Cursor::stats()` or `StreamCursor::stats()`. Values use relaxed atomics
/// and are intended for diagnostics.
#[cfg_attr(docsrs, doc(cfg(feature = "stats")))]
#[derive(Debug, Clone)]
pub struct Stats {
    counters: Arc<Counters>,
}

impl Stats {
    pub(crate) fn new(cursors: usize) -> Self {
        let counters = Counters::default();
        counters
            .active_cursors
            .store(cursors as u64, Ordering::Relaxed);
        Self {
            counters: Arc::new(counters),
        }
    }

    pub(crate) fn cursor_finished(&self) {
        self.counters.active_cursors.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn pulled(&self, buffered: usize) {
        self.counters.source_pulls.fetch_add(1, Ordering::Relaxed);
        self.counters
            .peak_buffered
            .fetch_max(buffered as u64, Ordering::Relaxed);
    }

    /// Returns the number of cursors of the split that are neither terminal nor dropped.
    pub fn active_cursors(&self) -> u64 {
        self.counters.active_cursors.load(Ordering::Relaxed)
    }

    /// Returns how many times the source has been pulled, including the pull that
    /// reported its end.
    pub fn source_pulls(&self) -> u64 {
        self.counters.source_pulls.load(Ordering::Relaxed)
    }

    /// Returns the largest buffer window observed right after a source pull.
    pub fn peak_buffered(&self) -> u64 {
        self.counters.peak_buffered.load(Ordering::Relaxed)
    }
}
