//! Transfer statistics types.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::media::MediaKind;

/// Counters for a single media pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Messages whose payload matched the pass kind.
    pub matched: usize,
    /// Messages downloaded and uploaded.
    pub transferred: usize,
    /// Messages skipped because the checkpoint already had them.
    pub skipped: usize,
    /// Messages whose download or upload failed.
    pub failed: usize,
}

/// Statistics for a whole run.
#[derive(Debug, Clone, Default)]
pub struct TransferStats {
    pub passes: BTreeMap<MediaKind, PassStats>,
    /// Bytes downloaded to local disk (and then uploaded).
    pub total_bytes: u64,
    pub elapsed: Duration,
}

impl TransferStats {
    /// Returns the counters for `kind`, zeroed if the pass never ran.
    #[must_use]
    pub fn pass(&self, kind: MediaKind) -> PassStats {
        self.passes.get(&kind).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn transferred(&self) -> usize {
        self.passes.values().map(|p| p.transferred).sum()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.passes.values().map(|p| p.failed).sum()
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.passes.values().map(|p| p.skipped).sum()
    }

    /// Items for which a transfer was attempted.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.transferred() + self.failed()
    }

    /// Returns the average throughput in bytes per second.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn average_speed(&self) -> u64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.total_bytes as f64 / secs) as u64
        } else {
            0
        }
    }
}

/// Accumulates statistics while the pipeline runs.
pub struct TransferStatsBuilder {
    stats: TransferStats,
    start_time: Instant,
}

impl Default for TransferStatsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferStatsBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stats: TransferStats::default(),
            start_time: Instant::now(),
        }
    }

    fn entry(&mut self, kind: MediaKind) -> &mut PassStats {
        self.stats.passes.entry(kind).or_default()
    }

    /// Counters accumulated so far for `kind`.
    #[must_use]
    pub fn pass(&self, kind: MediaKind) -> PassStats {
        self.stats.pass(kind)
    }

    /// Registers a pass so it shows up even when it matched nothing.
    pub fn start_pass(&mut self, kind: MediaKind) {
        self.entry(kind);
    }

    pub fn add_matched(&mut self, kind: MediaKind) {
        self.entry(kind).matched += 1;
    }

    pub fn add_transfer(&mut self, kind: MediaKind, bytes: u64) {
        self.entry(kind).transferred += 1;
        self.stats.total_bytes += bytes;
    }

    pub fn add_skipped(&mut self, kind: MediaKind) {
        self.entry(kind).skipped += 1;
    }

    pub fn add_failure(&mut self, kind: MediaKind) {
        self.entry(kind).failed += 1;
    }

    #[must_use]
    pub fn build(mut self) -> TransferStats {
        self.stats.elapsed = self.start_time.elapsed();
        self.stats
    }
}
