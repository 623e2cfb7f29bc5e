//! Progress reporting hooks for long ingest runs.

use std::time::Instant;

use log::info;

use super::OsmIngestSummary;

/// Observer notified as records are processed.
///
/// Every method has a no-op default so implementors only override the
/// milestones they care about.
pub trait ProgressObserver {
    /// Called after each point is filtered.
    fn point_processed(&mut self, _summary: &OsmIngestSummary) {}

    /// Called after each way is filtered and applied.
    fn way_processed(&mut self, _summary: &OsmIngestSummary) {}

    /// Called once after the input has been consumed.
    fn finished(&mut self, _summary: &OsmIngestSummary) {}
}

/// Observer that ignores every milestone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}

/// Logs counts at fixed intervals through the `log` facade.
#[derive(Debug, Clone)]
pub struct LogProgress {
    started: Instant,
    point_interval: u64,
    way_interval: u64,
}

impl LogProgress {
    /// Points between progress lines.
    pub const DEFAULT_POINT_INTERVAL: u64 = 10_000;
    /// Ways between progress lines.
    pub const DEFAULT_WAY_INTERVAL: u64 = 1_000;

    /// Start the clock with custom intervals.
    #[must_use]
    pub fn with_intervals(point_interval: u64, way_interval: u64) -> Self {
        Self {
            started: Instant::now(),
            point_interval,
            way_interval,
        }
    }

    fn elapsed(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::with_intervals(Self::DEFAULT_POINT_INTERVAL, Self::DEFAULT_WAY_INTERVAL)
    }
}

impl ProgressObserver for LogProgress {
    fn point_processed(&mut self, summary: &OsmIngestSummary) {
        if summary.points_seen.is_multiple_of(self.point_interval) {
            info!(
                "{:.3}s: {} points processed, {} accepted",
                self.elapsed(),
                summary.points_seen,
                summary.points_accepted
            );
        }
    }

    fn way_processed(&mut self, summary: &OsmIngestSummary) {
        if summary.ways_seen.is_multiple_of(self.way_interval) {
            info!(
                "{:.3}s: {} ways processed, {} accepted, {} rejected by tag, {} rejected by area, {} rejected by both",
                self.elapsed(),
                summary.ways_seen,
                summary.ways_accepted,
                summary.ways_rejected_by_tag,
                summary.ways_rejected_by_area,
                summary.ways_rejected_by_both
            );
        }
    }

    fn finished(&mut self, summary: &OsmIngestSummary) {
        info!(
            "{:.3}s: finished with {} of {} points and {} of {} ways accepted, {} edges, {} dangling pairs dropped",
            self.elapsed(),
            summary.points_accepted,
            summary.points_seen,
            summary.ways_accepted,
            summary.ways_seen,
            summary.edges_inserted,
            summary.dangling_pairs
        );
    }
}
