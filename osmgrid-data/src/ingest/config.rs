//! Pipeline configuration.

use std::{fmt, num::NonZeroUsize, str::FromStr};

use osmgrid_core::{BoundingBox, MembershipConfig, PartitionPrecision, TagWhitelist};
use thiserror::Error;

/// Queue depth used by [`IngestMode::Pipelined`] when none is given.
pub const DEFAULT_QUEUE_DEPTH: NonZeroUsize = match NonZeroUsize::new(1024) {
    Some(depth) => depth,
    None => NonZeroUsize::MIN,
};

/// How the input is traversed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IngestMode {
    /// One forward pass on the calling thread. Points must precede the ways
    /// referencing them; earlier references are dropped as dangling.
    #[default]
    SinglePass,
    /// One forward pass with parsing on a worker thread feeding records
    /// through a bounded queue.
    Pipelined {
        /// Maximum records buffered between the threads.
        queue_depth: NonZeroUsize,
    },
    /// Two passes over a file: points first, then ways. Tolerates any
    /// element order at the cost of reading the input twice.
    TwoPass,
}

impl IngestMode {
    /// Pipelined mode with the default queue depth.
    #[must_use]
    pub const fn pipelined() -> Self {
        Self::Pipelined {
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

impl fmt::Display for IngestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SinglePass => f.write_str("single-pass"),
            Self::Pipelined { .. } => f.write_str("pipelined"),
            Self::TwoPass => f.write_str("two-pass"),
        }
    }
}

/// Unrecognised ingest mode name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown ingest mode {0:?} (expected `single-pass`, `pipelined` or `two-pass`)")]
pub struct ParseIngestModeError(pub String);

impl FromStr for IngestMode {
    type Err = ParseIngestModeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "single-pass" | "single" => Ok(Self::SinglePass),
            "pipelined" => Ok(Self::pipelined()),
            "two-pass" => Ok(Self::TwoPass),
            _ => Err(ParseIngestModeError(raw.to_owned())),
        }
    }
}

/// Everything that shapes a pipeline run.
///
/// # Examples
/// ```
/// use osmgrid_core::{BoundingBox, TagWhitelist};
/// use osmgrid_data::{IngestMode, PipelineConfig};
///
/// # fn main() -> Result<(), osmgrid_core::ConfigError> {
/// let config = PipelineConfig::default()
///     .with_area(BoundingBox::new(44.95, 45.0, -93.26, -93.2)?)
///     .with_whitelist(TagWhitelist::from_csv("highway"))
///     .with_mode(IngestMode::TwoPass);
/// assert!(config.area.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    /// Spatial filter; `None` accepts every point.
    pub area: Option<BoundingBox>,
    /// Tag filter; empty accepts every way.
    pub whitelist: TagWhitelist,
    /// Decimal digits kept by partition keys.
    pub precision: PartitionPrecision,
    /// Accepted-node index settings.
    pub membership: MembershipConfig,
    /// Traversal strategy.
    pub mode: IngestMode,
    /// Whether to count tag keys across all ways.
    pub tabulate_tags: bool,
}

impl PipelineConfig {
    /// Restrict points to `area`.
    #[must_use]
    pub fn with_area(mut self, area: BoundingBox) -> Self {
        self.area = Some(area);
        self
    }

    /// Restrict ways to those carrying a whitelisted key.
    #[must_use]
    pub fn with_whitelist(mut self, whitelist: TagWhitelist) -> Self {
        self.whitelist = whitelist;
        self
    }

    /// Set the partition precision.
    #[must_use]
    pub fn with_precision(mut self, precision: PartitionPrecision) -> Self {
        self.precision = precision;
        self
    }

    /// Set the accepted-node index settings.
    #[must_use]
    pub fn with_membership(mut self, membership: MembershipConfig) -> Self {
        self.membership = membership;
        self
    }

    /// Set the traversal strategy.
    #[must_use]
    pub fn with_mode(mut self, mode: IngestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable or disable tag key tabulation.
    #[must_use]
    pub fn with_tag_tabulation(mut self, enabled: bool) -> Self {
        self.tabulate_tags = enabled;
        self
    }
}
