//! Validation errors for pipeline configuration values.

use thiserror::Error;

/// Errors returned when constructing configuration values.
#[derive(Debug, Clone, Error, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    /// The bounding box was not finite or had an empty extent.
    #[error(
        "invalid bounding box: latitude {lat_min}..{lat_max}, longitude {lon_min}..{lon_max}"
    )]
    InvalidBoundingBox {
        /// Southern edge.
        lat_min: f64,
        /// Northern edge.
        lat_max: f64,
        /// Western edge.
        lon_min: f64,
        /// Eastern edge.
        lon_max: f64,
    },
    /// The partition precision exceeded the supported digit count.
    #[error("partition precision {digits} exceeds the maximum of {max} decimal digits")]
    PrecisionOutOfRange {
        /// Requested number of decimal digits.
        digits: u8,
        /// Largest supported number of decimal digits.
        max: u8,
    },
    /// The Bloom filter false-positive rate was outside `[0, 1)`.
    #[error("false-positive rate {rate} must be at least 0 and below 1")]
    InvalidFalsePositiveRate {
        /// Rejected rate.
        rate: f64,
    },
    /// The Bloom filter was sized for zero items.
    #[error("expected item count for the approximate index must be positive")]
    ZeroExpectedItems,
    /// The membership mode name was not recognised.
    #[error("unknown membership mode {0:?} (expected `exact` or `approximate`)")]
    UnknownMembershipMode(String),
}
