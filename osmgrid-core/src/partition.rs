//! Geographic grid partitioning.
//!
//! A point's partition is the pair of its latitude and longitude floored to a
//! fixed number of decimal digits. Flooring rounds toward negative infinity on
//! both axes, so `-93.2502` at three digits lands in `-93.251` rather than
//! `-93.250`. Flooring works on the shortest decimal rendering of the `f64`,
//! which keeps values such as `1.001` in the `1.001` cell instead of sliding
//! into `1.000` through binary multiplication error.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, point::Point};

/// Number of decimal digits retained by partition keys.
///
/// # Examples
/// ```
/// use osmgrid_core::PartitionPrecision;
///
/// assert_eq!(PartitionPrecision::default().digits(), 3);
/// assert!(PartitionPrecision::new(16).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartitionPrecision(u8);

impl PartitionPrecision {
    /// Largest supported number of digits.
    pub const MAX: u8 = 15;

    /// Three digits, roughly 111 m cells at the equator.
    pub const DEFAULT: Self = Self(3);

    /// Validate a digit count.
    pub fn new(digits: u8) -> Result<Self, ConfigError> {
        if digits > Self::MAX {
            return Err(ConfigError::PrecisionOutOfRange {
                digits,
                max: Self::MAX,
            });
        }
        Ok(Self(digits))
    }

    /// Retained decimal digits.
    #[must_use]
    pub const fn digits(self) -> u8 {
        self.0
    }
}

impl Default for PartitionPrecision {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for PartitionPrecision {
    type Error = ConfigError;

    fn try_from(digits: u8) -> Result<Self, Self::Error> {
        Self::new(digits)
    }
}

/// Grid cell identifier made of floored latitude and longitude strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartitionKey {
    /// Floored latitude.
    pub lat: String,
    /// Floored longitude.
    pub lon: String,
}

impl PartitionKey {
    /// Construct a key from already formatted components.
    pub fn new(lat: impl Into<String>, lon: impl Into<String>) -> Self {
        Self {
            lat: lat.into(),
            lon: lon.into(),
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.lat, self.lon)
    }
}

/// Maps points to partition keys at a fixed precision.
///
/// # Examples
/// ```
/// use osmgrid_core::{PartitionAssigner, PartitionKey, Point};
///
/// let assigner = PartitionAssigner::default();
/// let key = assigner.assign(&Point::new("1", 44.9601, -93.2502));
/// assert_eq!(key, PartitionKey::new("44.960", "-93.251"));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartitionAssigner {
    precision: PartitionPrecision,
}

impl PartitionAssigner {
    /// Create an assigner for the given precision.
    #[must_use]
    pub const fn new(precision: PartitionPrecision) -> Self {
        Self { precision }
    }

    /// Configured precision.
    #[must_use]
    pub const fn precision(&self) -> PartitionPrecision {
        self.precision
    }

    /// Partition key for a point.
    #[must_use]
    pub fn assign(&self, point: &Point) -> PartitionKey {
        PartitionKey {
            lat: self.floor(point.lat()),
            lon: self.floor(point.lon()),
        }
    }

    /// Floor a single coordinate to the configured precision.
    #[must_use]
    pub fn floor(&self, value: f64) -> String {
        floor_decimal(value, usize::from(self.precision.digits()))
    }
}

fn floor_decimal(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let negative = value < 0.0;
    let magnitude = value.abs().to_string();
    let (whole, fraction) = magnitude
        .split_once('.')
        .unwrap_or((magnitude.as_str(), ""));

    let mut scaled: Vec<u8> = whole.bytes().collect();
    scaled.extend(fraction.bytes().chain(std::iter::repeat(b'0')).take(digits));
    let discarded = fraction.get(digits..).unwrap_or_default();
    if negative && discarded.bytes().any(|digit| digit != b'0') {
        increment(&mut scaled);
    }
    let is_zero = scaled.iter().all(|digit| *digit == b'0');

    let split = scaled.len() - digits;
    let mut out = String::with_capacity(scaled.len() + 2);
    if negative && !is_zero {
        out.push('-');
    }
    out.extend(scaled[..split].iter().map(|digit| char::from(*digit)));
    if digits > 0 {
        out.push('.');
        out.extend(scaled[split..].iter().map(|digit| char::from(*digit)));
    }
    out
}

/// Add one unit in the last place of an ASCII digit string.
fn increment(digits: &mut Vec<u8>) {
    for digit in digits.iter_mut().rev() {
        if *digit == b'9' {
            *digit = b'0';
        } else {
            *digit += 1;
            return;
        }
    }
    digits.insert(0, b'1');
}
