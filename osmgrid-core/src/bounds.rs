//! Rectangular spatial filter for point acceptance.

use geo::{Coord, Rect};

use crate::{error::ConfigError, point::Point};

/// Axis-aligned latitude/longitude rectangle.
///
/// Containment is strict: points lying exactly on an edge are outside.
///
/// # Examples
/// ```
/// use osmgrid_core::{BoundingBox, Point};
///
/// # fn main() -> Result<(), osmgrid_core::ConfigError> {
/// let area = BoundingBox::new(44.959454, 44.992362, -93.250237, -93.204060)?;
/// assert!(area.accepts(&Point::new("1", 44.97, -93.22)));
/// assert!(!area.accepts(&Point::new("2", 44.959454, -93.22)));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    lat_min: f64,
    lat_max: f64,
    lon_min: f64,
    lon_max: f64,
}

impl BoundingBox {
    /// Validate and construct a bounding box.
    ///
    /// Every edge must be finite and each minimum strictly below its maximum.
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Result<Self, ConfigError> {
        let finite = [lat_min, lat_max, lon_min, lon_max]
            .iter()
            .all(|edge| edge.is_finite());
        if !finite || lat_min >= lat_max || lon_min >= lon_max {
            return Err(ConfigError::InvalidBoundingBox {
                lat_min,
                lat_max,
                lon_min,
                lon_max,
            });
        }
        Ok(Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        })
    }

    /// Whether the point lies strictly inside the rectangle.
    #[must_use]
    pub fn accepts(&self, point: &Point) -> bool {
        self.contains(point.lat(), point.lon())
    }

    /// Strict containment test on raw coordinates.
    #[must_use]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat > self.lat_min && lat < self.lat_max && lon > self.lon_min && lon < self.lon_max
    }

    /// The rectangle as a `geo::Rect` (`x = longitude`, `y = latitude`).
    #[must_use]
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.lon_min,
                y: self.lat_min,
            },
            Coord {
                x: self.lon_max,
                y: self.lat_max,
            },
        )
    }
}
