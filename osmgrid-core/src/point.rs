//! Located point records.

use geo::Coord;

/// Opaque OSM node identifier.
///
/// Identifiers are kept as the raw attribute text so that datasets with
/// negative or non-numeric ids (common in editor exports) round-trip intact.
pub type NodeId = String;

/// A finalised point record.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`.
///
/// # Examples
/// ```
/// use osmgrid_core::Point;
///
/// let point = Point::new("42", 44.97, -93.22);
/// assert_eq!(point.id, "42");
/// assert_eq!(point.lat(), 44.97);
/// assert_eq!(point.lon(), -93.22);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// Identifier, unique within the dataset.
    pub id: NodeId,
    /// Geospatial position.
    pub location: Coord<f64>,
}

impl Point {
    /// Construct a point from its identifier, latitude and longitude.
    pub fn new(id: impl Into<NodeId>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            location: Coord { x: lon, y: lat },
        }
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.location.y
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lon(&self) -> f64 {
        self.location.x
    }
}
