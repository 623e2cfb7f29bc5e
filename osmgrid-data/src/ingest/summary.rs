//! Running counters for an ingest pass.

use geo::{Coord, Rect};
use osmgrid_core::WayEdges;

/// Element counts and filter outcomes gathered during ingestion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OsmIngestSummary {
    /// Points read from the input.
    pub points_seen: u64,
    /// Points that passed the spatial filter.
    pub points_accepted: u64,
    /// Ways read from the input.
    pub ways_seen: u64,
    /// Ways that passed both filters.
    pub ways_accepted: u64,
    /// Ways lacking a whitelisted tag but touching the accepted area.
    pub ways_rejected_by_tag: u64,
    /// Ways with a whitelisted tag but no accepted node.
    pub ways_rejected_by_area: u64,
    /// Ways failing both filters.
    pub ways_rejected_by_both: u64,
    /// Undirected edges added to the graph.
    pub edges_inserted: u64,
    /// Consecutive node pairs dropped because an endpoint was not accepted.
    pub dangling_pairs: u64,
    /// Bounding box covering every point read, accepted or not.
    /// Coordinates are WGS84 with `x = longitude`, `y = latitude`.
    pub bounds: Option<Rect<f64>>,
}

impl OsmIngestSummary {
    pub(super) fn record_point(&mut self, lon: f64, lat: f64, accepted: bool) {
        self.points_seen += 1;
        if accepted {
            self.points_accepted += 1;
        }
        let coordinate = Coord { x: lon, y: lat };
        self.include_bounds(Rect::new(coordinate, coordinate));
    }

    pub(super) fn record_way(&mut self, verdict: &WayVerdict) {
        self.ways_seen += 1;
        match verdict {
            WayVerdict::Accepted(edges) => {
                self.ways_accepted += 1;
                self.edges_inserted += to_u64(edges.new_edges);
                self.dangling_pairs += to_u64(edges.dangling_pairs);
            }
            WayVerdict::RejectedByTag => self.ways_rejected_by_tag += 1,
            WayVerdict::RejectedByArea => self.ways_rejected_by_area += 1,
            WayVerdict::RejectedByBoth => self.ways_rejected_by_both += 1,
        }
    }

    /// Ways rejected for any reason.
    #[must_use]
    pub const fn ways_rejected(&self) -> u64 {
        self.ways_rejected_by_tag + self.ways_rejected_by_area + self.ways_rejected_by_both
    }

    fn include_bounds(&mut self, bounds: Rect<f64>) {
        match &mut self.bounds {
            Some(existing) => {
                let min = Coord {
                    x: existing.min().x.min(bounds.min().x),
                    y: existing.min().y.min(bounds.min().y),
                };
                let max = Coord {
                    x: existing.max().x.max(bounds.max().x),
                    y: existing.max().y.max(bounds.max().y),
                };
                *existing = Rect::new(min, max);
            }
            None => self.bounds = Some(bounds),
        }
    }
}

fn to_u64(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}

/// How a way fared against the filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WayVerdict {
    /// Both filters passed; the way contributed these edges.
    Accepted(WayEdges),
    /// No whitelisted tag.
    RejectedByTag,
    /// No referenced node was accepted.
    RejectedByArea,
    /// Neither filter passed.
    RejectedByBoth,
}
