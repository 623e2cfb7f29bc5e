//! Owned pipeline state: filters, accepted points and the growing graph.

use osmgrid_core::{
    AcceptedNodes, AdjacencyGraph, ConfigError, MembershipIndex, PartitionAssigner, Point,
    TagTally, Way, aggregate,
};

use super::{IngestReport, OsmIngestSummary, PipelineConfig, WayVerdict};

/// Applies finished records to the accepted-node index and adjacency graph.
///
/// The builder owns every aggregate that lives for the whole pass. Nothing is
/// partitioned until [`GraphBuilder::finish`] runs, so neighbour lists are
/// always complete when handed on.
#[derive(Debug)]
pub struct GraphBuilder<'c> {
    config: &'c PipelineConfig,
    accepted: AcceptedNodes,
    points: Vec<Point>,
    graph: AdjacencyGraph,
    tally: Option<TagTally>,
    summary: OsmIngestSummary,
}

impl<'c> GraphBuilder<'c> {
    /// Prepare empty state for `config`.
    pub fn new(config: &'c PipelineConfig) -> Result<Self, ConfigError> {
        let accepted = AcceptedNodes::from_config(&config.membership)?;
        Ok(Self {
            config,
            accepted,
            points: Vec::new(),
            graph: AdjacencyGraph::default(),
            tally: config.tabulate_tags.then(TagTally::default),
            summary: OsmIngestSummary::default(),
        })
    }

    /// Filter a point, recording it when it lies inside the configured area.
    pub fn add_point(&mut self, point: Point) -> bool {
        let accepted = self
            .config
            .area
            .is_none_or(|area| area.accepts(&point));
        self.summary
            .record_point(point.lon(), point.lat(), accepted);
        if accepted {
            self.accepted.record(&point.id);
            self.points.push(point);
        }
        accepted
    }

    /// Filter a way and add its edges when it passes both filters.
    pub fn add_way(&mut self, way: &Way) -> WayVerdict {
        if let Some(tally) = self.tally.as_mut() {
            tally.observe(way);
        }
        let tag_ok = self.config.whitelist.accepts(way);
        let area_ok = way
            .node_refs
            .iter()
            .any(|id| self.accepted.might_contain(id));
        let verdict = match (tag_ok, area_ok) {
            (true, true) => WayVerdict::Accepted(self.graph.add_way(way, &self.accepted)),
            (false, true) => WayVerdict::RejectedByTag,
            (true, false) => WayVerdict::RejectedByArea,
            (false, false) => WayVerdict::RejectedByBoth,
        };
        self.summary.record_way(&verdict);
        verdict
    }

    /// Counters so far.
    #[must_use]
    pub const fn summary(&self) -> &OsmIngestSummary {
        &self.summary
    }

    /// Partition the accepted points and package the run's results.
    #[must_use]
    pub fn finish(self) -> IngestReport {
        let assigner = PartitionAssigner::new(self.config.precision);
        let graph = aggregate(&self.points, &self.graph, &assigner);
        let tag_counts = self
            .tally
            .map(|tally| tally.sorted_desc())
            .unwrap_or_default();
        IngestReport {
            summary: self.summary,
            graph,
            tag_counts,
        }
    }
}
