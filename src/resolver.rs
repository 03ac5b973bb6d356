//! Run endpoint resolution.
//!
//! Picks the start/end elevations of a run from its topology rather than
//! from row order.
//!
//! ## Cases
//!
//! 1. One segment: its own start/end z, no graph and no snapping.
//! 2. Two or more degree-1 nodes: double breadth-first sweep. Sweep from the
//!    first leaf (key order) to the farthest node `a`, then from `a` to the
//!    farthest node `b`. Exact for trees, an approximation once cycles exist.
//! 3. Fewer than two degree-1 nodes (closed loop, fully cyclic branching):
//!    minimum and maximum elevation over all nodes.
//! 4. Empty graph: `(0.0, 0.0)`.
//!
//! Ties in hop distance go to the node visited first; neighbor visitation is
//! in node key order, so the result never depends on input row order.
//!
//! The returned pair is always ordered ascending.

use serde::{Deserialize, Serialize};

use crate::geometry::Snapper;
use crate::topology::{NodeKey, TopologyGraph};
use crate::types::SegmentRecord;

/// How a run's endpoints were determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    /// Raw z of the only segment.
    SingleSegment,
    /// Double breadth-first sweep between branch tips.
    FarthestPair,
    /// Vertical range over all nodes; no usable branch tips.
    ElevationRange,
    /// No nodes at all.
    Empty,
}

/// Resolved start/end elevations of a run, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EndpointElevations {
    /// Lower elevation (m).
    pub start: f64,
    /// Higher elevation (m).
    pub end: f64,
    /// Which case produced the pair.
    pub resolution: Resolution,
}

impl EndpointElevations {
    /// Build an ordered pair.
    pub fn ordered(a: f64, b: f64, resolution: Resolution) -> Self {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        Self { start, end, resolution }
    }

    /// `(0.0, 0.0)` for a run with nothing to resolve.
    pub fn empty() -> Self {
        Self { start: 0.0, end: 0.0, resolution: Resolution::Empty }
    }
}

/// Node at maximum hop distance from `source`. The first node reached at
/// that distance wins.
pub fn farthest_from(graph: &TopologyGraph, source: &NodeKey) -> Option<(NodeKey, usize)> {
    let mut best: Option<(NodeKey, usize)> = None;
    for (node, dist) in graph.hop_distances(source) {
        match &best {
            Some((_, d)) if dist <= *d => {}
            _ => best = Some((node, dist)),
        }
    }
    best
}

/// Resolve endpoints from an already built graph.
pub fn resolve_graph(graph: &TopologyGraph) -> EndpointElevations {
    if graph.is_empty() {
        return EndpointElevations::empty();
    }

    let leaves = graph.leaves();
    if leaves.len() >= 2 {
        let sweep = farthest_from(graph, leaves[0])
            .and_then(|(a, _)| farthest_from(graph, &a).map(|(b, _)| (a, b)));

        if let Some((a, b)) = sweep {
            if let (Some(za), Some(zb)) = (graph.elevation(&a), graph.elevation(&b)) {
                return EndpointElevations::ordered(za, zb, Resolution::FarthestPair);
            }
        }
    }

    match graph.elevation_range() {
        Some((lo, hi)) => EndpointElevations::ordered(lo, hi, Resolution::ElevationRange),
        None => EndpointElevations::empty(),
    }
}

/// Resolve the endpoints of a run from its segments.
pub fn resolve_endpoints(segments: &[&SegmentRecord], snapper: &Snapper) -> EndpointElevations {
    match segments {
        [] => EndpointElevations::empty(),
        [only] => EndpointElevations::ordered(only.start.z, only.end.z, Resolution::SingleSegment),
        _ => {
            let graph = TopologyGraph::build(segments.iter().copied(), snapper);
            let endpoints = resolve_graph(&graph);
            tracing::debug!(
                run_id = %segments[0].run_id,
                nodes = graph.node_count(),
                edges = graph.edge_count(),
                leaves = graph.leaves().len(),
                resolution = ?endpoints.resolution,
                "resolved run endpoints"
            );
            endpoints
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FittingRef, Point3, RunId};

    fn seg(a: (f64, f64, f64), b: (f64, f64, f64)) -> SegmentRecord {
        SegmentRecord::new(
            "e",
            RunId::from("R1"),
            Point3::new(a.0, a.1, a.2),
            Point3::new(b.0, b.1, b.2),
            50.0,
            None,
        )
    }

    fn resolve(segs: &[SegmentRecord]) -> EndpointElevations {
        let refs: Vec<&SegmentRecord> = segs.iter().collect();
        resolve_endpoints(&refs, &Snapper::default())
    }

    #[test]
    fn test_single_segment_exact() {
        let segs = vec![seg((0.0, 0.0, 7.123_456_789), (1.0, 0.0, 2.000_000_4))];
        let ends = resolve(&segs);

        assert_eq!(ends.resolution, Resolution::SingleSegment);
        assert_eq!(ends.start, 2.000_000_4);
        assert_eq!(ends.end, 7.123_456_789);
    }

    #[test]
    fn test_linear_out_of_order() {
        // Rising stair, rows shuffled
        let segs = vec![
            seg((2.0, 0.0, 2.0), (3.0, 0.0, 3.0)),
            seg((0.0, 0.0, 0.0), (1.0, 0.0, 1.0)),
            seg((3.0, 0.0, 3.0), (4.0, 0.0, 4.0)),
            seg((1.0, 0.0, 1.0), (2.0, 0.0, 2.0)),
        ];
        let ends = resolve(&segs);

        assert_eq!(ends.resolution, Resolution::FarthestPair);
        assert!((ends.start - 0.0).abs() < 1e-9);
        assert!((ends.end - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_tree_picks_longest_branch() {
        //            (0,0,9)
        //               |
        // (-1,0,5) - (0,0,5) - (1,0,5) - (2,0,5) - (3,0,1)
        let segs = vec![
            seg((0.0, 0.0, 5.0), (0.0, 0.0, 9.0)),
            seg((-1.0, 0.0, 5.0), (0.0, 0.0, 5.0)),
            seg((0.0, 0.0, 5.0), (1.0, 0.0, 5.0)),
            seg((1.0, 0.0, 5.0), (2.0, 0.0, 5.0)),
            seg((2.0, 0.0, 5.0), (3.0, 0.0, 1.0)),
        ];
        let ends = resolve(&segs);

        assert_eq!(ends.resolution, Resolution::FarthestPair);
        // Both (-1,0,5) and (0,0,9) are 4 hops from (3,0,1); the lower key
        // is visited first.
        assert!((ends.start - 1.0).abs() < 1e-9);
        assert!((ends.end - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_closed_loop_falls_back_to_range() {
        let segs = vec![
            seg((0.0, 0.0, 0.0), (1.0, 0.0, 2.0)),
            seg((1.0, 0.0, 2.0), (1.0, 1.0, -1.0)),
            seg((1.0, 1.0, -1.0), (0.0, 0.0, 0.0)),
        ];
        let ends = resolve(&segs);

        assert_eq!(ends.resolution, Resolution::ElevationRange);
        assert!((ends.start + 1.0).abs() < 1e-9);
        assert!((ends.end - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_fittings_participate() {
        let segs = vec![
            seg((0.0, 0.0, 0.0), (5.0, 0.0, 0.0)).with_fittings(vec![FittingRef::new("Elbow", "1")]),
            seg((5.0, 0.0, 0.0), (5.0, 0.0, 3.0))
                .with_fittings(vec![FittingRef::new("Elbow", "1"), FittingRef::new("Tee", "2")]),
        ];
        let ends = resolve(&segs);

        assert!((ends.start - 0.0).abs() < 1e-9);
        assert!((ends.end - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_run() {
        let ends = resolve_endpoints(&[], &Snapper::default());
        assert_eq!(ends, EndpointElevations::empty());
    }

    #[test]
    fn test_farthest_first_visited_wins() {
        // Star: center with three tips, all two hops apart
        let segs = vec![
            seg((0.0, 0.0, 0.0), (1.0, 0.0, 1.0)),
            seg((0.0, 0.0, 0.0), (0.0, 1.0, 2.0)),
            seg((0.0, 0.0, 0.0), (-1.0, 0.0, 3.0)),
        ];
        let graph = TopologyGraph::build(&segs, &Snapper::default());

        // First leaf is the (-1,0,3) tip; from it the (0,1,2) tip is reached
        // first, and from there the (-1,0,3) tip again.
        let ends = resolve_graph(&graph);
        assert_eq!(ends.resolution, Resolution::FarthestPair);
        assert!((ends.start - 2.0).abs() < 1e-9);
        assert!((ends.end - 3.0).abs() < 1e-9);
        assert_eq!(resolve_graph(&graph), ends);
    }
}
