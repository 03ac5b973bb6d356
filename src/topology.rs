//! Per-run topology graph.
//!
//! Nodes are snapped segment endpoints and fitting instances. Edges join the
//! two endpoints of every segment, and every endpoint of a segment to each
//! fitting instance that segment references. A fitting shared by several
//! segments is one node with edges to all of them.
//!
//! ## Determinism
//!
//! Adjacency and elevations are kept in `BTreeMap`/`BTreeSet`, so node
//! iteration and neighbor visitation order depend only on node keys, never on
//! input row order or hashing.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use crate::geometry::Snapper;
use crate::types::{GridKey, SegmentRecord};

/// Identity of a graph node.
///
/// Orders point nodes before fitting nodes, each by its own key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKey {
    /// A snapped segment endpoint.
    Point(GridKey),
    /// A fitting instance, by instance id.
    Fitting(String),
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Point(key) => write!(f, "point{}", key),
            Self::Fitting(id) => write!(f, "fitting[{}]", id),
        }
    }
}

/// Undirected topology graph of one run, with node elevations.
///
/// Transient: built for endpoint resolution and dropped afterwards.
#[derive(Debug, Clone, Default)]
pub struct TopologyGraph {
    adjacency: BTreeMap<NodeKey, BTreeSet<NodeKey>>,
    elevations: BTreeMap<NodeKey, f64>,
}

impl TopologyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for the segments of one run.
    pub fn build<'a, I>(segments: I, snapper: &Snapper) -> Self
    where
        I: IntoIterator<Item = &'a SegmentRecord>,
    {
        let mut graph = Self::new();

        for segment in segments {
            let start_key = snapper.key(&segment.start);
            let end_key = snapper.key(&segment.end);
            let start = NodeKey::Point(start_key);
            let end = NodeKey::Point(end_key);

            graph.add_node(start.clone(), snapper.point_of(&start_key).z);
            graph.add_node(end.clone(), snapper.point_of(&end_key).z);
            graph.add_edge(&start, &end);

            for fitting in &segment.fittings {
                let node = NodeKey::Fitting(fitting.instance_id.clone());
                graph.adjacency.entry(node.clone()).or_default();
                graph.add_edge(&node, &start);
                graph.add_edge(&node, &end);
            }
        }

        graph.assign_fitting_elevations();
        graph
    }

    fn add_node(&mut self, node: NodeKey, elevation: f64) {
        self.adjacency.entry(node.clone()).or_default();
        self.elevations.entry(node).or_insert(elevation);
    }

    /// Add an undirected edge. Self loops (zero-length segments) are not
    /// recorded, so they never inflate a node's degree.
    fn add_edge(&mut self, a: &NodeKey, b: &NodeKey) {
        if a == b {
            return;
        }
        self.adjacency.entry(a.clone()).or_default().insert(b.clone());
        self.adjacency.entry(b.clone()).or_default().insert(a.clone());
    }

    /// A fitting has no measured elevation: use the mean elevation of the
    /// endpoints it is directly connected to.
    fn assign_fitting_elevations(&mut self) {
        for (node, neighbors) in &self.adjacency {
            if !matches!(node, NodeKey::Fitting(_)) {
                continue;
            }
            let zs: Vec<f64> = neighbors
                .iter()
                .filter(|n| matches!(n, NodeKey::Point(_)))
                .filter_map(|n| self.elevations.get(n).copied())
                .collect();
            let elevation = if zs.is_empty() {
                0.0
            } else {
                zs.iter().sum::<f64>() / zs.len() as f64
            };
            self.elevations.insert(node.clone(), elevation);
        }
    }

    /// Check whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// All nodes in key order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeKey> {
        self.adjacency.keys()
    }

    /// Neighbors of a node in key order.
    pub fn neighbors(&self, node: &NodeKey) -> impl Iterator<Item = &NodeKey> {
        self.adjacency.get(node).into_iter().flatten()
    }

    /// Number of distinct neighbors.
    pub fn degree(&self, node: &NodeKey) -> usize {
        self.adjacency.get(node).map_or(0, BTreeSet::len)
    }

    /// Degree-1 nodes (branch tips) in key order.
    pub fn leaves(&self) -> Vec<&NodeKey> {
        self.adjacency
            .iter()
            .filter(|(_, n)| n.len() == 1)
            .map(|(k, _)| k)
            .collect()
    }

    /// Elevation of a node.
    pub fn elevation(&self, node: &NodeKey) -> Option<f64> {
        self.elevations.get(node).copied()
    }

    /// Minimum and maximum elevation over all nodes.
    pub fn elevation_range(&self) -> Option<(f64, f64)> {
        self.elevations.values().fold(None, |acc, &z| match acc {
            None => Some((z, z)),
            Some((lo, hi)) => Some((lo.min(z), hi.max(z))),
        })
    }

    /// Breadth-first hop distances from `source` to every reachable node,
    /// in visitation order. Neighbors are visited in key order.
    pub fn hop_distances(&self, source: &NodeKey) -> Vec<(NodeKey, usize)> {
        let mut order = Vec::new();
        if !self.adjacency.contains_key(source) {
            return order;
        }

        let mut visited: BTreeSet<&NodeKey> = BTreeSet::new();
        let mut queue: VecDeque<(&NodeKey, usize)> = VecDeque::new();
        visited.insert(source);
        queue.push_back((source, 0));

        while let Some((node, dist)) = queue.pop_front() {
            order.push((node.clone(), dist));
            for next in self.neighbors(node) {
                if visited.insert(next) {
                    queue.push_back((next, dist + 1));
                }
            }
        }

        order
    }
}
