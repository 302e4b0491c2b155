//! Connected components of a k-mer graph and the rule deciding when they are complete.
use crate::graph::{KmerNode, NodeId};
use definitions::BreakendDirection;
use std::collections::HashMap;

/// An open connected component.
#[derive(Debug, Clone)]
pub struct Subgraph {
    pub id: usize,
    pub nodes: Vec<NodeId>,
    /// Smallest coordinate any node of this component can start at.
    pub min_position: usize,
    /// Largest coordinate covered by any k-mer of this component.
    pub max_position: usize,
    /// Number of nodes matching the reference at some coordinate.
    pub anchored_nodes: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SubgraphTracker {
    subgraphs: HashMap<usize, Subgraph>,
    next_id: usize,
}

impl SubgraphTracker {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn len(&self) -> usize {
        self.subgraphs.len()
    }
    pub fn is_empty(&self) -> bool {
        self.subgraphs.is_empty()
    }
    pub fn get(&self, id: usize) -> Option<&Subgraph> {
        self.subgraphs.get(&id)
    }
    pub fn iter(&self) -> impl Iterator<Item = &Subgraph> {
        self.subgraphs.values()
    }
    /// Open a singleton component and return its id.
    pub fn open(&mut self, node: NodeId, min_position: usize, max_position: usize) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        let subgraph = Subgraph {
            id,
            nodes: vec![node],
            min_position,
            max_position,
            anchored_nodes: 0,
        };
        self.subgraphs.insert(id, subgraph);
        id
    }
    /// Widen the coordinate window of a component.
    pub fn extend(&mut self, id: usize, min_position: usize, max_position: usize, newly_anchored: bool) {
        if let Some(subgraph) = self.subgraphs.get_mut(&id) {
            subgraph.min_position = subgraph.min_position.min(min_position);
            subgraph.max_position = subgraph.max_position.max(max_position);
            subgraph.anchored_nodes += newly_anchored as usize;
        }
    }
    /// Merge two components. The smaller one is absorbed into the larger one (ties keep the older one).
    /// Returns the id of the surviving component and the nodes that changed membership.
    pub fn merge(&mut self, a: usize, b: usize) -> Option<(usize, Vec<NodeId>)> {
        if a == b {
            return Some((a, vec![]));
        }
        let (size_a, size_b) = (self.subgraphs.get(&a)?.nodes.len(), self.subgraphs.get(&b)?.nodes.len());
        let (kept, absorbed) = match size_a.cmp(&size_b) {
            std::cmp::Ordering::Less => (b, a),
            std::cmp::Ordering::Greater => (a, b),
            std::cmp::Ordering::Equal => (a.min(b), a.max(b)),
        };
        let absorbed = self.subgraphs.remove(&absorbed)?;
        let kept_graph = self.subgraphs.get_mut(&kept)?;
        kept_graph.nodes.extend(absorbed.nodes.iter().copied());
        kept_graph.min_position = kept_graph.min_position.min(absorbed.min_position);
        kept_graph.max_position = kept_graph.max_position.max(absorbed.max_position);
        kept_graph.anchored_nodes += absorbed.anchored_nodes;
        Some((kept, absorbed.nodes))
    }
    /// Components that no evidence starting at or after `frontier` can reach.
    pub fn closable(&self, frontier: usize, margin: usize) -> Vec<usize> {
        let mut ids: Vec<_> = self
            .subgraphs
            .values()
            .filter(|s| s.max_position + margin < frontier)
            .map(|s| s.id)
            .collect();
        ids.sort_unstable();
        ids
    }
    pub fn all(&self) -> Vec<usize> {
        let mut ids: Vec<_> = self.subgraphs.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
    pub fn remove(&mut self, id: usize) -> Option<Subgraph> {
        self.subgraphs.remove(&id)
    }
}

/// A component removed from its graph. It owns its nodes and never changes again.
#[derive(Debug, Clone)]
pub struct ClosedSubgraph {
    pub id: usize,
    pub reference_index: usize,
    pub direction: BreakendDirection,
    pub k: usize,
    pub min_position: usize,
    pub max_position: usize,
    pub anchored_nodes: usize,
    pub nodes: HashMap<NodeId, KmerNode>,
}

impl ClosedSubgraph {
    /// The order in which closed components are assembled.
    pub fn flush_key(&self) -> (usize, BreakendDirection, usize) {
        (self.min_position, self.direction, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn merge_smaller_into_larger() {
        let mut tracker = SubgraphTracker::new();
        let a = tracker.open(0, 10, 14);
        tracker.extend(a, 10, 20, true);
        let b = tracker.open(1, 30, 34);
        let c = tracker.open(2, 5, 9);
        let (kept, moved) = tracker.merge(b, c).unwrap();
        assert_eq!(kept, b.min(c));
        assert_eq!(moved, vec![2]);
        let (kept, moved) = tracker.merge(a, b).unwrap();
        assert_eq!(kept, b);
        assert_eq!(moved, vec![0]);
        assert_eq!(tracker.len(), 1);
        let merged = tracker.get(b).unwrap();
        assert_eq!((merged.min_position, merged.max_position), (5, 34));
        assert_eq!(merged.anchored_nodes, 1);
        let mut nodes = merged.nodes.clone();
        nodes.sort();
        assert_eq!(nodes, vec![0, 1, 2]);
        assert_eq!(tracker.merge(b, b).unwrap(), (b, vec![]));
    }
    #[test]
    fn close_behind_frontier() {
        let mut tracker = SubgraphTracker::new();
        let a = tracker.open(0, 1, 10);
        let b = tracker.open(1, 5, 40);
        assert!(tracker.closable(20, 10).is_empty());
        assert!(tracker.closable(21, 10) == vec![a]);
        assert_eq!(tracker.closable(100, 10), vec![a, b]);
        assert!(tracker.remove(a).is_some());
        assert_eq!(tracker.all(), vec![b]);
    }
}
