//! Greedy walk through a closed subgraph.
//!
//! Seed: the heaviest node. Ties prefer a reference-anchored node, then the smallest k-mer, then the oldest node.
//! From the seed the walk is extended forward, then backward, never revisiting a node. At each step the candidate with
//! the heaviest edge wins, then the heaviest node, then the one reaching more unvisited nodes in the walking direction,
//! then the smallest k-mer, then the oldest node.
use crate::graph::{EvidenceTag, KmerNode, NodeId};
use crate::subgraph::ClosedSubgraph;
use definitions::BreakendDirection;
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashSet};

/// A run of path nodes anchored at consecutive reference coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KmerAnchor {
    /// Coordinate of the first base of the first k-mer of the run.
    pub position: usize,
    /// Number of k-mers in the run.
    pub kmers: usize,
}

#[derive(Debug, Clone)]
pub struct Contig {
    pub subgraph: usize,
    pub reference_index: usize,
    pub direction: BreakendDirection,
    pub k: usize,
    pub seq: Vec<u8>,
    pub path: Vec<NodeId>,
    pub weight: u64,
    pub evidence: BTreeSet<EvidenceTag>,
    /// Anchor run starting at the first k-mer of the path. Its position is the coordinate of base 0.
    pub leading: Option<KmerAnchor>,
    /// Anchor run ending at the last k-mer of the path. Its position is the coordinate of the last k-mer.
    pub trailing: Option<KmerAnchor>,
}

impl Contig {
    pub fn len(&self) -> usize {
        self.seq.len()
    }
    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
    /// Coordinate one past the last base, as implied by the trailing anchor.
    pub fn trailing_end(&self) -> Option<usize> {
        self.trailing.map(|t| t.position + self.k)
    }
}

/// Walk the subgraph. Returns `None` if the walk has no anchored end on the breakend side
/// or its weight is below `min_path_weight`.
pub fn select_path(subgraph: &ClosedSubgraph, min_path_weight: u64) -> Option<Contig> {
    let nodes = &subgraph.nodes;
    let (&seed, _) = nodes.iter().max_by_key(|&(&id, node)| {
        (node.weight, node.is_anchored(), Reverse(node.kmer), Reverse(id))
    })?;
    let mut visited: HashSet<NodeId> = HashSet::new();
    visited.insert(seed);
    let mut forward = vec![];
    let mut current = seed;
    while let Some(next) = best_next(subgraph, current, &visited, true) {
        visited.insert(next);
        forward.push(next);
        current = next;
    }
    let mut backward = vec![];
    current = seed;
    while let Some(next) = best_next(subgraph, current, &visited, false) {
        visited.insert(next);
        backward.push(next);
        current = next;
    }
    let mut path: Vec<NodeId> = backward.into_iter().rev().collect();
    path.push(seed);
    path.extend(forward);
    let is_anchored = |id: &NodeId| nodes.get(id).map_or(false, |n| n.is_anchored());
    match subgraph.direction {
        BreakendDirection::Forward => {
            let first = path.iter().position(is_anchored)?;
            path.drain(..first);
        }
        BreakendDirection::Backward => {
            let last = path.iter().rposition(is_anchored)?;
            path.truncate(last + 1);
        }
    }
    let path_nodes: Vec<&KmerNode> = path.iter().filter_map(|id| nodes.get(id)).collect();
    let weight: u64 = path_nodes.iter().map(|n| n.weight).sum();
    if weight < min_path_weight {
        debug!(
            "ASM\t{}\t{}\tFiltered\t{}\t{}",
            subgraph.id, subgraph.direction, weight, min_path_weight
        );
        return None;
    }
    let k = subgraph.k;
    let mut seq = path_nodes.first()?.kmer.decode(k);
    seq.extend(path_nodes.iter().skip(1).map(|n| n.kmer.last_base()));
    let evidence = path_nodes
        .iter()
        .flat_map(|n| n.evidence.iter().cloned())
        .collect();
    let leading = leading_anchor(&path_nodes);
    let trailing = trailing_anchor(&path_nodes);
    Some(Contig {
        subgraph: subgraph.id,
        reference_index: subgraph.reference_index,
        direction: subgraph.direction,
        k,
        seq,
        path,
        weight,
        evidence,
        leading,
        trailing,
    })
}

fn best_next(
    subgraph: &ClosedSubgraph,
    current: NodeId,
    visited: &HashSet<NodeId>,
    forward: bool,
) -> Option<NodeId> {
    let node = subgraph.nodes.get(&current)?;
    let edges = match forward {
        true => &node.successors,
        false => &node.predecessors,
    };
    let candidates: Vec<_> = edges
        .iter()
        .filter(|e| !visited.contains(&e.to))
        .filter_map(|e| subgraph.nodes.get(&e.to).map(|n| (e.to, e.weight, n)))
        .collect();
    let best = candidates.iter().map(|&(_, w, n)| (w, n.weight)).max()?;
    let tied: Vec<_> = candidates
        .into_iter()
        .filter(|&(_, w, n)| (w, n.weight) == best)
        .collect();
    if tied.len() == 1 {
        return Some(tied[0].0);
    }
    tied.into_iter()
        .max_by_key(|&(id, _, n)| (reach(subgraph, id, visited, forward), Reverse(n.kmer), Reverse(id)))
        .map(|(id, _, _)| id)
}

/// Number of unvisited nodes reachable from `start` (itself included).
fn reach(subgraph: &ClosedSubgraph, start: NodeId, visited: &HashSet<NodeId>, forward: bool) -> usize {
    let mut arrived: HashSet<NodeId> = HashSet::new();
    let mut stack = vec![start];
    arrived.insert(start);
    while let Some(id) = stack.pop() {
        let node = match subgraph.nodes.get(&id) {
            Some(node) => node,
            None => continue,
        };
        let edges = match forward {
            true => &node.successors,
            false => &node.predecessors,
        };
        for edge in edges {
            if !visited.contains(&edge.to) && arrived.insert(edge.to) {
                stack.push(edge.to);
            }
        }
    }
    arrived.len()
}

// The longest run, ties to the smallest coordinate.
fn leading_anchor(path: &[&KmerNode]) -> Option<KmerAnchor> {
    let first = path.first()?;
    first
        .reference_positions
        .iter()
        .map(|&position| {
            let kmers = path
                .iter()
                .enumerate()
                .take_while(|(j, n)| n.reference_positions.contains(&(position + j)))
                .count();
            KmerAnchor { position, kmers }
        })
        .max_by_key(|anchor| (anchor.kmers, Reverse(anchor.position)))
}

// The longest run, ties to the largest coordinate.
fn trailing_anchor(path: &[&KmerNode]) -> Option<KmerAnchor> {
    let last = path.last()?;
    last.reference_positions
        .iter()
        .map(|&position| {
            let kmers = path
                .iter()
                .rev()
                .enumerate()
                .take_while(|(j, n)| {
                    position
                        .checked_sub(*j)
                        .map_or(false, |p| n.reference_positions.contains(&p))
                })
                .count();
            KmerAnchor { position, kmers }
        })
        .max_by_key(|anchor| (anchor.kmers, anchor.position))
}
