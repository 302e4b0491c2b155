//! Positional de Bruijn graph built incrementally from evidence.
//!
//! A node is a k-mer together with the coordinate span its first base is expected at.
//! The same k-mer at two loci further apart than the window margin is two nodes.
use crate::error::AssemblyError;
use crate::kmer::{Kmer, KmerIter};
use crate::reference::ReferenceLookup;
use crate::subgraph::{ClosedSubgraph, SubgraphTracker};
use definitions::{BasePlacement, BreakendDirection, Evidence};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub to: NodeId,
    pub weight: u64,
}

/// The identity of an evidence traversing a node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EvidenceTag {
    pub id: Rc<str>,
    pub is_soft_clip: bool,
}

#[derive(Clone)]
pub struct KmerNode {
    pub kmer: Kmer,
    /// Number of evidence traversals.
    pub weight: u64,
    /// The first base of this k-mer is expected in `[start, end]`.
    pub start: usize,
    pub end: usize,
    /// Coordinates at which an exactly placed traversal matched the reference.
    pub reference_positions: BTreeSet<usize>,
    pub evidence: BTreeSet<EvidenceTag>,
    pub successors: Vec<Edge>,
    /// Mirror of the successor lists: the edge weight is the weight of the edge from `to` into this node.
    pub predecessors: Vec<Edge>,
    pub subgraph: usize,
}

impl std::fmt::Debug for KmerNode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let edges: Vec<_> = self
            .successors
            .iter()
            .map(|e| format!("(->{},{})", e.to, e.weight))
            .collect();
        write!(
            f,
            "{:?}\t{}\t[{},{}]\t{:?}\t{}",
            self.kmer,
            self.weight,
            self.start,
            self.end,
            self.reference_positions,
            edges.join(",")
        )
    }
}

impl KmerNode {
    fn new(kmer: Kmer, start: usize, end: usize, subgraph: usize) -> Self {
        Self {
            kmer,
            weight: 0,
            start,
            end,
            reference_positions: BTreeSet::new(),
            evidence: BTreeSet::new(),
            successors: vec![],
            predecessors: vec![],
            subgraph,
        }
    }
    pub fn is_anchored(&self) -> bool {
        !self.reference_positions.is_empty()
    }
    fn push(edges: &mut Vec<Edge>, to: NodeId) {
        match edges.iter_mut().find(|e| e.to == to) {
            Some(x) => x.weight += 1,
            None => edges.push(Edge { to, weight: 1 }),
        }
    }
    pub fn successor_weight(&self, to: NodeId) -> u64 {
        self.successors
            .iter()
            .find(|e| e.to == to)
            .map(|e| e.weight)
            .unwrap_or(0)
    }
}

/// The graph of one breakend direction on one reference.
pub struct KmerGraph {
    k: usize,
    margin: usize,
    reference_index: usize,
    direction: BreakendDirection,
    nodes: HashMap<NodeId, KmerNode>,
    index: HashMap<Kmer, Vec<NodeId>>,
    tracker: SubgraphTracker,
    next_node: NodeId,
}

impl std::fmt::Debug for KmerGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut ids: Vec<_> = self.nodes.keys().collect();
        ids.sort();
        for id in ids {
            writeln!(f, "{}\t{:?}", id, self.nodes[id])?;
        }
        write!(f, "K:{}\t{}\t{}", self.k, self.reference_index, self.direction)
    }
}

impl KmerGraph {
    pub fn new(k: usize, margin: usize, reference_index: usize, direction: BreakendDirection) -> Self {
        Self {
            k,
            margin,
            reference_index,
            direction,
            nodes: HashMap::new(),
            index: HashMap::new(),
            tracker: SubgraphTracker::new(),
            next_node: 0,
        }
    }
    pub fn k(&self) -> usize {
        self.k
    }
    pub fn reference_index(&self) -> usize {
        self.reference_index
    }
    pub fn direction(&self) -> BreakendDirection {
        self.direction
    }
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
    pub fn node(&self, id: NodeId) -> Option<&KmerNode> {
        self.nodes.get(&id)
    }
    /// Nodes carrying `kmer`, oldest first.
    pub fn nodes_of(&self, kmer: Kmer) -> impl Iterator<Item = (NodeId, &KmerNode)> {
        self.index
            .get(&kmer)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.nodes.get(id).map(|n| (*id, n)))
    }
    pub fn tracker(&self) -> &SubgraphTracker {
        &self.tracker
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    /// Fold one evidence into the graph. `bases` are the uppercase bases in reference orientation and
    /// `placement` is where the first of them lies. Returns the number of k-mers traversed.
    pub fn incorporate<R: ReferenceLookup + ?Sized>(
        &mut self,
        evidence: &Evidence,
        bases: &[u8],
        placement: BasePlacement,
        reference: &R,
    ) -> usize {
        let k = self.k;
        let tag = EvidenceTag {
            id: Rc::from(evidence.id.as_str()),
            is_soft_clip: evidence.is_soft_clip(),
        };
        let mut previous: Option<(usize, NodeId)> = None;
        let mut traversed = 0;
        for (offset, kmer) in KmerIter::new(bases, k) {
            // Windows hanging off the start of the reference are kept at coordinate 1 but never anchored.
            let (start, end, is_exact) = match placement {
                BasePlacement::Exact(x) => match x + offset as i64 {
                    x if x < 1 => (1, 1, false),
                    x => (x as usize, x as usize, true),
                },
                BasePlacement::Window(s, e) => (s + offset, e + offset, false),
            };
            let matches_reference = is_exact
                && reference.slice(self.reference_index, start, k) == Some(&bases[offset..offset + k]);
            let id = self.find_or_create(kmer, start, end);
            let node = match self.nodes.get_mut(&id) {
                Some(node) => node,
                None => continue,
            };
            node.weight += 1;
            node.start = node.start.min(start);
            node.end = node.end.max(end);
            node.evidence.insert(tag.clone());
            let newly_anchored = matches_reference && node.reference_positions.is_empty();
            if matches_reference {
                node.reference_positions.insert(start);
            }
            let subgraph = node.subgraph;
            self.tracker
                .extend(subgraph, start, end + k - 1, newly_anchored);
            if let Some((prev_offset, prev)) = previous {
                if prev_offset + 1 == offset {
                    self.add_edge(prev, id);
                }
            }
            previous = Some((offset, id));
            traversed += 1;
        }
        trace!(
            "INCORPORATE\t{}\t{}\t{}\t{}",
            evidence.id,
            self.direction,
            traversed,
            self.nodes.len()
        );
        traversed
    }
    fn find_or_create(&mut self, kmer: Kmer, start: usize, end: usize) -> NodeId {
        let margin = self.margin;
        let nodes = &self.nodes;
        let found = self.index.get(&kmer).and_then(|ids| {
            ids.iter().copied().find(|id| match nodes.get(id) {
                Some(node) => node.start <= end + margin && start <= node.end + margin,
                None => false,
            })
        });
        if let Some(id) = found {
            return id;
        }
        let id = self.next_node;
        self.next_node += 1;
        let subgraph = self.tracker.open(id, start, end + self.k - 1);
        self.nodes.insert(id, KmerNode::new(kmer, start, end, subgraph));
        self.index.entry(kmer).or_default().push(id);
        id
    }
    fn add_edge(&mut self, from: NodeId, to: NodeId) {
        let from_subgraph = match self.nodes.get_mut(&from) {
            Some(node) => {
                KmerNode::push(&mut node.successors, to);
                node.subgraph
            }
            None => return,
        };
        let to_subgraph = match self.nodes.get_mut(&to) {
            Some(node) => {
                KmerNode::push(&mut node.predecessors, from);
                node.subgraph
            }
            None => return,
        };
        if from_subgraph != to_subgraph {
            if let Some((kept, moved)) = self.tracker.merge(from_subgraph, to_subgraph) {
                for id in moved {
                    if let Some(node) = self.nodes.get_mut(&id) {
                        node.subgraph = kept;
                    }
                }
            }
        }
    }
    /// Remove and return every component whose last coordinate is more than the margin behind `frontier`.
    pub fn close_before(&mut self, frontier: usize) -> Vec<ClosedSubgraph> {
        let ids = self.tracker.closable(frontier, self.margin);
        ids.into_iter().filter_map(|id| self.detach(id)).collect()
    }
    /// Remove and return every component.
    pub fn close_all(&mut self) -> Vec<ClosedSubgraph> {
        let ids = self.tracker.all();
        ids.into_iter().filter_map(|id| self.detach(id)).collect()
    }
    fn detach(&mut self, id: usize) -> Option<ClosedSubgraph> {
        let subgraph = self.tracker.remove(id)?;
        let mut nodes = HashMap::with_capacity(subgraph.nodes.len());
        for node_id in subgraph.nodes.iter() {
            if let Some(node) = self.nodes.remove(node_id) {
                if let Some(ids) = self.index.get_mut(&node.kmer) {
                    ids.retain(|x| x != node_id);
                    if ids.is_empty() {
                        self.index.remove(&node.kmer);
                    }
                }
                nodes.insert(*node_id, node);
            }
        }
        Some(ClosedSubgraph {
            id,
            reference_index: self.reference_index,
            direction: self.direction,
            k: self.k,
            min_position: subgraph.min_position,
            max_position: subgraph.max_position,
            anchored_nodes: subgraph.anchored_nodes,
            nodes,
        })
    }
    /// Check the structural invariants of the graph.
    pub fn sanity_check(&self) -> Result<(), AssemblyError> {
        let fail = |message: String| Err(AssemblyError::SanityCheck { message });
        for (&id, node) in self.nodes.iter() {
            for edge in node.successors.iter() {
                let mirrored = self
                    .nodes
                    .get(&edge.to)
                    .and_then(|to| to.predecessors.iter().find(|e| e.to == id));
                if mirrored.map(|e| e.weight) != Some(edge.weight) {
                    return fail(format!("edge {}->{} has no matching predecessor", id, edge.to));
                }
                if self.nodes[&edge.to].subgraph != node.subgraph {
                    return fail(format!("edge {}->{} crosses subgraphs", id, edge.to));
                }
            }
            for edge in node.predecessors.iter() {
                let weight = self.nodes.get(&edge.to).map(|from| from.successor_weight(id));
                if weight != Some(edge.weight) {
                    return fail(format!("predecessor {}<-{} has no matching edge", id, edge.to));
                }
            }
            if !self.index.get(&node.kmer).map_or(false, |ids| ids.contains(&id)) {
                return fail(format!("node {} is not indexed", id));
            }
            match self.tracker.get(node.subgraph) {
                Some(subgraph) => {
                    if node.start < subgraph.min_position || subgraph.max_position < node.end + self.k - 1 {
                        return fail(format!("node {} lies outside subgraph {}", id, subgraph.id));
                    }
                }
                None => return fail(format!("node {} has no subgraph", id)),
            }
            if node.weight == 0 {
                return fail(format!("node {} has no support", id));
            }
        }
        let members: usize = self.tracker.iter().map(|s| s.nodes.len()).sum();
        if members != self.nodes.len() {
            return fail(format!("{} subgraph members but {} nodes", members, self.nodes.len()));
        }
        for subgraph in self.tracker.iter() {
            for id in subgraph.nodes.iter() {
                if self.nodes.get(id).map(|n| n.subgraph) != Some(subgraph.id) {
                    return fail(format!("subgraph {} claims node {}", subgraph.id, id));
                }
            }
        }
        let indexed: usize = self.index.values().map(|ids| ids.len()).sum();
        if indexed != self.nodes.len() {
            return fail(format!("{} indexed but {} nodes", indexed, self.nodes.len()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::InMemoryReference;
    use definitions::BreakendDirection::Forward;
    fn reference() -> InMemoryReference {
        InMemoryReference::new(vec![("chr1".to_string(), b"TAAACCCCGGGGTTTTACGTACGTAAAC".to_vec())])
    }
    fn sc(id: &str, position: usize, anchor: usize, seq: &str) -> Evidence {
        Evidence::soft_clip(id, 0, Forward, position, anchor, seq)
    }
    #[test]
    fn same_kmer_same_coordinate_is_one_node() {
        let reference = reference();
        let mut graph = KmerGraph::new(3, 10, 0, Forward);
        let e1 = sc("r1", 1, 4, "TAAAGTC");
        let e2 = sc("r2", 1, 3, "TAAT");
        graph.incorporate(&e1, b"TAAAGTC", BasePlacement::Exact(1), &reference);
        graph.incorporate(&e2, b"TAAT", BasePlacement::Exact(1), &reference);
        graph.sanity_check().unwrap();
        let taa = Kmer::new(b"TAA").unwrap();
        let nodes: Vec<_> = graph.nodes_of(taa).collect();
        assert_eq!(nodes.len(), 1);
        let (_, node) = nodes[0];
        assert_eq!(node.weight, 2);
        assert_eq!(node.evidence.len(), 2);
        assert!(node.reference_positions.contains(&1));
        let aag = graph.nodes_of(Kmer::new(b"AAG").unwrap()).next().unwrap().1;
        assert!(!aag.is_anchored());
        // TAA -> AAA and TAA -> AAT
        assert_eq!(node.successors.len(), 2);
        let aaa = graph.nodes_of(Kmer::new(b"AAA").unwrap()).next().unwrap().1;
        assert_eq!(aaa.successors.len(), 1);
        assert_eq!(aaa.predecessors, vec![Edge { to: nodes[0].0, weight: 1 }]);
        assert_eq!(graph.tracker().len(), 1);
    }
    #[test]
    fn distant_loci_stay_apart() {
        let reference = reference();
        let mut graph = KmerGraph::new(3, 2, 0, Forward);
        let e1 = sc("r1", 1, 3, "TAAG");
        let e2 = sc("r2", 20, 3, "TAAG");
        graph.incorporate(&e1, b"TAAG", BasePlacement::Exact(1), &reference);
        graph.incorporate(&e2, b"TAAG", BasePlacement::Exact(20), &reference);
        graph.sanity_check().unwrap();
        assert_eq!(graph.nodes_of(Kmer::new(b"TAA").unwrap()).count(), 2);
        assert_eq!(graph.tracker().len(), 2);
        let closed = graph.close_before(10);
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].nodes.len(), 2);
        assert_eq!(closed[0].min_position, 1);
        assert_eq!(closed[0].max_position, 4);
        graph.sanity_check().unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.close_all().len(), 1);
        assert!(graph.is_empty());
    }
    #[test]
    fn windows_merge_into_exact_nodes() {
        let reference = reference();
        let mut graph = KmerGraph::new(3, 10, 0, Forward);
        let rp = Evidence::read_pair("p1", 0, (1, 10), false, None, "GACTTTA");
        graph.incorporate(&rp, b"TAAAGTC", BasePlacement::Window(1, 301), &reference);
        let e1 = sc("r1", 15, 3, "TAAT");
        graph.incorporate(&e1, b"TAAT", BasePlacement::Exact(15), &reference);
        graph.sanity_check().unwrap();
        let taa: Vec<_> = graph.nodes_of(Kmer::new(b"TAA").unwrap()).collect();
        assert_eq!(taa.len(), 1);
        assert_eq!(taa[0].1.weight, 2);
        assert!(!taa[0].1.is_anchored());
        assert_eq!(graph.tracker().len(), 1);
        let subgraph = graph.tracker().iter().next().unwrap();
        assert_eq!(subgraph.max_position, 301 + 4 + 2);
    }
    #[test]
    fn ambiguous_bases_break_the_walk() {
        let reference = reference();
        let mut graph = KmerGraph::new(3, 10, 0, Forward);
        let e1 = sc("r1", 1, 3, "TAANCCC");
        let traversed = graph.incorporate(&e1, b"TAANCCC", BasePlacement::Exact(1), &reference);
        assert_eq!(traversed, 2);
        graph.sanity_check().unwrap();
        assert_eq!(graph.tracker().len(), 2);
    }
    #[test]
    fn windows_before_the_reference_start_are_not_anchored() {
        let reference = reference();
        let mut graph = KmerGraph::new(3, 10, 0, BreakendDirection::Backward);
        let e1 = Evidence::soft_clip("r1", 0, BreakendDirection::Backward, 1, 4, "GGTAAA");
        let traversed = graph.incorporate(&e1, b"GGTAAA", BasePlacement::Exact(-1), &reference);
        assert_eq!(traversed, 4);
        graph.sanity_check().unwrap();
        let ggt = graph.nodes_of(Kmer::new(b"GGT").unwrap()).next().unwrap().1;
        assert_eq!((ggt.start, ggt.end), (1, 1));
        assert!(!ggt.is_anchored());
        let gta = graph.nodes_of(Kmer::new(b"GTA").unwrap()).next().unwrap().1;
        assert!(!gta.is_anchored());
        let taa = graph.nodes_of(Kmer::new(b"TAA").unwrap()).next().unwrap().1;
        assert!(taa.reference_positions.contains(&1));
        assert_eq!(graph.tracker().len(), 1);
        assert_eq!(graph.tracker().iter().next().unwrap().min_position, 1);
    }
}
