//! Optional dumps of closed subgraphs (GFA) and per-subgraph assembly metrics.
//! Failures here are logged and never abort the assembly.
use crate::path::Contig;
use crate::reference::ReferenceLookup;
use crate::subgraph::ClosedSubgraph;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Diagnostics {
    dir: PathBuf,
    subgraph_sizes: Vec<usize>,
}

impl Diagnostics {
    pub fn new(dir: &Path) -> Self {
        if let Err(why) = std::fs::create_dir_all(dir) {
            warn!("DIAGNOSTICS\t{:?}\t{}", dir, why);
        }
        Self {
            dir: dir.to_path_buf(),
            subgraph_sizes: vec![],
        }
    }
    pub fn graph_path(&self, reference_name: &str) -> PathBuf {
        self.dir.join(format!("debruijn.kmers.{}.gfa", reference_name))
    }
    pub fn metrics_path(&self, reference_name: &str) -> PathBuf {
        self.dir.join(format!("debruijn.assembly.metrics.{}.bed", reference_name))
    }
    pub fn record<R: ReferenceLookup + ?Sized>(
        &mut self,
        subgraph: &ClosedSubgraph,
        contig: Option<&Contig>,
        reference: &R,
        elapsed: Duration,
    ) {
        self.subgraph_sizes.push(subgraph.nodes.len());
        let name = match reference.name(subgraph.reference_index) {
            Some(name) => name.to_string(),
            None => subgraph.reference_index.to_string(),
        };
        if let Err(why) = self.write_graph(&name, subgraph) {
            warn!("DIAGNOSTICS\tGFA\t{}\t{}", name, why);
        }
        if let Err(why) = self.write_metrics(&name, subgraph, contig, elapsed) {
            warn!("DIAGNOSTICS\tMetrics\t{}\t{}", name, why);
        }
    }
    fn write_graph(&self, name: &str, subgraph: &ClosedSubgraph) -> std::io::Result<()> {
        let gfa = subgraph_to_gfa(subgraph);
        let mut wtr = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.graph_path(name))
            .map(std::io::BufWriter::new)?;
        writeln!(wtr, "{}", gfa)
    }
    fn write_metrics(
        &self,
        name: &str,
        subgraph: &ClosedSubgraph,
        contig: Option<&Contig>,
        elapsed: Duration,
    ) -> std::io::Result<()> {
        let mut wtr = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.metrics_path(name))
            .map(std::io::BufWriter::new)?;
        writeln!(
            wtr,
            "{}\t{}\t{}\tsubgraph{}{}\tKmers={};PathNodes={};Anchored={};Times={}",
            name,
            subgraph.min_position.saturating_sub(1),
            subgraph.max_position,
            subgraph.id,
            subgraph.direction,
            subgraph.nodes.len(),
            contig.map_or(0, |c| c.path.len()),
            subgraph.anchored_nodes,
            elapsed.as_micros()
        )
    }
    pub fn summary(&self) -> String {
        if self.subgraph_sizes.is_empty() {
            return "Subgraphs:0".to_string();
        }
        let hist = histgram_viz::Histgram::new(&self.subgraph_sizes);
        format!(
            "Subgraphs:{}\nKmers per subgraph\n{}",
            self.subgraph_sizes.len(),
            hist.format(20, 20)
        )
    }
}

/// Segments are k-mers (`cv` = weight, `rp` = number of reference positions), links are edges,
/// and one group holds the whole subgraph.
pub fn subgraph_to_gfa(subgraph: &ClosedSubgraph) -> gfa::GFA {
    let k = subgraph.k;
    let sid = subgraph.id;
    let name = move |id: usize| format!("s{}_{}", sid, id);
    let mut ids: Vec<_> = subgraph.nodes.keys().copied().collect();
    ids.sort_unstable();
    let segments = ids.iter().filter_map(|id| {
        let node = subgraph.nodes.get(id)?;
        let seq = String::from_utf8_lossy(&node.kmer.decode(k)).to_string();
        let seg = gfa::Segment::from(name(*id), k, Some(seq));
        let tags = vec![
            gfa::SamTag::new(format!("cv:i:{}", node.weight)),
            gfa::SamTag::new(format!("rp:i:{}", node.reference_positions.len())),
        ];
        Some(gfa::Record::from_contents(gfa::Content::Seg(seg), tags))
    });
    let edges = ids.iter().filter_map(|id| subgraph.nodes.get(id).map(|n| (id, n))).flat_map(|(id, node)| {
        node.successors.iter().map(move |edge| {
            let sid1 = gfa::RefID::from(&name(*id), true);
            let sid2 = gfa::RefID::from(&name(edge.to), true);
            let beg1 = gfa::Position::from(k, true);
            let beg2 = gfa::Position::from(0, false);
            let edge_record = gfa::Edge::from(None, sid1, sid2, beg1, beg1, beg2, beg2, None);
            let tags = vec![gfa::SamTag::new(format!("cv:i:{}", edge.weight))];
            gfa::Record::from_contents(gfa::Content::Edge(edge_record), tags)
        })
    });
    let mut records: Vec<_> = segments.chain(edges).collect();
    let uid = Some(format!("subgraph-{}", subgraph.id));
    let group = gfa::Group::Set(gfa::UnorderedGroup {
        uid,
        ids: ids.iter().map(|&id| name(id)).collect(),
    });
    records.push(gfa::Record::from_contents(gfa::Content::Group(group), vec![]));
    gfa::GFA::from_records(records)
}
