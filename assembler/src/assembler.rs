//! The online assembler: a strictly sequential state machine over coordinate-sorted evidence.
use crate::breakpoint::{anchors_match, resolve};
use crate::config::{AssemblyConfig, ProcessingConfig};
use crate::diagnostics::Diagnostics;
use crate::emit::AssemblyEmitter;
use crate::error::AssemblyError;
use crate::graph::KmerGraph;
use crate::path::select_path;
use crate::reference::ReferenceLookup;
use crate::subgraph::ClosedSubgraph;
use definitions::{parse_cigar, AssemblyEvidence, BreakendDirection, BreakpointSummary, Evidence, VariantSummary};
use std::collections::HashSet;

/// Sort evidence into the order [DeBruijnSubgraphAssembler] requires.
pub fn sort_evidence(evidence: &mut [Evidence], max_fragment: usize) {
    evidence.sort_by(|x, y| {
        let x_key = (x.reference_index, x.start_position(max_fragment));
        let y_key = (y.reference_index, y.start_position(max_fragment));
        x_key.cmp(&y_key).then_with(|| x.id.cmp(&y.id))
    });
}

struct ReferenceState {
    reference_index: usize,
    frontier: usize,
    /// Forward and backward graphs.
    graphs: [KmerGraph; 2],
    /// Indels already reported from this reference. Both graphs usually find the same one.
    reported_indels: HashSet<BreakpointSummary>,
}

impl ReferenceState {
    /// Drop reported indels that no open or future subgraph can report again.
    /// Contigs only reach `max_indel_size` past their own nodes, and every node of an open
    /// subgraph lies at or after that subgraph's first coordinate.
    fn forget_indels_before(&mut self, frontier: usize, config: &AssemblyConfig) {
        let low_water = self
            .graphs
            .iter()
            .flat_map(|g| g.tracker().iter().map(|s| s.min_position))
            .fold(frontier, usize::min);
        let horizon = config.window_margin + config.max_indel_size;
        let before = self.reported_indels.len();
        self.reported_indels
            .retain(|bp| low_water <= bp.local.end.max(bp.remote.end) + horizon);
        if self.reported_indels.len() < before {
            trace!(
                "FORGET	{}	{}	{}",
                self.reference_index,
                low_water,
                before - self.reported_indels.len()
            );
        }
    }
}

fn slot(direction: BreakendDirection) -> usize {
    match direction {
        BreakendDirection::Forward => 0,
        BreakendDirection::Backward => 1,
    }
}

pub struct DeBruijnSubgraphAssembler<'a, R: ReferenceLookup + ?Sized> {
    config: &'a ProcessingConfig,
    reference: &'a R,
    state: Option<ReferenceState>,
    emitter: AssemblyEmitter,
    diagnostics: Option<Diagnostics>,
    subgraphs_closed: usize,
    finished: bool,
}

impl<'a, R: ReferenceLookup + ?Sized> DeBruijnSubgraphAssembler<'a, R> {
    pub fn new(config: &'a ProcessingConfig, reference: &'a R) -> Result<Self, AssemblyError> {
        config.assembly.validate()?;
        let diagnostics = config.diagnostics.as_deref().map(Diagnostics::new);
        Ok(Self {
            config,
            reference,
            state: None,
            emitter: AssemblyEmitter::new(),
            diagnostics,
            subgraphs_closed: 0,
            finished: false,
        })
    }
    pub fn subgraphs_closed(&self) -> usize {
        self.subgraphs_closed
    }
    pub fn emitted(&self) -> usize {
        self.emitter.emitted()
    }
    /// Number of k-mer nodes currently held in open subgraphs.
    pub fn open_nodes(&self) -> usize {
        self.state
            .as_ref()
            .map_or(0, |s| s.graphs.iter().map(|g| g.node_count()).sum())
    }
    /// Fold one evidence into the graph. Returns the assemblies of every subgraph the new frontier closed.
    pub fn add_evidence(&mut self, evidence: &Evidence) -> Result<Vec<AssemblyEvidence>, AssemblyError> {
        if self.finished {
            return Err(AssemblyError::contract(format!(
                "evidence {} added after the end of evidence",
                evidence.id
            )));
        }
        if self.reference.reference_count() <= evidence.reference_index {
            return Err(AssemblyError::contract(format!(
                "evidence {} is on unknown reference {}",
                evidence.id, evidence.reference_index
            )));
        }
        let max_fragment = self.config.assembly.max_fragment_size;
        let start = evidence.start_position(max_fragment);
        let mut assemblies = vec![];
        let is_new_reference = match self.state.as_ref() {
            Some(state) => {
                let current = (state.reference_index, state.frontier);
                if (evidence.reference_index, start) < current {
                    return Err(AssemblyError::OutOfOrder {
                        id: evidence.id.clone(),
                        reference_index: evidence.reference_index,
                        position: start,
                        frontier_reference: current.0,
                        frontier: current.1,
                    });
                }
                state.reference_index < evidence.reference_index
            }
            None => true,
        };
        if is_new_reference {
            assemblies.extend(self.flush_all()?);
            self.state = Some(self.open_reference(evidence.reference_index));
        }
        let closed = match self.state.as_mut() {
            Some(state) => {
                state.frontier = start;
                let mut closed = vec![];
                for graph in state.graphs.iter_mut() {
                    closed.extend(graph.close_before(start));
                }
                state.forget_indels_before(start, &self.config.assembly);
                closed
            }
            None => vec![],
        };
        assemblies.extend(self.assemble(closed)?);
        let bases = crate::seq::assembly_bases(evidence);
        let placement = evidence.placement(max_fragment);
        let reference = self.reference;
        if let Some(state) = self.state.as_mut() {
            let graph = &mut state.graphs[slot(evidence.direction())];
            graph.incorporate(evidence, &bases, placement, reference);
            if self.config.sanity_check_graph {
                graph.sanity_check()?;
            }
        }
        Ok(assemblies)
    }
    /// Flush every open subgraph. Has to be called exactly once, after the last evidence.
    pub fn end_of_evidence(&mut self) -> Result<Vec<AssemblyEvidence>, AssemblyError> {
        if self.finished {
            return Err(AssemblyError::contract("end of evidence signalled twice"));
        }
        self.finished = true;
        let assemblies = self.flush_all()?;
        debug!(
            "DONE\tAssembly\t{}\tSubgraphs\t{}\tAssemblies",
            self.subgraphs_closed,
            self.emitter.emitted()
        );
        if let Some(diagnostics) = self.diagnostics.as_ref() {
            info!("{}", diagnostics.summary());
        }
        Ok(assemblies)
    }
    fn open_reference(&self, reference_index: usize) -> ReferenceState {
        let (k, margin) = (self.config.assembly.k, self.config.assembly.window_margin);
        debug!("START\tReference\t{}", reference_index);
        ReferenceState {
            reference_index,
            frontier: 0,
            graphs: [
                KmerGraph::new(k, margin, reference_index, BreakendDirection::Forward),
                KmerGraph::new(k, margin, reference_index, BreakendDirection::Backward),
            ],
            reported_indels: HashSet::new(),
        }
    }
    fn flush_all(&mut self) -> Result<Vec<AssemblyEvidence>, AssemblyError> {
        let closed = match self.state.as_mut() {
            Some(state) => {
                let mut closed = vec![];
                for graph in state.graphs.iter_mut() {
                    closed.extend(graph.close_all());
                }
                closed
            }
            None => return Ok(vec![]),
        };
        let assemblies = self.assemble(closed)?;
        self.state = None;
        Ok(assemblies)
    }
    fn assemble(&mut self, mut closed: Vec<ClosedSubgraph>) -> Result<Vec<AssemblyEvidence>, AssemblyError> {
        closed.sort_by_key(|s| s.flush_key());
        let mut assemblies = vec![];
        for subgraph in closed {
            self.subgraphs_closed += 1;
            let start = std::time::Instant::now();
            let contig = select_path(&subgraph, self.config.assembly.min_path_weight);
            let resolution = contig
                .as_ref()
                .and_then(|contig| resolve(contig, self.reference, &self.config.assembly));
            if let (Some(contig), Some(resolution)) = (contig.as_ref(), resolution) {
                let is_new = match (&resolution.summary, self.state.as_mut()) {
                    (VariantSummary::Breakpoint(bp), Some(state)) => state.reported_indels.insert(*bp),
                    _ => true,
                };
                if is_new {
                    let assembly = self.emitter.emit(contig, resolution);
                    if self.config.sanity_check_contigs {
                        self.check_anchors(&assembly)?;
                    }
                    debug!(
                        "ASM\t{}\t{}\t{}\t{}\t{}",
                        assembly.id,
                        subgraph.min_position,
                        assembly.direction,
                        assembly.cigar,
                        assembly.support.weight
                    );
                    assemblies.push(assembly);
                } else {
                    debug!("ASM\t{}\t{}\tDuplicatedIndel", subgraph.id, subgraph.direction);
                }
            }
            if let Some(diagnostics) = self.diagnostics.as_mut() {
                diagnostics.record(&subgraph, contig.as_ref(), self.reference, start.elapsed());
            }
        }
        Ok(assemblies)
    }
    fn check_anchors(&self, assembly: &AssemblyEvidence) -> Result<(), AssemblyError> {
        let ops = parse_cigar(&assembly.cigar).unwrap_or_default();
        let seq = assembly.assembly_sequence.as_bytes();
        let start = assembly.alignment_start;
        match anchors_match(seq, &ops, assembly.reference_index, start, self.reference) {
            true => Ok(()),
            false => Err(AssemblyError::SanityCheck {
                message: format!(
                    "anchor of {} ({} at {}:{}) does not match the reference",
                    assembly.id, assembly.cigar, assembly.reference_index, start
                ),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::InMemoryReference;
    use crate::seq::revcmp;
    use definitions::{cigar_string, BreakendSummary, MateAlignment};
    use rand::Rng;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;
    use BreakendDirection::{Backward, Forward};
    const DELETION_REF: &[u8] = b"CATTAATCGCAAGAGCGGGTTGTATTCGACGCCAAGTCAGCTGAAGCACCATTACCCGATCAAA";
    const HOMOLOGY_REF: &[u8] = b"CATTAATCGCAATAAAATGTTCAAAACGACGCCAAGTCAGCTGAAGCACCATTACCCGATCAAA";
    fn reference(seqs: &[&[u8]]) -> InMemoryReference {
        let records = seqs
            .iter()
            .enumerate()
            .map(|(i, seq)| (format!("chr{}", i + 1), seq.to_vec()))
            .collect();
        InMemoryReference::new(records)
    }
    fn config(k: usize) -> ProcessingConfig {
        let mut config = ProcessingConfig::new(AssemblyConfig::new(k, 1, 50, 300));
        config.sanity_check_graph = true;
        config.sanity_check_contigs = true;
        config
    }
    fn run<R: ReferenceLookup>(
        config: &ProcessingConfig,
        reference: &R,
        mut evidence: Vec<Evidence>,
    ) -> Vec<AssemblyEvidence> {
        let _ = env_logger::builder().is_test(true).try_init();
        sort_evidence(&mut evidence, config.assembly.max_fragment_size);
        let mut assembler = DeBruijnSubgraphAssembler::new(config, reference).unwrap();
        let mut assemblies = vec![];
        for e in evidence.iter() {
            assemblies.extend(assembler.add_evidence(e).unwrap());
        }
        assemblies.extend(assembler.end_of_evidence().unwrap());
        assert!(assemblies.len() <= assembler.subgraphs_closed());
        assemblies
    }
    fn sc(id: &str, ri: usize, direction: BreakendDirection, position: usize, anchor: usize, seq: &[u8]) -> Evidence {
        let seq = String::from_utf8_lossy(seq).to_string();
        Evidence::soft_clip(id, ri, direction, position, anchor, &seq)
    }
    fn deleted(reference: &[u8], (left, right): (usize, usize)) -> Vec<u8> {
        let mut seq = reference[..left].to_vec();
        seq.extend_from_slice(&reference[right..39]);
        seq
    }
    #[test]
    fn separate_references_are_not_merged() {
        let reference = reference(&[b"TAAACCCCGGGGTTTTACGT", b"TAAACCCCGGGGTTTTACGT"]);
        let config = config(3);
        let evidence = vec![
            sc("a1", 0, Forward, 1, 4, b"TAAAGTC"),
            sc("a2", 0, Forward, 2, 3, b"AAAGTCT"),
            sc("b1", 1, Forward, 1, 4, b"TAAAGTC"),
            sc("b2", 1, Forward, 2, 3, b"AAAGTCT"),
        ];
        let assemblies = run(&config, &reference, evidence);
        assert_eq!(assemblies.len(), 2);
        for (i, asm) in assemblies.iter().enumerate() {
            assert_eq!(asm.reference_index, i);
            assert_eq!(asm.assembly_sequence, "TAAAGTCT");
            assert_eq!(asm.anchor_length, 4);
            assert_eq!(asm.breakend_sequence, "GTCT");
            assert_eq!(asm.cigar, "4M4S");
            assert_eq!(asm.support.soft_clip_count, 2);
        }
    }
    #[test]
    fn read_pair_extends_soft_clip() {
        let reference = reference(&[b"GGGGGGGGGGGGGGTAACGGGGGGGGGGGG"]);
        let config = config(3);
        let mate = String::from_utf8(revcmp(b"TAAAGTC")).unwrap();
        let evidence = vec![
            sc("sc1", 0, Forward, 15, 3, b"TAAT"),
            Evidence::read_pair("rp1", 0, (1, 10), false, None, &mate),
        ];
        let assemblies = run(&config, &reference, evidence);
        assert_eq!(assemblies.len(), 1);
        let asm = &assemblies[0];
        assert_eq!(asm.anchor_length, 3);
        assert_eq!(asm.assembly_sequence, "TAAAGTC");
        assert_eq!(asm.breakend_sequence, "AGTC");
        assert_eq!(asm.support.read_pair_count, 1);
        assert_eq!(asm.support.soft_clip_count, 1);
        assert_eq!(
            asm.summary,
            VariantSummary::Breakend(BreakendSummary::new(0, Forward, 17, 17))
        );
    }
    #[test]
    fn small_deletion() {
        let reference = reference(&[DELETION_REF]);
        let config = config(8);
        let seq = deleted(DELETION_REF, (15, 24));
        let evidence = vec![
            sc("fwd", 0, Forward, 1, 15, &seq),
            sc("bwd", 0, Backward, 25, 15, &seq),
        ];
        let assemblies = run(&config, &reference, evidence);
        assert_eq!(assemblies.len(), 1);
        let asm = &assemblies[0];
        assert_eq!(asm.cigar, "15M9D15M");
        assert_eq!(asm.alignment_start, 1);
        assert_eq!(asm.assembly_sequence.as_bytes(), seq.as_slice());
        assert_eq!(asm.breakend_sequence, "");
        assert_eq!((asm.anchor_length, asm.remote_anchor_length), (15, 15));
        let expected = BreakpointSummary {
            local: BreakendSummary::new(0, Forward, 15, 15),
            remote: BreakendSummary::new(0, Backward, 25, 25),
        };
        assert_eq!(asm.summary, VariantSummary::Breakpoint(expected));
    }
    #[test]
    fn microhomology_is_centred() {
        let reference = reference(&[HOMOLOGY_REF]);
        let config = config(8);
        let expected = VariantSummary::Breakpoint(BreakpointSummary {
            local: BreakendSummary::new(0, Forward, 13, 17),
            remote: BreakendSummary::new(0, Backward, 23, 27),
        });
        for &(left, right) in [(15, 24), (17, 26)].iter() {
            let seq = deleted(HOMOLOGY_REF, (left, right));
            let evidence = vec![
                sc("fwd", 0, Forward, 1, left, &seq),
                sc("bwd", 0, Backward, right + 1, 39 - right, &seq),
            ];
            let assemblies = run(&config, &reference, evidence);
            assert_eq!(assemblies.len(), 1, "{}/{}", left, right);
            assert_eq!(assemblies[0].summary, expected, "{}/{}", left, right);
            assert_eq!(assemblies[0].cigar, "15M9D15M");
        }
    }
    #[test]
    fn reference_bubble_is_discarded() {
        let seq: &[u8] = b"ACGTTGCAATGCCATAGGAC";
        let reference = reference(&[seq]);
        let config = config(5);
        let evidence = vec![
            sc("fwd", 0, Forward, 1, 5, &seq[..10]),
            sc("bwd", 0, Backward, 6, 5, &seq[..10]),
        ];
        assert!(run(&config, &reference, evidence).is_empty());
    }
    #[test]
    fn unanchored_read_pairs_are_discarded() {
        let reference = reference(&[b"ACGTTGCAATGCCATAGGAC"]);
        let config = config(5);
        let evidence = vec![
            Evidence::read_pair("rp1", 0, (1, 10), false, None, "GGGCCCAAAT"),
            Evidence::read_pair("rp2", 0, (2, 11), false, None, "GGGCCCAAAT"),
        ];
        assert!(run(&config, &reference, evidence).is_empty());
    }
    #[test]
    fn backward_breakend() {
        let reference = reference(&[b"CCCCCCCCCCATGCCCCCCC"]);
        let config = config(3);
        let evidence = vec![
            sc("s1", 0, Backward, 11, 3, b"TATG"),
            sc("s2", 0, Backward, 11, 3, b"TTATG"),
        ];
        let assemblies = run(&config, &reference, evidence);
        assert_eq!(assemblies.len(), 1);
        let asm = &assemblies[0];
        assert_eq!(asm.assembly_sequence, "TTATG");
        assert_eq!(asm.breakend_sequence, "TT");
        assert_eq!(asm.cigar, "2S3M");
        assert_eq!(
            asm.summary,
            VariantSummary::Breakend(BreakendSummary::new(0, Backward, 11, 11))
        );
    }
    // 1-5: AACCG, 50-55: CGATTA
    const ORIENTATION_REF: &[u8] = b"AACCGTCATGCTTAGCAGTCCTAGGATCCATGCAGTTCAGACTTCATTTCGATTAGCATGCAATCCTAGGACTCACTGAACTG";
    #[test]
    fn read_pair_orientation() {
        let reference = reference(&[ORIENTATION_REF]);
        let config = config(5);
        let mate = MateAlignment {
            reference_index: 0,
            position: 1000,
            reverse: true,
        };
        let fwd_mate = String::from_utf8(revcmp(b"AACCGGTTCCA")).unwrap();
        let bwd_mate = String::from_utf8(revcmp(b"TTGTACGATTA")).unwrap();
        let evidence = vec![
            sc("fwd_sc", 0, Forward, 1, 5, b"AACCGGTTC"),
            Evidence::read_pair("fwd_rp", 0, (1, 40), false, None, &fwd_mate),
            sc("bwd_sc", 0, Backward, 50, 6, b"GTACGATTA"),
            Evidence::read_pair("bwd_rp", 0, (51, 60), true, Some(mate), &bwd_mate),
        ];
        let assemblies = run(&config, &reference, evidence);
        assert_eq!(assemblies.len(), 2);
        let fwd = &assemblies[0];
        assert_eq!(fwd.direction, Forward);
        assert_eq!(fwd.assembly_sequence, "AACCGGTTCCA");
        assert_eq!(fwd.breakend_sequence, "GTTCCA");
        assert_eq!(fwd.summary.local().start, 5);
        let bwd = &assemblies[1];
        assert_eq!(bwd.direction, Backward);
        assert_eq!(bwd.assembly_sequence, "TTGTACGATTA");
        assert_eq!(bwd.breakend_sequence, "TTGTA");
        assert_eq!(bwd.summary.local().start, 50);
        assert_eq!(bwd.cigar, "5S6M");
    }
    #[test]
    fn long_kmers() {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(394);
        let seq: Vec<u8> = (0..400).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect();
        let reference = reference(&[&seq]);
        let config = config(32);
        let mut read = seq[..100].to_vec();
        let mut clip: Vec<u8> = (0..100).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect();
        if clip[0] == seq[100] {
            clip[0] = if seq[100] == b'A' { b'C' } else { b'A' };
        }
        read.extend(clip);
        let evidence = vec![sc("long", 0, Forward, 1, 100, &read)];
        let assemblies = run(&config, &reference, evidence);
        assert_eq!(assemblies.len(), 1);
        assert_eq!(assemblies[0].assembly_sequence.len(), 200);
        assert_eq!(assemblies[0].breakend_sequence.len(), 100);
        assert_eq!(assemblies[0].anchor_length, 100);
    }
    #[test]
    fn subgraphs_flush_behind_the_frontier() {
        let mut seq = b"TAAACCCCGGGGTTTTACGT".to_vec();
        seq.extend(std::iter::repeat(b'C').take(300));
        let reference = reference(&[&seq]);
        let config = config(3);
        let mut assembler = DeBruijnSubgraphAssembler::new(&config, &reference).unwrap();
        let first = sc("a1", 0, Forward, 1, 4, b"TAAAGTC");
        assert!(assembler.add_evidence(&first).unwrap().is_empty());
        assert!(0 < assembler.open_nodes());
        let far = Evidence::read_pair("rp", 0, (200, 250), false, None, "TTTTTT");
        let flushed = assembler.add_evidence(&far).unwrap();
        assert_eq!(flushed.len(), 1);
        assert_eq!(flushed[0].assembly_sequence, "TAAAGTC");
        assert_eq!(assembler.subgraphs_closed(), 1);
        assert!(assembler.end_of_evidence().unwrap().is_empty());
    }
    #[test]
    fn contract_violations() {
        let reference = reference(&[b"TAAACCCCGGGGTTTTACGT", b"TAAACCCCGGGGTTTTACGT"]);
        let config = config(3);
        let mut assembler = DeBruijnSubgraphAssembler::new(&config, &reference).unwrap();
        assembler.add_evidence(&sc("a", 1, Forward, 10, 3, b"TTTA")).unwrap();
        let earlier = sc("b", 1, Forward, 5, 3, b"TTTA");
        assert!(matches!(
            assembler.add_evidence(&earlier),
            Err(AssemblyError::OutOfOrder { position: 5, frontier: 10, .. })
        ));
        let previous_reference = sc("c", 0, Forward, 20, 3, b"TTTA");
        assert!(assembler.add_evidence(&previous_reference).is_err());
        let unknown = sc("d", 2, Forward, 20, 3, b"TTTA");
        assert!(matches!(
            assembler.add_evidence(&unknown),
            Err(AssemblyError::ContractViolation { .. })
        ));
        assembler.end_of_evidence().unwrap();
        assert!(assembler.end_of_evidence().is_err());
        let late = sc("e", 1, Forward, 30, 3, b"TTTA");
        assert!(matches!(
            assembler.add_evidence(&late),
            Err(AssemblyError::ContractViolation { .. })
        ));
        let bad_config = ProcessingConfig::new(AssemblyConfig::new(40, 1, 10, 300));
        assert!(DeBruijnSubgraphAssembler::new(&bad_config, &reference).is_err());
    }
    #[test]
    fn random_evidence_keeps_anchors_on_reference() {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(2394);
        let seq: Vec<u8> = (0..2000).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect();
        let reference = reference(&[&seq]);
        let mut config = config(12);
        config.assembly.window_margin = 20;
        let evidence: Vec<_> = (0..200)
            .map(|i| {
                let direction = if rng.gen_bool(0.5) { Forward } else { Backward };
                let position = rng.gen_range(40..1900);
                let anchor = rng.gen_range(15..40);
                let clip = rng.gen_range(5..30);
                let insert: Vec<u8> = (0..clip).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect();
                let read = match direction {
                    Forward => {
                        let mut read = seq[position - 1..position - 1 + anchor].to_vec();
                        read.extend(insert);
                        read
                    }
                    Backward => {
                        let mut read = insert;
                        read.extend_from_slice(&seq[position - 1..position - 1 + anchor]);
                        read
                    }
                };
                sc(&format!("r{}", i), 0, direction, position, anchor, &read)
            })
            .collect();
        let assemblies = run(&config, &reference, evidence);
        assert!(!assemblies.is_empty());
        for asm in assemblies.iter() {
            let ops = parse_cigar(&asm.cigar).unwrap();
            assert_eq!(cigar_string(&ops), asm.cigar);
            let query = asm.assembly_sequence.as_bytes();
            assert!(anchors_match(query, &ops, 0, asm.alignment_start, &reference), "{:?}", asm);
        }
    }
    #[test]
    fn backward_clip_off_the_reference_start() {
        // Six clipped bases lie before coordinate 1.
        let reference = reference(&[b"AAAACCGTTGCAGTCCATGGACTTG"]);
        let config = config(4);
        let evidence = vec![
            sc("s1", 0, Backward, 1, 4, b"TTGCTCAAAA"),
            sc("s2", 0, Backward, 1, 4, b"TTGCTCAAAA"),
        ];
        let assemblies = run(&config, &reference, evidence);
        assert_eq!(assemblies.len(), 1);
        let asm = &assemblies[0];
        assert_eq!(asm.assembly_sequence, "TTGCTCAAAA");
        assert_eq!(asm.breakend_sequence, "TTGCTC");
        assert_eq!(asm.anchor_length, 4);
        assert_eq!(asm.cigar, "6S4M");
        assert_eq!(asm.alignment_start, 1);
        assert_eq!(
            asm.summary,
            VariantSummary::Breakend(BreakendSummary::new(0, Backward, 1, 1))
        );
    }
    #[test]
    fn backward_anchor_shorter_than_clip() {
        let reference = reference(&[b"CCCCCCCCCCATGCCCCCCC"]);
        let config = config(3);
        let evidence = vec![
            sc("s1", 0, Backward, 11, 3, b"GGTTAAATG"),
            sc("s2", 0, Backward, 11, 3, b"GGTTAAATG"),
        ];
        let assemblies = run(&config, &reference, evidence);
        assert_eq!(assemblies.len(), 1);
        let asm = &assemblies[0];
        assert_eq!(asm.breakend_sequence, "GGTTAA");
        assert_eq!(asm.anchor_length, 3);
        assert_eq!(asm.cigar, "6S3M");
        assert_eq!(asm.alignment_start, 11);
        assert_eq!(
            asm.summary,
            VariantSummary::Breakend(BreakendSummary::new(0, Backward, 11, 11))
        );
    }
    #[test]
    fn reported_indels_are_forgotten_behind_the_frontier() {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(4821);
        let seq: Vec<u8> = (0..4000).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect();
        let reference = reference(&[&seq]);
        let mut config = config(12);
        config.assembly.window_margin = 20;
        config.assembly.max_indel_size = 20;
        // 10 bp deletions after 0-based index p, seen from both sides.
        let mut evidence = vec![];
        for i in 0..38 {
            let p = 150 + 100 * i;
            let mut read = seq[p - 30..p].to_vec();
            read.extend_from_slice(&seq[p + 10..p + 40]);
            evidence.push(sc(&format!("f{}", i), 0, Forward, p - 29, 30, &read));
            evidence.push(sc(&format!("b{}", i), 0, Backward, p + 11, 30, &read));
        }
        sort_evidence(&mut evidence, config.assembly.max_fragment_size);
        let mut assembler = DeBruijnSubgraphAssembler::new(&config, &reference).unwrap();
        let mut assemblies = vec![];
        for e in evidence.iter() {
            assemblies.extend(assembler.add_evidence(e).unwrap());
            let kept = assembler.state.as_ref().map_or(0, |s| s.reported_indels.len());
            assert!(kept <= 2, "{}\t{}", e.id, kept);
        }
        assemblies.extend(assembler.end_of_evidence().unwrap());
        assert_eq!(assemblies.len(), 38);
        assert!(assemblies
            .iter()
            .all(|asm| matches!(asm.summary, VariantSummary::Breakpoint(_))));
    }
}
