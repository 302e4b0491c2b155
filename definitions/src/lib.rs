//! Definitions -- The records exchanged between the breakend assembler and its collaborators.
//! Every step of the pipeline reads and writes these structures as JSON lines, one record per line.
//! The upstream evidence feed produces [Evidence](Evidence), the assembler produces [AssemblyEvidence](AssemblyEvidence),
//! and the realignment step produces [RealignedRecord](RealignedRecord).
use serde::{Deserialize, Serialize};

/// The side of a breakend on which the non-reference sequence lies.
/// `Forward` means the variant sequence follows the anchored bases (the anchor is on the left),
/// `Backward` means it precedes them (the anchor is on the right).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BreakendDirection {
    Forward,
    Backward,
}

impl std::ops::Not for BreakendDirection {
    type Output = Self;
    fn not(self) -> Self::Output {
        match self {
            BreakendDirection::Forward => BreakendDirection::Backward,
            BreakendDirection::Backward => BreakendDirection::Forward,
        }
    }
}

impl std::fmt::Display for BreakendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            BreakendDirection::Forward => write!(f, "f"),
            BreakendDirection::Backward => write!(f, "b"),
        }
    }
}

/// Alignment of the mate of a read pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MateAlignment {
    pub reference_index: usize,
    /// 1-based position of the first aligned base.
    pub position: usize,
    pub reverse: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvidenceKind {
    /// A read whose alignment is clipped at one end.
    /// `position` is the 1-based coordinate of the first aligned base.
    /// For `Forward`, the first `anchor_length` bases are aligned and the rest are clipped.
    /// For `Backward`, the last `anchor_length` bases are aligned.
    SoftClip {
        direction: BreakendDirection,
        position: usize,
        anchor_length: usize,
    },
    /// A read pair with the local read aligned at `[local_start, local_end]` (1-based, inclusive)
    /// and the mate either unmapped or placed elsewhere.
    /// The sequence of the enclosing [Evidence] is the mate bases as stored in the mate record.
    ReadPair {
        local_start: usize,
        local_end: usize,
        local_reverse: bool,
        mate: Option<MateAlignment>,
    },
}

/// One piece of support for a candidate variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: String,
    pub reference_index: usize,
    pub kind: EvidenceKind,
    /// Bases on the alphabet of A,C,G,T,N (lowercase accepted).
    pub seq: String,
}

/// Where the first base of an evidence sequence lies on the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasePlacement {
    /// The first base is exactly at this 1-based coordinate. Below 1 when leading bases of a
    /// backward soft clip hang off the start of the reference.
    Exact(i64),
    /// The first base is somewhere in this 1-based, inclusive range.
    Window(usize, usize),
}

impl Evidence {
    pub fn soft_clip(
        id: &str,
        reference_index: usize,
        direction: BreakendDirection,
        position: usize,
        anchor_length: usize,
        seq: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            reference_index,
            kind: EvidenceKind::SoftClip {
                direction,
                position,
                anchor_length,
            },
            seq: seq.to_string(),
        }
    }
    pub fn read_pair(
        id: &str,
        reference_index: usize,
        (local_start, local_end): (usize, usize),
        local_reverse: bool,
        mate: Option<MateAlignment>,
        seq: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            reference_index,
            kind: EvidenceKind::ReadPair {
                local_start,
                local_end,
                local_reverse,
                mate,
            },
            seq: seq.to_string(),
        }
    }
    pub fn is_soft_clip(&self) -> bool {
        matches!(self.kind, EvidenceKind::SoftClip { .. })
    }
    /// The breakend direction this evidence supports.
    /// Read pairs whose local read is on the reverse strand support a backward breakend.
    pub fn direction(&self) -> BreakendDirection {
        match self.kind {
            EvidenceKind::SoftClip { direction, .. } => direction,
            EvidenceKind::ReadPair { local_reverse, .. } => match local_reverse {
                false => BreakendDirection::Forward,
                true => BreakendDirection::Backward,
            },
        }
    }
    pub fn clip_length(&self) -> usize {
        match self.kind {
            EvidenceKind::SoftClip { anchor_length, .. } => {
                self.seq.len().saturating_sub(anchor_length)
            }
            EvidenceKind::ReadPair { .. } => self.seq.len(),
        }
    }
    /// Whether the bases have to be reverse-complemented before assembly.
    /// Only read pairs need it: the mate bases are flipped when the mate is stored on the same
    /// strand as the local read (an unmapped mate counts as forward).
    pub fn is_flipped(&self) -> bool {
        match &self.kind {
            EvidenceKind::SoftClip { .. } => false,
            EvidenceKind::ReadPair {
                local_reverse,
                mate,
                ..
            } => mate.map(|m| m.reverse).unwrap_or(false) == *local_reverse,
        }
    }
    /// The placement of the first base of the (possibly flipped) assembly sequence.
    pub fn placement(&self, max_fragment: usize) -> BasePlacement {
        match self.kind {
            EvidenceKind::SoftClip {
                direction: BreakendDirection::Forward,
                position,
                ..
            } => BasePlacement::Exact(position as i64),
            EvidenceKind::SoftClip {
                direction: BreakendDirection::Backward,
                position,
                ..
            } => BasePlacement::Exact(position as i64 - self.clip_length() as i64),
            EvidenceKind::ReadPair {
                local_start,
                local_reverse: false,
                ..
            } => BasePlacement::Window(local_start, local_start + max_fragment),
            EvidenceKind::ReadPair {
                local_end,
                local_reverse: true,
                ..
            } => BasePlacement::Window(local_end.saturating_sub(max_fragment).max(1), local_end),
        }
    }
    /// The smallest coordinate on the reference this evidence can touch. Evidence has to be fed to
    /// the assembler in non-decreasing order of this value.
    pub fn start_position(&self, max_fragment: usize) -> usize {
        match self.placement(max_fragment) {
            BasePlacement::Exact(x) => x.max(1) as usize,
            BasePlacement::Window(start, _) => start,
        }
    }
}

/// Run-length encoded alignment operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Match(usize),
    Ins(usize),
    Del(usize),
    SoftClip(usize),
}

impl Op {
    pub fn len(&self) -> usize {
        match *self {
            Op::Match(l) | Op::Ins(l) | Op::Del(l) | Op::SoftClip(l) => l,
        }
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Length on the query.
    pub fn query_len(&self) -> usize {
        match *self {
            Op::Match(l) | Op::Ins(l) | Op::SoftClip(l) => l,
            Op::Del(_) => 0,
        }
    }
    /// Length on the reference.
    pub fn reference_len(&self) -> usize {
        match *self {
            Op::Match(l) | Op::Del(l) => l,
            Op::Ins(_) | Op::SoftClip(_) => 0,
        }
    }
}

/// Convert operations into a CIGAR string. Zero-length operations are dropped.
pub fn cigar_string(ops: &[Op]) -> String {
    ops.iter()
        .filter(|op| !op.is_empty())
        .map(|op| match *op {
            Op::Match(l) => format!("{}M", l),
            Op::Ins(l) => format!("{}I", l),
            Op::Del(l) => format!("{}D", l),
            Op::SoftClip(l) => format!("{}S", l),
        })
        .collect()
}

/// Parse a CIGAR string. `=` and `X` are read as matches. Returns `None` for malformed strings.
pub fn parse_cigar(cigar: &str) -> Option<Vec<Op>> {
    let mut ops = vec![];
    let mut len = 0;
    let mut has_digit = false;
    for c in cigar.chars() {
        if let Some(d) = c.to_digit(10) {
            len = len * 10 + d as usize;
            has_digit = true;
            continue;
        }
        if !has_digit {
            return None;
        }
        let op = match c {
            'M' | '=' | 'X' => Op::Match(len),
            'I' => Op::Ins(len),
            'D' | 'N' => Op::Del(len),
            'S' => Op::SoftClip(len),
            _ => return None,
        };
        ops.push(op);
        len = 0;
        has_digit = false;
    }
    match has_digit {
        true => None,
        false => Some(ops),
    }
}

/// One side of a (possibly imprecise) breakpoint: the breakend lies in `[start, end]` (1-based, inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BreakendSummary {
    pub reference_index: usize,
    pub direction: BreakendDirection,
    pub start: usize,
    pub end: usize,
}

impl BreakendSummary {
    pub fn new(reference_index: usize, direction: BreakendDirection, start: usize, end: usize) -> Self {
        Self {
            reference_index,
            direction,
            start,
            end,
        }
    }
}

/// Two breakends joined together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BreakpointSummary {
    pub local: BreakendSummary,
    pub remote: BreakendSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariantSummary {
    Breakend(BreakendSummary),
    Breakpoint(BreakpointSummary),
}

impl VariantSummary {
    pub fn local(&self) -> &BreakendSummary {
        match self {
            VariantSummary::Breakend(be) => be,
            VariantSummary::Breakpoint(bp) => &bp.local,
        }
    }
    pub fn remote(&self) -> Option<&BreakendSummary> {
        match self {
            VariantSummary::Breakend(_) => None,
            VariantSummary::Breakpoint(bp) => Some(&bp.remote),
        }
    }
}

/// The evidence backing an assembly.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssemblySupport {
    /// Identities of the contributing evidence, sorted.
    pub evidence_ids: Vec<String>,
    /// Total k-mer weight along the assembled path.
    pub weight: u64,
    pub soft_clip_count: usize,
    pub read_pair_count: usize,
}

/// An alignment of an assembled breakend sequence, returned by the realignment step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealignedRecord {
    /// The encoded read name the sequence was exported with.
    pub name: String,
    /// `None` if the sequence was not aligned.
    pub reference_index: Option<usize>,
    /// 1-based position of the first aligned base.
    pub position: usize,
    pub reverse: bool,
    pub cigar: String,
    pub mapq: u8,
}

impl RealignedRecord {
    pub fn unmapped(name: &str) -> Self {
        Self {
            name: name.to_string(),
            reference_index: None,
            position: 0,
            reverse: false,
            cigar: String::new(),
            mapq: 0,
        }
    }
    pub fn is_mapped(&self) -> bool {
        self.reference_index.is_some()
    }
}

/// An assembled contig together with its breakend geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyEvidence {
    pub id: String,
    pub reference_index: usize,
    pub direction: BreakendDirection,
    /// The whole contig, in reference orientation.
    pub assembly_sequence: String,
    /// The bases not explained by the reference: the unanchored tail of a breakend,
    /// or the untemplated insertion of an indel (possibly empty).
    pub breakend_sequence: String,
    pub anchor_length: usize,
    /// Length of the second anchor. Zero for a single breakend.
    pub remote_anchor_length: usize,
    pub summary: VariantSummary,
    pub cigar: String,
    /// 1-based coordinate of the first base consumed by the first match operation.
    pub alignment_start: usize,
    pub support: AssemblySupport,
    #[serde(default)]
    pub subsequent_realignments: Vec<RealignedRecord>,
}

impl AssemblyEvidence {
    /// The coordinate the mate-coordinate stream is ordered by:
    /// the remote breakend of an indel, else the first mapped realignment, else the local breakend.
    pub fn mate_coordinate(&self) -> (usize, usize) {
        if let Some(remote) = self.summary.remote() {
            return (remote.reference_index, remote.start);
        }
        match self
            .subsequent_realignments
            .iter()
            .find_map(|r| r.reference_index.map(|idx| (idx, r.position)))
        {
            Some(coordinate) => coordinate,
            None => {
                let local = self.summary.local();
                (local.reference_index, local.start)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn direction_and_placement() {
        use BreakendDirection::*;
        let fwd = Evidence::soft_clip("r1", 0, Forward, 10, 4, "ACGTTT");
        assert_eq!(fwd.direction(), Forward);
        assert_eq!(fwd.clip_length(), 2);
        assert_eq!(fwd.placement(300), BasePlacement::Exact(10));
        let bwd = Evidence::soft_clip("r2", 0, Backward, 10, 4, "ACGTTT");
        assert_eq!(bwd.placement(300), BasePlacement::Exact(8));
        assert_eq!(bwd.start_position(300), 8);
        let overhang = Evidence::soft_clip("r5", 0, Backward, 1, 4, "TTGCTCAAAA");
        assert_eq!(overhang.placement(300), BasePlacement::Exact(-5));
        assert_eq!(overhang.start_position(300), 1);
        let rp = Evidence::read_pair("r3", 0, (100, 150), true, None, "ACGT");
        assert_eq!(rp.direction(), Backward);
        assert_eq!(rp.placement(300), BasePlacement::Window(1, 150));
        let rp = Evidence::read_pair("r4", 0, (100, 150), false, None, "ACGT");
        assert_eq!(rp.direction(), Forward);
        assert_eq!(rp.start_position(300), 100);
    }
    #[test]
    fn flip_follows_strands() {
        let mate = |reverse| {
            Some(MateAlignment {
                reference_index: 1,
                position: 1000,
                reverse,
            })
        };
        let rp = |local_reverse, mate| Evidence::read_pair("r", 0, (1, 10), local_reverse, mate, "A");
        assert!(rp(false, None).is_flipped());
        assert!(!rp(true, None).is_flipped());
        assert!(rp(true, mate(true)).is_flipped());
        assert!(!rp(false, mate(true)).is_flipped());
        let sc = Evidence::soft_clip("s", 0, BreakendDirection::Forward, 1, 1, "AA");
        assert!(!sc.is_flipped());
    }
    #[test]
    fn cigar_conversion() {
        let ops = vec![Op::Match(15), Op::Del(9), Op::Ins(0), Op::Match(15)];
        assert_eq!(cigar_string(&ops), "15M9D15M");
        let parsed = parse_cigar("3S10M2I1D4=").unwrap();
        assert_eq!(
            parsed,
            vec![
                Op::SoftClip(3),
                Op::Match(10),
                Op::Ins(2),
                Op::Del(1),
                Op::Match(4)
            ]
        );
        assert!(parse_cigar("10").is_none());
        assert!(parse_cigar("M").is_none());
        assert!(parse_cigar("4Q").is_none());
        assert_eq!(parse_cigar("").unwrap(), vec![]);
    }
    #[test]
    fn mate_coordinate() {
        let local = BreakendSummary::new(0, BreakendDirection::Forward, 10, 10);
        let mut asm = AssemblyEvidence {
            id: "asm0-0".to_string(),
            reference_index: 0,
            direction: BreakendDirection::Forward,
            assembly_sequence: "ACGTACGT".to_string(),
            breakend_sequence: "ACGT".to_string(),
            anchor_length: 4,
            remote_anchor_length: 0,
            summary: VariantSummary::Breakend(local),
            cigar: "4M4S".to_string(),
            alignment_start: 7,
            support: AssemblySupport::default(),
            subsequent_realignments: vec![],
        };
        assert_eq!(asm.mate_coordinate(), (0, 10));
        asm.subsequent_realignments
            .push(RealignedRecord::unmapped("0#7#asm0-0"));
        asm.subsequent_realignments.push(RealignedRecord {
            name: "0#7#asm0-0".to_string(),
            reference_index: Some(2),
            position: 500,
            reverse: false,
            cigar: "4M".to_string(),
            mapq: 60,
        });
        assert_eq!(asm.mate_coordinate(), (2, 500));
        let line = serde_json::to_string(&asm).unwrap();
        let back: AssemblyEvidence = serde_json::from_str(&line).unwrap();
        assert_eq!(back, asm);
    }
}
