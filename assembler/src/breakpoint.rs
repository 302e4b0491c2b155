//! Classification of an assembled contig into a breakend or a small indel.
use crate::config::AssemblyConfig;
use crate::path::Contig;
use crate::reference::ReferenceLookup;
use definitions::{BreakendDirection, BreakendSummary, BreakpointSummary, Op, VariantSummary};
use std::cmp::Reverse;
use std::ops::Range;

/// The geometry of a contig against the reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub summary: VariantSummary,
    /// Alignment of the whole contig, starting at `alignment_start`.
    pub ops: Vec<Op>,
    pub alignment_start: usize,
    pub anchor_length: usize,
    pub remote_anchor_length: usize,
    /// Contig bases not explained by the reference.
    pub breakend: Range<usize>,
}

struct AnchorView<'a, R: ReferenceLookup + ?Sized> {
    seq: &'a [u8],
    reference_index: usize,
    reference: &'a R,
}

impl<'a, R: ReferenceLookup + ?Sized> AnchorView<'a, R> {
    /// Number of leading bases matching the reference when base 0 is at `start`.
    fn prefix_match(&self, start: usize) -> usize {
        self.seq
            .iter()
            .enumerate()
            .take_while(|&(i, &b)| self.reference.base(self.reference_index, start + i) == Some(b))
            .count()
    }
    /// Number of trailing bases matching the reference when the last base is at `end - 1`.
    fn suffix_match(&self, end: usize) -> usize {
        self.seq
            .iter()
            .rev()
            .enumerate()
            .take_while(|&(j, &b)| match end.checked_sub(j + 1) {
                Some(position) if 0 < position => self.reference.base(self.reference_index, position) == Some(b),
                _ => false,
            })
            .count()
    }
}

/// Resolve the geometry of a contig. Returns `None` for contigs with no anchor, and for
/// contigs explained by the reference as they are.
pub fn resolve<R: ReferenceLookup + ?Sized>(
    contig: &Contig,
    reference: &R,
    config: &AssemblyConfig,
) -> Option<Resolution> {
    let n = contig.len();
    let view = AnchorView {
        seq: &contig.seq,
        reference_index: contig.reference_index,
        reference,
    };
    let leading = contig.leading.map(|anchor| anchor.position);
    let trailing = contig.trailing_end();
    match (leading, trailing) {
        (None, None) => {
            debug!("ASM\t{}\t{}\tNoAnchor", contig.subgraph, contig.direction);
            None
        }
        (Some(start), Some(end)) => {
            let (a, b) = (view.prefix_match(start), view.suffix_match(end));
            if n <= a || n <= b || end == start + n {
                debug!("ASM\t{}\t{}\tReferenceBubble", contig.subgraph, contig.direction);
                return None;
            }
            resolve_indel(contig.reference_index, n, (start, end), (a, b)).or_else(|| match contig.direction {
                BreakendDirection::Forward => breakend(contig, &view, BreakendDirection::Forward, start),
                BreakendDirection::Backward => breakend(contig, &view, BreakendDirection::Backward, end),
            })
        }
        (Some(start), None) => {
            let a = view.prefix_match(start);
            if n <= a {
                debug!("ASM\t{}\t{}\tReferenceBubble", contig.subgraph, contig.direction);
                return None;
            }
            far_suffix_anchor(contig, &view, config, start, a)
                .or_else(|| breakend(contig, &view, BreakendDirection::Forward, start))
        }
        (None, Some(end)) => {
            let b = view.suffix_match(end);
            if n <= b {
                debug!("ASM\t{}\t{}\tReferenceBubble", contig.subgraph, contig.direction);
                return None;
            }
            far_prefix_anchor(contig, &view, config, end, b)
                .or_else(|| breakend(contig, &view, BreakendDirection::Backward, end))
        }
    }
}

// `position` is the coordinate of base 0 for a forward breakend and one past the last base for a backward one.
fn breakend<R: ReferenceLookup + ?Sized>(
    contig: &Contig,
    view: &AnchorView<R>,
    direction: BreakendDirection,
    position: usize,
) -> Option<Resolution> {
    let n = contig.len();
    let ri = contig.reference_index;
    match direction {
        BreakendDirection::Forward => {
            let a = view.prefix_match(position);
            if a == 0 || n <= a {
                return None;
            }
            let at = position + a - 1;
            Some(Resolution {
                summary: VariantSummary::Breakend(BreakendSummary::new(ri, direction, at, at)),
                ops: vec![Op::Match(a), Op::SoftClip(n - a)],
                alignment_start: position,
                anchor_length: a,
                remote_anchor_length: 0,
                breakend: a..n,
            })
        }
        BreakendDirection::Backward => {
            let b = view.suffix_match(position);
            if b == 0 || n <= b {
                return None;
            }
            let at = position - b;
            Some(Resolution {
                summary: VariantSummary::Breakend(BreakendSummary::new(ri, direction, at, at)),
                ops: vec![Op::SoftClip(n - b), Op::Match(b)],
                alignment_start: at,
                anchor_length: b,
                remote_anchor_length: 0,
                breakend: 0..n - b,
            })
        }
    }
}

/// Geometry of a contig of length `n` whose base 0 is at `start` and whose last base is at `end - 1`,
/// with `a` leading and `b` trailing bases matching the reference.
/// When the anchors overlap, every split inside the homologous window explains the contig:
/// the breakend intervals cover the whole window and the alignment uses the centre.
pub fn resolve_indel(
    reference_index: usize,
    n: usize,
    (start, end): (usize, usize),
    (a, b): (usize, usize),
) -> Option<Resolution> {
    if end < start + 2 || end == start + n || a == 0 || b == 0 {
        return None;
    }
    let span = end - start;
    let len = n.min(span);
    let (lo, hi, split, right) = if len <= a + b {
        let lo = len.saturating_sub(b).max(1);
        let hi = a.min(len - 1);
        if hi < lo {
            return None;
        }
        let split = (lo + hi) / 2;
        (lo, hi, split, len - split)
    } else {
        (a, a, a, b)
    };
    let insertion = n - split - right;
    let deletion = span - split - right;
    if insertion == 0 && deletion == 0 {
        return None;
    }
    let local = BreakendSummary::new(
        reference_index,
        BreakendDirection::Forward,
        start + lo - 1,
        start + hi - 1,
    );
    let remote_start = end - right - (split - lo);
    let remote = BreakendSummary::new(
        reference_index,
        BreakendDirection::Backward,
        remote_start,
        remote_start + (hi - lo),
    );
    let mut ops = vec![
        Op::Match(split),
        Op::Ins(insertion),
        Op::Del(deletion),
        Op::Match(right),
    ];
    ops.retain(|op| !op.is_empty());
    Some(Resolution {
        summary: VariantSummary::Breakpoint(BreakpointSummary { local, remote }),
        ops,
        alignment_start: start,
        anchor_length: split,
        remote_anchor_length: right,
        breakend: split..split + insertion,
    })
}

struct Candidate {
    resolution: Resolution,
    matched: usize,
    indel: usize,
    position: usize,
}

fn best_candidate(candidates: Vec<Candidate>) -> Option<Resolution> {
    candidates
        .into_iter()
        .max_by_key(|c| (c.matched, Reverse(c.indel), Reverse(c.position)))
        .map(|c| c.resolution)
}

/// Search the reference near a forward contig for an exact copy of its last bases.
fn far_suffix_anchor<R: ReferenceLookup + ?Sized>(
    contig: &Contig,
    view: &AnchorView<R>,
    config: &AssemblyConfig,
    start: usize,
    a: usize,
) -> Option<Resolution> {
    let n = contig.len();
    let len = config.far_anchor_length();
    if n <= len {
        return None;
    }
    let suffix = &contig.seq[n - len..];
    let expected = start + n - len;
    let candidates: Vec<_> = (expected.saturating_sub(config.max_indel_size).max(1)
        ..=expected + config.max_indel_size)
        .filter(|&s| s != expected)
        .filter(|&s| view.reference.slice(contig.reference_index, s, len) == Some(suffix))
        .filter_map(|s| {
            let end = s + len;
            let b = view.suffix_match(end);
            let resolution = resolve_indel(contig.reference_index, n, (start, end), (a, b))?;
            Some(Candidate {
                resolution,
                matched: b,
                indel: s.max(expected) - s.min(expected),
                position: s,
            })
        })
        .collect();
    best_candidate(candidates)
}

/// Search the reference near a backward contig for an exact copy of its first bases.
fn far_prefix_anchor<R: ReferenceLookup + ?Sized>(
    contig: &Contig,
    view: &AnchorView<R>,
    config: &AssemblyConfig,
    end: usize,
    b: usize,
) -> Option<Resolution> {
    let n = contig.len();
    let len = config.far_anchor_length();
    if n <= len || end <= n {
        return None;
    }
    let prefix = &contig.seq[..len];
    let expected = end - n;
    let candidates: Vec<_> = (expected.saturating_sub(config.max_indel_size).max(1)
        ..=expected + config.max_indel_size)
        .filter(|&s| s != expected && s < end)
        .filter(|&s| view.reference.slice(contig.reference_index, s, len) == Some(prefix))
        .filter_map(|s| {
            let a = view.prefix_match(s);
            let resolution = resolve_indel(contig.reference_index, n, (s, end), (a, b))?;
            Some(Candidate {
                resolution,
                matched: a,
                indel: s.max(expected) - s.min(expected),
                position: s,
            })
        })
        .collect();
    best_candidate(candidates)
}

/// Whether every aligned base of `seq` equals the reference under `ops` starting at `alignment_start`.
pub fn anchors_match<R: ReferenceLookup + ?Sized>(
    seq: &[u8],
    ops: &[Op],
    reference_index: usize,
    alignment_start: usize,
    reference: &R,
) -> bool {
    let (mut qpos, mut rpos) = (0, alignment_start);
    for op in ops {
        match *op {
            Op::Match(l) => {
                let query = match seq.get(qpos..qpos + l) {
                    Some(query) => query,
                    None => return false,
                };
                if reference.slice(reference_index, rpos, l) != Some(query) {
                    return false;
                }
                qpos += l;
                rpos += l;
            }
            Op::Ins(l) | Op::SoftClip(l) => qpos += l,
            Op::Del(l) => rpos += l,
        }
    }
    qpos == seq.len()
}
