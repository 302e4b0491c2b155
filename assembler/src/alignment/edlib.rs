use super::{compress, Aligner, Alignment, Step};

// edlib operation codes.
const EDLIB_STEPS: [Step; 4] = [Step::Match, Step::Ins, Step::Del, Step::Mismatch];

#[derive(Debug, Clone, Copy, Default)]
pub struct EdlibAligner;

impl Aligner for EdlibAligner {
    fn name(&self) -> &'static str {
        "edlib"
    }
    fn align(&self, query: &[u8], target: &[u8]) -> Option<Alignment> {
        if query.is_empty() || target.is_empty() {
            return None;
        }
        let mode = edlib_sys::AlignMode::Infix;
        let task = edlib_sys::AlignTask::Alignment;
        let aln = edlib_sys::align(query, target, mode, task);
        let (start, end) = aln.location()?;
        let steps: Vec<_> = aln
            .operations()?
            .iter()
            .filter_map(|&op| EDLIB_STEPS.get(op as usize).copied())
            .collect();
        let (ops, edit_distance) = compress(&steps);
        Some(Alignment {
            target_start: start,
            target_end: end + 1,
            ops,
            edit_distance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use definitions::Op;
    #[test]
    fn infix() {
        let aln = EdlibAligner.align(b"ACGTTTAC", b"GGGGACGTTAACGGGG").unwrap();
        assert_eq!(aln.target_start, 4);
        assert_eq!(aln.edit_distance, 1);
        let query_len: usize = aln.ops.iter().map(|op| op.query_len()).sum();
        assert_eq!(query_len, 8);
        assert!(EdlibAligner.align(b"", b"ACGT").is_none());
        let aln = EdlibAligner.align(b"ACGT", b"TTACGTTT").unwrap();
        assert_eq!(aln.ops, vec![Op::Match(4)]);
        assert_eq!((aln.target_start, aln.target_end), (2, 6));
    }
}
