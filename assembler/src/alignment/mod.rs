//! Gapped infix alignment of breakend sequences against a reference window.
use crate::config::ProcessingConfig;
use definitions::Op;
#[cfg(feature = "native-aligner")]
mod edlib;
mod portable;
#[cfg(feature = "native-aligner")]
pub use self::edlib::EdlibAligner;
pub use portable::PortableAligner;

/// An alignment of the whole query to `target[target_start..target_end]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    pub target_start: usize,
    pub target_end: usize,
    pub ops: Vec<Op>,
    pub edit_distance: usize,
}

pub trait Aligner: Send + Sync {
    fn name(&self) -> &'static str;
    /// Infix alignment: the query is aligned end to end, gaps before and after it in the target are free.
    fn align(&self, query: &[u8], target: &[u8]) -> Option<Alignment>;
}

/// Pick the aligner once for the whole run.
pub fn create_aligner(config: &ProcessingConfig) -> Box<dyn Aligner> {
    if config.native_aligner {
        if let Some(aligner) = native() {
            debug!("ALIGNER\t{}", aligner.name());
            return aligner;
        }
        warn!("The native aligner is not available. Falling back to the portable one: realignment of breakends will be slower.");
    }
    debug!("ALIGNER\tportable");
    Box::new(PortableAligner::default())
}

#[cfg(feature = "native-aligner")]
fn native() -> Option<Box<dyn Aligner>> {
    Some(Box::new(EdlibAligner))
}

#[cfg(not(feature = "native-aligner"))]
fn native() -> Option<Box<dyn Aligner>> {
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Match,
    Mismatch,
    Ins,
    Del,
}

/// Run-length encode per-base steps. Mismatches are folded into `M`.
fn compress(steps: &[Step]) -> (Vec<Op>, usize) {
    let mut ops: Vec<Op> = vec![];
    let mut edit_distance = 0;
    for step in steps {
        let op = match step {
            Step::Match => Op::Match(1),
            Step::Mismatch => {
                edit_distance += 1;
                Op::Match(1)
            }
            Step::Ins => {
                edit_distance += 1;
                Op::Ins(1)
            }
            Step::Del => {
                edit_distance += 1;
                Op::Del(1)
            }
        };
        match (ops.last_mut(), op) {
            (Some(Op::Match(l)), Op::Match(_)) => *l += 1,
            (Some(Op::Ins(l)), Op::Ins(_)) => *l += 1,
            (Some(Op::Del(l)), Op::Del(_)) => *l += 1,
            _ => ops.push(op),
        }
    }
    (ops, edit_distance)
}
