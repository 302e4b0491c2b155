use crate::breakpoint::Resolution;
use crate::path::Contig;
use definitions::{cigar_string, AssemblySupport, AssemblyEvidence};

/// Turns resolved contigs into [AssemblyEvidence] with ids unique within one assembler.
#[derive(Debug, Clone, Default)]
pub struct AssemblyEmitter {
    emitted: usize,
}

impl AssemblyEmitter {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn emitted(&self) -> usize {
        self.emitted
    }
    pub fn emit(&mut self, contig: &Contig, resolution: Resolution) -> AssemblyEvidence {
        let id = format!("asm{}-{}", contig.reference_index, self.emitted);
        self.emitted += 1;
        let soft_clip_count = contig.evidence.iter().filter(|e| e.is_soft_clip).count();
        let support = AssemblySupport {
            evidence_ids: contig.evidence.iter().map(|e| e.id.to_string()).collect(),
            weight: contig.weight,
            soft_clip_count,
            read_pair_count: contig.evidence.len() - soft_clip_count,
        };
        let assembly_sequence = String::from_utf8_lossy(&contig.seq).to_string();
        let breakend_sequence = String::from_utf8_lossy(&contig.seq[resolution.breakend.clone()]).to_string();
        AssemblyEvidence {
            id,
            reference_index: contig.reference_index,
            direction: contig.direction,
            assembly_sequence,
            breakend_sequence,
            anchor_length: resolution.anchor_length,
            remote_anchor_length: resolution.remote_anchor_length,
            summary: resolution.summary,
            cigar: cigar_string(&resolution.ops),
            alignment_start: resolution.alignment_start,
            support,
            subsequent_realignments: vec![],
        }
    }
}
