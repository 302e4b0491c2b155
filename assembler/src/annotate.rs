//! Attaching realignments of breakend sequences to their assemblies.
use crate::alignment::{Aligner, Alignment};
use crate::config::ProcessingConfig;
use crate::error::AssemblyError;
use crate::realign::{encode_name, is_realignable, realignment_order, SequentialRealignmentMatcher};
use crate::reference::ReferenceLookup;
use crate::seq::revcmp;
use definitions::{cigar_string, AssemblyEvidence, RealignedRecord};
use rayon::prelude::*;

const UNIQUE_MAPQ: u8 = 60;

/// Attach the records of an external realignment. Assemblies are returned in realignment order.
/// With `expected`, every exported assembly has to have at least one record.
pub fn attach_realignments<I>(
    mut assemblies: Vec<AssemblyEvidence>,
    records: I,
    min_length: usize,
    expected: bool,
) -> Result<Vec<AssemblyEvidence>, AssemblyError>
where
    I: Iterator<Item = Result<RealignedRecord, AssemblyError>>,
{
    realignment_order(&mut assemblies);
    let mut matcher = SequentialRealignmentMatcher::new(records);
    let mut attached = 0;
    for assembly in assemblies.iter_mut().filter(|a| is_realignable(a, min_length)) {
        assembly.subsequent_realignments = matcher.find_associated(assembly, expected)?;
        attached += assembly.subsequent_realignments.iter().any(|r| r.is_mapped()) as usize;
    }
    debug!("ANNOTATE\t{}\t{}\tMapped", assemblies.len(), attached);
    Ok(assemblies)
}

/// Align every breakend sequence against the reference around its breakend with `aligner`
/// and attach the best hit. The window reaches one fragment size to each side.
pub fn realign_breakends<R>(
    assemblies: &mut [AssemblyEvidence],
    reference: &R,
    aligner: &dyn Aligner,
    config: &ProcessingConfig,
) -> usize
where
    R: ReferenceLookup + Sync + ?Sized,
{
    let flank = config.assembly.max_fragment_size;
    let min_length = config.min_realign_length;
    let max_error = config.max_realign_error;
    assemblies
        .par_iter_mut()
        .filter(|asm| is_realignable(asm, min_length))
        .map(|asm| {
            let record = realign(asm, reference, aligner, flank, max_error);
            let is_mapped = record.is_mapped();
            asm.subsequent_realignments = vec![record];
            is_mapped as usize
        })
        .sum()
}

fn realign<R: ReferenceLookup + ?Sized>(
    assembly: &AssemblyEvidence,
    reference: &R,
    aligner: &dyn Aligner,
    flank: usize,
    max_error: f64,
) -> RealignedRecord {
    let name = encode_name(assembly);
    let ri = assembly.reference_index;
    let local = assembly.summary.local();
    let len = match reference.reference_len(ri) {
        Some(len) => len,
        None => return RealignedRecord::unmapped(&name),
    };
    let window_start = local.start.saturating_sub(flank).max(1);
    let window_end = (local.end + flank).min(len);
    let window = match reference.slice(ri, window_start, (window_end + 1).saturating_sub(window_start)) {
        Some(window) => window,
        None => return RealignedRecord::unmapped(&name),
    };
    let query = assembly.breakend_sequence.to_ascii_uppercase().into_bytes();
    let max_distance = (query.len() as f64 * max_error).floor() as usize;
    let hit = |seq: &[u8]| aligner.align(seq, window).filter(|aln| aln.edit_distance <= max_distance);
    let forward = hit(&query);
    let reverse = hit(&revcmp(&query));
    let (aln, is_reverse, mapq): (Alignment, bool, u8) = match (forward, reverse) {
        (None, None) => return RealignedRecord::unmapped(&name),
        (Some(f), None) => (f, false, UNIQUE_MAPQ),
        (None, Some(r)) => (r, true, UNIQUE_MAPQ),
        (Some(f), Some(r)) if f.edit_distance < r.edit_distance => (f, false, UNIQUE_MAPQ),
        (Some(f), Some(r)) if r.edit_distance < f.edit_distance => (r, true, UNIQUE_MAPQ),
        (Some(f), Some(_)) => (f, false, 0),
    };
    trace!("REALIGN\t{}\t{}\t{}", name, aln.target_start, aln.edit_distance);
    RealignedRecord {
        name,
        reference_index: Some(ri),
        position: window_start + aln.target_start,
        reverse: is_reverse,
        cigar: cigar_string(&aln.ops),
        mapq,
    }
}
