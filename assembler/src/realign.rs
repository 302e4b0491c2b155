//! Correlating assemblies with the records of an external realignment.
//!
//! Breakend sequences are exported as FASTQ under a name encoding the `(reference, alignment start, id)` of their
//! assembly. The external aligner has to write its records in the order of the exported sequences, which is the order
//! [realignment_order] puts assemblies in. The matcher then walks both streams together with one record of lookahead.
use crate::error::AssemblyError;
use definitions::{AssemblyEvidence, RealignedRecord};
use std::io::{BufRead, Write};
use std::iter::Peekable;

const SEPARATOR: char = '#';
// Quality of every exported base.
const QUAL: u8 = b'I';

pub type RealignmentKey = (usize, usize);

pub fn encode_name(assembly: &AssemblyEvidence) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        assembly.reference_index,
        assembly.alignment_start,
        assembly.id,
        sep = SEPARATOR
    )
}

/// Returns the `(reference, alignment start)` key and the assembly id of an encoded name.
pub fn decode_name(name: &str) -> Result<(RealignmentKey, &str), AssemblyError> {
    let encoding = || AssemblyError::Encoding {
        name: name.to_string(),
    };
    let mut fields = name.splitn(3, SEPARATOR);
    let reference_index = fields.next().and_then(|x| x.parse().ok()).ok_or_else(encoding)?;
    let start = fields.next().and_then(|x| x.parse().ok()).ok_or_else(encoding)?;
    match fields.next() {
        Some(id) if !id.is_empty() => Ok(((reference_index, start), id)),
        _ => Err(encoding()),
    }
}

pub fn realignment_key(assembly: &AssemblyEvidence) -> RealignmentKey {
    (assembly.reference_index, assembly.alignment_start)
}

/// Sort assemblies into the order their breakend sequences are exported in.
pub fn realignment_order(assemblies: &mut [AssemblyEvidence]) {
    assemblies.sort_by(|x, y| {
        realignment_key(x)
            .cmp(&realignment_key(y))
            .then_with(|| x.id.cmp(&y.id))
    });
}

/// Whether the breakend sequence of this assembly is long enough to be realigned.
pub fn is_realignable(assembly: &AssemblyEvidence, min_length: usize) -> bool {
    min_length <= assembly.breakend_sequence.len() && 0 < assembly.breakend_sequence.len()
}

/// Write the breakend sequences of `assemblies` (already in [realignment_order]) as FASTQ.
/// Returns the number of exported sequences.
pub fn write_realignment_fastq<W: Write>(
    assemblies: &[AssemblyEvidence],
    min_length: usize,
    wtr: &mut W,
) -> Result<usize, AssemblyError> {
    let mut exported = 0;
    let mut previous: Option<(RealignmentKey, &str)> = None;
    for assembly in assemblies.iter().filter(|a| is_realignable(a, min_length)) {
        let key = (realignment_key(assembly), assembly.id.as_str());
        if let Some(previous) = previous.filter(|&p| key < p) {
            return Err(AssemblyError::contract(format!(
                "assembly {} exported after {}",
                assembly.id, previous.1
            )));
        }
        previous = Some(key);
        let seq = &assembly.breakend_sequence;
        let qual = String::from_utf8(vec![QUAL; seq.len()]).unwrap_or_default();
        writeln!(wtr, "@{}\n{}\n+\n{}", encode_name(assembly), seq, qual)?;
        exported += 1;
    }
    debug!("EXPORT\t{}\t{}", exported, assemblies.len());
    Ok(exported)
}

/// Realigned records stored as JSON lines.
pub fn read_realigned_records<R: BufRead>(
    reader: R,
) -> impl Iterator<Item = Result<RealignedRecord, AssemblyError>> {
    serde_json::Deserializer::from_reader(reader)
        .into_iter::<RealignedRecord>()
        .map(|record| record.map_err(AssemblyError::from))
}

/// Walks the realigned records alongside assemblies visited in [realignment_order].
pub struct SequentialRealignmentMatcher<I: Iterator<Item = Result<RealignedRecord, AssemblyError>>> {
    records: Peekable<I>,
    // The key and name of the last record taken from the stream.
    last_record: Option<(RealignmentKey, String)>,
    // The last queried source.
    last_source: Option<RealignmentKey>,
    buffer: Vec<RealignedRecord>,
}

impl<I: Iterator<Item = Result<RealignedRecord, AssemblyError>>> SequentialRealignmentMatcher<I> {
    pub fn new(records: I) -> Self {
        Self {
            records: records.peekable(),
            last_record: None,
            last_source: None,
            buffer: vec![],
        }
    }
    /// The realigned records of `source`. If `expected` is true, a source without any record is an error.
    pub fn find_associated(
        &mut self,
        source: &AssemblyEvidence,
        expected: bool,
    ) -> Result<Vec<RealignedRecord>, AssemblyError> {
        let key = realignment_key(source);
        match self.last_source {
            Some(last) if key < last => {
                return Err(AssemblyError::contract(format!(
                    "assembly {} queried out of realignment order",
                    source.id
                )));
            }
            Some(last) if key == last => {}
            _ => {
                self.buffer.clear();
                self.fill(key)?;
                self.last_source = Some(key);
            }
        }
        let associated: Vec<_> = self
            .buffer
            .iter()
            .filter(|record| matches!(decode_name(&record.name), Ok((_, id)) if id == source.id))
            .cloned()
            .collect();
        if associated.is_empty() && expected {
            return Err(AssemblyError::MissingRealignment {
                name: encode_name(source),
            });
        }
        Ok(associated)
    }
    // Skip records before `key` and buffer the ones at `key`.
    fn fill(&mut self, key: RealignmentKey) -> Result<(), AssemblyError> {
        loop {
            let record_key = match self.records.peek() {
                None => return Ok(()),
                Some(Err(_)) => match self.records.next() {
                    Some(Err(why)) => return Err(why),
                    _ => return Ok(()),
                },
                Some(Ok(record)) => decode_name(&record.name)?.0,
            };
            if key < record_key {
                return Ok(());
            }
            let record = match self.records.next() {
                Some(Ok(record)) => record,
                _ => return Ok(()),
            };
            if let Some((last_key, last_name)) = self.last_record.as_ref() {
                if record_key < *last_key {
                    return Err(AssemblyError::RealignmentOrder {
                        name: record.name.clone(),
                        previous: last_name.clone(),
                    });
                }
            }
            self.last_record = Some((record_key, record.name.clone()));
            if record_key == key {
                self.buffer.push(record);
            } else {
                trace!("REALIGN\tSkip\t{}", record.name);
            }
        }
    }
}
