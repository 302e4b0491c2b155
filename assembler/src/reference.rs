//! Reference sequence access. Coordinates are 1-based throughout the assembler.
use std::io::BufRead;

pub trait ReferenceLookup {
    /// The whole (uppercase) sequence of a reference.
    fn sequence(&self, reference_index: usize) -> Option<&[u8]>;
    fn name(&self, reference_index: usize) -> Option<&str>;
    fn reference_count(&self) -> usize;
    /// `len` bases starting at the 1-based `position`. `None` if any of them is outside the reference.
    fn slice(&self, reference_index: usize, position: usize, len: usize) -> Option<&[u8]> {
        let seq = self.sequence(reference_index)?;
        let start = position.checked_sub(1)?;
        seq.get(start..start + len)
    }
    fn base(&self, reference_index: usize, position: usize) -> Option<u8> {
        self.slice(reference_index, position, 1).map(|x| x[0])
    }
    fn reference_len(&self, reference_index: usize) -> Option<usize> {
        self.sequence(reference_index).map(|x| x.len())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryReference {
    names: Vec<String>,
    seqs: Vec<Vec<u8>>,
}

impl InMemoryReference {
    pub fn new(records: Vec<(String, Vec<u8>)>) -> Self {
        let (names, seqs) = records
            .into_iter()
            .map(|(name, mut seq)| {
                seq.make_ascii_uppercase();
                (name, seq)
            })
            .unzip();
        Self { names, seqs }
    }
    pub fn from_fasta<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let records: Vec<_> = bio_utils::fasta::parse_into_vec_from(reader)?
            .into_iter()
            .map(|record| {
                let (id, _, seq) = record.into();
                (id, seq.into_bytes())
            })
            .collect();
        debug!("REFERENCE\t{}\tRecords", records.len());
        Ok(Self::new(records))
    }
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

impl ReferenceLookup for InMemoryReference {
    fn sequence(&self, reference_index: usize) -> Option<&[u8]> {
        self.seqs.get(reference_index).map(|x| x.as_slice())
    }
    fn name(&self, reference_index: usize) -> Option<&str> {
        self.names.get(reference_index).map(|x| x.as_str())
    }
    fn reference_count(&self) -> usize {
        self.seqs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn one_based_slices() {
        let reference = InMemoryReference::new(vec![
            ("chr1".to_string(), b"acgtAC".to_vec()),
            ("chr2".to_string(), b"TTTT".to_vec()),
        ]);
        assert_eq!(reference.slice(0, 1, 3), Some(&b"ACG"[..]));
        assert_eq!(reference.slice(0, 4, 3), Some(&b"TAC"[..]));
        assert_eq!(reference.slice(0, 5, 3), None);
        assert_eq!(reference.slice(0, 0, 1), None);
        assert_eq!(reference.base(1, 4), Some(b'T'));
        assert_eq!(reference.base(2, 1), None);
        assert_eq!(reference.index_of("chr2"), Some(1));
        assert_eq!(reference.reference_len(0), Some(6));
    }
}
