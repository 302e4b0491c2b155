//! 2-bit packed k-mers.

/// A k-mer of at most 32 bases, packed two bits per base with the first base in the most significant position.
/// Packed values of the same length compare in the lexicographic order of their bases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Kmer(u64);

const BASES: [u8; 4] = *b"ACGT";

fn encode_base(base: u8) -> Option<u64> {
    match base {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}

impl Kmer {
    /// `None` if `bases` is longer than 32 or holds anything other than A, C, G, or T.
    pub fn new(bases: &[u8]) -> Option<Self> {
        if 32 < bases.len() {
            return None;
        }
        bases
            .iter()
            .try_fold(0u64, |acc, &b| encode_base(b).map(|x| (acc << 2) | x))
            .map(Kmer)
    }
    pub fn decode(&self, k: usize) -> Vec<u8> {
        (0..k)
            .rev()
            .map(|i| BASES[((self.0 >> (2 * i)) & 0b11) as usize])
            .collect()
    }
    /// The last base of the k-mer.
    pub fn last_base(&self) -> u8 {
        BASES[(self.0 & 0b11) as usize]
    }
}

/// Iterate over the k-mers of a sequence, as `(offset, kmer)`.
/// Windows containing anything other than A, C, G, or T are skipped.
pub struct KmerIter<'a> {
    seq: &'a [u8],
    k: usize,
    offset: usize,
}

impl<'a> KmerIter<'a> {
    pub fn new(seq: &'a [u8], k: usize) -> Self {
        Self { seq, k, offset: 0 }
    }
}

impl<'a> std::iter::Iterator for KmerIter<'a> {
    type Item = (usize, Kmer);
    fn next(&mut self) -> Option<Self::Item> {
        while self.offset + self.k <= self.seq.len() {
            let offset = self.offset;
            self.offset += 1;
            if let Some(kmer) = Kmer::new(&self.seq[offset..offset + self.k]) {
                return Some((offset, kmer));
            }
        }
        None
    }
}
