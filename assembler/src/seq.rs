const fn revcmp_table() -> [u8; 256] {
    let mut table = [b'N'; 256];
    table[b'A' as usize] = b'T';
    table[b'C' as usize] = b'G';
    table[b'G' as usize] = b'C';
    table[b'T' as usize] = b'A';
    table[b'a' as usize] = b't';
    table[b'c' as usize] = b'g';
    table[b'g' as usize] = b'c';
    table[b't' as usize] = b'a';
    table
}
const REVCMP: [u8; 256] = revcmp_table();

pub fn revcmp(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&x| REVCMP[x as usize]).collect()
}

/// Uppercased bases of an evidence, flipped into reference orientation if needed.
pub fn assembly_bases(evidence: &definitions::Evidence) -> Vec<u8> {
    let seq = evidence.seq.to_ascii_uppercase().into_bytes();
    match evidence.is_flipped() {
        true => revcmp(&seq),
        false => seq,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn revcmp_test() {
        assert_eq!(revcmp(b"AACCGGTTCCA"), b"TGGAACCGGTT".to_vec());
        assert_eq!(revcmp(b"acgN"), b"NcgT".to_vec());
        assert_eq!(revcmp(&revcmp(b"GATTACA")), b"GATTACA".to_vec());
    }
    #[test]
    fn read_pair_orientation() {
        use definitions::Evidence;
        let rp = Evidence::read_pair("r", 0, (1, 10), false, None, "tggaaccggtt");
        assert_eq!(assembly_bases(&rp), b"AACCGGTTCCA".to_vec());
        let sc = Evidence::soft_clip("s", 0, definitions::BreakendDirection::Forward, 1, 3, "acgT");
        assert_eq!(assembly_bases(&sc), b"ACGT".to_vec());
    }
}
