use super::{compress, Aligner, Alignment, Step};

/// Unit-cost edit distance DP in pure Rust. Quadratic, so only suitable for short queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortableAligner;

impl Aligner for PortableAligner {
    fn name(&self) -> &'static str {
        "portable"
    }
    fn align(&self, query: &[u8], target: &[u8]) -> Option<Alignment> {
        if query.is_empty() || target.is_empty() {
            return None;
        }
        let (n, m) = (query.len(), target.len());
        let width = m + 1;
        // Leading target bases are free.
        let mut dp = vec![0u32; (n + 1) * width];
        for i in 1..=n {
            dp[i * width] = i as u32;
            for j in 1..=m {
                let mat = (query[i - 1] != target[j - 1]) as u32;
                let diag = dp[(i - 1) * width + j - 1] + mat;
                let ins = dp[(i - 1) * width + j] + 1;
                let del = dp[i * width + j - 1] + 1;
                dp[i * width + j] = diag.min(ins).min(del);
            }
        }
        // Trailing target bases are free as well: the leftmost best end wins.
        let (end, _) = (0..=m)
            .map(|j| (j, dp[n * width + j]))
            .min_by_key(|&(j, score)| (score, j))?;
        let (mut i, mut j) = (n, end);
        let mut steps = vec![];
        while 0 < i {
            let score = dp[i * width + j];
            if 0 < j {
                let mat = query[i - 1] != target[j - 1];
                if dp[(i - 1) * width + j - 1] + mat as u32 == score {
                    steps.push(if mat { Step::Mismatch } else { Step::Match });
                    i -= 1;
                    j -= 1;
                    continue;
                }
            }
            if dp[(i - 1) * width + j] + 1 == score {
                steps.push(Step::Ins);
                i -= 1;
            } else {
                steps.push(Step::Del);
                j -= 1;
            }
        }
        steps.reverse();
        let (ops, edit_distance) = compress(&steps);
        Some(Alignment {
            target_start: j,
            target_end: end,
            ops,
            edit_distance,
        })
    }
}
