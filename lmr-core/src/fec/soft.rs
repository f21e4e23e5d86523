//! Chase-II style soft-decision decoding shared by the block codes in this
//! module (§4.3: "Soft variants take a reliability slice ... Chase-II style
//! strategy: enumerate flips of the k least-reliable positions, pick the
//! lowest-penalty valid candidate, where penalty = sum(255 - reliab[i]) over
//! flipped bits").

/// Enumerates every subset of up to `weight` flips among the `k`
/// least-reliable positions in `bits`, calls `validate` on each candidate,
/// and returns the lowest-penalty candidate that `validate` accepts.
///
/// `validate` returns `Some(corrected_bits)` when the candidate is a valid
/// codeword (after whatever hard-decode step the caller layers on top), or
/// `None` otherwise. Ties on penalty keep the first (fewest flips) result.
pub fn chase_decode<F>(bits: &[u8], reliability: &[u8], k_weak: usize, max_weight: usize, mut validate: F) -> Option<(Vec<u8>, u32)>
where
    F: FnMut(&[u8]) -> Option<Vec<u8>>,
{
    debug_assert_eq!(bits.len(), reliability.len());
    let mut weak: Vec<usize> = (0..bits.len()).collect();
    weak.sort_by_key(|&i| reliability[i]);
    weak.truncate(k_weak.min(bits.len()));

    let mut best: Option<(Vec<u8>, u32)> = None;
    for weight in 0..=max_weight.min(weak.len()) {
        for combo in combinations(&weak, weight) {
            let mut candidate = bits.to_vec();
            let mut penalty: u32 = 0;
            for &idx in &combo {
                candidate[idx] ^= 1;
                penalty += 255 - reliability[idx] as u32;
            }
            if let Some(corrected) = validate(&candidate) {
                let better = match &best {
                    None => true,
                    Some((_, best_penalty)) => penalty < *best_penalty,
                };
                if better {
                    best = Some((corrected, penalty));
                }
            }
        }
        // Exact Chase-II examines all weights up to max_weight and keeps the
        // globally lowest-penalty hit rather than stopping at the first
        // weight that yields any candidate, since a heavier flip can still
        // have lower total penalty on very unreliable bits.
    }
    best
}

fn combinations(items: &[usize], k: usize) -> Vec<Vec<usize>> {
    if k == 0 {
        return vec![vec![]];
    }
    if items.is_empty() || k > items.len() {
        return vec![];
    }
    let mut out = Vec::new();
    for i in 0..=items.len() - k {
        let head = items[i];
        for mut tail in combinations(&items[i + 1..], k - 1) {
            tail.insert(0, head);
            out.push(tail);
        }
    }
    out
}
