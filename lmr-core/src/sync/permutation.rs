//! CQPSK constellation-permutation recovery (§4.2). After a Costas re-lock
//! the received dibit constellation may sit at any of the 24 permutations
//! of `{0,1,2,3}`; this module finds which one maps received dibits back
//! to logical dibits against a known sync pattern.

use std::sync::atomic::{AtomicU64, Ordering};

/// All 24 permutations of `{0,1,2,3}` in lexicographic order. `PERMUTATIONS[p][d]`
/// is the logical dibit a received dibit `d` maps to under permutation `p`.
/// The four pure QPSK phase rotations (`d -> (d+k) % 4`) land at indices
/// `0, 9, 16, 18` in this ordering -- not a coincidence: lexicographic
/// enumeration of 4-element permutations places the identity first and the
/// three cyclic shifts at exactly those positions, matching §4.2's
/// "indices 0, 9, 16, 18".
pub const PERMUTATIONS: [[u8; 4]; 24] = [
    [0, 1, 2, 3], [0, 1, 3, 2], [0, 2, 1, 3], [0, 2, 3, 1], [0, 3, 1, 2], [0, 3, 2, 1],
    [1, 0, 2, 3], [1, 0, 3, 2], [1, 2, 0, 3], [1, 2, 3, 0], [1, 3, 0, 2], [1, 3, 2, 0],
    [2, 0, 1, 3], [2, 0, 3, 1], [2, 1, 0, 3], [2, 1, 3, 0], [2, 3, 0, 1], [2, 3, 1, 0],
    [3, 0, 1, 2], [3, 0, 2, 1], [3, 1, 0, 2], [3, 1, 2, 0], [3, 2, 0, 1], [3, 2, 1, 0],
];

/// The four pure-rotation permutation indices, tried before an exhaustive
/// scan (§4.2 step 2).
pub const ROTATION_INDICES: [usize; 4] = [0, 9, 16, 18];

/// How a permutation was accepted, returned alongside the result so
/// callers/tests can distinguish the fast path from a full scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPath {
    Locked,
    EarlyAccept,
    Exhaustive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermutationResult {
    pub permutation_index: usize,
    pub hamming_distance: usize,
    pub search_path: SearchPath,
}

fn hamming_over_permutation(received: &[u8], expected: &[u8], perm: &[u8; 4]) -> usize {
    received.iter().zip(expected.iter()).filter(|(&r, &e)| perm[r as usize] != e).count()
}

/// Threshold for a sync of length `sync_len` symbols: §4.2 "thresholds
/// scale proportionally with sync length (24 for P25P1, 20 for P25P2)".
/// Expressed here as a fraction of the reference lengths so it generalises
/// to any sync window.
fn distance_threshold(sync_len: usize, reference_len: usize, reference_threshold: usize) -> usize {
    ((reference_threshold * sync_len) as f64 / reference_len as f64).round() as usize
}

/// Runs the three-step search procedure from §4.2 against one sync window.
/// Returns `None` when even the best exhaustive-scan candidate misses the
/// length-scaled distance threshold -- the window doesn't match any
/// permutation closely enough to accept.
///
/// `locked` is the permutation index accepted on a previous call, if any.
/// `reference_len`/`reference_threshold` anchor the proportional-threshold
/// rule (use `(24, 4)` for P25P1-length syncs, `(20, 3)` for P25P2-length).
pub fn recover_permutation(
    received: &[u8],
    expected: &[u8],
    locked: Option<usize>,
    reference_len: usize,
    reference_threshold: usize,
) -> Option<PermutationResult> {
    let threshold = distance_threshold(received.len(), reference_len, reference_threshold).max(1);

    // Step 1: locked fast path.
    if let Some(idx) = locked {
        let dist = hamming_over_permutation(received, expected, &PERMUTATIONS[idx]);
        if dist <= 1 {
            return Some(PermutationResult { permutation_index: idx, hamming_distance: dist, search_path: SearchPath::Locked });
        }
    }

    // Step 2: current + four phase rotations.
    let mut best: Option<(usize, usize)> = None;
    for &idx in ROTATION_INDICES.iter() {
        let dist = hamming_over_permutation(received, expected, &PERMUTATIONS[idx]);
        if dist <= 2 {
            return Some(PermutationResult { permutation_index: idx, hamming_distance: dist, search_path: SearchPath::EarlyAccept });
        }
        if best.map(|(_, best_dist)| dist < best_dist).unwrap_or(true) {
            best = Some((idx, dist));
        }
    }

    // Step 3: exhaustive scan of the remaining permutations.
    for (idx, perm) in PERMUTATIONS.iter().enumerate() {
        if ROTATION_INDICES.contains(&idx) {
            continue;
        }
        let dist = hamming_over_permutation(received, expected, perm);
        if best.map(|(_, best_dist)| dist < best_dist).unwrap_or(true) {
            best = Some((idx, dist));
        }
    }

    let (idx, dist) = best.unwrap_or((0, usize::MAX));
    if dist > threshold {
        return None;
    }
    Some(PermutationResult { permutation_index: idx, hamming_distance: dist, search_path: SearchPath::Exhaustive })
}

/// Packs `(index, hamming)` into the single 64-bit atomic word §5 describes
/// for cross-thread CQPSK permutation state: low 32 bits = index, high 32
/// bits = hamming distance.
fn pack(index: usize, hamming: usize) -> u64 {
    (index as u64) | ((hamming as u64) << 32)
}

fn unpack(word: u64) -> (usize, usize) {
    ((word & 0xFFFF_FFFF) as usize, (word >> 32) as usize)
}

/// Cross-thread permutation-lock word (§5 "CQPSK permutation state").
/// Updated by compare-and-swap with the policy: "accept strictly better
/// hamming, or equal hamming with a different index (phase-rotation slip)".
pub struct AtomicPermutationState {
    word: AtomicU64,
}

impl AtomicPermutationState {
    pub fn new() -> Self {
        Self { word: AtomicU64::new(pack(0, usize::MAX)) }
    }

    pub fn load(&self) -> (usize, usize) {
        unpack(self.word.load(Ordering::Acquire))
    }

    /// Attempts to publish a new `(index, hamming)` pair; returns whether
    /// the update was accepted under the CAS policy.
    pub fn try_update(&self, index: usize, hamming: usize) -> bool {
        loop {
            let current = self.word.load(Ordering::Acquire);
            let (current_index, current_hamming) = unpack(current);
            let accept = hamming < current_hamming || (hamming == current_hamming && index != current_index);
            if !accept {
                return false;
            }
            let new_word = pack(index, hamming);
            if self
                .word
                .compare_exchange(current, new_word, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return true;
            }
        }
    }
}

impl Default for AtomicPermutationState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Invariant 5 (§8): the permutation set is closed under composition with
    // the four phase rotations -- i.e. every rotation is itself a member of
    // the 24-permutation set (trivially true here since ROTATION_INDICES
    // indexes directly into PERMUTATIONS), and composing any permutation
    // with a rotation yields another member of the set.
    #[test]
    fn rotation_indices_match_cyclic_shift_permutations() {
        for (k, &idx) in ROTATION_INDICES.iter().enumerate() {
            let perm = PERMUTATIONS[idx];
            for d in 0u8..4 {
                assert_eq!(perm[d as usize], (d + k as u8) % 4);
            }
        }
    }

    #[test]
    fn permutation_set_is_closed_under_rotation_composition() {
        for perm in PERMUTATIONS.iter() {
            for &rot_idx in ROTATION_INDICES.iter() {
                let rot = PERMUTATIONS[rot_idx];
                let composed: Vec<u8> = (0..4u8).map(|d| rot[perm[d as usize] as usize]).collect();
                assert!(PERMUTATIONS.iter().any(|p| p.to_vec() == composed));
            }
        }
    }

    #[test]
    fn exact_match_locks_with_zero_distance() {
        let expected = vec![0u8, 1, 2, 3, 0, 1, 2, 3];
        let received = expected.clone();
        let result = recover_permutation(&received, &expected, None, 24, 4).expect("exact match must be accepted");
        assert_eq!(result.hamming_distance, 0);
        assert_eq!(PERMUTATIONS[result.permutation_index], [0, 1, 2, 3]);
    }

    #[test]
    fn rotated_constellation_is_recovered_via_early_accept() {
        let expected = vec![0u8, 1, 2, 3, 0, 1, 2, 3, 0, 1];
        // Received dibits are the expected ones rotated by +1 (logical = (d+1)%4
        // applied at the transmitter, so received = logical - 1 under that
        // same rotation perm index 9).
        let received: Vec<u8> = expected.iter().map(|&d| PERMUTATIONS[9][d as usize]).collect();
        let result = recover_permutation(&received, &expected, None, 24, 4).expect("rotated match must be accepted");
        assert_eq!(result.permutation_index, 9);
        assert_eq!(result.hamming_distance, 0);
        assert_eq!(result.search_path, SearchPath::EarlyAccept);
    }

    #[test]
    fn locked_fast_path_is_reused_when_still_consistent() {
        let expected = vec![0u8, 1, 2, 3, 0, 1, 2, 3];
        let result = recover_permutation(&expected, &expected, Some(0), 24, 4).expect("locked match must be accepted");
        assert_eq!(result.search_path, SearchPath::Locked);
        assert_eq!(result.permutation_index, 0);
    }

    #[test]
    fn exhaustive_scan_rejects_a_window_beyond_the_scaled_threshold() {
        // Build a window where, for each logical value `e`, half of its six
        // occurrences are received as `(e+1)%4` and half as `(e+2)%4`. No
        // single permutation `g` can agree with both halves, so every
        // candidate mapping mismatches at least half of each value's
        // occurrences -- total distance >= 12, far past the scaled
        // threshold of 4 for a 24-symbol window.
        let mut expected = vec![0u8; 24];
        let mut received = vec![0u8; 24];
        for e in 0u8..4 {
            for k in 0usize..6 {
                let i = e as usize + 4 * k;
                expected[i] = e;
                received[i] = if k % 2 == 0 { (e + 1) % 4 } else { (e + 2) % 4 };
            }
        }
        let result = recover_permutation(&received, &expected, None, 24, 4);
        assert!(result.is_none());
    }

    #[test]
    fn atomic_state_accepts_strictly_better_hamming() {
        let state = AtomicPermutationState::new();
        assert!(state.try_update(3, 2));
        assert_eq!(state.load(), (3, 2));
        assert!(!state.try_update(3, 2));
        assert!(state.try_update(5, 1));
        assert_eq!(state.load(), (5, 1));
    }

    #[test]
    fn atomic_state_accepts_equal_hamming_with_different_index() {
        let state = AtomicPermutationState::new();
        state.try_update(1, 2);
        assert!(state.try_update(2, 2));
        assert_eq!(state.load(), (2, 2));
        assert!(!state.try_update(2, 2));
    }
}
