//! Hamming(10,6,3) (P25 hex words) and Hamming(17,12,3) (DMR SLCO), §4.3.
//!
//! Both are single-error-correcting systematic codes built from the same
//! standard parity-check construction: the parity-check matrix's columns are
//! every nonzero value in `1..2^r` assigned so the identity sub-matrix lands
//! on the parity positions, giving a distance-3 code for any `(n,k)` with
//! `n = k + r` and `2^r - 1 >= n`. `r=4` for (10,6), `r=5` for (17,12).

use super::soft::chase_decode;

fn parity_bits_needed(n: usize) -> usize {
    let mut r = 1;
    while (1usize << r) - 1 < n {
        r += 1;
    }
    r
}

/// Builds the `n` parity-check columns (each an `r`-bit value in `1..2^r`),
/// assigning power-of-two positions (1,2,4,8,...) to parity bits and the
/// rest, in order, to data bits. Returns one column value per bit position
/// (0-indexed from the MSB of the codeword).
fn check_matrix_columns(n: usize, r: usize) -> Vec<u32> {
    let mut columns = vec![0u32; n];
    let mut next_value = 1u32;
    let mut data_positions: Vec<usize> = Vec::new();
    let mut parity_positions: Vec<usize> = Vec::new();
    for pos in 0..n {
        let one_indexed = pos + 1;
        if one_indexed.is_power_of_two() {
            parity_positions.push(pos);
        } else {
            data_positions.push(pos);
        }
    }
    // Parity position i (0-indexed among parity_positions) gets column 2^i.
    for (i, &pos) in parity_positions.iter().enumerate() {
        columns[pos] = 1u32 << i;
    }
    for &pos in &data_positions {
        // Skip zero and already-used powers of two; assign the remaining
        // values in ascending order to data positions.
        while next_value == 0 || next_value.is_power_of_two() || columns.contains(&next_value) {
            next_value += 1;
            if next_value >= (1u32 << r) {
                break;
            }
        }
        columns[pos] = next_value;
        next_value += 1;
    }
    columns
}

struct HammingCode {
    n: usize,
    k: usize,
    r: usize,
    columns: Vec<u32>,
    data_positions: Vec<usize>,
}

impl HammingCode {
    fn new(n: usize, k: usize) -> Self {
        let r = parity_bits_needed(n);
        debug_assert_eq!(n, k + r, "n must equal k + required parity bits");
        let columns = check_matrix_columns(n, r);
        let data_positions: Vec<usize> = (0..n).filter(|&p| !(p + 1).is_power_of_two()).collect();
        Self { n, k, r, columns, data_positions }
    }

    fn encode(&self, data: &[u8]) -> Vec<u8> {
        assert_eq!(data.len(), self.k);
        let mut codeword = vec![0u8; self.n];
        for (bit, &pos) in data.iter().zip(&self.data_positions) {
            codeword[pos] = *bit;
        }
        for i in 0..self.r {
            let parity_pos = (1usize << i) - 1;
            let mut acc = 0u8;
            for pos in 0..self.n {
                if pos == parity_pos {
                    continue;
                }
                if (self.columns[pos] >> i) & 1 == 1 {
                    acc ^= codeword[pos];
                }
            }
            codeword[parity_pos] = acc;
        }
        codeword
    }

    fn syndrome(&self, codeword: &[u8]) -> u32 {
        let mut syn = 0u32;
        for (pos, &bit) in codeword.iter().enumerate() {
            if bit & 1 == 1 {
                syn ^= self.columns[pos];
            }
        }
        syn
    }

    /// Hard decode: corrects a single bit error, returns `(data, errors)`, or
    /// `None` if the syndrome points outside the codeword (more than 1 error,
    /// undetectable as uncorrectable by a plain Hamming code).
    fn decode(&self, codeword: &[u8]) -> Option<(Vec<u8>, u32)> {
        assert_eq!(codeword.len(), self.n);
        let syn = self.syndrome(codeword);
        let mut corrected = codeword.to_vec();
        let mut errors = 0u32;
        if syn != 0 {
            match self.columns.iter().position(|&c| c == syn) {
                Some(pos) => {
                    corrected[pos] ^= 1;
                    errors = 1;
                }
                None => return None,
            }
        }
        let data: Vec<u8> = self.data_positions.iter().map(|&p| corrected[p]).collect();
        Some((data, errors))
    }
}

/// Encodes 6 data bits into a 10-bit P25 hex-word codeword.
pub fn hamming10_6_encode(data: &[u8]) -> Vec<u8> {
    HammingCode::new(10, 6).encode(data)
}

/// Hard-decodes a 10-bit P25 hex-word codeword; `Some((data, errors))` with
/// `errors in {0,1}`, `None` if the syndrome is unresolvable.
pub fn hamming10_6_decode(codeword: &[u8]) -> Option<(Vec<u8>, u32)> {
    HammingCode::new(10, 6).decode(codeword)
}

/// Soft variant: enumerates flips among the 3 least-reliable bits (§4.3).
pub fn hamming10_6_decode_soft(codeword: &[u8], reliability: &[u8]) -> Option<(Vec<u8>, u32)> {
    let code = HammingCode::new(10, 6);
    chase_decode(codeword, reliability, 3, 1, |cand| code.decode(cand).map(|(d, _)| d))
        .map(|(data, penalty)| (data, penalty))
}

/// Encodes 12 data bits into a 17-bit DMR SLCO codeword.
pub fn hamming17_12_encode(data: &[u8]) -> Vec<u8> {
    HammingCode::new(17, 12).encode(data)
}

/// Hard-decodes a 17-bit DMR SLCO codeword.
pub fn hamming17_12_decode(codeword: &[u8]) -> Option<(Vec<u8>, u32)> {
    HammingCode::new(17, 12).decode(codeword)
}

/// Generic `(n,k)` Hamming encode, used by [`crate::fec::bptc`] for the
/// BPTC(196,96) row (15,11) and column (13,9) sub-codes.
pub fn hamming_encode(n: usize, k: usize, data: &[u8]) -> Vec<u8> {
    HammingCode::new(n, k).encode(data)
}

/// Generic `(n,k)` Hamming decode.
pub fn hamming_decode(n: usize, k: usize, codeword: &[u8]) -> Option<(Vec<u8>, u32)> {
    HammingCode::new(n, k).decode(codeword)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::int_to_bitstream;

    #[test]
    fn hamming10_6_corrects_single_error() {
        let data = int_to_bitstream(0b101101, 6);
        let codeword = hamming10_6_encode(&data);
        for flip in 0..codeword.len() {
            let mut corrupted = codeword.clone();
            corrupted[flip] ^= 1;
            let (decoded, errors) = hamming10_6_decode(&corrupted).expect("single error must resolve");
            assert_eq!(decoded, data, "flip at {flip}");
            assert_eq!(errors, if corrupted == codeword { 0 } else { 1 });
        }
    }

    #[test]
    fn hamming10_6_clean_codeword_has_zero_errors() {
        let data = int_to_bitstream(0b000000, 6);
        let codeword = hamming10_6_encode(&data);
        let (decoded, errors) = hamming10_6_decode(&codeword).unwrap();
        assert_eq!(errors, 0);
        assert_eq!(decoded, data);
    }

    #[test]
    fn hamming17_12_corrects_single_error() {
        let data = int_to_bitstream(0xABC, 12);
        let codeword = hamming17_12_encode(&data);
        let mut corrupted = codeword.clone();
        corrupted[5] ^= 1;
        let (decoded, errors) = hamming17_12_decode(&corrupted).expect("must resolve");
        assert_eq!(decoded, data);
        assert_eq!(errors, 1);
    }

    #[test]
    fn soft_decode_prefers_flipping_least_reliable_bit() {
        let data = int_to_bitstream(0b110010, 6);
        let codeword = hamming10_6_encode(&data);
        let mut corrupted = codeword.clone();
        corrupted[2] ^= 1;
        let mut reliability = vec![255u8; corrupted.len()];
        reliability[2] = 10;
        let (decoded, _) = hamming10_6_decode_soft(&corrupted, &reliability).expect("soft decode must resolve");
        assert_eq!(decoded, data);
    }
}
