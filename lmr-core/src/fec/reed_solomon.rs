//! Generic Reed-Solomon encode/decode over GF(256), parameterized by `(n,k)`,
//! backing every RS variant in §4.3's table: RS(12,9) (DMR embedded),
//! RS(24,16,9) (P25 HDU), RS(24,12,13) (P25 TDULC/LCW), and the ezpwd-style
//! RS(63,35) used by P25P2 FACCH/SACCH/ESS (with erasure support for the
//! slicer's soft-decision path).
//!
//! Symbols are bytes (`0..=n` fits comfortably in GF(256) for every code
//! this crate needs). A systematic encoding is used throughout: the first
//! `k` symbols of the codeword are the message, the last `n-k` are parity.

use super::gf256::Gf256;

pub struct ReedSolomon {
    pub n: usize,
    pub k: usize,
    generator: Vec<u8>, // LSB-first, degree n-k
}

impl ReedSolomon {
    /// Builds the RS(n,k) codec with a narrow-sense generator
    /// `g(x) = prod_{i=0}^{n-k-1} (x - alpha^i)`.
    pub fn new(n: usize, k: usize) -> Self {
        assert!(n > k && n <= 255);
        let gf = Gf256::new();
        let mut gen = vec![1u8];
        for i in 0..(n - k) {
            let factor = [gf.alpha_pow(i as i32), 1];
            gen = gf.poly_mul(&gen, &factor);
        }
        Self { n, k, generator: gen }
    }

    /// Encodes `k` data symbols into an `n`-symbol systematic codeword.
    pub fn encode(&self, data: &[u8]) -> Vec<u8> {
        assert_eq!(data.len(), self.k);
        let redundancy = self.n - self.k;
        let gf = Gf256::new();
        // message(x) * x^redundancy, represented LSB-first.
        let mut shifted = vec![0u8; redundancy];
        shifted.extend(data.iter().rev().copied());
        let mut remainder = shifted.clone();
        for i in (redundancy..remainder.len()).rev() {
            let coeff = remainder[i];
            if coeff == 0 {
                continue;
            }
            for (j, &g) in self.generator.iter().enumerate() {
                remainder[i - redundancy + j] = gf.add(remainder[i - redundancy + j], gf.mul(coeff, g));
            }
        }
        let parity_lsb = &remainder[..redundancy];
        let mut codeword = data.to_vec();
        codeword.extend(parity_lsb.iter().rev().copied());
        codeword
    }

    fn syndromes(&self, gf: &Gf256, received_lsb: &[u8]) -> Vec<u8> {
        (0..self.n - self.k).map(|i| gf.poly_eval(received_lsb, gf.alpha_pow(i as i32))).collect()
    }

    /// Decodes a systematic codeword (`data || parity`), correcting errors
    /// (and, if `erasure_positions` is non-empty, erasures at those
    /// zero-indexed codeword positions -- used by the P25P2 soft path).
    /// Returns `(data, symbols_corrected)`, or `None` if uncorrectable.
    pub fn decode(&self, codeword: &[u8], erasure_positions: &[usize]) -> Option<(Vec<u8>, u32)> {
        assert_eq!(codeword.len(), self.n);
        let gf = Gf256::new();
        let redundancy = self.n - self.k;
        let max_erasures = erasure_positions.len();

        // Received polynomial LSB-first: position n-1-j in codeword holds
        // the coefficient of x^j.
        let received_lsb: Vec<u8> = codeword.iter().rev().copied().collect();
        let syn = self.syndromes(&gf, &received_lsb);
        if syn.iter().all(|&s| s == 0) && erasure_positions.is_empty() {
            return Some((codeword[..self.k].to_vec(), 0));
        }

        // Erasure locator polynomial: prod (1 - X * alpha^pos) over erased
        // positions, expressed in terms of x^j exponent = n-1-pos.
        let erasure_exponents: Vec<i32> = erasure_positions.iter().map(|&p| (self.n - 1 - p) as i32).collect();
        let mut erasure_locator = vec![1u8];
        for &e in &erasure_exponents {
            let factor = [1u8, gf.alpha_pow(e)];
            erasure_locator = gf.poly_mul(&erasure_locator, &factor);
        }

        // Forney syndrome: convolve syndrome poly with erasure locator, keep
        // terms up to degree (redundancy - erasures - 1).
        let modified_syn = gf.poly_mul(&syn, &erasure_locator);
        let t_syn = &modified_syn[..redundancy.min(modified_syn.len())];

        let max_correctable_errors = (redundancy - max_erasures) / 2;
        let sigma = berlekamp_massey(&gf, t_syn, max_correctable_errors);
        let error_degree = sigma.iter().rposition(|&c| c != 0).unwrap_or(0);
        if error_degree > max_correctable_errors {
            return None;
        }

        let mut error_positions = Vec::new();
        for pos in 0..self.n {
            let exponent = (self.n - 1 - pos) as i32;
            let x_inv = gf.alpha_pow(-exponent);
            if gf.poly_eval(&sigma, x_inv) == 0 {
                error_positions.push(pos);
            }
        }
        if error_positions.len() != error_degree {
            return None;
        }

        // Full error-and-erasure locator = sigma * erasure_locator.
        let full_locator = gf.poly_mul(&sigma, &erasure_locator);
        let locator_derivative = formal_derivative(&gf, &full_locator);
        let omega = gf.poly_mul(&modified_syn, &full_locator);

        let mut all_positions = error_positions.clone();
        for &p in erasure_positions {
            if !all_positions.contains(&p) {
                all_positions.push(p);
            }
        }

        let mut corrected = codeword.to_vec();
        for &pos in &all_positions {
            let exponent = (self.n - 1 - pos) as i32;
            let x_inv = gf.alpha_pow(-exponent);
            let numerator = gf.poly_eval(&omega, x_inv);
            let denominator = gf.poly_eval(&locator_derivative, x_inv);
            if denominator == 0 {
                return None;
            }
            let magnitude = gf.mul(gf.alpha_pow(exponent), gf.div(numerator, denominator));
            corrected[pos] = gf.add(corrected[pos], magnitude);
        }

        let corrected_lsb: Vec<u8> = corrected.iter().rev().copied().collect();
        if self.syndromes(&gf, &corrected_lsb).iter().any(|&s| s != 0) {
            return None;
        }
        Some((corrected[..self.k].to_vec(), all_positions.len() as u32))
    }
}

fn formal_derivative(gf: &Gf256, poly: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; poly.len().saturating_sub(1)];
    for (i, &c) in poly.iter().enumerate().skip(1) {
        if i % 2 == 1 {
            out[i - 1] = gf.add(out[i - 1], c);
        }
    }
    out
}

/// Berlekamp-Massey over GF(256), capped so the locator degree never
/// exceeds `max_degree` (errors available after accounting for erasures).
fn berlekamp_massey(gf: &Gf256, syn: &[u8], max_degree: usize) -> Vec<u8> {
    let mut sigma = vec![1u8];
    let mut prev_sigma = vec![1u8];
    let mut l = 0usize;
    let mut m = 1i64;
    let mut b = 1u8;

    for n in 0..syn.len() {
        let mut discrepancy = syn[n];
        for i in 1..=l {
            if i < sigma.len() {
                discrepancy = gf.add(discrepancy, gf.mul(sigma[i], syn[n - i]));
            }
        }
        if discrepancy == 0 {
            m += 1;
        } else if 2 * l <= n && l <= max_degree {
            let t = sigma.clone();
            let scale = gf.div(discrepancy, b);
            let shift = m as usize;
            let needed_len = prev_sigma.len() + shift;
            if sigma.len() < needed_len {
                sigma.resize(needed_len, 0);
            }
            for (i, &pc) in prev_sigma.iter().enumerate() {
                sigma[i + shift] = gf.add(sigma[i + shift], gf.mul(scale, pc));
            }
            l = n + 1 - l;
            prev_sigma = t;
            b = discrepancy;
            m = 1;
        } else {
            let scale = gf.div(discrepancy, b);
            let shift = m as usize;
            let needed_len = prev_sigma.len() + shift;
            if sigma.len() < needed_len {
                sigma.resize(needed_len, 0);
            }
            for (i, &pc) in prev_sigma.iter().enumerate() {
                sigma[i + shift] = gf.add(sigma[i + shift], gf.mul(scale, pc));
            }
            m += 1;
        }
    }
    sigma
}

/// RS(12,9) over GF(256): DMR embedded signalling.
pub fn dmr_rs12_9() -> ReedSolomon {
    ReedSolomon::new(12, 9)
}

/// RS(24,16,9) over GF(256): P25 HDU, corrects up to 4 symbol errors.
pub fn p25_hdu_rs24_16() -> ReedSolomon {
    ReedSolomon::new(24, 16)
}

/// RS(24,12,13) over GF(256): P25 TDULC/LCW, corrects up to 6 symbol errors.
pub fn p25_lcw_rs24_12() -> ReedSolomon {
    ReedSolomon::new(24, 12)
}

/// RS(63,35) over GF(256): P25P2 FACCH/SACCH/ESS (ezpwd-style).
pub fn p25p2_rs63_35() -> ReedSolomon {
    ReedSolomon::new(63, 35)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rs24_16_corrects_four_symbol_errors() {
        let rs = p25_hdu_rs24_16();
        let data: Vec<u8> = (0..16u8).collect();
        let codeword = rs.encode(&data);
        let mut corrupted = codeword.clone();
        for &pos in &[0, 5, 10, 20] {
            corrupted[pos] ^= 0x55;
        }
        let (decoded, errors) = rs.decode(&corrupted, &[]).expect("4 symbol errors must be correctable");
        assert_eq!(decoded, data);
        assert_eq!(errors, 4);
    }

    #[test]
    fn rs12_9_clean_codeword_round_trips() {
        let rs = dmr_rs12_9();
        let data: Vec<u8> = (1..=9u8).collect();
        let codeword = rs.encode(&data);
        let (decoded, errors) = rs.decode(&codeword, &[]).unwrap();
        assert_eq!(decoded, data);
        assert_eq!(errors, 0);
    }

    #[test]
    fn rs63_35_uses_erasures_to_correct_more_symbols() {
        let rs = p25p2_rs63_35();
        let data: Vec<u8> = (0..35u8).collect();
        let codeword = rs.encode(&data);
        let mut corrupted = codeword.clone();
        // 14 redundancy symbols: with erasures the code corrects up to
        // (redundancy - erasures)/2 errors plus the erasures themselves.
        let erasure_positions = vec![40usize, 41, 42, 43];
        for &p in &erasure_positions {
            corrupted[p] = 0;
        }
        corrupted[0] ^= 0xFF;
        let (decoded, _) = rs.decode(&corrupted, &erasure_positions).expect("erasures plus one error must be correctable");
        assert_eq!(decoded, data);
    }
}
