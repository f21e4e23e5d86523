//! Golay(23,12)/(24,12) and the (24,6) shortened variant used for P25
//! header hexwords (§4.3). The binary Golay code is perfect for `t=3`: every
//! syndrome of a correctable (weight <= 3) error pattern is unique, so
//! decoding is a syndrome lookup built once and reused.

use super::soft::chase_decode;
use std::collections::HashMap;
use std::sync::OnceLock;

/// One of the two standard generator polynomials for the (23,12,7) binary
/// Golay code, in bit-0-is-constant-term order: `x^11+x^10+x^6+x^5+x^4+x^2+1`.
const GOLAY_GEN_POLY: u32 = 0xC75; // x^11+x^10+x^6+x^5+x^4+x^2+1

fn poly_mod(mut value: u32, poly: u32, poly_degree: u32) -> u32 {
    let mut value_degree = 31 - value.leading_zeros() as i32;
    while value_degree >= poly_degree as i32 {
        value ^= poly << (value_degree - poly_degree as i32);
        value_degree = if value == 0 { -1 } else { 31 - value.leading_zeros() as i32 };
    }
    value
}

/// Systematic cyclic encode: codeword = data << 11 | (data<<11 mod g(x)).
fn golay23_encode_bits(data: &[u8]) -> [u8; 23] {
    assert_eq!(data.len(), 12);
    let data_val = data.iter().fold(0u32, |acc, &b| (acc << 1) | (b & 1) as u32);
    let shifted = data_val << 11;
    let parity = poly_mod(shifted, GOLAY_GEN_POLY, 11);
    let codeword_val = shifted | parity;
    let mut out = [0u8; 23];
    for i in 0..23 {
        out[i] = ((codeword_val >> (22 - i)) & 1) as u8;
    }
    out
}

fn syndrome23(codeword: &[u8]) -> u32 {
    let val = codeword.iter().fold(0u32, |acc, &b| (acc << 1) | (b & 1) as u32);
    poly_mod(val, GOLAY_GEN_POLY, 11)
}

/// Syndrome -> error pattern (as a 23-bit value) lookup for every weight
/// `0..=3` error pattern. Built once; the Golay code being perfect
/// guarantees there is no collision.
fn syndrome_table() -> &'static HashMap<u32, u32> {
    static TABLE: OnceLock<HashMap<u32, u32>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut map = HashMap::new();
        map.insert(0u32, 0u32);
        for w in 1..=3usize {
            for combo in combinations(23, w) {
                let mut err = 0u32;
                for &bit in &combo {
                    err |= 1 << bit;
                }
                let codeword: Vec<u8> = (0..23).map(|i| ((err >> (22 - i)) & 1) as u8).collect();
                let syn = syndrome23(&codeword);
                map.entry(syn).or_insert(err);
            }
        }
        map
    })
}

fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    fn go(start: usize, n: usize, k: usize, cur: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if cur.len() == k {
            out.push(cur.clone());
            return;
        }
        for i in start..n {
            cur.push(i);
            go(i + 1, n, k, cur, out);
            cur.pop();
        }
    }
    let mut out = Vec::new();
    go(0, n, k, &mut Vec::new(), &mut out);
    out
}

/// Encodes 12 data bits into a 23-bit Golay(23,12,7) codeword.
pub fn golay23_12_encode(data: &[u8]) -> Vec<u8> {
    golay23_encode_bits(data).to_vec()
}

/// Hard-decodes a 23-bit codeword, correcting up to 3 errors. Returns
/// `(data, errors_fixed)`, or `None` if the syndrome is not in the
/// weight<=3 table (more than 3 errors occurred).
pub fn golay23_12_decode(codeword: &[u8]) -> Option<(Vec<u8>, u32)> {
    assert_eq!(codeword.len(), 23);
    let syn = syndrome23(codeword);
    let err = *syndrome_table().get(&syn)?;
    let val = codeword.iter().fold(0u32, |acc, &b| (acc << 1) | (b & 1) as u32);
    let corrected = val ^ err;
    let data: Vec<u8> = (0..12).map(|i| ((corrected >> (22 - i)) & 1) as u8).collect();
    Some((data, err.count_ones()))
}

/// Soft variant: enumerates flips among the 6 least-reliable bits, weight up
/// to 4 (§4.3: "Hard + Chase-soft (6 weak bits, weight<=4)").
pub fn golay23_12_decode_soft(codeword: &[u8], reliability: &[u8]) -> Option<(Vec<u8>, u32)> {
    chase_decode(codeword, reliability, 6, 4, |cand| golay23_12_decode(cand).map(|(d, _)| d))
}

/// Extended Golay(24,12,8): appends an overall even-parity bit to the
/// (23,12) codeword, raising the minimum distance to 8 (corrects 3, detects
/// a 4th).
pub fn golay24_12_encode(data: &[u8]) -> Vec<u8> {
    let mut codeword = golay23_encode_bits(data).to_vec();
    let parity = codeword.iter().fold(0u8, |acc, &b| acc ^ b);
    codeword.push(parity);
    codeword
}

/// Decodes a 24-bit extended codeword: corrects up to 3 errors in the first
/// 23 bits via the (23,12) syndrome table, then checks the appended parity
/// bit against the corrected codeword as a 4-error detector.
pub fn golay24_12_decode(codeword: &[u8]) -> Option<(Vec<u8>, u32)> {
    assert_eq!(codeword.len(), 24);
    let (data, errors) = golay23_12_decode(&codeword[..23])?;
    let corrected23 = golay23_encode_bits(&data);
    let expected_parity = corrected23.iter().fold(0u8, |acc, &b| acc ^ b);
    if expected_parity != codeword[23] && errors == 3 {
        return None; // 4-error pattern detected, uncorrectable
    }
    Some((data, errors))
}

/// The "Golay(24,6) extended" variant used for P25 headers (§4.3): a
/// shortened extended-Golay code that carries only 6 significant data bits,
/// zero-padded into the unused 6 message-bit positions before encoding.
pub fn golay24_6_encode(data: &[u8]) -> Vec<u8> {
    assert_eq!(data.len(), 6);
    let mut padded = data.to_vec();
    padded.extend(std::iter::repeat(0u8).take(6));
    golay24_12_encode(&padded)
}

/// Decodes a shortened (24,6) codeword; returns the first 6 data bits.
pub fn golay24_6_decode(codeword: &[u8]) -> Option<(Vec<u8>, u32)> {
    let (data, errors) = golay24_12_decode(codeword)?;
    Some((data[..6].to_vec(), errors))
}

/// Soft variant for the (24,6) header code: 5 weak bits, weight <= 3 (§4.3).
pub fn golay24_6_decode_soft(codeword: &[u8], reliability: &[u8]) -> Option<(Vec<u8>, u32)> {
    chase_decode(codeword, reliability, 5, 3, |cand| golay24_6_decode(cand).map(|(d, _)| d))
}
