//! BCH(63,16,11) for the P25 NID (§4.3): GF(2^6), primitive poly
//! `x^6+x+1`, corrects up to 11 errors via Berlekamp-Massey + Chien search.
//!
//! The generator polynomial is derived at first use from the field's
//! cyclotomic cosets rather than hand-transcribed, so encode/decode are
//! guaranteed consistent with each other; see DESIGN.md for why this
//! derivation (rather than a literature constant) is the grounding here.

use super::gf::Gf64;
use std::sync::OnceLock;

const N: usize = 63;
const K: usize = 16;
const T: usize = 11; // correctable errors, designed distance 2T+1 = 23

/// A GF(2) polynomial, coefficients LSB-first (`coeffs[0]` = constant term).
fn poly_mul_gf2(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; a.len() + b.len() - 1];
    for (i, &ai) in a.iter().enumerate() {
        if ai == 0 {
            continue;
        }
        for (j, &bj) in b.iter().enumerate() {
            out[i + j] ^= ai & bj;
        }
    }
    out
}

/// Minimal polynomial of `alpha^i` over GF(2): the product of `(x + alpha^c)`
/// over the cyclotomic coset `{i*2^j mod 63}`. Coefficients end up in
/// `{0,1}` by construction (Galois theory over GF(2^m)/GF(2)).
fn minimal_poly(gf: &Gf64, i: usize) -> Vec<u8> {
    let mut coset = Vec::new();
    let mut c = i % N;
    loop {
        if coset.contains(&c) {
            break;
        }
        coset.push(c);
        c = (c * 2) % N;
    }
    // poly = product over c in coset of (x + alpha^c), field coefficients.
    let mut poly_field: Vec<u8> = vec![1]; // constant 1
    for &c in &coset {
        let root = gf.alpha_pow(c as i32);
        let factor = vec![root, 1]; // (alpha^c + x), LSB-first: [alpha^c, 1]
        let mut next = vec![0u8; poly_field.len() + factor.len() - 1];
        for (ii, &a) in poly_field.iter().enumerate() {
            for (jj, &b) in factor.iter().enumerate() {
                next[ii + jj] = gf.add(next[ii + jj], gf.mul(a, b));
            }
        }
        poly_field = next;
    }
    poly_field.iter().map(|&v| { debug_assert!(v == 0 || v == 1, "minimal polynomial must have GF(2) coefficients"); v & 1 }).collect()
}

fn lcm_distinct(polys: &[Vec<u8>]) -> Vec<u8> {
    let mut distinct: Vec<Vec<u8>> = Vec::new();
    for p in polys {
        if !distinct.contains(p) {
            distinct.push(p.clone());
        }
    }
    let mut acc = vec![1u8];
    for p in &distinct {
        acc = poly_mul_gf2(&acc, p);
    }
    acc
}

/// Generator polynomial for BCH(63,16,23), LSB-first, degree `n-k = 47`.
fn generator() -> &'static Vec<u8> {
    static GEN: OnceLock<Vec<u8>> = OnceLock::new();
    GEN.get_or_init(|| {
        let gf = Gf64::new();
        let mins: Vec<Vec<u8>> = (1..=2 * T).map(|i| minimal_poly(&gf, i)).collect();
        lcm_distinct(&mins)
    })
}

/// Encodes `K=16` data bits (MSB-first, as every framer in this crate
/// exchanges bits) into an `N=63`-bit systematic BCH codeword.
pub fn bch63_16_encode(data: &[u8]) -> Vec<u8> {
    assert_eq!(data.len(), K);
    let gen = generator();
    let redundancy = gen.len() - 1;
    // data(x) * x^redundancy, LSB-first representation built from the
    // MSB-first input.
    let mut msg_shifted = vec![0u8; redundancy];
    msg_shifted.extend(data.iter().rev().copied());
    // Polynomial remainder of msg_shifted(x) mod gen(x), all LSB-first.
    let mut remainder = msg_shifted.clone();
    for i in (redundancy..remainder.len()).rev() {
        if remainder[i] == 1 {
            for (j, &g) in gen.iter().enumerate() {
                remainder[i - redundancy + j] ^= g;
            }
        }
    }
    let parity = &remainder[..redundancy];
    let mut codeword_lsb = vec![0u8; N];
    codeword_lsb[..redundancy].copy_from_slice(parity);
    codeword_lsb[redundancy..].copy_from_slice(&data.iter().rev().copied().collect::<Vec<_>>());
    codeword_lsb.iter().rev().copied().collect()
}

fn syndromes(gf: &Gf64, codeword_msb: &[u8]) -> Vec<u8> {
    // Evaluate received(alpha^j) for j=1..=2T. received(x) with
    // received[0] = MSB = coefficient of x^(N-1).
    (1..=2 * T)
        .map(|j| {
            let mut acc = 0u8;
            for (pos, &bit) in codeword_msb.iter().enumerate() {
                if bit == 0 {
                    continue;
                }
                let degree = (N - 1 - pos) as i32;
                acc = gf.add(acc, gf.alpha_pow(degree * j as i32));
            }
            acc
        })
        .collect()
}

/// Berlekamp-Massey over GF(64): finds the error-locator polynomial from the
/// syndrome sequence. Returns coefficients LSB-first (`sigma[0] == 1`).
fn berlekamp_massey(gf: &Gf64, syn: &[u8]) -> Vec<u8> {
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
        } else if 2 * l <= n {
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

/// Chien search: evaluates `sigma(alpha^-i)` for every codeword position `i`
/// and returns the positions (0 = MSB / `x^(N-1)`) where it vanishes.
fn chien_search(gf: &Gf64, sigma: &[u8]) -> Vec<usize> {
    let mut positions = Vec::new();
    for pos in 0..N {
        let degree = (N - 1 - pos) as i32;
        let x_inv = gf.alpha_pow(-degree);
        let mut acc = 0u8;
        for (power, &coeff) in sigma.iter().enumerate() {
            if coeff == 0 {
                continue;
            }
            acc = gf.add(acc, gf.mul(coeff, gf.pow(x_inv, power as i32)));
        }
        if acc == 0 {
            positions.push(pos);
        }
    }
    positions
}

/// Decodes a 63-bit NID codeword (MSB-first). Returns `(data, errors_fixed)`,
/// or `None` if more than 11 errors are present (the error-locator degree
/// exceeds `T`, or Chien search fails to find enough roots).
pub fn bch63_16_decode(codeword: &[u8]) -> Option<(Vec<u8>, u32)> {
    assert_eq!(codeword.len(), N);
    let gf = Gf64::new();
    let syn = syndromes(&gf, codeword);
    if syn.iter().all(|&s| s == 0) {
        let data: Vec<u8> = codeword[N - K..].to_vec();
        return Some((data, 0));
    }
    let sigma = berlekamp_massey(&gf, &syn);
    let degree = sigma.iter().rposition(|&c| c != 0).unwrap_or(0);
    if degree > T {
        return None;
    }
    let error_positions = chien_search(&gf, &sigma);
    if error_positions.len() != degree {
        return None; // locator has roots outside GF(64): uncorrectable pattern
    }
    let mut corrected = codeword.to_vec();
    for &pos in &error_positions {
        corrected[pos] ^= 1;
    }
    let resyn = syndromes(&gf, &corrected);
    if !resyn.iter().all(|&s| s == 0) {
        return None;
    }
    let data: Vec<u8> = corrected[N - K..].to_vec();
    Some((data, error_positions.len() as u32))
}
