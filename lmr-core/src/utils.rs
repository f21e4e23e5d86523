//! Bitstream and complex-sample conversion helpers shared across the DSP,
//! FEC, and protocol layers.

use ndarray::Array1;
use num_complex::Complex64;

pub fn string_to_bitstream(text: &str) -> Vec<u8> {
    text.as_bytes()
        .iter()
        .flat_map(|byte| (0..8).rev().map(move |bit| (byte >> bit) & 1))
        .collect()
}

pub fn int_to_bitstream(value: u64, bits: usize) -> Vec<u8> {
    assert!(bits > 0, "bit width must be positive");
    if bits < u64::BITS as usize {
        let limit = 1u64.checked_shl(bits as u32).unwrap_or(u64::MAX);
        assert!(value < limit, "value does not fit in bit width");
    }
    (0..bits).rev().map(|bit| ((value >> bit) & 1) as u8).collect()
}

/// Inverse of [`int_to_bitstream`]: packs a MSB-first bit slice into an
/// integer. Used throughout the protocol layer to read fixed-width fields
/// out of a frame's bit vector (opcodes, NAC, colour code, and so on).
pub fn bitstream_to_int(bits: &[u8]) -> u64 {
    bits.iter().fold(0u64, |acc, &b| (acc << 1) | (b & 1) as u64)
}

pub fn hex_to_bitstream(hex: &str, expected_bits: usize) -> Vec<u8> {
    assert!(expected_bits % 8 == 0, "expected_bits must be byte aligned");
    let padded = if hex.len() * 4 < expected_bits {
        format!("{:0>width$}", hex, width = expected_bits / 4)
    } else {
        hex.to_string()
    };

    let bytes = (0..padded.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&padded[i..i + 2], 16).expect("invalid hex"))
        .collect::<Vec<_>>();

    bytes
        .iter()
        .flat_map(|byte| (0..8).rev().map(move |bit| (byte >> bit) & 1))
        .collect()
}

pub fn pack_bits(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | (b & 1)))
        .collect()
}

pub fn bits_to_string(bits: &[u8]) -> String {
    let bytes = pack_bits(bits);
    String::from_utf8_lossy(&bytes).to_string()
}

pub fn complex_from_interleaved(data: &[f64]) -> Vec<Complex64> {
    data.chunks(2).map(|chunk| Complex64::new(chunk[0], chunk[1])).collect()
}

pub fn interleaved_from_complex(data: &[Complex64]) -> Vec<f64> {
    data.iter().flat_map(|c| [c.re, c.im]).collect()
}

pub fn array_from_bits(bits: &[u8]) -> Array1<u8> {
    Array1::from_vec(bits.to_vec())
}

/// Even parity (XOR-fold) over a bit slice; `0` for an even number of set
/// bits. Used by the CRC and block-code modules for quick parity checks
/// ahead of a full syndrome computation.
pub fn xor_parity(bits: &[u8]) -> u8 {
    bits.iter().fold(0u8, |acc, &b| acc ^ (b & 1))
}

/// Hamming distance between two equal-length bit slices.
pub fn hamming_distance(a: &[u8], b: &[u8]) -> usize {
    assert_eq!(a.len(), b.len());
    a.iter().zip(b).filter(|(x, y)| x != y).count()
}

/// Splits a dibit-encoded (2 bits/symbol) bit vector into a vector of
/// `u8` symbols in `0..=3`, MSB first within each dibit. Shared by every
/// CQPSK/4FSK protocol's deframer.
pub fn bits_to_dibits(bits: &[u8]) -> Vec<u8> {
    bits.chunks(2).map(|c| (c[0] << 1) | c.get(1).copied().unwrap_or(0)).collect()
}

pub fn dibits_to_bits(dibits: &[u8]) -> Vec<u8> {
    dibits.iter().flat_map(|d| [(d >> 1) & 1, d & 1]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_bitstream_roundtrip() {
        let text = "HelloLMR";
        let bits = string_to_bitstream(text);
        assert_eq!(bits.len(), text.len() * 8);
        let packed = pack_bits(&bits);
        assert_eq!(String::from_utf8(packed).unwrap(), text);
    }

    #[test]
    fn int_to_bitstream_width() {
        let bits = int_to_bitstream(0xAB, 12);
        assert_eq!(bits, vec![0, 0, 0, 0, 1, 0, 1, 0, 1, 0, 1, 1]);
    }

    #[test]
    fn bitstream_to_int_is_inverse_of_int_to_bitstream() {
        let bits = int_to_bitstream(0x1A5, 12);
        assert_eq!(bitstream_to_int(&bits), 0x1A5);
    }

    #[test]
    fn hex_to_bitstream_expected_width() {
        let bits = hex_to_bitstream("A5A5", 16);
        assert_eq!(bits.len(), 16);
        assert_eq!(&bits[..8], &[1, 0, 1, 0, 0, 1, 0, 1]);
    }

    #[test]
    fn complex_conversion_roundtrip() {
        let samples = [Complex64::new(0.5, -0.25), Complex64::new(-1.0, 2.0)];
        let interleaved = interleaved_from_complex(&samples);
        assert_eq!(interleaved, vec![0.5, -0.25, -1.0, 2.0]);
        let reconstructed = complex_from_interleaved(&interleaved);
        assert_eq!(reconstructed, samples);
    }

    #[test]
    fn array_from_bits_copies() {
        let bits = vec![1_u8, 0, 1, 1];
        let arr = array_from_bits(&bits);
        assert_eq!(arr.len(), bits.len());
        assert_eq!(arr.to_vec(), bits);
    }

    #[test]
    fn dibit_roundtrip() {
        let bits = vec![1, 0, 0, 1, 1, 1, 0, 0];
        let dibits = bits_to_dibits(&bits);
        assert_eq!(dibits, vec![2, 1, 3, 0]);
        assert_eq!(dibits_to_bits(&dibits), bits);
    }

    #[test]
    fn xor_parity_detects_odd_count() {
        assert_eq!(xor_parity(&[1, 0, 1, 1]), 1);
        assert_eq!(xor_parity(&[1, 1, 0, 0]), 0);
    }

    #[test]
    fn hamming_distance_counts_mismatches() {
        assert_eq!(hamming_distance(&[1, 0, 1], &[1, 1, 1]), 1);
        assert_eq!(hamming_distance(&[0, 0], &[1, 1]), 2);
    }
}
