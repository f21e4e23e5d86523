//! BPTC(196,96): DMR data/voice-header block-product turbo code (§4.3,
//! GLOSSARY). A 13-row x 15-column matrix (195 bits, plus one reserved
//! leading bit = 196) where each of the 9 data rows is a Hamming(15,11,3)
//! codeword and each of the 15 columns is a Hamming(13,9,3) codeword; the
//! 9x11 = 99 information positions carry 96 payload bits (3 reserved).

use super::hamming::{hamming_decode, hamming_encode};

const ROWS: usize = 13;
const COLS: usize = 15;
const DATA_ROWS: usize = 9;
const DATA_COLS: usize = 11;
const RAW_BITS: usize = 196;
const PAYLOAD_BITS: usize = 96;

/// DMR's standard BPTC bit interleave: `deinterleaved[i] = raw[(i*181) % 196]`.
fn deinterleave(raw: &[u8]) -> Vec<u8> {
    assert_eq!(raw.len(), RAW_BITS);
    (0..RAW_BITS).map(|i| raw[(i * 181) % RAW_BITS]).collect()
}

fn interleave(deinterleaved: &[u8]) -> Vec<u8> {
    assert_eq!(deinterleaved.len(), RAW_BITS);
    let mut raw = vec![0u8; RAW_BITS];
    for i in 0..RAW_BITS {
        raw[(i * 181) % RAW_BITS] = deinterleaved[i];
    }
    raw
}

/// Encodes 96 payload bits into a 196-bit interleaved BPTC block. The 3
/// unused information positions (99 - 96) are filled with zero.
pub fn bptc196_96_encode(payload: &[u8]) -> Vec<u8> {
    assert_eq!(payload.len(), PAYLOAD_BITS);
    let mut info = payload.to_vec();
    info.extend([0, 0, 0]); // 3 reserved bits, zero-filled

    // Matrix of 13 rows x 15 cols, index [row*COLS+col]; position 0 (the
    // leading reserved bit before the matrix) is accounted for separately.
    let mut matrix = vec![0u8; ROWS * COLS];
    let mut info_iter = info.iter();
    for row in 0..DATA_ROWS {
        for col in 0..DATA_COLS {
            matrix[row * COLS + col] = *info_iter.next().unwrap();
        }
    }
    // Row parity: Hamming(15,11) over each of the 9 data rows.
    for row in 0..DATA_ROWS {
        let data: Vec<u8> = (0..DATA_COLS).map(|col| matrix[row * COLS + col]).collect();
        let codeword = hamming_encode(15, 11, &data);
        for col in 0..COLS {
            matrix[row * COLS + col] = codeword[col];
        }
    }
    // Column parity: Hamming(13,9) down each of the 15 columns (rows 0..9
    // are the data/row-parity rows just computed; rows 9..13 are produced
    // here).
    for col in 0..COLS {
        let data: Vec<u8> = (0..DATA_ROWS).map(|row| matrix[row * COLS + col]).collect();
        let codeword = hamming_encode(13, 9, &data);
        for row in 0..ROWS {
            matrix[row * COLS + col] = codeword[row];
        }
    }

    let mut deinterleaved = vec![0u8; RAW_BITS];
    deinterleaved[0] = 0; // reserved leading bit
    deinterleaved[1..].copy_from_slice(&matrix);
    interleave(&deinterleaved)
}

/// Decodes a 196-bit interleaved BPTC block. Column Hamming(13,9) corrects
/// first (per the standard decode order), then row Hamming(15,11) corrects
/// each data row; returns `(payload, total_bits_corrected)`, or `None` if
/// any sub-code's syndrome is unresolvable.
pub fn bptc196_96_decode(raw: &[u8]) -> Option<(Vec<u8>, u32)> {
    let deinterleaved = deinterleave(raw);
    let mut matrix = deinterleaved[1..].to_vec();
    let mut total_errors = 0u32;

    for col in 0..COLS {
        let codeword: Vec<u8> = (0..ROWS).map(|row| matrix[row * COLS + col]).collect();
        let (data, errors) = hamming_decode(13, 9, &codeword)?;
        total_errors += errors;
        for (row, &bit) in data.iter().enumerate() {
            matrix[row * COLS + col] = bit;
        }
    }

    let mut payload = Vec::with_capacity(DATA_ROWS * DATA_COLS);
    for row in 0..DATA_ROWS {
        let codeword: Vec<u8> = (0..COLS).map(|col| matrix[row * COLS + col]).collect();
        let (data, errors) = hamming_decode(15, 11, &codeword)?;
        total_errors += errors;
        payload.extend_from_slice(&data);
    }
    payload.truncate(PAYLOAD_BITS);
    Some((payload, total_errors))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_block_round_trips() {
        let payload: Vec<u8> = (0..PAYLOAD_BITS).map(|i| (i % 3 == 0) as u8).collect();
        let encoded = bptc196_96_encode(&payload);
        assert_eq!(encoded.len(), RAW_BITS);
        let (decoded, errors) = bptc196_96_decode(&encoded).expect("clean block must decode");
        assert_eq!(decoded, payload);
        assert_eq!(errors, 0);
    }

    #[test]
    fn corrects_single_bit_error_per_row_and_column() {
        let payload: Vec<u8> = (0..PAYLOAD_BITS).map(|i| (i % 5 == 0) as u8).collect();
        let encoded = bptc196_96_encode(&payload);
        let mut corrupted = encoded.clone();
        corrupted[10] ^= 1;
        let (decoded, errors) = bptc196_96_decode(&corrupted).expect("single error must resolve");
        assert_eq!(decoded, payload);
        assert!(errors >= 1);
    }
}
