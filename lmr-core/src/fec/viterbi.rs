//! Convolutional Viterbi decoders (§4.3): K=3 rate-1/2 poly (7,5) for the
//! D-STAR header, and K=5 rate-1/2 for DMR embedded/SB signalling exposed
//! via an explicit streaming `reset/decode_bit/chainback` API (§3: "a
//! Viterbi trellis that exposes reset() plus decode_bit(s0, s1, pos) plus
//! chainback(pos, len) -> bytes for streaming use").

/// A soft-decision streaming Viterbi decoder for a rate-1/2 convolutional
/// code of constraint length `k`, generator polynomials `(g0, g1)` given as
/// bitmasks over the `k`-bit shift register (MSB = newest bit).
pub struct ViterbiTrellis {
    k: u32,
    num_states: usize,
    g0: u32,
    g1: u32,
    /// Per-step path metrics, one entry per state.
    path_metrics: Vec<u32>,
    /// History of survivor predecessor-state choices, one `Vec<u8>` per
    /// decoded bit position (`0`/`1` = which of the two predecessors won).
    history: Vec<Vec<u8>>,
}

const METRIC_INF: u32 = u32::MAX / 4;

impl ViterbiTrellis {
    pub fn new(k: u32, g0: u32, g1: u32) -> Self {
        let num_states = 1usize << (k - 1);
        let mut trellis = Self { k, num_states, g0, g1, path_metrics: vec![0; num_states], history: Vec::new() };
        trellis.reset();
        trellis
    }

    pub fn k3_poly_7_5() -> Self {
        Self::new(3, 0b111, 0b101)
    }

    pub fn k5_rate_half() -> Self {
        // Standard DMR-style K=5 polynomials (g0=0x19, g1=0x1B in octal-free
        // bitmask form over a 5-bit register).
        Self::new(5, 0b11001, 0b11011)
    }

    /// Resets path metrics and clears decode history (called once per
    /// burst, never mid-burst -- per §3 the trellis is value-typed state
    /// the caller owns, not a process-wide singleton).
    pub fn reset(&mut self) {
        self.path_metrics = vec![METRIC_INF; self.num_states];
        self.path_metrics[0] = 0;
        self.history.clear();
    }

    fn output_bits(&self, state: usize, input_bit: u8) -> (u8, u8) {
        let reg = ((state as u32) << 1) | input_bit as u32;
        (parity(reg & self.g0), parity(reg & self.g1))
    }

    /// Feeds one soft-decision symbol pair `(s0, s1)` -- each a "distance
    /// from 0/1" cost, lower is more confident -- through one trellis
    /// step. `pos` is the caller-tracked position, used only for assertions
    /// about monotonic call order in debug builds.
    pub fn decode_bit(&mut self, s0: u32, s1: u32, pos: usize) {
        debug_assert_eq!(pos, self.history.len(), "decode_bit must be called in position order");
        let mut next_metrics = vec![METRIC_INF; self.num_states];
        let mut choices = vec![0u8; self.num_states];

        for state in 0..self.num_states {
            if self.path_metrics[state] >= METRIC_INF {
                continue;
            }
            for input_bit in 0..2u8 {
                let (out0, out1) = self.output_bits(state, input_bit);
                // s0/s1 are the soft cost of deciding bit=1 on each coded
                // output; the cost of bit=0 is the complement.
                let cost0 = if out0 == 1 { s0 } else { 255u32.saturating_sub(s0) };
                let cost1 = if out1 == 1 { s1 } else { 255u32.saturating_sub(s1) };
                let metric = self.path_metrics[state] + cost0 + cost1;

                let next_state = ((state << 1) | input_bit as usize) & (self.num_states - 1);
                if metric < next_metrics[next_state] {
                    next_metrics[next_state] = metric;
                    choices[next_state] = input_bit;
                }
            }
        }
        self.path_metrics = next_metrics;
        self.history.push(choices);
    }

    /// Traces back from the best-metric end state over the last `len`
    /// decoded positions (`pos - len + 1 ..= pos`), producing `len` decoded
    /// bits packed MSB-first into bytes. No tail padding is assumed (§4.3:
    /// "no tail padding" for the D-STAR header).
    pub fn chainback(&self, pos: usize, len: usize) -> Vec<u8> {
        assert!(pos + 1 == self.history.len(), "chainback must be called immediately after the last decode_bit");
        assert!(len <= self.history.len());
        let mut state = self
            .path_metrics
            .iter()
            .enumerate()
            .min_by_key(|(_, &m)| m)
            .map(|(s, _)| s)
            .unwrap_or(0);

        let mut bits = vec![0u8; len];
        for i in (0..len).rev() {
            let step = &self.history[pos - (len - 1 - i)];
            let input_bit = step[state];
            bits[i] = input_bit;
            state = (state >> 1) | ((input_bit as usize) << (self.k as usize - 2));
        }
        pack_bits(&bits)
    }
}

fn parity(value: u32) -> u8 {
    (value.count_ones() % 2) as u8
}

fn pack_bits(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8).map(|c| c.iter().fold(0u8, |acc, &b| (acc << 1) | (b & 1))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_k3(bits: &[u8]) -> Vec<(u8, u8)> {
        let mut reg: u32 = 0;
        bits.iter()
            .map(|&b| {
                reg = ((reg << 1) | b as u32) & 0b111;
                (parity(reg & 0b111), parity(reg & 0b101))
            })
            .collect()
    }

    #[test]
    fn k3_decodes_clean_stream() {
        let data = vec![1u8, 0, 1, 1, 0, 0, 1, 0];
        let coded = encode_k3(&data);
        let mut trellis = ViterbiTrellis::k3_poly_7_5();
        for (i, &(c0, c1)) in coded.iter().enumerate() {
            let s0 = if c0 == 1 { 255 } else { 0 };
            let s1 = if c1 == 1 { 255 } else { 0 };
            trellis.decode_bit(s0, s1, i);
        }
        let decoded_bits = trellis.chainback(coded.len() - 1, data.len());
        let expected = super::pack_bits(&data);
        assert_eq!(decoded_bits, expected);
    }
}
