//! P25 Phase 2 (TDMA H-CPM/CQPSK, 6000 sym/s, 2 slots) framer (§4.4):
//! super-frame = ISCH + SACCH + 4V(voice) x 2 + FACCH windows. FACCH/SACCH
//! use the ezpwd-style RS(63,35) codec with soft-decision erasures fed from
//! the slicer's per-bit reliability. A 700-dibit capture scope and a
//! 4320-bit descrambled-stream buffer match §4.4's stated sizes; the
//! descrambler's keystream construction is this crate's own LFSR, seeded
//! from `(WACN, SYSID, NAC)`, since the TIA-102 scrambler polynomial is a
//! protocol-document detail out of scope per §4.4's closing note.

use crate::fec::reed_solomon::p25p2_rs63_35;
use crate::frame::{FecStats, Frame, FramePayload, Slot};
use crate::protocols::{Framer, Protocol};
use crate::utils::pack_bits;

pub const CAPTURE_DIBITS: usize = 700;
pub const DESCRAMBLED_BITS: usize = 4320;
pub const RELIABILITY_BYTES: usize = 700;

const FACCH_CODEWORD_BYTES: usize = 63;
const FACCH_BITS: usize = FACCH_CODEWORD_BYTES * 8;
const ERASURE_THRESHOLD: u8 = 64;

/// A keystream generator seeded from the trunking identifiers carried on
/// the control channel. Not a reproduction of the real TIA-102 scrambler.
#[derive(Debug, Clone, Copy)]
pub struct P25P2Scrambler {
    state: u64,
}

impl P25P2Scrambler {
    pub fn new(wacn: u32, sysid: u16, nac: u16) -> Self {
        let seed = ((wacn as u64) << 28) ^ ((sysid as u64) << 16) ^ nac as u64 ^ 0x9E37_79B9_7F4A_7C15;
        Self { state: seed | 1 }
    }

    fn next_bit(&mut self) -> u8 {
        // xorshift64*, truncated to one bit per call.
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        (self.state & 1) as u8
    }

    pub fn keystream(&mut self, len: usize) -> Vec<u8> {
        (0..len).map(|_| self.next_bit()).collect()
    }
}

fn descramble(scrambled: &[u8], scrambler: &mut P25P2Scrambler) -> Vec<u8> {
    let keystream = scrambler.keystream(scrambled.len());
    scrambled.iter().zip(keystream).map(|(&b, k)| b ^ k).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotState {
    pub voice_active: bool,
    pub audio_allowed: bool,
}

/// Streaming P25 Phase 2 framer. Tracks per-slot MAC-driven activity
/// independently from `active_slot` (§3's invariant: "a MAC_SIGNAL observed
/// on one slot must not clear `voice_active` on the other").
pub struct P25P2Framer {
    scrambler: Option<P25P2Scrambler>,
    scrambled_bits: Vec<u8>,
    reliability: Vec<u8>,
    active_slot: Option<u8>,
    slots: [SlotState; 2],
}

impl P25P2Framer {
    pub fn new() -> Self {
        Self { scrambler: None, scrambled_bits: Vec::new(), reliability: Vec::new(), active_slot: None, slots: [SlotState::default(); 2] }
    }

    /// Seeds the descrambler once the control channel has delivered the
    /// system identifiers. Until this is called, incoming bits accumulate
    /// but are never descrambled or dispatched.
    pub fn set_keys(&mut self, wacn: u32, sysid: u16, nac: u16) {
        self.scrambler = Some(P25P2Scrambler::new(wacn, sysid, nac));
    }

    pub fn active_slot(&self) -> Option<u8> {
        self.active_slot
    }

    pub fn slot(&self, slot: u8) -> SlotState {
        self.slots[slot as usize & 1]
    }

    /// MAC_SIGNAL/MAC_PTT on `slot`: marks that slot active, selects it as
    /// `active_slot`, leaves the other slot's state untouched.
    pub fn note_mac_active(&mut self, slot: u8) {
        self.active_slot = Some(slot & 1);
        self.slots[slot as usize & 1].voice_active = true;
        self.slots[slot as usize & 1].audio_allowed = true;
    }

    /// MAC_END_PTT/MAC_IDLE on `slot`.
    pub fn note_mac_idle(&mut self, slot: u8) {
        self.slots[slot as usize & 1].voice_active = false;
        self.slots[slot as usize & 1].audio_allowed = false;
    }

    fn decode_superframe(&mut self, descrambled: &[u8], reliability: &[u8]) -> Option<Frame> {
        let codeword = pack_bits(&descrambled[..FACCH_BITS]);
        let codeword_reliability: Vec<u8> =
            reliability[..FACCH_BITS].chunks(8).map(|c| (c.iter().map(|&r| r as u32).sum::<u32>() / 8) as u8).collect();
        let erasures: Vec<usize> =
            codeword_reliability.iter().enumerate().filter(|&(_, &r)| r < ERASURE_THRESHOLD).map(|(i, _)| i).collect();

        let rs = p25p2_rs63_35();
        let voice_bytes = pack_bits(&descrambled[FACCH_BITS..]);
        let codec_frames: Vec<Vec<u8>> = voice_bytes.chunks(60).map(|c| c.to_vec()).collect();

        match rs.decode(&codeword, &erasures) {
            Some((data, errors)) => Some(Frame::new(
                Protocol::P25Phase2,
                self.active_slot.map(Slot::Tdma).unwrap_or(Slot::Single),
                0.0,
                FecStats { bits_corrected: errors, crc_ok: true },
                FramePayload::TrunkingControl { opcode: data.first().copied().unwrap_or(0) as u16, payload_bits: descrambled[..FACCH_BITS].to_vec() },
            )),
            None => Some(Frame::new(
                Protocol::P25Phase2,
                self.active_slot.map(Slot::Tdma).unwrap_or(Slot::Single),
                0.0,
                FecStats { bits_corrected: 0, crc_ok: false },
                FramePayload::Voice { codec_frames },
            )),
        }
    }
}

impl Default for P25P2Framer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framer for P25P2Framer {
    fn process_bits(&mut self, bits: &[u8], reliability: &[u8]) -> Option<Frame> {
        self.scrambled_bits.extend_from_slice(bits);
        self.reliability.extend_from_slice(reliability);
        if self.scrambled_bits.len() < DESCRAMBLED_BITS || self.scrambler.is_none() {
            return None;
        }
        let scrambler = self.scrambler.as_mut().expect("checked above");
        let burst: Vec<u8> = self.scrambled_bits.drain(..DESCRAMBLED_BITS).collect();
        let burst_reliability: Vec<u8> = self.reliability.drain(..DESCRAMBLED_BITS.min(self.reliability.len())).collect();
        let descrambled = descramble(&burst, scrambler);
        self.decode_superframe(&descrambled, &burst_reliability)
    }

    fn protocol(&self) -> Protocol {
        Protocol::P25Phase2
    }

    fn reset(&mut self) {
        self.scrambled_bits.clear();
        self.reliability.clear();
        self.active_slot = None;
        self.slots = [SlotState::default(); 2];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrambler_round_trips() {
        let data = vec![1u8, 0, 1, 1, 0, 0, 1, 0, 1, 1];
        let mut enc = P25P2Scrambler::new(0xABCDE, 0x123, 0x5A5);
        let scrambled = descramble(&data, &mut enc);
        let mut dec = P25P2Scrambler::new(0xABCDE, 0x123, 0x5A5);
        let restored = descramble(&scrambled, &mut dec);
        assert_eq!(restored, data);
    }

    #[test]
    fn mac_active_on_one_slot_does_not_disturb_the_other() {
        let mut framer = P25P2Framer::new();
        framer.note_mac_active(0);
        framer.note_mac_active(1);
        framer.note_mac_idle(1);
        assert!(framer.slot(0).voice_active);
        assert!(!framer.slot(1).voice_active);
        assert_eq!(framer.active_slot(), Some(1));
    }

    #[test]
    fn facch_survives_soft_erasures() {
        let rs = p25p2_rs63_35();
        let data: Vec<u8> = (0..35u8).collect();
        let mut codeword = rs.encode(&data);
        let erasure_positions = vec![40usize, 41, 42, 43];
        for &p in &erasure_positions {
            codeword[p] = 0;
        }
        codeword[0] ^= 0xFF;
        let (decoded, _) = rs.decode(&codeword, &erasure_positions).expect("soft erasures plus one error must be correctable");
        assert_eq!(decoded, data);
    }

    #[test]
    fn framer_requires_keys_before_emitting_frames() {
        let mut framer = P25P2Framer::new();
        let bits = vec![0u8; DESCRAMBLED_BITS];
        let reliability = vec![255u8; DESCRAMBLED_BITS];
        assert!(framer.process_bits(&bits, &reliability).is_none());
    }
}
