//! P25 Phase 1 (FDMA C4FM, 4800 sym/s) framer (§4.4): super-frame =
//! HDU + 9xLDU + {TDU|TDULC}. NID (NAC + DUID) decodes via BCH(63,16,11);
//! HDU's message indicator via RS(24,16,9); TDULC's link-control word via
//! RS(24,12,13); TSBK/MBT trunking messages are fixed-field blocks over the
//! RS-corrected bytes. A status dibit is expected every 35 data dibits and
//! is stripped transparently before body decode, counted but never passed
//! on to a decoder.
//!
//! MBT/TSBK field layout (opcode byte, the System ID and WACN placement,
//! the 4-bit-iden/12-bit-channel pairing) is this crate's own fixed framing
//! for the messages named in the trunking scenarios below; the real TIA-102
//! bit-exact layout is out of scope per §4.4's closing note.

use crate::fec::bch::bch63_16_decode;
use crate::fec::reed_solomon::{p25_hdu_rs24_16, p25_lcw_rs24_12};
use crate::frame::{FecStats, Frame, FramePayload, Slot};
use crate::protocols::iden::IdenTable;
use crate::protocols::{Framer, Protocol};
use crate::utils::{bitstream_to_int, pack_bits};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Duid {
    Hdu,
    Tdu,
    Ldu1,
    Ldu2,
    Tdulc,
    Tsbk,
    Mbt,
    Pdu,
    Unknown(u8),
}

impl Duid {
    fn from_nibble(nibble: u8) -> Self {
        match nibble {
            0x0 => Duid::Hdu,
            0x3 => Duid::Tdu,
            0x5 => Duid::Ldu1,
            0xA => Duid::Ldu2,
            0xF => Duid::Tdulc,
            0x7 => Duid::Tsbk,
            0xC => Duid::Mbt,
            0x6 => Duid::Pdu,
            other => Duid::Unknown(other),
        }
    }

    /// Body length in bits, following the NID, for each data unit type.
    fn body_bits(self) -> usize {
        match self {
            Duid::Hdu => 24 * 8,
            Duid::Tdu => 0,
            Duid::Ldu1 | Duid::Ldu2 => 9 * 88,
            Duid::Tdulc => 24 * 8,
            Duid::Tsbk => 12 * 8,
            Duid::Mbt => 48 * 8,
            Duid::Pdu => 12 * 8,
            Duid::Unknown(_) => 0,
        }
    }
}

/// MBT opcodes this crate understands field layouts for.
pub const OPCODE_NETWORK_STATUS: u8 = 0x17;
pub const OPCODE_RFSS_STATUS: u8 = 0x3A;

#[derive(Debug, Clone, PartialEq)]
pub enum MbtBody {
    NetworkStatus { wacn: u32, sysid: u16, cc_iden: u8, cc_channel: u16 },
    RfssStatus { neighbour_channels: Vec<(u8, u16)> },
    Other { opcode: u8, payload: Vec<u8> },
}

/// Parses a (already RS-corrected) MBT block's fixed fields. `block` must be
/// at least 17 bytes (enough to hold the Network-Status fields); callers
/// pass the full 48-byte block decoded by [`P25P1Framer`].
pub fn decode_mbt(block: &[u8]) -> MbtBody {
    assert!(block.len() >= 17, "MBT block too short for fixed fields");
    match block[0] {
        OPCODE_NETWORK_STATUS => {
            let sysid = ((block[3] & 0x0F) as u16) << 8 | block[4] as u16;
            let wacn = ((block[12] as u32) << 16 | (block[13] as u32) << 8 | block[14] as u32) >> 4;
            let cc = u16::from_be_bytes([block[15], block[16]]);
            MbtBody::NetworkStatus { wacn, sysid, cc_iden: ((cc >> 12) & 0xF) as u8, cc_channel: cc & 0x0FFF }
        }
        OPCODE_RFSS_STATUS => {
            let chan_t = u16::from_be_bytes([block[7], block[8]]);
            let chan_r = u16::from_be_bytes([block[9], block[10]]);
            let split = |c: u16| (((c >> 12) & 0xF) as u8, c & 0x0FFF);
            MbtBody::RfssStatus { neighbour_channels: vec![split(chan_t), split(chan_r)] }
        }
        opcode => MbtBody::Other { opcode, payload: block.to_vec() },
    }
}

/// Resolves a Network-Status MBT's control-channel frequency, and a
/// RFSS-Status MBT's neighbour list, against an [`IdenTable`].
pub fn resolve_mbt_frequencies(body: &MbtBody, iden_table: &IdenTable) -> Vec<u64> {
    match body {
        MbtBody::NetworkStatus { cc_iden, cc_channel, .. } => {
            iden_table.frequency_hz(*cc_iden, *cc_channel).into_iter().collect()
        }
        MbtBody::RfssStatus { neighbour_channels } => {
            neighbour_channels.iter().filter_map(|&(id, ch)| iden_table.frequency_hz(id, ch)).collect()
        }
        MbtBody::Other { .. } => Vec::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingNid,
    Body(Duid),
}

/// Streaming P25 Phase 1 framer: consumes a bit-serial stream (MSB-first per
/// dibit) already delineated to begin at a detected sync, and emits one
/// `Frame` per completed data unit.
pub struct P25P1Framer {
    state: State,
    data_bits: Vec<u8>,
    data_reliability: Vec<u8>,
    bits_since_status: usize,
    pending_status_bits: usize,
    status_dibits_seen: u32,
    nac: Option<u16>,
    iden_table: IdenTable,
}

impl P25P1Framer {
    const NID_BITS: usize = 63;
    const STATUS_PERIOD_BITS: usize = 70; // 35 data dibits * 2 bits/dibit

    pub fn new(iden_table: IdenTable) -> Self {
        Self {
            state: State::AwaitingNid,
            data_bits: Vec::new(),
            data_reliability: Vec::new(),
            bits_since_status: 0,
            pending_status_bits: 0,
            status_dibits_seen: 0,
            nac: None,
            iden_table,
        }
    }

    pub fn nac(&self) -> Option<u16> {
        self.nac
    }

    pub fn status_dibits_seen(&self) -> u32 {
        self.status_dibits_seen
    }

    /// Appends bits to the data buffer, transparently stripping the status
    /// dibit that follows every 35 data dibits.
    fn feed(&mut self, bits: &[u8], reliability: &[u8]) {
        for (&bit, &rel) in bits.iter().zip(reliability.iter()) {
            if self.pending_status_bits > 0 {
                self.pending_status_bits -= 1;
                if self.pending_status_bits == 0 {
                    self.status_dibits_seen += 1;
                }
                continue;
            }
            self.data_bits.push(bit);
            self.data_reliability.push(rel);
            self.bits_since_status += 1;
            if self.bits_since_status == Self::STATUS_PERIOD_BITS {
                self.bits_since_status = 0;
                self.pending_status_bits = 2;
            }
        }
    }

    fn try_decode_body(&mut self, duid: Duid) -> Option<Frame> {
        let needed = duid.body_bits();
        if self.data_bits.len() < needed {
            return None;
        }
        let body: Vec<u8> = self.data_bits.drain(..needed).collect();
        let drain_rel = needed.min(self.data_reliability.len());
        self.data_reliability.drain(..drain_rel);
        self.state = State::AwaitingNid;

        let payload = match duid {
            Duid::Tdu => {
                // "the call-strings are blanked and ALG/KEY/MI reset"
                self.nac = None;
                FramePayload::LinkControl { fields: vec![] }
            }
            Duid::Hdu => {
                let bytes = pack_bits(&body);
                match p25_hdu_rs24_16().decode(&bytes, &[]) {
                    Some((data, _errors)) => FramePayload::LinkSetup {
                        call_id: None,
                        source: None,
                        destination: None,
                        group_call: data[0] & 0x80 == 0,
                        encrypted: data[0] & 0x01 != 0,
                    },
                    None => FramePayload::LinkSetup { call_id: None, source: None, destination: None, group_call: true, encrypted: false },
                }
            }
            Duid::Ldu1 | Duid::Ldu2 => {
                let codec_frames = body.chunks(88).map(pack_bits).collect();
                FramePayload::Voice { codec_frames }
            }
            Duid::Tdulc => {
                let bytes = pack_bits(&body);
                // "do not force a CC return even if LCW decoding fails" -- the
                // framer just reports an empty link-control word; the
                // trunking layer decides what to do with it.
                let fields = match p25_lcw_rs24_12().decode(&bytes, &[]) {
                    Some((data, _errors)) => vec![("lcw_opcode", data.first().copied().unwrap_or(0) as u64)],
                    None => vec![],
                };
                FramePayload::LinkControl { fields }
            }
            Duid::Tsbk => {
                let bytes = pack_bits(&body);
                FramePayload::TrunkingControl { opcode: bytes[0] as u16, payload_bits: body.clone() }
            }
            Duid::Mbt => {
                let bytes = pack_bits(&body);
                FramePayload::TrunkingControl { opcode: bytes[0] as u16, payload_bits: body.clone() }
            }
            Duid::Pdu => {
                let bytes = pack_bits(&body);
                FramePayload::Data { service_access_point: bytes.first().copied().unwrap_or(0), blocks: vec![bytes] }
            }
            Duid::Unknown(_) => FramePayload::TrunkingControl { opcode: 0, payload_bits: body },
        };

        Some(Frame::new(Protocol::P25Phase1, Slot::Single, 0.0, FecStats::default(), payload))
    }
}

impl Framer for P25P1Framer {
    fn process_bits(&mut self, bits: &[u8], reliability: &[u8]) -> Option<Frame> {
        self.feed(bits, reliability);
        match self.state {
            State::AwaitingNid => {
                if self.data_bits.len() < Self::NID_BITS {
                    return None;
                }
                let nid_bits: Vec<u8> = self.data_bits.drain(..Self::NID_BITS).collect();
                let drain_rel = Self::NID_BITS.min(self.data_reliability.len());
                self.data_reliability.drain(..drain_rel);
                let (info, _errors) = bch63_16_decode(&nid_bits)?;
                let info_value = bitstream_to_int(&info);
                let nac = (info_value >> 4) as u16;
                let duid = Duid::from_nibble((info_value & 0xF) as u8);
                self.nac = Some(nac);
                self.state = State::Body(duid);
                self.try_decode_body(duid)
            }
            State::Body(duid) => self.try_decode_body(duid),
        }
    }

    fn protocol(&self) -> Protocol {
        Protocol::P25Phase1
    }

    fn reset(&mut self) {
        self.state = State::AwaitingNid;
        self.data_bits.clear();
        self.data_reliability.clear();
        self.bits_since_status = 0;
        self.pending_status_bits = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::iden::{ChannelType, IdenEntry};

    fn iden_table_with_851() -> IdenTable {
        let mut table = IdenTable::new();
        table.insert(1, IdenEntry { base_frequency_units: 851_000_000 / 5, spacing_units: 100, tdma: false, channel_type: ChannelType::Fdma });
        table
    }

    fn mbt_block_s1() -> Vec<u8> {
        let mut block = vec![0u8; 48];
        let given = [0x17, 0x00, 0x01, 0x01, 0x23, 0x02, 0x3B, 0x00, 0x00, 0x00, 0x00, 0x00, 0xAB, 0xCD, 0xE0, 0x10, 0x0A];
        block[..given.len()].copy_from_slice(&given);
        block
    }

    // S1: P25P1 MBT Network-Status decode.
    #[test]
    fn s1_mbt_network_status_decode() {
        let block = mbt_block_s1();
        let body = decode_mbt(&block);
        match &body {
            MbtBody::NetworkStatus { wacn, sysid, .. } => {
                assert_eq!(*wacn, 0xABCDE);
                assert_eq!(*sysid, 0x123);
            }
            other => panic!("expected NetworkStatus, got {other:?}"),
        }
        let iden_table = iden_table_with_851();
        let freqs = resolve_mbt_frequencies(&body, &iden_table);
        assert_eq!(freqs, vec![851_125_000]);
    }

    // S2: P25P1 MBT RFSS-Status neighbour update.
    #[test]
    fn s2_mbt_rfss_status_neighbour_update() {
        let mut block = vec![0u8; 48];
        block[0] = OPCODE_RFSS_STATUS;
        let chan_t = 0x1001u16.to_be_bytes();
        let chan_r = 0x1002u16.to_be_bytes();
        block[7..9].copy_from_slice(&chan_t);
        block[9..11].copy_from_slice(&chan_r);

        let body = decode_mbt(&block);
        let iden_table = iden_table_with_851();
        let freqs = resolve_mbt_frequencies(&body, &iden_table);
        assert_eq!(freqs, vec![851_012_500, 851_025_000]);
    }

    #[test]
    fn tdu_resets_nac() {
        let mut framer = P25P1Framer::new(IdenTable::new());
        framer.nac = Some(0xABC);
        framer.state = State::Body(Duid::Tdu);
        let frame = framer.try_decode_body(Duid::Tdu).expect("TDU body is zero-length");
        assert!(matches!(frame.payload, FramePayload::LinkControl { .. }));
        assert!(framer.nac().is_none());
    }

    #[test]
    fn status_dibit_is_stripped_and_counted() {
        let mut framer = P25P1Framer::new(IdenTable::new());
        let data_run: Vec<u8> = (0..P25P1Framer::STATUS_PERIOD_BITS).map(|i| (i % 2) as u8).collect();
        let status_dibit = vec![1u8, 0u8];
        let mut bits = data_run.clone();
        bits.extend(status_dibit);
        let reliability = vec![255u8; bits.len()];
        framer.feed(&bits, &reliability);
        assert_eq!(framer.status_dibits_seen(), 1);
        assert_eq!(framer.data_bits.len(), data_run.len());
    }
}
