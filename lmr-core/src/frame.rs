//! The decoded-frame type shared by every protocol framer (§3, §6).
//!
//! A `Framer` implementation never emits raw bits to callers; it emits a
//! `Frame`, tagged with the protocol that produced it and carrying whatever
//! per-frame FEC bookkeeping the trunking layer or CLI wants to report.

use crate::protocols::Protocol;

/// Which logical slot a frame belongs to. Single-slot protocols (P25 Phase 1,
/// D-STAR, YSF, NXDN conventional, M17) always report `Slot::Single`; TDMA
/// protocols (P25 Phase 2, DMR) report the physical slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Single,
    Tdma(u8),
}

/// Bookkeeping a framer attaches to every frame it emits, regardless of
/// protocol, so the CLI/metrics layer has one place to look for FEC health.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FecStats {
    pub bits_corrected: u32,
    pub crc_ok: bool,
}

/// The payload carried by a decoded frame. Variants map to the four frame
/// families named in §3: voice, trunking/link control, link setup, and data.
#[derive(Debug, Clone, PartialEq)]
pub enum FramePayload {
    /// Digital-voice codec frames extracted from a voice burst/LDU, opaque
    /// to this crate (the vocoder is an external collaborator per the
    /// non-goals).
    Voice { codec_frames: Vec<Vec<u8>> },
    /// A trunking control message (P25 TSBK/MBT, DMR CSBK, ...).
    TrunkingControl { opcode: u16, payload_bits: Vec<u8> },
    /// An embedded or explicit link-control word carried alongside voice.
    LinkControl { fields: Vec<(&'static str, u64)> },
    /// A call/link setup announcement (HDU, DMR voice-header LC, D-STAR
    /// header, M17 LSF).
    LinkSetup { call_id: Option<u32>, source: Option<u32>, destination: Option<u32>, group_call: bool, encrypted: bool },
    /// A data packet burst (PDU, confirmed/unconfirmed data blocks).
    Data { service_access_point: u8, blocks: Vec<Vec<u8>> },
}

/// A fully decoded frame, tagged with its protocol, slot, and FEC outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub protocol: Protocol,
    pub slot: Slot,
    pub timestamp_monotonic_s: f64,
    pub fec: FecStats,
    pub payload: FramePayload,
}

impl Frame {
    pub fn new(protocol: Protocol, slot: Slot, timestamp_monotonic_s: f64, fec: FecStats, payload: FramePayload) -> Self {
        Self { protocol, slot, timestamp_monotonic_s, fec, payload }
    }

    pub fn is_voice(&self) -> bool {
        matches!(self.payload, FramePayload::Voice { .. })
    }

    pub fn is_trunking_control(&self) -> bool {
        matches!(self.payload, FramePayload::TrunkingControl { .. })
    }
}
