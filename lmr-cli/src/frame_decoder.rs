//! Frame decoder: renders a decoded [`lmr_core::frame::Frame`] into a hex
//! dump and a short human-readable summary for structured logging.

use crate::logging::{DecodedFrame, FrameDecodeEvent, FrameHexDump};
use chrono::Utc;
use lmr_core::frame::{Frame, FramePayload, Slot};
use lmr_core::utils::pack_bits;

/// Stateless frame-to-log-event renderer.
#[derive(Debug, Default)]
pub struct FrameDecoder;

impl FrameDecoder {
    pub fn new() -> Self {
        Self
    }

    pub fn decode_frame(&self, frame_index: usize, frame: &Frame) -> FrameDecodeEvent {
        let payload_hex = match &frame.payload {
            FramePayload::Voice { codec_frames } => codec_frames.iter().map(|b| bits_to_hex_bytes(b)).collect::<Vec<_>>().join(" "),
            FramePayload::TrunkingControl { payload_bits, .. } => bits_to_hex(payload_bits),
            FramePayload::LinkControl { fields } => fields.iter().map(|(name, v)| format!("{name}={v:#x}")).collect::<Vec<_>>().join(" "),
            FramePayload::LinkSetup { .. } => String::new(),
            FramePayload::Data { blocks, .. } => blocks.iter().map(|b| bits_to_hex_bytes(b)).collect::<Vec<_>>().join(" "),
        };

        let hex_dump = FrameHexDump {
            protocol: frame.protocol.name().to_string(),
            slot: format_slot(frame.slot),
            bits_corrected: frame.fec.bits_corrected,
            crc_ok: frame.fec.crc_ok,
            payload_hex: format_hex_field(&payload_hex.replace(' ', "")),
        };

        let (kind, summary) = match &frame.payload {
            FramePayload::Voice { codec_frames } => ("voice".to_string(), format!("{} codec frame(s)", codec_frames.len())),
            FramePayload::TrunkingControl { opcode, payload_bits } => {
                ("trunking_control".to_string(), format!("opcode=0x{opcode:02X} ({} bits)", payload_bits.len()))
            }
            FramePayload::LinkControl { fields } => {
                ("link_control".to_string(), if fields.is_empty() { "(empty)".to_string() } else { format!("{} field(s)", fields.len()) })
            }
            FramePayload::LinkSetup { call_id, source, destination, group_call, encrypted } => (
                "link_setup".to_string(),
                format!(
                    "call_id={} source={} dest={} group={} encrypted={}",
                    call_id.map(|v| v.to_string()).unwrap_or_else(|| "?".into()),
                    source.map(|v| v.to_string()).unwrap_or_else(|| "?".into()),
                    destination.map(|v| v.to_string()).unwrap_or_else(|| "?".into()),
                    group_call,
                    encrypted
                ),
            ),
            FramePayload::Data { service_access_point, blocks } => {
                ("data".to_string(), format!("sap=0x{service_access_point:02X} {} block(s)", blocks.len()))
            }
        };

        FrameDecodeEvent { timestamp: Utc::now(), frame_index, hex_dump, decoded: DecodedFrame { kind, summary } }
    }
}

fn format_slot(slot: Slot) -> String {
    match slot {
        Slot::Single => "single".to_string(),
        Slot::Tdma(n) => format!("tdma{n}"),
    }
}

/// Converts an already byte-packed buffer to an uppercase hex string.
fn bits_to_hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

/// Converts a bit array (MSB-first) to an uppercase hex string.
fn bits_to_hex(bits: &[u8]) -> String {
    bits_to_hex_bytes(&pack_bits(bits))
}

/// Formats hex with spaces every 4 characters for readability.
fn format_hex_field(hex: &str) -> String {
    hex.chars().collect::<Vec<_>>().chunks(4).map(|chunk| chunk.iter().collect::<String>()).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lmr_core::frame::FecStats;
    use lmr_core::protocols::Protocol;

    #[test]
    fn bits_to_hex_matches_known_bytes() {
        let bits = vec![1, 0, 1, 0, 0, 1, 0, 1];
        assert_eq!(bits_to_hex(&bits), "A5");
        let bits = vec![1, 1, 1, 1, 0, 0, 0, 0, 1, 0, 1, 0, 1, 0, 1, 0];
        assert_eq!(bits_to_hex(&bits), "F0AA");
    }

    #[test]
    fn format_hex_field_groups_by_four() {
        assert_eq!(format_hex_field("DEADBEEF"), "DEAD BEEF");
        assert_eq!(format_hex_field("A5A5A5A5"), "A5A5 A5A5");
    }

    #[test]
    fn trunking_control_frame_reports_opcode() {
        let decoder = FrameDecoder::new();
        let frame = Frame::new(
            Protocol::P25Phase1,
            Slot::Single,
            0.0,
            FecStats::default(),
            FramePayload::TrunkingControl { opcode: 0x3A, payload_bits: vec![1, 0, 1, 1] },
        );
        let event = decoder.decode_frame(0, &frame);
        assert_eq!(event.decoded.kind, "trunking_control");
        assert!(event.decoded.summary.contains("0x3A"));
        assert_eq!(event.hex_dump.protocol, "P25P1");
    }

    #[test]
    fn voice_frame_reports_codec_frame_count() {
        let decoder = FrameDecoder::new();
        let frame = Frame::new(
            Protocol::Dmr,
            Slot::Tdma(1),
            0.0,
            FecStats { bits_corrected: 2, crc_ok: true },
            FramePayload::Voice { codec_frames: vec![vec![0u8; 9], vec![1u8; 9]] },
        );
        let event = decoder.decode_frame(1, &frame);
        assert_eq!(event.decoded.kind, "voice");
        assert_eq!(event.hex_dump.slot, "tdma1");
        assert!(event.hex_dump.crc_ok);
    }
}
