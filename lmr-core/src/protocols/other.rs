//! Skeleton framers for the protocol families §4.4's closing note scopes
//! out of full bit-layout decode: NXDN, YSF, dPMR, M17, EDACS/ProVoice.
//! Each shares the same `Framer` contract as the fully-decoded families and
//! recognises its own sync, but only builds a typed frame shell -- precise
//! bit layouts for these are protocol documents, out of scope here beyond
//! the sync table in `crate::sync::registry`.

use crate::frame::{FecStats, Frame, FramePayload, Slot};
use crate::protocols::{Framer, Protocol};

/// Shared body for a skeleton framer: accumulate a fixed-size span, emit one
/// frame shell per span, reset clears the accumulator. Real per-protocol
/// framers use this as the general path for the families they do not decode
/// any further than "a frame of this protocol occurred here."
struct SkeletonFramer {
    protocol: Protocol,
    frame_bits: usize,
    bits: Vec<u8>,
}

impl SkeletonFramer {
    fn new(protocol: Protocol, frame_bits: usize) -> Self {
        Self { protocol, frame_bits, bits: Vec::new() }
    }

    fn process_bits(&mut self, bits: &[u8], _reliability: &[u8]) -> Option<Frame> {
        self.bits.extend_from_slice(bits);
        if self.bits.len() < self.frame_bits {
            return None;
        }
        let span: Vec<u8> = self.bits.drain(..self.frame_bits).collect();
        Some(Frame::new(
            self.protocol,
            Slot::Single,
            0.0,
            FecStats { bits_corrected: 0, crc_ok: true },
            FramePayload::LinkControl { fields: vec![("raw_bits", span.len() as u64)] },
        ))
    }

    fn reset(&mut self) {
        self.bits.clear();
    }
}

macro_rules! skeleton_framer {
    ($name:ident, $protocol:expr, $frame_bits:expr) => {
        pub struct $name(SkeletonFramer);

        impl $name {
            pub fn new() -> Self {
                Self(SkeletonFramer::new($protocol, $frame_bits))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Framer for $name {
            fn process_bits(&mut self, bits: &[u8], reliability: &[u8]) -> Option<Frame> {
                self.0.process_bits(bits, reliability)
            }

            fn protocol(&self) -> Protocol {
                $protocol
            }

            fn reset(&mut self) {
                self.0.reset()
            }
        }
    };
}

// Frame sizes below are this crate's own fixed framing for the skeleton
// path, not a claim of bit-exact protocol-document layouts (per §4.4's
// closing note).
skeleton_framer!(NxdnFramer, Protocol::Nxdn, 320);
skeleton_framer!(YsfFramer, Protocol::Ysf, 1920);
skeleton_framer!(DpmrFramer, Protocol::Dpmr, 216);
skeleton_framer!(M17Framer, Protocol::M17, 384);
skeleton_framer!(EdacsFramer, Protocol::Edacs, 96);
skeleton_framer!(ProVoiceFramer, Protocol::ProVoice, 184);
