//! The sync-type registry (§3 "Sync identity", §6 table): ~40 named sync
//! patterns, each tagged with protocol family and polarity, plus the
//! bidirectional family <-> sync-type map §3 calls for.

use crate::protocols::Protocol;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Inverted,
}

/// A named sync pattern from §6's registry. IDs are wire-visible through
/// logs/state dumps and must not be renumbered once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncId {
    P25P1Plus,
    P25P1Minus,
    X2TdmaDataPlus,
    X2TdmaDataMinus,
    X2TdmaVoicePlus,
    X2TdmaVoiceMinus,
    DStarVoicePlus,
    DStarVoiceMinus,
    DStarHeaderPlus,
    DStarHeaderMinus,
    M17StreamPlus,
    M17StreamMinus,
    M17LsfPlus,
    M17LsfMinus,
    M17PacketPlus,
    M17PacketMinus,
    M17PreamblePlus,
    M17PreambleMinus,
    DmrBsPlus,
    DmrBsMinus,
    DmrMsPlus,
    DmrMsMinus,
    DmrRcPlus,
    DmrRcMinus,
    ProVoicePlus,
    ProVoiceMinus,
    EdacsPlus,
    EdacsMinus,
    DpmrFs1Plus,
    DpmrFs1Minus,
    DpmrFs2Plus,
    DpmrFs2Minus,
    DpmrFs3Plus,
    DpmrFs3Minus,
    DpmrFs4Plus,
    DpmrFs4Minus,
    NxdnPlus,
    NxdnMinus,
    YsfPlus,
    YsfMinus,
    P25P2Plus,
    P25P2Minus,
    AnalogGeneric,
    DigitalGeneric,
    None,
}

impl SyncId {
    /// The "ID" column of §6's table, stable and wire-visible.
    pub fn numeric_id(self) -> i32 {
        use SyncId::*;
        match self {
            P25P1Plus => 0,
            P25P1Minus => 1,
            X2TdmaDataPlus => 2,
            X2TdmaDataMinus => 3,
            X2TdmaVoicePlus => 4,
            X2TdmaVoiceMinus => 5,
            DStarVoicePlus => 6,
            DStarVoiceMinus => 7,
            M17StreamPlus => 8,
            M17StreamMinus => 9,
            DmrBsPlus => 10,
            DmrBsMinus => 11,
            DmrMsPlus => 12,
            DmrMsMinus => 13,
            ProVoicePlus => 14,
            ProVoiceMinus => 15,
            M17LsfPlus => 16,
            M17LsfMinus => 17,
            DStarHeaderPlus => 18,
            DStarHeaderMinus => 19,
            DpmrFs1Plus => 20,
            DpmrFs1Minus => 21,
            DpmrFs2Plus => 22,
            DpmrFs2Minus => 23,
            DpmrFs3Plus => 24,
            DpmrFs3Minus => 25,
            DpmrFs4Plus => 26,
            DpmrFs4Minus => 27,
            NxdnPlus => 28,
            NxdnMinus => 29,
            YsfPlus => 30,
            YsfMinus => 31,
            DmrRcPlus => 32,
            DmrRcMinus => 33,
            P25P2Plus => 35,
            P25P2Minus => 36,
            EdacsPlus => 37,
            EdacsMinus => 38,
            AnalogGeneric => 39,
            DigitalGeneric => 40,
            None => -1,
            M17PacketPlus => 86,
            M17PacketMinus => 87,
            M17PreamblePlus => 98,
            M17PreambleMinus => 99,
        }
    }

    pub fn polarity(self) -> Polarity {
        use SyncId::*;
        match self {
            P25P1Minus | X2TdmaDataMinus | X2TdmaVoiceMinus | DStarVoiceMinus | DStarHeaderMinus | M17StreamMinus
            | M17LsfMinus | M17PacketMinus | M17PreambleMinus | DmrBsMinus | DmrMsMinus | DmrRcMinus | ProVoiceMinus
            | EdacsMinus | DpmrFs1Minus | DpmrFs2Minus | DpmrFs3Minus | DpmrFs4Minus | NxdnMinus | YsfMinus
            | P25P2Minus => Polarity::Inverted,
            _ => Polarity::Positive,
        }
    }

    pub fn family(self) -> Option<Protocol> {
        use SyncId::*;
        match self {
            P25P1Plus | P25P1Minus => Some(Protocol::P25Phase1),
            P25P2Plus | P25P2Minus => Some(Protocol::P25Phase2),
            DmrBsPlus | DmrBsMinus | DmrMsPlus | DmrMsMinus | DmrRcPlus | DmrRcMinus | X2TdmaDataPlus
            | X2TdmaDataMinus | X2TdmaVoicePlus | X2TdmaVoiceMinus => Some(Protocol::Dmr),
            DStarVoicePlus | DStarVoiceMinus | DStarHeaderPlus | DStarHeaderMinus => Some(Protocol::DStar),
            M17StreamPlus | M17StreamMinus | M17LsfPlus | M17LsfMinus | M17PacketPlus | M17PacketMinus
            | M17PreamblePlus | M17PreambleMinus => Some(Protocol::M17),
            NxdnPlus | NxdnMinus => Some(Protocol::Nxdn),
            YsfPlus | YsfMinus => Some(Protocol::Ysf),
            DpmrFs1Plus | DpmrFs1Minus | DpmrFs2Plus | DpmrFs2Minus | DpmrFs3Plus | DpmrFs3Minus | DpmrFs4Plus
            | DpmrFs4Minus => Some(Protocol::Dpmr),
            ProVoicePlus | ProVoiceMinus | EdacsPlus | EdacsMinus => Some(Protocol::Edacs),
            AnalogGeneric | DigitalGeneric | None => Option::None,
        }
    }

    /// The ideal symbol vector for correlation: DMR outer-only syncs use
    /// only `{+3,-3}`; patterns with intermediate levels (P25P2, CQPSK
    /// generally) include `{+1,-1}` too. Bit pairs are read MSB-first from
    /// each sync's canonical hex/dibit representation.
    pub fn ideal_levels(self, canonical_dibits: &[u8]) -> Vec<i8> {
        let outer_only = matches!(self, SyncId::DmrBsPlus | SyncId::DmrBsMinus | SyncId::DmrMsPlus | SyncId::DmrMsMinus);
        canonical_dibits
            .iter()
            .map(|&d| {
                let level = match d & 0b11 {
                    0b01 => 1,
                    0b00 => 3,
                    0b10 => -1,
                    0b11 => -3,
                    _ => unreachable!(),
                };
                if outer_only {
                    if level >= 0 { 3 } else { -3 }
                } else {
                    level
                }
            })
            .collect()
    }
}

/// Bidirectional protocol-family <-> sync-type-list map (§3).
pub struct SyncRegistry {
    by_family: HashMap<Protocol, Vec<SyncId>>,
}

impl SyncRegistry {
    pub fn new() -> Self {
        let mut by_family: HashMap<Protocol, Vec<SyncId>> = HashMap::new();
        for id in Self::all() {
            if let Some(family) = id.family() {
                by_family.entry(family).or_default().push(id);
            }
        }
        Self { by_family }
    }

    pub fn syncs_for(&self, family: Protocol) -> &[SyncId] {
        self.by_family.get(&family).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn all() -> Vec<SyncId> {
        use SyncId::*;
        vec![
            P25P1Plus, P25P1Minus, X2TdmaDataPlus, X2TdmaDataMinus, X2TdmaVoicePlus, X2TdmaVoiceMinus,
            DStarVoicePlus, DStarVoiceMinus, DStarHeaderPlus, DStarHeaderMinus, M17StreamPlus, M17StreamMinus,
            M17LsfPlus, M17LsfMinus, M17PacketPlus, M17PacketMinus, M17PreamblePlus, M17PreambleMinus, DmrBsPlus,
            DmrBsMinus, DmrMsPlus, DmrMsMinus, DmrRcPlus, DmrRcMinus, ProVoicePlus, ProVoiceMinus, EdacsPlus,
            EdacsMinus, DpmrFs1Plus, DpmrFs1Minus, DpmrFs2Plus, DpmrFs2Minus, DpmrFs3Plus, DpmrFs3Minus,
            DpmrFs4Plus, DpmrFs4Minus, NxdnPlus, NxdnMinus, YsfPlus, YsfMinus, P25P2Plus, P25P2Minus,
            AnalogGeneric, DigitalGeneric, None,
        ]
    }
}

impl Default for SyncRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_sync_with_a_family_appears_in_the_family_map() {
        let registry = SyncRegistry::new();
        for id in SyncId::all() {
            if let Some(family) = id.family() {
                assert!(registry.syncs_for(family).contains(&id));
            }
        }
    }

    #[test]
    fn p25_ids_match_the_wire_visible_table() {
        assert_eq!(SyncId::P25P1Plus.numeric_id(), 0);
        assert_eq!(SyncId::P25P1Minus.numeric_id(), 1);
        assert_eq!(SyncId::P25P2Plus.numeric_id(), 35);
        assert_eq!(SyncId::P25P2Minus.numeric_id(), 36);
        assert_eq!(SyncId::None.numeric_id(), -1);
    }

    #[test]
    fn outer_only_dmr_sync_never_reports_inner_levels() {
        let dibits = [0b01, 0b10, 0b00, 0b11];
        let levels = SyncId::DmrBsPlus.ideal_levels(&dibits);
        assert!(levels.iter().all(|&l| l == 3 || l == -3));
    }
}
