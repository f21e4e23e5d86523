//! Configuration types for the decoder runtime.
//!
//! `RuntimeConfig` is built once per run from a config file (loading and
//! parsing it is left to the CLI layer) and held behind an atomic-swap cell
//! (`crate::concurrency::RuntimeSnapshot`) so the control thread can publish
//! a changed copy without the DSP thread ever taking a lock.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Modulation {
    #[default]
    Cqpsk,
    C4fm,
    Gfsk,
    Fsk4,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RrcConfig {
    pub rolloff: f64,
    pub span_symbols: usize,
    pub samples_per_symbol: usize,
}

impl Default for RrcConfig {
    fn default() -> Self {
        Self { rolloff: 0.2, span_symbols: 9, samples_per_symbol: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GardnerConfig {
    pub loop_gain: f64,
    pub damping: f64,
}

impl Default for GardnerConfig {
    fn default() -> Self {
        Self { loop_gain: 0.02, damping: 1.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostasConfig {
    pub loop_bandwidth_hz: f64,
    pub damping: f64,
    pub order: u8,
}

impl Default for CostasConfig {
    fn default() -> Self {
        Self { loop_bandwidth_hz: 50.0, damping: 0.707, order: 4 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FllConfig {
    pub loop_bandwidth_hz: f64,
    pub deadband_hz: f64,
}

impl Default for FllConfig {
    fn default() -> Self {
        Self { loop_bandwidth_hz: 200.0, deadband_hz: 5.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgcConfig {
    pub target_amplitude: f64,
    pub attack: f64,
    pub decay: f64,
}

impl Default for AgcConfig {
    fn default() -> Self {
        Self { target_amplitude: 1.0, attack: 0.01, decay: 0.001 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EqualizerConfig {
    pub enabled: bool,
    pub taps: usize,
    pub step_size: f64,
    pub use_cma_warmup: bool,
}

impl Default for EqualizerConfig {
    fn default() -> Self {
        Self { enabled: true, taps: 7, step_size: 0.01, use_cma_warmup: true }
    }
}

/// DSP-stage tunables, one struct per pipeline stage (§4.1).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DspConfig {
    pub input_sample_rate_hz: f64,
    pub decimation: usize,
    pub modulation: Modulation,
    pub symbol_rate: usize,
    pub rrc: RrcConfig,
    pub gardner: GardnerConfig,
    pub costas: CostasConfig,
    pub fll: FllConfig,
    pub agc: AgcConfig,
    pub equalizer: EqualizerConfig,
    pub dc_block_pole: f64,
}

impl DspConfig {
    pub fn p25_phase1() -> Self {
        Self {
            input_sample_rate_hz: 48_000.0,
            decimation: 1,
            modulation: Modulation::C4fm,
            symbol_rate: 4800,
            dc_block_pole: 0.999,
            ..Self::default_filled()
        }
    }

    pub fn dmr() -> Self {
        Self {
            input_sample_rate_hz: 48_000.0,
            decimation: 1,
            modulation: Modulation::Fsk4,
            symbol_rate: 4800,
            dc_block_pole: 0.999,
            ..Self::default_filled()
        }
    }

    fn default_filled() -> Self {
        Self {
            input_sample_rate_hz: 48_000.0,
            decimation: 1,
            modulation: Modulation::default(),
            symbol_rate: 4800,
            rrc: RrcConfig::default(),
            gardner: GardnerConfig::default(),
            costas: CostasConfig::default(),
            fll: FllConfig::default(),
            agc: AgcConfig::default(),
            equalizer: EqualizerConfig::default(),
            dc_block_pole: 0.999,
        }
    }
}

/// Trunking-control-channel timers and thresholds (§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrunkConfig {
    pub hangtime_s: f64,
    pub grant_timeout_s: f64,
    pub candidate_cooldown_s: f64,
    pub neighbour_sweep_interval_s: f64,
    pub mac_hold_timeout_s: f64,
    pub allow_encrypted: bool,
    pub max_neighbours: usize,
    /// §4.5 `vc_grace_s`: grace period after tuning a voice channel before
    /// the hangtime/MAC gates start being evaluated.
    pub vc_grace_s: f64,
    /// §4.5 `min_follow_dwell_s`: minimum time to stay tuned to a voice
    /// channel before a release is considered, even if gates are satisfied.
    pub min_follow_dwell_s: f64,
    /// §4.5 `grant_voice_timeout_s`: if no voice activity is observed this
    /// long after a grant, treat it as abandoned and return to the CC.
    pub grant_voice_timeout_s: f64,
    /// §4.5 `retune_backoff_s`: suppresses a repeat grant for the same
    /// frequency shortly after a return to the CC.
    pub retune_backoff_s: f64,
    /// §4.5 `eval_s`: how long a HUNTING candidate is given to show a CC
    /// sync before it is cooled down and the next candidate tried.
    pub eval_s: f64,
    /// Basic mode releases immediately after hangtime, skipping the
    /// post-hang MAC-activity gate (§4.5, §9 Open Questions).
    pub basic_mode: bool,
}

impl Default for TrunkConfig {
    fn default() -> Self {
        Self {
            hangtime_s: 1.0,
            grant_timeout_s: 3.0,
            candidate_cooldown_s: 10.0,
            neighbour_sweep_interval_s: 20.0,
            mac_hold_timeout_s: 4.0,
            allow_encrypted: false,
            max_neighbours: 16,
            vc_grace_s: 1.5,
            min_follow_dwell_s: 0.7,
            grant_voice_timeout_s: 2.0,
            retune_backoff_s: 3.0,
            eval_s: 5.0,
            basic_mode: false,
        }
    }
}

/// Per-protocol enable switches (§2 "protocols covered").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolToggles {
    pub p25_phase1: bool,
    pub p25_phase2: bool,
    pub dmr: bool,
    pub nxdn: bool,
    pub dstar: bool,
    pub ysf: bool,
    pub dpmr: bool,
    pub m17: bool,
    pub edacs: bool,
    pub provoice: bool,
    /// When set, restricts decoding to conventional (non-trunked) framing
    /// even for protocols that support trunking (exposed per the Open
    /// Questions resolution recorded in DESIGN.md).
    pub basic_mode: bool,
}

impl Default for ProtocolToggles {
    fn default() -> Self {
        Self {
            p25_phase1: true,
            p25_phase2: true,
            dmr: true,
            nxdn: true,
            dstar: true,
            ysf: true,
            dpmr: true,
            m17: true,
            edacs: true,
            provoice: true,
            basic_mode: false,
        }
    }
}

/// One row of a P25 channel-identifier table (§6, IDEN_UP/IDEN_UP_VU).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IdenEntry {
    pub base_frequency_hz: u64,
    pub channel_spacing_hz: u32,
    pub transmit_offset_hz: i64,
    pub tdma: bool,
    pub slots_per_carrier: u8,
}

impl IdenEntry {
    /// Converts a human-authored (Hz-based) config row into the wire-exact
    /// 5 Hz/125 Hz unit representation `protocols::iden::IdenTable` needs.
    /// Transmit offset is FDMA repeater-only bookkeeping the trunking layer
    /// doesn't currently consume, so it is dropped here rather than carried
    /// through (channel resolution only ever needs the receive frequency).
    pub fn to_wire(self) -> crate::protocols::iden::IdenEntry {
        crate::protocols::iden::IdenEntry {
            base_frequency_units: (self.base_frequency_hz / 5) as u32,
            spacing_units: (self.channel_spacing_hz / 125) as u16,
            tdma: self.tdma,
            channel_type: if self.tdma {
                crate::protocols::iden::ChannelType::Tdma
            } else {
                crate::protocols::iden::ChannelType::Fdma
            },
        }
    }
}

/// Root configuration tree, serialized/deserialized wholesale and held behind
/// an atomic-swap snapshot cell (`RuntimeConfig` in §3's "(ADDED)" section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub dsp: DspConfig,
    pub trunk: TrunkConfig,
    pub protocols: ProtocolToggles,
    #[serde(default)]
    pub iden_tables: HashMap<u8, IdenEntry>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            dsp: DspConfig::default_filled(),
            trunk: TrunkConfig::default(),
            protocols: ProtocolToggles::default(),
            iden_tables: HashMap::new(),
        }
    }
}

impl RuntimeConfig {
    /// Builds the wire-exact `IdenTable` the P25 framer and trunking state
    /// machine consume, from this config's Hz-based rows.
    pub fn iden_table(&self) -> crate::protocols::iden::IdenTable {
        let mut table = crate::protocols::iden::IdenTable::new();
        for (&id, entry) in &self.iden_tables {
            table.insert(id, entry.to_wire());
        }
        table
    }
}
