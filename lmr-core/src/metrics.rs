//! Lock-free counters and snapshots shared across threads (§5, §7).
//!
//! `Counters` backs the `fec_ok`/`fec_err`/`fec_corr`/`udp_in_*` counters
//! §7 requires to be queryable via a metrics snapshot. `DspMetrics` backs
//! the DSP pipeline's `snapshot_metrics()` contract from §4.1 -- written by
//! the DSP thread, read by the control thread/CLI without locking.

use atomic_float::AtomicF64;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// FEC layer identifiers used to key the per-layer counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FecLayer {
    P25HexHamming,
    P25Golay23_12,
    P25Golay24_6,
    P25Nid,
    P25HduRs,
    P25LcwRs,
    P25P2Rs63_35,
    DmrRs12_9,
    DmrBptc,
    DmrSlco,
    DmrViterbiK5,
    DmrTrellis34,
    DStarViterbiK3,
    Mbf34,
}

impl FecLayer {
    pub const ALL: [FecLayer; 14] = [
        FecLayer::P25HexHamming,
        FecLayer::P25Golay23_12,
        FecLayer::P25Golay24_6,
        FecLayer::P25Nid,
        FecLayer::P25HduRs,
        FecLayer::P25LcwRs,
        FecLayer::P25P2Rs63_35,
        FecLayer::DmrRs12_9,
        FecLayer::DmrBptc,
        FecLayer::DmrSlco,
        FecLayer::DmrViterbiK5,
        FecLayer::DmrTrellis34,
        FecLayer::DStarViterbiK3,
        FecLayer::Mbf34,
    ];

    fn index(self) -> usize {
        Self::ALL.iter().position(|l| *l == self).expect("FecLayer::ALL is exhaustive")
    }
}

/// One counter triple per FEC layer, plus the UDP ingress counters from §7.
pub struct Counters {
    fec_ok: [AtomicU64; FecLayer::ALL.len()],
    fec_err: [AtomicU64; FecLayer::ALL.len()],
    fec_corr: [AtomicU64; FecLayer::ALL.len()],
    pub udp_in_packets: AtomicU64,
    pub udp_in_bytes: AtomicU64,
    pub udp_in_drops: AtomicU64,
    pub iq_blocks_dropped: AtomicU64,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            fec_ok: Default::default(),
            fec_err: Default::default(),
            fec_corr: Default::default(),
            udp_in_packets: AtomicU64::new(0),
            udp_in_bytes: AtomicU64::new(0),
            udp_in_drops: AtomicU64::new(0),
            iq_blocks_dropped: AtomicU64::new(0),
        }
    }
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful decode with `corrected` bits/symbols fixed along
    /// the way (0 for a clean codeword).
    pub fn record_ok(&self, layer: FecLayer, corrected: u64) {
        self.fec_ok[layer.index()].fetch_add(1, Ordering::Relaxed);
        if corrected > 0 {
            self.fec_corr[layer.index()].fetch_add(corrected, Ordering::Relaxed);
        }
    }

    pub fn record_err(&self, layer: FecLayer) {
        self.fec_err[layer.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn fec_ok(&self, layer: FecLayer) -> u64 {
        self.fec_ok[layer.index()].load(Ordering::Relaxed)
    }

    pub fn fec_err(&self, layer: FecLayer) -> u64 {
        self.fec_err[layer.index()].load(Ordering::Relaxed)
    }

    pub fn fec_corr(&self, layer: FecLayer) -> u64 {
        self.fec_corr[layer.index()].load(Ordering::Relaxed)
    }
}

/// Carrier-lock state machine states (§4.1, "State machine: carrier lock").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarrierLockState {
    Acquire,
    Track,
    Loss,
}

/// A lock-free snapshot of the DSP pipeline's running metrics. Fields are
/// stored as atomics so the control thread / CLI can read them without a
/// lock while the DSP thread updates them every block.
pub struct DspMetrics {
    cfo_hz: AtomicF64,
    residual_cfo_hz: AtomicF64,
    snr_db: AtomicF64,
    ted_bias_q20: AtomicF64,
    costas_err_q14: AtomicF64,
    nco_q15: AtomicF64,
    carrier_locked: AtomicBool,
}

impl Default for DspMetrics {
    fn default() -> Self {
        Self {
            cfo_hz: AtomicF64::new(0.0),
            residual_cfo_hz: AtomicF64::new(0.0),
            snr_db: AtomicF64::new(0.0),
            ted_bias_q20: AtomicF64::new(0.0),
            costas_err_q14: AtomicF64::new(0.0),
            nco_q15: AtomicF64::new(0.0),
            carrier_locked: AtomicBool::new(false),
        }
    }
}

/// Plain-value rendering of [`DspMetrics`] for a single point-in-time read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsSnapshot {
    pub cfo_hz: f64,
    pub residual_cfo_hz: f64,
    pub snr_db: f64,
    pub ted_bias_q20: f64,
    pub carrier_locked: bool,
    pub costas_err_q14: f64,
    pub nco_q15: f64,
}

impl DspMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cfo_hz(&self, v: f64) {
        self.cfo_hz.store(v, Ordering::Relaxed);
    }
    pub fn set_residual_cfo_hz(&self, v: f64) {
        self.residual_cfo_hz.store(v, Ordering::Relaxed);
    }
    pub fn set_snr_db(&self, v: f64) {
        self.snr_db.store(v, Ordering::Relaxed);
    }
    pub fn set_ted_bias_q20(&self, v: f64) {
        self.ted_bias_q20.store(v, Ordering::Relaxed);
    }
    pub fn set_costas_err_q14(&self, v: f64) {
        self.costas_err_q14.store(v, Ordering::Relaxed);
    }
    pub fn set_nco_q15(&self, v: f64) {
        self.nco_q15.store(v, Ordering::Relaxed);
    }
    pub fn set_carrier_locked(&self, v: bool) {
        self.carrier_locked.store(v, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cfo_hz: self.cfo_hz.load(Ordering::Relaxed),
            residual_cfo_hz: self.residual_cfo_hz.load(Ordering::Relaxed),
            snr_db: self.snr_db.load(Ordering::Relaxed),
            ted_bias_q20: self.ted_bias_q20.load(Ordering::Relaxed),
            carrier_locked: self.carrier_locked.load(Ordering::Relaxed),
            costas_err_q14: self.costas_err_q14.load(Ordering::Relaxed),
            nco_q15: self.nco_q15.load(Ordering::Relaxed),
        }
    }
}
