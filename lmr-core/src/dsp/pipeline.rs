//! The DSP pipeline (§4.1): composes the fifteen stages in fixed,
//! bypassable order and exposes the `init/process/apply_config/reset_*`
//! contract. Mode-selectable (FM/C4FM, CQPSK, pass-through) rather than a
//! single fixed demodulation path.

use crate::config::DspConfig;
use crate::dsp::agc::{self, Agc};
use crate::dsp::blanker::ImpulseBlanker;
use crate::dsp::carrier_lock::{CarrierLockThresholds, CarrierLockTracker};
use crate::dsp::costas::Costas;
use crate::dsp::dc_block::DcBlocker;
use crate::dsp::decimate::{DecimationKind, Decimator};
use crate::dsp::discriminator::{cqpsk_slice, FmDiscriminator};
use crate::dsp::equalizer::{CmaSmoother, CmaStrength, LmsEqualizer};
use crate::dsp::fll::Fll;
use crate::dsp::gardner::GardnerTed;
use crate::dsp::iq_balance::IqBalance;
use crate::dsp::matched_filter::MatchedFilter5;
use crate::dsp::post_demod::PostDemod;
use crate::dsp::rrc::RrcFilter;
use crate::dsp::PipelineMode;
use crate::errors::{ConfigError, DspError};
use crate::metrics::{DspMetrics, MetricsSnapshot};
use crate::symbol::Symbol;
use num_complex::Complex64;
use std::sync::Arc;

/// Runtime-tunable parameters (§4.1 `apply_config`), distinct from the
/// structural `DspConfig` that fixes the cascade at `init` time.
#[derive(Debug, Clone)]
pub struct PipelineRuntimeConfig {
    pub blanker_threshold: f64,
    pub blanker_window: usize,
    pub agc_target_rms: f64,
    pub equalizer_enabled: bool,
}

impl Default for PipelineRuntimeConfig {
    fn default() -> Self {
        Self { blanker_threshold: 4.0, blanker_window: 4, agc_target_rms: 1.0, equalizer_enabled: true }
    }
}

pub struct Pipeline {
    mode: PipelineMode,
    decim: Decimator,
    blanker: ImpulseBlanker,
    dc_block: DcBlocker,
    iq_balance: IqBalance,
    agc: Agc,
    cma: CmaSmoother,
    fll: Fll,
    gardner: GardnerTed,
    costas: Costas,
    matched_filter: MatchedFilter5,
    rrc: Option<RrcFilter>,
    lms: LmsEqualizer,
    fm_disc: FmDiscriminator,
    post_demod: PostDemod,
    carrier_lock: CarrierLockTracker,
    runtime: PipelineRuntimeConfig,
    last_cqpsk_diff: Complex64,
    metrics: Arc<DspMetrics>,
}

impl Pipeline {
    /// `init(mode, in_rate, out_rate, bandwidth)` (§4.1). `bandwidth` feeds
    /// the optional RRC stage's design when `cfg.rrc.span_symbols` is set;
    /// a stage that cannot initialise fails the whole pipeline.
    pub fn init(mode: PipelineMode, cfg: &DspConfig, _bandwidth_hz: f64) -> Result<Self, DspError> {
        if cfg.input_sample_rate_hz <= 0.0 {
            return Err(DspError::FilterDesignFailed { stage: "decimate", reason: "non-positive input sample rate".into() });
        }
        let sps = cfg.rrc.samples_per_symbol.max(1);

        let rrc = if cfg.rrc.span_symbols > 0 {
            Some(RrcFilter::new((cfg.rrc.rolloff * 100.0) as u8, cfg.rrc.span_symbols, sps).map_err(|e| DspError::FilterDesignFailed {
                stage: "rrc",
                reason: e.to_string(),
            })?)
        } else {
            None
        };

        Ok(Self {
            mode,
            decim: Decimator::new(DecimationKind::HalfBandCascade, cfg.decimation.max(1)),
            blanker: ImpulseBlanker::new(4.0, 4),
            dc_block: DcBlocker::new((cfg.dc_block_pole.clamp(0.5, 0.999_999) * 15.0) as u32 + 6),
            iq_balance: IqBalance::new(1e-4),
            agc: Agc::new(cfg.agc.target_amplitude, (cfg.agc.attack * 32768.0) as i32, (cfg.agc.decay * 32768.0) as i32),
            cma: CmaSmoother::new(CmaStrength::Light),
            fll: Fll::new(sps),
            gardner: GardnerTed::new(sps as f64),
            costas: Costas::new(cfg.costas.loop_bandwidth_hz / 1000.0, cfg.costas.loop_bandwidth_hz / 10000.0),
            matched_filter: MatchedFilter5::new(),
            rrc,
            lms: LmsEqualizer::new(cfg.equalizer.taps, (cfg.equalizer.step_size * 32768.0) as i32, 1, false, 0, if cfg.equalizer.use_cma_warmup { 200 } else { 0 }),
            fm_disc: FmDiscriminator::new(),
            post_demod: PostDemod::new(13000, 10, 3000.0, cfg.input_sample_rate_hz),
            carrier_lock: CarrierLockTracker::new(CarrierLockThresholds::default()),
            runtime: PipelineRuntimeConfig::default(),
            last_cqpsk_diff: Complex64::new(1.0, 0.0),
            metrics: Arc::new(DspMetrics::new()),
        })
    }

    pub fn apply_config(&mut self, runtime: PipelineRuntimeConfig) -> Result<(), ConfigError> {
        self.blanker = ImpulseBlanker::new(runtime.blanker_threshold, runtime.blanker_window);
        self.agc = Agc::new(runtime.agc_target_rms, (0.01 * 32768.0) as i32, (0.05 * 32768.0) as i32);
        self.runtime = runtime;
        Ok(())
    }

    /// `process(block_in) -> block_out` (§4.1): synchronous, deterministic
    /// for a given state.
    pub fn process(&mut self, block_in: &[Complex64]) -> Result<Vec<Symbol>, ConfigError> {
        let mut samples = block_in.to_vec();
        self.blanker.process(&mut samples);

        let decimated = self.decim.process(&samples)?;
        let mut stage: Vec<Complex64> = decimated.iter().map(|&s| self.dc_block.process_sample(s)).collect();
        stage = self.iq_balance.process(&stage);

        match self.mode {
            PipelineMode::Fm => self.process_fm(&stage),
            PipelineMode::Cqpsk => self.process_cqpsk(&stage),
            PipelineMode::PassThrough => Ok(stage
                .iter()
                .map(|&s| Symbol::new(quantize(s.re), 255))
                .collect()),
        }
    }

    fn process_fm(&mut self, stage: &[Complex64]) -> Result<Vec<Symbol>, ConfigError> {
        let mut stage: Vec<Complex64> = self.agc.process(stage);
        agc::limit(&mut stage);
        stage = self.cma.process(&stage);

        let mut out = Vec::new();
        for &s in &stage {
            if let Some(sym) = self.gardner.process_sample(s) {
                let freq = self.fm_disc.process_sample(sym);
                let audio = self.post_demod.process_sample(freq);
                let value = quantize(audio);
                let reliability = (255.0 * (1.0 - self.gardner.lock_metric().min(1.0))) as u8;
                out.push(Symbol::new(value, reliability));
            }
        }
        Ok(out)
    }

    fn process_cqpsk(&mut self, stage: &[Complex64]) -> Result<Vec<Symbol>, ConfigError> {
        let mut stage: Vec<Complex64> = self.fll.process(stage);
        stage = stage.iter().map(|&s| self.matched_filter.process_sample(s)).collect();
        if let Some(rrc) = &mut self.rrc {
            stage = rrc.process(&stage);
        }

        let mut out = Vec::new();
        for &s in &stage {
            if let Some(sym) = self.gardner.process_sample(s) {
                let diff = sym * self.last_cqpsk_diff.conj();
                self.last_cqpsk_diff = sym;
                let recovered = self.costas.process_sample(diff);
                let equalized = if self.runtime.equalizer_enabled { self.lms.process_sample(recovered) } else { recovered };
                let dibit = cqpsk_slice(equalized.re);
                let reliability = (255.0 * (1.0 - self.costas.mean_abs_error().min(1.0))) as u8;
                out.push(Symbol::new(dibit as i8, reliability));
                self.carrier_lock.update(self.fll.frequency() * 1000.0, self.costas.mean_abs_error(), 10.0);
            }
        }
        self.metrics.set_cfo_hz(self.fll.frequency());
        self.metrics.set_costas_err_q14(self.costas.mean_abs_error());
        self.metrics.set_carrier_locked(matches!(self.carrier_lock.state(), crate::metrics::CarrierLockState::Track));
        Ok(out)
    }

    /// §4.1: "invoked on every retune", resets Costas/FLL/CMA-LMS
    /// warm-up/IQ-balance adaptation but NOT the impulse blanker's counts.
    pub fn reset_carrier(&mut self) {
        self.fll.reset();
        self.costas.reset();
        self.carrier_lock.reset();
        self.iq_balance.reset();
    }

    pub fn reset_timing(&mut self) {
        self.gardner.reset();
    }

    pub fn reset_all(&mut self) {
        self.reset_carrier();
        self.reset_timing();
        self.dc_block.reset();
        self.cma.reset();
        self.lms.reset();
        self.matched_filter.reset();
        if let Some(rrc) = &mut self.rrc {
            rrc.reset();
        }
        self.post_demod.reset();
        self.agc.reset();
        self.fm_disc.reset();
        // Impulse-blanker statistics deliberately survive (§4.1).
    }

    pub fn snapshot_metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn metrics(&self) -> Arc<DspMetrics> {
        self.metrics.clone()
    }
}

/// Quantizes a real-valued demod output to the small signed range symbols
/// use (§3: "FM/FSK: integer in a small signed range").
fn quantize(v: f64) -> i8 {
    (v.clamp(-3.0, 3.0) * 1.0).round() as i8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DspConfig;

    fn cfg() -> DspConfig {
        DspConfig::p25_phase1()
    }

    #[test]
    fn init_rejects_non_positive_sample_rate() {
        let mut bad = cfg();
        bad.input_sample_rate_hz = 0.0;
        assert!(Pipeline::init(PipelineMode::Fm, &bad, 12500.0).is_err());
    }

    #[test]
    fn pass_through_mode_emits_one_symbol_per_decimated_sample() {
        let mut c = cfg();
        c.decimation = 1;
        let mut pipeline = Pipeline::init(PipelineMode::PassThrough, &c, 12500.0).unwrap();
        let block = vec![Complex64::new(1.0, 0.0); 16];
        let out = pipeline.process(&block).unwrap();
        assert_eq!(out.len(), 16);
    }

    #[test]
    fn reset_all_does_not_panic_and_clears_carrier_state() {
        let c = cfg();
        let mut pipeline = Pipeline::init(PipelineMode::Cqpsk, &c, 12500.0).unwrap();
        let block: Vec<Complex64> = (0..200).map(|n| Complex64::from_polar(1.0, n as f64 * 0.3)).collect();
        let _ = pipeline.process(&block);
        pipeline.reset_all();
        let snap = pipeline.snapshot_metrics();
        assert!(!snap.carrier_locked);
    }

    #[test]
    fn fm_mode_produces_symbols_with_reliability_in_range() {
        let c = cfg();
        let mut pipeline = Pipeline::init(PipelineMode::Fm, &c, 12500.0).unwrap();
        let block: Vec<Complex64> = (0..500).map(|n| Complex64::from_polar(1.0, n as f64 * 0.05)).collect();
        let out = pipeline.process(&block).unwrap();
        for sym in out {
            assert!(sym.reliability <= 255);
        }
    }
}
