//! The carrier-lock state machine (§4.1 "State machine: carrier lock"):
//! `ACQUIRE -> TRACK -> LOSS`, transitioning on sustained-N/M windows of
//! residual CFO, Costas error, and SNR rather than a single-sample glitch.

use crate::metrics::CarrierLockState;

#[derive(Debug, Clone, Copy)]
pub struct CarrierLockThresholds {
    pub max_residual_cfo_hz: f64,
    pub max_costas_err: f64,
    pub min_snr_db: f64,
    /// N: consecutive good symbols required for ACQUIRE -> TRACK.
    pub acquire_hold_symbols: u32,
    /// M: consecutive bad symbols required for TRACK -> LOSS.
    pub loss_hold_symbols: u32,
}

impl Default for CarrierLockThresholds {
    fn default() -> Self {
        Self {
            max_residual_cfo_hz: 200.0,
            max_costas_err: 0.05 * std::f64::consts::PI,
            min_snr_db: 6.0,
            acquire_hold_symbols: 200,
            loss_hold_symbols: 500,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CarrierLockTracker {
    thresholds: CarrierLockThresholds,
    state: CarrierLockState,
    good_run: u32,
    bad_run: u32,
    /// Set on a TRACK -> LOSS transition so the caller knows to re-engage
    /// the FLL (§4.1: "Losses trigger an FLL re-engagement").
    pub fll_reengage_requested: bool,
}

impl CarrierLockTracker {
    pub fn new(thresholds: CarrierLockThresholds) -> Self {
        Self { thresholds, state: CarrierLockState::Acquire, good_run: 0, bad_run: 0, fll_reengage_requested: false }
    }

    pub fn state(&self) -> CarrierLockState {
        self.state
    }

    fn condition_ok(&self, residual_cfo_hz: f64, costas_err: f64, snr_db: f64) -> bool {
        residual_cfo_hz.abs() < self.thresholds.max_residual_cfo_hz
            && costas_err < self.thresholds.max_costas_err
            && snr_db > self.thresholds.min_snr_db
    }

    /// Called once per symbol with the current metric readings; returns the
    /// (possibly updated) state.
    pub fn update(&mut self, residual_cfo_hz: f64, costas_err: f64, snr_db: f64) -> CarrierLockState {
        let ok = self.condition_ok(residual_cfo_hz, costas_err, snr_db);
        self.fll_reengage_requested = false;

        match self.state {
            CarrierLockState::Acquire => {
                if ok {
                    self.good_run += 1;
                    if self.good_run >= self.thresholds.acquire_hold_symbols {
                        self.state = CarrierLockState::Track;
                        self.bad_run = 0;
                    }
                } else {
                    self.good_run = 0;
                }
            }
            CarrierLockState::Track => {
                if ok {
                    self.bad_run = 0;
                } else {
                    self.bad_run += 1;
                    if self.bad_run >= self.thresholds.loss_hold_symbols {
                        self.state = CarrierLockState::Loss;
                        self.fll_reengage_requested = true;
                        self.good_run = 0;
                    }
                }
            }
            CarrierLockState::Loss => {
                self.good_run = if ok { self.good_run + 1 } else { 0 };
                if self.good_run >= self.thresholds.acquire_hold_symbols {
                    self.state = CarrierLockState::Track;
                    self.bad_run = 0;
                } else {
                    self.state = CarrierLockState::Acquire;
                }
            }
        }
        self.state
    }

    pub fn reset(&mut self) {
        self.state = CarrierLockState::Acquire;
        self.good_run = 0;
        self.bad_run = 0;
        self.fll_reengage_requested = false;
    }
}
