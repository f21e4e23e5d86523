//! Stage 5: FM AGC and constant-envelope limiter (§4.1), FM/FSK modes only.
//! Targets a configurable RMS using split-rate EMAs so gain rises slowly
//! and falls fast on a burst, then limits the result to unit envelope.

use num_complex::Complex64;

#[derive(Debug, Clone, Copy)]
pub struct Agc {
    target_rms: f64,
    alpha_up_q15: i32,
    alpha_down_q15: i32,
    gain: f64,
    envelope: f64,
}

impl Agc {
    pub fn new(target_rms: f64, alpha_up_q15: i32, alpha_down_q15: i32) -> Self {
        Self { target_rms, alpha_up_q15, alpha_down_q15, gain: 1.0, envelope: target_rms }
    }

    fn alpha(&self, rising: bool) -> f64 {
        let q15 = if rising { self.alpha_up_q15 } else { self.alpha_down_q15 };
        q15 as f64 / 32768.0
    }

    pub fn process_sample(&mut self, x: Complex64) -> Complex64 {
        let mag = x.norm();
        let rising = mag > self.envelope;
        let a = self.alpha(rising);
        self.envelope += a * (mag - self.envelope);
        if self.envelope > 1e-9 {
            self.gain = self.target_rms / self.envelope;
        }
        x * self.gain
    }

    pub fn process(&mut self, samples: &[Complex64]) -> Vec<Complex64> {
        samples.iter().map(|&s| self.process_sample(s)).collect()
    }

    pub fn reset(&mut self) {
        self.gain = 1.0;
        self.envelope = self.target_rms;
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }
}

/// Constant-envelope limiter applied after AGC in FM/FSK modes: clips the
/// magnitude to exactly 1.0 without touching phase.
pub fn limit(samples: &mut [Complex64]) {
    for s in samples.iter_mut() {
        let mag = s.norm();
        if mag > 1e-12 {
            *s /= mag;
        }
    }
}
