//! Stage 10: Costas loop (§4.1), CQPSK modes. QPSK phase detector driving a
//! PI loop filter; phase is clamped (not wrapped) to +/-pi/2 and frequency
//! clamped to +/-1 rad/sample, matching the reference design's saturation
//! behaviour exactly (wrapping here would let the loop run away instead of
//! holding at the rail).

use num_complex::Complex64;
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy)]
pub struct Costas {
    alpha: f64,
    beta: f64,
    phase: f64,
    freq: f64,
    last_error: f64,
}

impl Costas {
    /// `(alpha, beta)` derived from `B_L=0.008, zeta=sqrt(2)/2` per §4.1;
    /// defaults to the documented approximate values when the caller just
    /// wants the reference loop.
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta, phase: 0.0, freq: 0.0, last_error: 0.0 }
    }

    pub fn reference() -> Self {
        Self::new(0.0223, 0.000253)
    }

    /// QPSK phase-detector error: `sign(I)*Q - sign(Q)*I`, the standard
    /// decision-directed Costas error for a 4-point constellation.
    fn phase_error(sample: Complex64) -> f64 {
        let i = sample.re;
        let q = sample.im;
        i.signum() * q - q.signum() * i
    }

    pub fn process_sample(&mut self, x: Complex64) -> Complex64 {
        let rotated = x * Complex64::from_polar(1.0, -self.phase);
        let error = Self::phase_error(rotated);
        self.last_error = error;

        self.freq += self.beta * error;
        self.freq = self.freq.clamp(-1.0, 1.0);

        self.phase += self.freq + self.alpha * error;
        self.phase = self.phase.clamp(-PI / 2.0, PI / 2.0);

        rotated
    }

    pub fn process(&mut self, samples: &[Complex64]) -> Vec<Complex64> {
        samples.iter().map(|&s| self.process_sample(s)).collect()
    }

    pub fn mean_abs_error(&self) -> f64 {
        self.last_error.abs()
    }

    pub fn frequency(&self) -> f64 {
        self.freq
    }

    /// §4.1: "`reset()` on retune".
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.freq = 0.0;
        self.last_error = 0.0;
    }
}
