//! Stage 14: discriminator (§4.1). FM mode uses the standard
//! `atan2(I*Q' - Q*I', I*I' + Q*Q')` differential-product discriminator;
//! CQPSK mode uses a 4-level slicer with decision boundaries at
//! `{-2, 0, +2}`, applied after the differential-phasor and Costas stages.

use num_complex::Complex64;

/// FM discriminator: consumes consecutive complex samples, emits one real
/// frequency estimate per sample after the first.
#[derive(Debug, Clone, Copy, Default)]
pub struct FmDiscriminator {
    prev: Complex64,
}

impl FmDiscriminator {
    pub fn new() -> Self {
        Self { prev: Complex64::new(1.0, 0.0) }
    }

    pub fn process_sample(&mut self, x: Complex64) -> f64 {
        let i = x.re;
        let q = x.im;
        let ip = self.prev.re;
        let qp = self.prev.im;
        self.prev = x;
        (i * (q - qp) - q * (i - ip)).atan2(i * ip + q * qp)
    }

    pub fn process(&mut self, samples: &[Complex64]) -> Vec<f64> {
        samples.iter().map(|&s| self.process_sample(s)).collect()
    }

    pub fn reset(&mut self) {
        self.prev = Complex64::new(1.0, 0.0);
    }
}

/// CQPSK 4-level slicer: maps a differential+Costas-recovered real value to
/// a dibit in `0..=3` via boundaries at `{-2, 0, +2}`.
pub fn cqpsk_slice(value: f64) -> u8 {
    if value < -2.0 {
        3
    } else if value < 0.0 {
        2
    } else if value < 2.0 {
        0
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn discriminator_reports_zero_for_unmodulated_carrier() {
        let mut disc = FmDiscriminator::new();
        let out = disc.process_sample(Complex64::new(1.0, 0.0));
        assert!(out.abs() < 1e-9);
    }

    #[test]
    fn discriminator_tracks_constant_frequency_offset() {
        let mut disc = FmDiscriminator::new();
        let step = PI / 8.0;
        let mut phase = 0.0;
        let mut outs = Vec::new();
        for _ in 0..20 {
            phase += step;
            outs.push(disc.process_sample(Complex64::from_polar(1.0, phase)));
        }
        for out in &outs[2..] {
            assert!((out - step).abs() < 1e-6);
        }
    }

    #[test]
    fn cqpsk_slicer_boundaries_match_spec() {
        assert_eq!(cqpsk_slice(3.0), 1);
        assert_eq!(cqpsk_slice(1.0), 0);
        assert_eq!(cqpsk_slice(-1.0), 2);
        assert_eq!(cqpsk_slice(-3.0), 3);
    }
}
