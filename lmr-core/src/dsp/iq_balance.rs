//! Stage 4: IQ balance / image cancellation (§4.1). A small adaptive
//! complex prefilter correcting the mirror image produced by gain/phase
//! mismatch between the I and Q branches, used in modes dominated by a
//! one-sided spectrum.

use num_complex::Complex64;

#[derive(Debug, Clone, Copy)]
pub struct IqBalance {
    /// Adaptive correction: `y = x + gain * conj(x)`.
    gain: Complex64,
    step_size: f64,
}

impl IqBalance {
    pub fn new(step_size: f64) -> Self {
        Self { gain: Complex64::new(0.0, 0.0), step_size }
    }

    pub fn process_sample(&mut self, x: Complex64) -> Complex64 {
        let y = x + self.gain * x.conj();
        // Minimize image power by nudging gain opposite the cross term.
        let error = y.re * y.im;
        self.gain -= Complex64::new(self.step_size * error, 0.0);
        y
    }

    pub fn process(&mut self, samples: &[Complex64]) -> Vec<Complex64> {
        samples.iter().map(|&s| self.process_sample(s)).collect()
    }

    pub fn reset(&mut self) {
        self.gain = Complex64::new(0.0, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_gain_is_identity() {
        let mut balance = IqBalance::new(0.0);
        let samples = vec![Complex64::new(0.3, -0.2), Complex64::new(-0.1, 0.4)];
        let out = balance.process(&samples);
        assert_eq!(out, samples);
    }

    #[test]
    fn reset_clears_adapted_gain() {
        let mut balance = IqBalance::new(1e-3);
        let samples = vec![Complex64::new(0.5, 0.5); 100];
        balance.process(&samples);
        balance.reset();
        assert_eq!(balance.gain, Complex64::new(0.0, 0.0));
    }
}
