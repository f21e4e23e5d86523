//! Stage 8: Gardner timing-error detector (§4.1). Maintains a symbol-rate
//! accumulator `mu` and symbol period `omega`; when `mu` crosses 1 it
//! interpolates a symbol and a mid-symbol sample and updates both from
//! `error = (last - current) * mid`.

use num_complex::Complex64;

#[derive(Debug, Clone, Copy)]
pub struct GardnerTed {
    mu: f64,
    omega: f64,
    gain_mu: f64,
    gain_omega: f64,
    last_symbol: Complex64,
    history: [Complex64; 3],
    lock_metric: f64,
}

impl GardnerTed {
    /// `sps` sets the nominal symbol period `omega`. Defaults per §4.1:
    /// `gain_mu=0.025`, `gain_omega=0.1*gain_mu^2`.
    pub fn new(sps: f64) -> Self {
        let gain_mu = 0.025;
        Self {
            mu: 0.0,
            omega: sps,
            gain_mu,
            gain_omega: 0.1 * gain_mu * gain_mu,
            last_symbol: Complex64::new(0.0, 0.0),
            history: [Complex64::new(0.0, 0.0); 3],
            lock_metric: 0.0,
        }
    }

    /// Linear interpolation between history samples, used for both the
    /// symbol and mid-symbol taps.
    fn interpolate(&self, frac: f64) -> Complex64 {
        self.history[1] + (self.history[2] - self.history[1]) * frac
    }

    /// Feeds one input sample at the front-end sample rate; returns a
    /// recovered symbol whenever `mu` crosses 1 within this sample.
    pub fn process_sample(&mut self, x: Complex64) -> Option<Complex64> {
        self.history[0] = self.history[1];
        self.history[1] = self.history[2];
        self.history[2] = x;

        self.mu += 1.0 / self.omega;
        if self.mu < 1.0 {
            return None;
        }
        let overshoot = self.mu - 1.0;
        self.mu = overshoot;

        let current = self.interpolate(1.0 - overshoot);
        let mid = self.interpolate(0.5 - overshoot.min(0.5));

        let error = ((self.last_symbol - current) * mid.conj()).re;
        self.lock_metric = 0.99 * self.lock_metric + 0.01 * error.abs();

        self.omega += self.gain_omega * error;
        // Tolerance per §4.1: omega must stay within +/-0.2% of nominal.
        let tolerance = self.omega * 0.002;
        self.omega = self.omega.clamp(self.omega - tolerance, self.omega + tolerance);
        self.mu += self.gain_mu * error;

        self.last_symbol = current;
        Some(current)
    }

    pub fn process(&mut self, samples: &[Complex64]) -> Vec<Complex64> {
        samples.iter().filter_map(|&s| self.process_sample(s)).collect()
    }

    pub fn lock_metric(&self) -> f64 {
        self.lock_metric
    }

    pub fn symbol_period(&self) -> f64 {
        self.omega
    }

    pub fn reset(&mut self) {
        self.mu = 0.0;
        self.last_symbol = Complex64::new(0.0, 0.0);
        self.history = [Complex64::new(0.0, 0.0); 3];
        self.lock_metric = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_roughly_one_symbol_per_sps_input_samples() {
        let sps = 10.0;
        let mut ted = GardnerTed::new(sps);
        let samples: Vec<Complex64> = (0..1000).map(|n| Complex64::new((n as f64 / sps).sin(), 0.0)).collect();
        let symbols = ted.process(&samples);
        let expected = (samples.len() as f64 / sps).floor() as usize;
        assert!((symbols.len() as isize - expected as isize).unsigned_abs() <= 2);
    }

    #[test]
    fn reset_clears_mu_and_history() {
        let mut ted = GardnerTed::new(10.0);
        for n in 0..50 {
            ted.process_sample(Complex64::new(n as f64, 0.0));
        }
        ted.reset();
        assert_eq!(ted.lock_metric(), 0.0);
    }
}
