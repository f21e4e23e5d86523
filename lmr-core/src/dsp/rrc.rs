//! Stage 12: optional root-raised-cosine matched filter (§4.1).
//! `alpha_percent in [1,100]`, `span_syms in [3,16]`; out-of-range
//! parameters fail pipeline init per §4.1's failure semantics (this is the
//! one filter whose design step the cascade actually rejects).

use crate::errors::ConfigError;
use num_complex::Complex64;

#[derive(Debug, Clone)]
pub struct RrcFilter {
    taps: Vec<f64>,
    history: Vec<Complex64>,
}

impl RrcFilter {
    pub fn new(alpha_percent: u8, span_syms: usize, sps: usize) -> Result<Self, ConfigError> {
        if !(1..=100).contains(&alpha_percent) {
            return Err(ConfigError::InvalidRrcRolloff { alpha_percent });
        }
        if !(3..=16).contains(&span_syms) {
            return Err(ConfigError::InvalidRrcSpan { span: span_syms });
        }
        let alpha = alpha_percent as f64 / 100.0;
        let n = span_syms * sps + 1;
        let center = (n as f64 - 1.0) / 2.0;
        let mut taps: Vec<f64> = (0..n)
            .map(|i| {
                let t = (i as f64 - center) / sps as f64;
                rrc_sample(t, alpha)
            })
            .collect();
        let energy: f64 = taps.iter().map(|t| t * t).sum::<f64>().sqrt();
        if energy > 1e-12 {
            for t in taps.iter_mut() {
                *t /= energy;
            }
        }
        Ok(Self { taps: taps.clone(), history: vec![Complex64::new(0.0, 0.0); taps.len()] })
    }

    pub fn process_sample(&mut self, x: Complex64) -> Complex64 {
        self.history.rotate_left(1);
        *self.history.last_mut().unwrap() = x;
        self.history.iter().rev().zip(self.taps.iter()).map(|(&s, &t)| s * t).sum()
    }

    pub fn process(&mut self, samples: &[Complex64]) -> Vec<Complex64> {
        samples.iter().map(|&s| self.process_sample(s)).collect()
    }

    pub fn reset(&mut self) {
        for s in self.history.iter_mut() {
            *s = Complex64::new(0.0, 0.0);
        }
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }
}

fn rrc_sample(t: f64, alpha: f64) -> f64 {
    if t.abs() < 1e-9 {
        return 1.0 - alpha + 4.0 * alpha / std::f64::consts::PI;
    }
    let denom = 1.0 - (4.0 * alpha * t).powi(2);
    if denom.abs() < 1e-9 {
        let x = std::f64::consts::FRAC_PI_4;
        return (alpha / std::f64::consts::SQRT_2)
            * ((1.0 + 2.0 / std::f64::consts::PI) * x.sin() + (1.0 - 2.0 / std::f64::consts::PI) * x.cos());
    }
    let numer = (std::f64::consts::PI * t * (1.0 - alpha)).sin() + 4.0 * alpha * t * (std::f64::consts::PI * t * (1.0 + alpha)).cos();
    numer / (std::f64::consts::PI * t * denom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_span_out_of_range() {
        assert!(matches!(RrcFilter::new(35, 2, 8), Err(ConfigError::InvalidRrcSpan { span: 2 })));
        assert!(matches!(RrcFilter::new(35, 20, 8), Err(ConfigError::InvalidRrcSpan { span: 20 })));
    }

    #[test]
    fn rejects_rolloff_out_of_range() {
        assert!(matches!(RrcFilter::new(0, 8, 8), Err(ConfigError::InvalidRrcRolloff { .. })));
        assert!(matches!(RrcFilter::new(150, 8, 8), Err(ConfigError::InvalidRrcRolloff { .. })));
    }

    #[test]
    fn accepts_valid_parameters_and_produces_expected_tap_count() {
        let filt = RrcFilter::new(35, 8, 10).expect("valid params");
        assert_eq!(filt.len(), 8 * 10 + 1);
    }
}
