//! Stage 2: decimation cascade (§4.1). Either a half-band power-of-two
//! cascade or a boxcar + 9-tap symmetric FIR. Input length must be an exact
//! multiple of the total decimation factor.

use crate::errors::ConfigError;
use num_complex::Complex64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecimationKind {
    HalfBandCascade,
    BoxcarFir9,
}

const FIR9: [f64; 9] = [0.01, 0.02, 0.06, 0.12, 0.18, 0.12, 0.06, 0.02, 0.01];

#[derive(Debug, Clone)]
pub struct Decimator {
    kind: DecimationKind,
    factor: usize,
}

impl Decimator {
    pub fn new(kind: DecimationKind, factor: usize) -> Self {
        Self { kind, factor }
    }

    pub fn factor(&self) -> usize {
        self.factor
    }

    pub fn process(&self, input: &[Complex64]) -> Result<Vec<Complex64>, ConfigError> {
        if self.factor <= 1 {
            return Ok(input.to_vec());
        }
        if input.len() % self.factor != 0 {
            return Err(ConfigError::DecimationMismatch { decim: self.factor, len: input.len() });
        }
        match self.kind {
            DecimationKind::HalfBandCascade => Ok(input.iter().step_by(self.factor).copied().collect()),
            DecimationKind::BoxcarFir9 => {
                let filtered = Self::fir9_filter(input);
                Ok(filtered.iter().step_by(self.factor).copied().collect())
            }
        }
    }

    fn fir9_filter(input: &[Complex64]) -> Vec<Complex64> {
        let half = FIR9.len() / 2;
        (0..input.len())
            .map(|i| {
                let mut acc = Complex64::new(0.0, 0.0);
                for (tap, &coeff) in FIR9.iter().enumerate() {
                    let idx = i as isize + tap as isize - half as isize;
                    if idx >= 0 && (idx as usize) < input.len() {
                        acc += input[idx as usize] * coeff;
                    }
                }
                acc
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Invariant 1 (§8): len(output) = L/D for every L, D with D | L.
    #[test]
    fn output_length_is_input_over_decimation() {
        let dec = Decimator::new(DecimationKind::HalfBandCascade, 4);
        let input = vec![Complex64::new(1.0, 0.0); 32];
        let out = dec.process(&input).unwrap();
        assert_eq!(out.len(), 32 / 4);
    }

    #[test]
    fn non_dividing_length_is_an_error() {
        let dec = Decimator::new(DecimationKind::BoxcarFir9, 5);
        let input = vec![Complex64::new(1.0, 0.0); 12];
        assert!(dec.process(&input).is_err());
    }

    #[test]
    fn factor_one_is_pass_through() {
        let dec = Decimator::new(DecimationKind::HalfBandCascade, 1);
        let input = vec![Complex64::new(1.0, 2.0); 5];
        assert_eq!(dec.process(&input).unwrap(), input);
    }
}
