use mfpt_core::System;
use nalgebra::{DMatrix, DMatrixView, DVector};

/// Uncoupled harmonic oscillators, `V = sum_i k_i q_i^2 / 2`, one spring
/// constant and one constant mass per degree of freedom.
pub struct HarmonicOscillator {
    masses: DVector<f64>,
    strengths: DVector<f64>,
}

impl HarmonicOscillator {
    pub fn new(masses: DVector<f64>, strengths: DVector<f64>) -> mfpt_core::Result<Self> {
        if masses.is_empty() {
            return Err(mfpt_core::Error::param(
                "a system needs at least one degree of freedom",
            ));
        }
        if masses.len() != strengths.len() {
            return Err(mfpt_core::Error::param(format!(
                "got {} masses but {} spring strengths",
                masses.len(),
                strengths.len(),
            )));
        }
        Ok(Self { masses, strengths })
    }
}

impl System for HarmonicOscillator {
    fn dofs(&self) -> usize {
        self.masses.len()
    }

    fn potential(&self, phase: DMatrixView<f64>, _t: f64) -> DVector<f64> {
        let d = self.dofs();
        let q = phase.columns_range(0..d);
        DVector::from_fn(phase.nrows(), |i, _| {
            0.5 * q
                .row(i)
                .iter()
                .zip(self.strengths.iter())
                .map(|(qi, ki)| ki * qi * qi)
                .sum::<f64>()
        })
    }

    fn force(&self, phase: DMatrixView<f64>, _t: f64) -> DMatrix<f64> {
        let d = self.dofs();
        let q = phase.columns_range(0..d);
        DMatrix::from_fn(phase.nrows(), d, |i, j| -self.strengths[j] * q[(i, j)])
    }

    fn masses(&self, phase: DMatrixView<f64>) -> DMatrix<f64> {
        DMatrix::from_fn(phase.nrows(), self.dofs(), |_, j| self.masses[j])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mismatched_lengths_are_rejected() {
        assert!(HarmonicOscillator::new(
            DVector::from_vec(vec![1.0, 2.0]),
            DVector::from_vec(vec![1.0]),
        )
        .is_err());
    }

    #[test]
    fn potential_and_force_agree_with_hand_values() {
        let system = HarmonicOscillator::new(
            DVector::from_vec(vec![1.0, 2.0]),
            DVector::from_vec(vec![3.0, 4.0]),
        )
        .unwrap();
        let phase = DMatrix::from_row_slice(1, 4, &[2.0, -1.0, 0.7, 0.7]);

        let v = system.potential(phase.as_view(), 0.0);
        assert_relative_eq!(v[0], 0.5 * (3.0 * 4.0 + 4.0 * 1.0), epsilon = 1e-14);

        let f = system.force(phase.as_view(), 0.0);
        assert_relative_eq!(f[(0, 0)], -6.0, epsilon = 1e-14);
        assert_relative_eq!(f[(0, 1)], 4.0, epsilon = 1e-14);
    }
}
