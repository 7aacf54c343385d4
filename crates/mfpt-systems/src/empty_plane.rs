use mfpt_core::System;
use nalgebra::{DMatrix, DMatrixView, DVector};

/// Free motion in `D` dimensions: zero potential, constant masses.
///
/// Mostly useful as a reference system in tests and for sampling
/// unconstrained Maxwell-Boltzmann momenta.
pub struct EmptyPlane {
    masses: DVector<f64>,
}

impl EmptyPlane {
    pub fn new(masses: DVector<f64>) -> mfpt_core::Result<Self> {
        if masses.is_empty() {
            return Err(mfpt_core::Error::param(
                "a system needs at least one degree of freedom",
            ));
        }
        Ok(Self { masses })
    }
}

impl System for EmptyPlane {
    fn dofs(&self) -> usize {
        self.masses.len()
    }

    fn potential(&self, phase: DMatrixView<f64>, _t: f64) -> DVector<f64> {
        DVector::zeros(phase.nrows())
    }

    fn force(&self, phase: DMatrixView<f64>, _t: f64) -> DMatrix<f64> {
        DMatrix::zeros(phase.nrows(), self.masses.len())
    }

    fn masses(&self, phase: DMatrixView<f64>) -> DMatrix<f64> {
        DMatrix::from_fn(phase.nrows(), self.masses.len(), |_, j| self.masses[j])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everything_is_flat() {
        let system = EmptyPlane::new(DVector::from_vec(vec![2.0, 3.0])).unwrap();
        let phase = DMatrix::from_row_slice(2, 4, &[1.0, -1.0, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0]);

        assert_eq!(system.potential(phase.as_view(), 0.0), DVector::zeros(2));
        assert_eq!(system.force(phase.as_view(), 0.0), DMatrix::zeros(2, 2));
        let m = system.masses(phase.as_view());
        assert_eq!(m, DMatrix::from_row_slice(2, 2, &[2.0, 3.0, 2.0, 3.0]));
    }

    #[test]
    fn empty_mass_vector_is_rejected() {
        assert!(EmptyPlane::new(DVector::zeros(0)).is_err());
    }
}
