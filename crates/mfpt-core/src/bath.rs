use nalgebra::{DMatrix, DMatrixViewMut};

use crate::error::{Error, Result};
use crate::noise::NoiseGenerator;

/// Thermal reservoir coupled to every degree of freedom.
///
/// A bath applies one thermal sub-step to the momenta and auxiliary blocks
/// of a state batch, drawing from its own noise stream. Iterated long
/// enough under any stepper, it must leave the ensemble at the thermal
/// equilibrium distribution for the configured `k_B T`, independent of the
/// step size within stability limits.
pub trait Bath: Send {
    /// Number of exponential-memory modes `K` (0 for memoryless baths).
    fn memory_modes(&self) -> usize {
        0
    }

    /// Mutate `momenta` (`N x D`) and `aux` (`N x D*K`) in place over `dt`.
    fn apply_thermal(
        &mut self,
        momenta: DMatrixViewMut<f64>,
        aux: DMatrixViewMut<f64>,
        masses: &DMatrix<f64>,
        dt: f64,
    ) -> Result<()>;
}

fn check_blocks(
    momenta: &DMatrixViewMut<f64>,
    aux: &DMatrixViewMut<f64>,
    masses: &DMatrix<f64>,
    memory_modes: usize,
) -> Result<()> {
    if momenta.shape() != masses.shape() {
        return Err(Error::shape(format!(
            "momenta are {}x{} but masses are {}x{}",
            momenta.nrows(),
            momenta.ncols(),
            masses.nrows(),
            masses.ncols(),
        )));
    }
    let expected_aux = momenta.ncols() * memory_modes;
    if aux.nrows() != momenta.nrows() || aux.ncols() != expected_aux {
        return Err(Error::shape(format!(
            "aux block is {}x{} but the bath requires {}x{}",
            aux.nrows(),
            aux.ncols(),
            momenta.nrows(),
            expected_aux,
        )));
    }
    Ok(())
}

/// Memoryless (Markovian) Langevin bath.
///
/// The momentum update is the exact Ornstein-Uhlenbeck transition
///
/// ```text
/// p' = p e^{-g dt} + sqrt(m kT (1 - e^{-2 g dt})) xi
/// ```
///
/// with one standard-normal draw per step and degree of freedom. The exact
/// form keeps the update statistically exact for any `g dt`, unlike an
/// Euler discretization of the friction term.
pub struct LangevinBath {
    sqrt_kb_t: f64,
    friction: f64,
    rng: NoiseGenerator,
}

impl LangevinBath {
    pub fn new(kb_t: f64, friction: f64, rng: impl Into<NoiseGenerator>) -> Result<Self> {
        if kb_t < 0.0 {
            return Err(Error::param("the temperature kb_t must be >= 0"));
        }
        if friction < 0.0 {
            return Err(Error::param("the friction must be >= 0"));
        }
        Ok(Self {
            sqrt_kb_t: kb_t.sqrt(),
            friction,
            rng: rng.into(),
        })
    }
}

impl Bath for LangevinBath {
    fn apply_thermal(
        &mut self,
        mut momenta: DMatrixViewMut<f64>,
        aux: DMatrixViewMut<f64>,
        masses: &DMatrix<f64>,
        dt: f64,
    ) -> Result<()> {
        check_blocks(&momenta, &aux, masses, self.memory_modes())?;

        let friction_scale = (-self.friction * dt).exp();
        let noise_var = 1.0 - friction_scale * friction_scale;
        if !noise_var.is_finite() || noise_var < 0.0 {
            return Err(Error::Unstable(format!(
                "Ornstein-Uhlenbeck noise variance is {noise_var} for friction {} and dt {dt}",
                self.friction,
            )));
        }
        let sigma = self.sqrt_kb_t * noise_var.sqrt();

        let (rows, cols) = momenta.shape();
        let xi = self.rng.standard_normals(rows, cols);
        momenta *= friction_scale;
        momenta += masses.map(f64::sqrt).component_mul(&xi) * sigma;
        Ok(())
    }
}

/// Generalized Langevin bath with a single Prony-type exponential memory
/// kernel (one auxiliary variable per degree of freedom).
///
/// Uses the multistage splitting of Baczewski and Bond with xi = 1: the
/// auxiliary block `z` follows its own exact OU relaxation with rate
/// `1/tau`, `tau = friction * memory`, and couples back into the momenta
/// as a colored-noise friction force:
///
/// ```text
/// p += dt/2 z
/// z  = e^{-dt/tau} z - (1 - e^{-dt/tau}) g p + sqrt(m) s_z xi
/// p += dt/2 z
/// ```
///
/// with `s_z = sqrt(2 kT g) (1 - e^{-dt/tau}) / sqrt(dt)`. The auxiliary
/// variables are real integration state: they live in the `aux` range of
/// the state records (zero-initialized by the packing helpers) and persist
/// across steps and ensemble removals.
///
/// References:
/// - Baczewski and Bond, J. Chem. Phys. 139, 044107 (2013):
///   https://doi.org/10.1063/1.4815917
/// - Leimkuhler and Sachs, SIAM J. Sci. Comput. 44:1, A364-A388 (2022):
///   https://doi.org/10.1137/20M138497X
pub struct ExpMemoryBath {
    noise: f64,
    friction: f64,
    memory: f64,
    rng: NoiseGenerator,
}

impl ExpMemoryBath {
    pub fn new(
        kb_t: f64,
        friction: f64,
        memory: f64,
        rng: impl Into<NoiseGenerator>,
    ) -> Result<Self> {
        if kb_t < 0.0 {
            return Err(Error::param("the temperature kb_t must be >= 0"));
        }
        if friction < 0.0 {
            return Err(Error::param("the friction must be >= 0"));
        }
        if memory < 0.0 {
            return Err(Error::param("the memory parameter must be >= 0"));
        }
        Ok(Self {
            noise: (2.0 * kb_t * friction).sqrt(),
            friction,
            memory,
            rng: rng.into(),
        })
    }
}

impl Bath for ExpMemoryBath {
    fn memory_modes(&self) -> usize {
        1
    }

    fn apply_thermal(
        &mut self,
        mut momenta: DMatrixViewMut<f64>,
        mut aux: DMatrixViewMut<f64>,
        masses: &DMatrix<f64>,
        dt: f64,
    ) -> Result<()> {
        check_blocks(&momenta, &aux, masses, self.memory_modes())?;

        let tau = self.friction * self.memory;
        let h = 0.5 * dt;
        let memory_scale = (-dt / tau).exp();
        let noise_var = (1.0 - memory_scale) * (1.0 - memory_scale) / dt;
        if !noise_var.is_finite() || noise_var < 0.0 {
            return Err(Error::Unstable(format!(
                "memory-kernel noise variance is {noise_var} for tau {tau} and dt {dt}",
            )));
        }
        let sigma = self.noise * noise_var.sqrt();

        let (rows, cols) = momenta.shape();
        let xi = self.rng.standard_normals(rows, cols);

        momenta += &aux * h;
        aux *= memory_scale;
        aux += &momenta * (-(1.0 - memory_scale) * self.friction);
        aux += masses.map(f64::sqrt).component_mul(&xi) * sigma;
        momenta += &aux * h;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    #[test]
    fn langevin_rejects_invalid_arguments() {
        assert!(LangevinBath::new(1.0, 1.0, 42).is_ok());
        assert!(LangevinBath::new(0.0, 0.0, 42).is_ok());
        assert!(matches!(
            LangevinBath::new(-1.0, 1.0, 42),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            LangevinBath::new(1.0, -1.0, 42),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn exp_memory_rejects_invalid_arguments() {
        assert!(ExpMemoryBath::new(1.0, 1.0, 10.0, 42).is_ok());
        assert!(ExpMemoryBath::new(-1.0, 1.0, 10.0, 42).is_err());
        assert!(ExpMemoryBath::new(1.0, -1.0, 10.0, 42).is_err());
        assert!(ExpMemoryBath::new(1.0, 1.0, -10.0, 42).is_err());
    }

    #[test]
    fn langevin_at_zero_temperature_decays_momenta_exactly() {
        let mut bath = LangevinBath::new(0.0, 2.0, 42).unwrap();
        let mut states = DMatrix::from_row_slice(2, 2, &[1.0, -3.0, 0.5, 4.0]);
        let masses = DMatrix::from_element(2, 2, 1.5);
        let dt: f64 = 0.25;

        let expected = &states * (-2.0 * dt).exp();
        let (p, z) = states.columns_range_pair_mut(0..2, 2..2);
        bath.apply_thermal(p, z, &masses, dt).unwrap();
        assert_relative_eq!(states, expected, epsilon = 1e-14);
    }

    #[test]
    fn langevin_negative_dt_is_unstable() {
        let mut bath = LangevinBath::new(1.0, 1.0, 42).unwrap();
        let mut states = DMatrix::zeros(1, 2);
        let masses = DMatrix::from_element(1, 2, 1.0);
        let (p, z) = states.columns_range_pair_mut(0..2, 2..2);
        assert!(matches!(
            bath.apply_thermal(p, z, &masses, -0.1),
            Err(Error::Unstable(_))
        ));
    }

    #[test]
    fn shape_mismatch_is_fatal() {
        let mut bath = LangevinBath::new(1.0, 1.0, 42).unwrap();
        let mut states = DMatrix::zeros(3, 2);
        let masses = DMatrix::from_element(2, 2, 1.0);
        let (p, z) = states.columns_range_pair_mut(0..2, 2..2);
        assert!(matches!(
            bath.apply_thermal(p, z, &masses, 0.1),
            Err(Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn exp_memory_requires_aux_block() {
        let mut bath = ExpMemoryBath::new(1.0, 1.0, 10.0, 42).unwrap();
        let mut states = DMatrix::zeros(2, 2);
        let masses = DMatrix::from_element(2, 2, 1.0);
        // No aux columns although the bath has one memory mode.
        let (p, z) = states.columns_range_pair_mut(0..2, 2..2);
        assert!(matches!(
            bath.apply_thermal(p, z, &masses, 0.1),
            Err(Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn exp_memory_at_zero_temperature_is_deterministic() {
        let mut bath = ExpMemoryBath::new(0.0, 0.5, 4.0, 42).unwrap();
        // One trajectory, one dof: p = 1, z = 0.2.
        let mut states = DMatrix::from_row_slice(1, 2, &[1.0, 0.2]);
        let masses = DMatrix::from_element(1, 1, 2.0);
        let dt = 0.1;

        let tau: f64 = 0.5 * 4.0;
        let s = (-dt / tau).exp();
        let mut p = 1.0;
        let mut z = 0.2;
        p += 0.5 * dt * z;
        z = s * z - (1.0 - s) * 0.5 * p;
        p += 0.5 * dt * z;

        let (pm, zm) = states.columns_range_pair_mut(0..1, 1..2);
        bath.apply_thermal(pm, zm, &masses, dt).unwrap();
        assert_relative_eq!(states[(0, 0)], p, epsilon = 1e-14);
        assert_relative_eq!(states[(0, 1)], z, epsilon = 1e-14);
    }
}
