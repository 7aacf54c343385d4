use nalgebra::{DMatrix, DMatrixView, DVector};

/// Potential/force/mass provider for one physical model.
///
/// `phase` is the `N x 2*dofs` positions+momenta block of a state batch;
/// forces may legitimately depend on momenta (e.g. centrifugal terms from
/// position-dependent effective masses), so implementations receive the
/// full phase rather than positions alone.
pub trait System: Send + Sync {
    /// Number of degrees of freedom `D`.
    fn dofs(&self) -> usize;

    /// Potential energy per trajectory (`N` entries).
    fn potential(&self, phase: DMatrixView<f64>, t: f64) -> DVector<f64>;

    /// Force (negative position-gradient of the potential) per trajectory
    /// and degree of freedom (`N x D`).
    ///
    /// Must agree with the finite-difference gradient of [`Self::potential`]
    /// to a small tolerance; a silent mismatch corrupts energy conservation.
    fn force(&self, phase: DMatrixView<f64>, t: f64) -> DMatrix<f64>;

    /// Effective diagonal masses (`N x D`), broadcastable against momenta.
    fn masses(&self, phase: DMatrixView<f64>) -> DMatrix<f64>;
}

/// Kinetic energy `sum_i p_i^2 / (2 m_i)` per trajectory.
pub fn kinetic_energy(system: &dyn System, phase: DMatrixView<f64>) -> DVector<f64> {
    let d = system.dofs();
    let p = phase.columns_range(d..2 * d);
    let m = system.masses(phase);
    (p.component_mul(&p).component_div(&m) * 0.5).column_sum()
}

/// Potential plus kinetic energy per trajectory.
pub fn total_energy(system: &dyn System, phase: DMatrixView<f64>, t: f64) -> DVector<f64> {
    system.potential(phase, t) + kinetic_energy(system, phase)
}
