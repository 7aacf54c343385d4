//! Splitting integrators for thermostatted Hamiltonian dynamics.
//!
//! Every stepper decomposes one time step into kick (B), drift (A), and
//! thermal (O) sub-steps and differs only in their order and in how often
//! the force is evaluated. All of them mutate an `N x record_len` batch in
//! place and advance the shared clock.

mod baoab;
mod fast_baoab;
mod lf_middle;

pub use baoab::Baoab;
pub use fast_baoab::FastBaoab;
pub use lf_middle::LfMiddle;

use nalgebra::{DMatrix, DMatrixViewMut};

use crate::bath::Bath;
use crate::error::{Error, Result};
use crate::state::StateLayout;
use crate::system::System;

pub trait Stepper: Send {
    /// Nominal step size configured at construction.
    fn dt(&self) -> f64;

    /// Advance the batch by one nominal step.
    fn step(
        &mut self,
        system: &dyn System,
        bath: &mut dyn Bath,
        layout: &StateLayout,
        states: DMatrixViewMut<f64>,
        t: &mut f64,
    ) -> Result<()> {
        let dt = self.dt();
        self.step_by(system, bath, layout, states, t, dt)
    }

    /// Advance the batch by an explicit step size (used for the final
    /// partial step of a fixed-horizon propagation).
    fn step_by(
        &mut self,
        system: &dyn System,
        bath: &mut dyn Bath,
        layout: &StateLayout,
        states: DMatrixViewMut<f64>,
        t: &mut f64,
        dt: f64,
    ) -> Result<()>;

    /// Tell the stepper that rows were compacted: `keep[i]` is whether row
    /// `i` of the previous batch survives. Steppers with per-row caches
    /// must apply the same compaction; stateless steppers ignore it.
    fn filter_states(&mut self, keep: &[bool]) {
        let _ = keep;
    }

    /// Drop any cached per-batch data (after out-of-band state edits).
    fn reset(&mut self) {}
}

fn positive_step(dt: f64) -> Result<f64> {
    if dt.is_finite() && dt > 0.0 {
        Ok(dt)
    } else {
        Err(Error::param(format!(
            "step size must be positive and finite, got {dt}"
        )))
    }
}

fn check_step(layout: &StateLayout, states: &DMatrixViewMut<f64>, dt: f64) -> Result<f64> {
    if states.ncols() != layout.record_len() {
        return Err(Error::shape(format!(
            "state records have {} entries but the layout requires {}",
            states.ncols(),
            layout.record_len(),
        )));
    }
    positive_step(dt)
}

fn eval_force(
    system: &dyn System,
    layout: &StateLayout,
    states: &DMatrixViewMut<f64>,
    t: f64,
) -> Result<DMatrix<f64>> {
    let phase = states.columns_range(layout.phase());
    let force = system.force(phase, t);
    if force.shape() != (states.nrows(), layout.dofs()) {
        return Err(Error::shape(format!(
            "system produced a {}x{} force for a batch of {} trajectories with {} dofs",
            force.nrows(),
            force.ncols(),
            states.nrows(),
            layout.dofs(),
        )));
    }
    Ok(force)
}

fn eval_masses(
    system: &dyn System,
    layout: &StateLayout,
    states: &DMatrixViewMut<f64>,
) -> Result<DMatrix<f64>> {
    let phase = states.columns_range(layout.phase());
    let masses = system.masses(phase);
    if masses.shape() != (states.nrows(), layout.dofs()) {
        return Err(Error::shape(format!(
            "system produced {}x{} masses for a batch of {} trajectories with {} dofs",
            masses.nrows(),
            masses.ncols(),
            states.nrows(),
            layout.dofs(),
        )));
    }
    Ok(masses)
}

/// B sub-step: `p += dt F`.
fn kick(layout: &StateLayout, states: &mut DMatrixViewMut<f64>, force: &DMatrix<f64>, dt: f64) {
    let mut momenta = states.columns_range_mut(layout.momenta());
    momenta += force * dt;
}

/// A sub-step: `q += dt p / m`, masses evaluated at the current state.
fn drift(
    system: &dyn System,
    layout: &StateLayout,
    states: &mut DMatrixViewMut<f64>,
    dt: f64,
) -> Result<()> {
    let masses = eval_masses(system, layout, states)?;
    let (mut positions, momenta) =
        states.columns_range_pair_mut(layout.positions(), layout.momenta());
    positions += momenta.component_div(&masses) * dt;
    Ok(())
}

/// O sub-step: hand the momenta and aux blocks to the bath.
fn thermal(
    system: &dyn System,
    bath: &mut dyn Bath,
    layout: &StateLayout,
    states: &mut DMatrixViewMut<f64>,
    dt: f64,
) -> Result<()> {
    let masses = eval_masses(system, layout, states)?;
    let (momenta, aux) = states.columns_range_pair_mut(layout.momenta(), layout.aux());
    bath.apply_thermal(momenta, aux, &masses, dt)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use nalgebra::{DMatrix, DMatrixView, DMatrixViewMut, DVector};

    use crate::bath::Bath;
    use crate::error::Result;
    use crate::system::System;

    /// Harmonic well `V = k/2 |q|^2` with unit masses and a force-call
    /// counter, so cache-reuse behavior is observable.
    pub struct CountedWell {
        pub dofs: usize,
        pub stiffness: f64,
        pub force_calls: AtomicUsize,
    }

    impl CountedWell {
        pub fn new(dofs: usize, stiffness: f64) -> Self {
            Self {
                dofs,
                stiffness,
                force_calls: AtomicUsize::new(0),
            }
        }

        pub fn force_calls(&self) -> usize {
            self.force_calls.load(Ordering::Relaxed)
        }
    }

    impl System for CountedWell {
        fn dofs(&self) -> usize {
            self.dofs
        }

        fn potential(&self, phase: DMatrixView<f64>, _t: f64) -> DVector<f64> {
            let q = phase.columns_range(0..self.dofs);
            q.component_mul(&q).column_sum() * (0.5 * self.stiffness)
        }

        fn force(&self, phase: DMatrixView<f64>, _t: f64) -> DMatrix<f64> {
            self.force_calls.fetch_add(1, Ordering::Relaxed);
            phase.columns_range(0..self.dofs) * -self.stiffness
        }

        fn masses(&self, phase: DMatrixView<f64>) -> DMatrix<f64> {
            DMatrix::from_element(phase.nrows(), self.dofs, 1.0)
        }
    }

    /// Bath that leaves momenta untouched (pure Hamiltonian sub-steps).
    pub struct NullBath;

    impl Bath for NullBath {
        fn apply_thermal(
            &mut self,
            _momenta: DMatrixViewMut<f64>,
            _aux: DMatrixViewMut<f64>,
            _masses: &DMatrix<f64>,
            _dt: f64,
        ) -> Result<()> {
            Ok(())
        }
    }
}
