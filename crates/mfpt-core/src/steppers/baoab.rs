use nalgebra::DMatrixViewMut;

use super::{check_step, drift, eval_force, kick, positive_step, thermal, Stepper};
use crate::bath::Bath;
use crate::error::Result;
use crate::state::StateLayout;
use crate::system::System;

/// The BAOAB splitting of Leimkuhler and Matthews.
///
/// Sub-step order is B(dt/2) A(dt/2) O(dt) A(dt/2) B(dt/2). Forces can
/// depend on momenta (centrifugal terms), so the closing half-kick cannot
/// reuse the opening one; BAOAB evaluates the force twice per step. See
/// [`FastBaoab`](super::FastBaoab) for the cached single-evaluation
/// variant, valid when consecutive steps share the same batch.
pub struct Baoab {
    dt: f64,
}

impl Baoab {
    pub fn new(dt: f64) -> Result<Self> {
        Ok(Self {
            dt: positive_step(dt)?,
        })
    }
}

impl Stepper for Baoab {
    fn dt(&self) -> f64 {
        self.dt
    }

    fn step_by(
        &mut self,
        system: &dyn System,
        bath: &mut dyn Bath,
        layout: &StateLayout,
        mut states: DMatrixViewMut<f64>,
        t: &mut f64,
        dt: f64,
    ) -> Result<()> {
        check_step(layout, &states, dt)?;
        let half = 0.5 * dt;

        let force = eval_force(system, layout, &states, *t)?;
        kick(layout, &mut states, &force, half);
        drift(system, layout, &mut states, half)?;
        thermal(system, bath, layout, &mut states, dt)?;
        drift(system, layout, &mut states, half)?;
        let force = eval_force(system, layout, &states, *t + dt)?;
        kick(layout, &mut states, &force, half);

        *t += dt;
        Ok(())
    }
}
