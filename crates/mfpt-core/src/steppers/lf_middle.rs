use nalgebra::DMatrixViewMut;

use super::{check_step, drift, eval_force, kick, positive_step, thermal, Stepper};
use crate::bath::Bath;
use crate::error::Result;
use crate::state::StateLayout;
use crate::system::System;

/// Leapfrog-middle scheme: B(dt) A(dt/2) O(dt) A(dt/2).
///
/// One force evaluation per step with no cross-step caching, so the batch
/// may be edited freely between steps. Configurational averages carry a
/// larger step-size bias than BAOAB's at equal `dt`.
pub struct LfMiddle {
    dt: f64,
}

impl LfMiddle {
    pub fn new(dt: f64) -> Result<Self> {
        Ok(Self {
            dt: positive_step(dt)?,
        })
    }
}

impl Stepper for LfMiddle {
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
        kick(layout, &mut states, &force, dt);
        drift(system, layout, &mut states, half)?;
        thermal(system, bath, layout, &mut states, dt)?;
        drift(system, layout, &mut states, half)?;

        *t += dt;
        Ok(())
    }
}
