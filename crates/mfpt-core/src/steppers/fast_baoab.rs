use nalgebra::{DMatrix, DMatrixViewMut};

use super::{check_step, drift, eval_force, positive_step, thermal, Stepper};
use crate::bath::Bath;
use crate::error::{Error, Result};
use crate::state::{partition_rows, StateLayout};
use crate::system::System;

struct KickCache {
    dt: f64,
    /// Closing half-kick of the previous step, already scaled by `dt/2`.
    kick: DMatrix<f64>,
}

/// BAOAB with the closing half-kick cached for reuse as the next step's
/// opening half-kick, halving the force evaluations on a warm cache.
///
/// The cache is keyed on the step size and assumes the batch rows are the
/// same trajectories as last step. Row compaction must be reported through
/// [`Stepper::filter_states`]; any other out-of-band edit to positions or
/// momenta requires [`Stepper::reset`], otherwise the first kick of the
/// next step is stale. A batch whose row count disagrees with the cache is
/// rejected rather than silently recomputed.
pub struct FastBaoab {
    dt: f64,
    cache: Option<KickCache>,
}

impl FastBaoab {
    pub fn new(dt: f64) -> Result<Self> {
        Ok(Self {
            dt: positive_step(dt)?,
            cache: None,
        })
    }
}

impl Stepper for FastBaoab {
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

        let opening = match self.cache.take() {
            Some(cache) => {
                if cache.kick.nrows() != states.nrows() {
                    return Err(Error::shape(format!(
                        "cached kick covers {} trajectories but the batch has {}; \
                         report row compaction with filter_states or call reset",
                        cache.kick.nrows(),
                        states.nrows(),
                    )));
                }
                if cache.dt == dt {
                    cache.kick
                } else {
                    eval_force(system, layout, &states, *t)? * half
                }
            }
            None => eval_force(system, layout, &states, *t)? * half,
        };

        {
            let mut momenta = states.columns_range_mut(layout.momenta());
            momenta += &opening;
        }
        drift(system, layout, &mut states, half)?;
        thermal(system, bath, layout, &mut states, dt)?;
        drift(system, layout, &mut states, half)?;
        let closing = eval_force(system, layout, &states, *t + dt)? * half;
        {
            let mut momenta = states.columns_range_mut(layout.momenta());
            momenta += &closing;
        }
        self.cache = Some(KickCache { dt, kick: closing });

        *t += dt;
        Ok(())
    }

    fn filter_states(&mut self, keep: &[bool]) {
        let Some(cache) = &mut self.cache else {
            return;
        };
        if keep.len() != cache.kick.nrows() {
            self.cache = None;
            return;
        }
        // Same swap sequence the absorbing loop applies to the batch, so
        // cached kicks stay aligned with their rows.
        let kick = &mut cache.kick;
        let kept = partition_rows(keep, |i, j| kick.swap_rows(i, j));
        cache.kick = cache.kick.rows(0, kept).clone_owned();
    }

    fn reset(&mut self) {
        self.cache = None;
    }
}
