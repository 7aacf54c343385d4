use mfpt_core::{partition_rows, Bath, Error, Result, StateLayout, Stepper, System, Time};
use nalgebra::{DMatrix, DMatrixView};

/// Observer verdict after inspecting the batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Continue,
    Halt,
}

/// Periodic callback into a propagation loop.
///
/// Called once with the initial batch and once after every step, with the
/// currently active trajectories and the current time. Returning
/// [`Control::Halt`] stops the loop after the current step; in
/// [`propagate_while`] the trajectories that have not reacted by then keep
/// a `None` passage time.
pub struct Observer<'a> {
    callback: Option<Box<dyn FnMut(DMatrixView<f64>, Time) -> Control + Send + 'a>>,
}

impl<'a> Observer<'a> {
    /// No-op observer.
    pub fn none() -> Self {
        Self { callback: None }
    }

    pub fn new(mut observe: impl FnMut(DMatrixView<f64>, Time) + Send + 'a) -> Self {
        Self {
            callback: Some(Box::new(move |states, t| {
                observe(states, t);
                Control::Continue
            })),
        }
    }

    pub fn with_control(
        observe: impl FnMut(DMatrixView<f64>, Time) -> Control + Send + 'a,
    ) -> Self {
        Self {
            callback: Some(Box::new(observe)),
        }
    }

    fn observe(&mut self, states: DMatrixView<f64>, t: Time) -> Control {
        match &mut self.callback {
            Some(callback) => callback(states, t),
            None => Control::Continue,
        }
    }
}

impl Default for Observer<'_> {
    fn default() -> Self {
        Self::none()
    }
}

/// Undo the row permutation accumulated by repeated partitioning:
/// afterwards row `i` again holds the trajectory that started as row `i`.
fn restore_order(order: &mut [usize], states: &mut DMatrix<f64>) {
    for cycle in 0..order.len() {
        let mut current = cycle;
        while order[current] != current {
            let target = order[current];
            states.swap_rows(cycle, target);
            order[current] = current;
            current = target;
        }
    }
}

/// Propagate the whole batch from `t_start` to exactly `t_end`.
///
/// Whole steps of the stepper's nominal `dt` are taken while they fit; the
/// horizon is then closed with one shorter step, so the batch never
/// overshoots `t_end`. The observer sees the initial batch and the batch
/// after every step; [`Control::Halt`] returns early with the time reached.
#[allow(clippy::too_many_arguments)]
pub fn propagate_to(
    stepper: &mut dyn Stepper,
    bath: &mut dyn Bath,
    system: &dyn System,
    layout: &StateLayout,
    states: &mut DMatrix<f64>,
    t_start: Time,
    t_end: Time,
    observer: &mut Observer,
) -> Result<Time> {
    layout.validate_batch(states)?;
    if t_end < t_start {
        return Err(Error::param(format!(
            "final time {t_end} precedes initial time {t_start}"
        )));
    }

    let mut t = t_start;
    if observer.observe(states.as_view(), t) == Control::Halt {
        return Ok(t);
    }
    while t < t_end {
        let remaining = t_end - t;
        if remaining < stepper.dt() {
            stepper.step_by(system, bath, layout, states.as_view_mut(), &mut t, remaining)?;
            // Absorb the roundoff of the final partial step.
            t = t_end;
        } else {
            stepper.step(system, bath, layout, states.as_view_mut(), &mut t)?;
        }
        if observer.observe(states.as_view(), t) == Control::Halt {
            return Ok(t);
        }
    }
    Ok(t)
}

/// Propagate with an absorbing boundary, returning first-passage times.
///
/// `reacted` flags trajectories that have crossed into the product region;
/// it is evaluated at `t_start` (trajectories born reacted are absorbed
/// immediately at `t_start`) and after every step. Absorbed trajectories
/// are frozen at their absorption-time state and removed from the active
/// batch, so the per-step cost shrinks as the ensemble drains.
///
/// Returns one entry per input row, in input order: `Some(t)` with the
/// first step time at which the trajectory was seen reacted, or `None` if
/// the observer halted the loop first. Absorption is step-aligned; it does
/// not interpolate the crossing within a step.
#[allow(clippy::too_many_arguments)]
pub fn propagate_while(
    stepper: &mut dyn Stepper,
    bath: &mut dyn Bath,
    system: &dyn System,
    layout: &StateLayout,
    states: &mut DMatrix<f64>,
    t_start: Time,
    mut reacted: impl FnMut(DMatrixView<f64>, Time) -> Vec<bool>,
    observer: &mut Observer,
) -> Result<Vec<Option<Time>>> {
    layout.validate_batch(states)?;
    let total = states.nrows();
    let mut order: Vec<usize> = (0..total).collect();
    let mut passage: Vec<Option<Time>> = vec![None; total];
    let mut t = t_start;
    let mut active = total;

    let mut halted = observer.observe(states.rows(0, active), t) == Control::Halt;
    while !halted {
        let mask = reacted(states.rows(0, active), t);
        if mask.len() != active {
            return Err(Error::shape(format!(
                "predicate returned {} flags for {} active trajectories",
                mask.len(),
                active,
            )));
        }
        let keep: Vec<bool> = mask.iter().map(|&r| !r).collect();

        let still = partition_rows(&keep, |i, j| {
            states.swap_rows(i, j);
            order.swap(i, j);
        });
        for i in still..active {
            passage[order[i]] = Some(t);
        }

        tracing::debug!(t, active = still, absorbed = active - still, "absorbing sweep");

        if still == 0 {
            active = 0;
            break;
        }
        if still != active {
            stepper.filter_states(&keep);
        }
        active = still;

        stepper.step(system, bath, layout, states.rows_mut(0, active), &mut t)?;
        halted = observer.observe(states.rows(0, active), t) == Control::Halt;
    }
    if halted {
        tracing::debug!(remaining = active, t, "propagation halted by observer");
    }

    restore_order(&mut order, states);
    Ok(passage)
}
