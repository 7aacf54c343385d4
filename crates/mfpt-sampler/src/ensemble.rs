use mfpt_core::{Error, NoiseGenerator, Result, Seed, StateLayout, System};
use nalgebra::{DMatrix, DMatrixView, DVectorView};
use rayon::prelude::*;

/// Assemble a state batch from per-trajectory positions and momenta.
///
/// Missing momenta default to zero (a cold start), auxiliary bath
/// variables always start at zero, and `time` fills the trailing time
/// column of layouts that carry one. Passing a time for a layout without a
/// time column is an error.
pub fn pack_states(
    layout: &StateLayout,
    positions: &DMatrix<f64>,
    momenta: Option<&DMatrix<f64>>,
    time: Option<f64>,
) -> Result<DMatrix<f64>> {
    if positions.ncols() != layout.dofs() {
        return Err(Error::shape(format!(
            "positions have {} columns but the layout has {} degrees of freedom",
            positions.ncols(),
            layout.dofs(),
        )));
    }
    if let Some(p) = momenta {
        if p.shape() != positions.shape() {
            return Err(Error::shape(format!(
                "momenta are {}x{} but positions are {}x{}",
                p.nrows(),
                p.ncols(),
                positions.nrows(),
                positions.ncols(),
            )));
        }
    }
    if time.is_some() && !layout.has_time() {
        return Err(Error::param(
            "an initial time was given but the layout has no time column",
        ));
    }

    let mut states = DMatrix::zeros(positions.nrows(), layout.record_len());
    states
        .columns_range_mut(layout.positions())
        .copy_from(positions);
    if let Some(p) = momenta {
        states.columns_range_mut(layout.momenta()).copy_from(p);
    }
    if let (Some(t), Some(index)) = (time, layout.time_index()) {
        states.column_mut(index).fill(t);
    }
    Ok(states)
}

pub fn positions_of<'a>(layout: &StateLayout, states: &'a DMatrix<f64>) -> DMatrixView<'a, f64> {
    states.columns_range(layout.positions())
}

pub fn momenta_of<'a>(layout: &StateLayout, states: &'a DMatrix<f64>) -> DMatrixView<'a, f64> {
    states.columns_range(layout.momenta())
}

pub fn aux_of<'a>(layout: &StateLayout, states: &'a DMatrix<f64>) -> DMatrixView<'a, f64> {
    states.columns_range(layout.aux())
}

pub fn times_of<'a>(
    layout: &StateLayout,
    states: &'a DMatrix<f64>,
) -> Option<DVectorView<'a, f64>> {
    layout.time_index().map(|index| states.column(index))
}

/// Build a batch with the given positions and momenta drawn from the
/// Maxwell-Boltzmann distribution at temperature `kb_t`, one independent
/// noise sub-stream per trajectory.
///
/// Masses are evaluated at the cold-start state, so position-dependent
/// masses see the correct geometry. The result is bitwise reproducible for
/// a fixed seed, independent of the number of worker threads.
pub fn maxwell_boltzmann_ensemble(
    system: &dyn System,
    layout: &StateLayout,
    kb_t: f64,
    positions: &DMatrix<f64>,
    seed: Seed,
) -> Result<DMatrix<f64>> {
    if kb_t < 0.0 {
        return Err(Error::param("the temperature kb_t must be >= 0"));
    }
    if system.dofs() != layout.dofs() {
        return Err(Error::shape(format!(
            "system has {} degrees of freedom but the layout has {}",
            system.dofs(),
            layout.dofs(),
        )));
    }

    let mut states = pack_states(layout, positions, None, None)?;
    let masses = system.masses(states.columns_range(layout.phase()));

    let dofs = layout.dofs();
    let momenta: Vec<Vec<f64>> = (0..states.nrows())
        .into_par_iter()
        .map(|i| {
            let mut rng = NoiseGenerator::from_trajectory_id(seed, i as u64);
            (0..dofs)
                .map(|j| (masses[(i, j)] * kb_t).sqrt() * rng.sample())
                .collect()
        })
        .collect();

    for (i, row) in momenta.iter().enumerate() {
        for (j, &p) in row.iter().enumerate() {
            states[(i, dofs + j)] = p;
        }
    }
    Ok(states)
}
