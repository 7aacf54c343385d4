//! Ensemble construction and propagation loops on top of `mfpt-core`.
//!
//! [`propagate_to`] advances a batch to a fixed time; [`propagate_while`]
//! runs an absorbing-boundary loop that removes trajectories as they react
//! and reports per-trajectory first-passage times.

pub mod ensemble;
pub mod propagate;

pub use ensemble::{
    aux_of, maxwell_boltzmann_ensemble, momenta_of, pack_states, positions_of, times_of,
};
pub use propagate::{propagate_to, propagate_while, Control, Observer};
