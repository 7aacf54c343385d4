use std::ops::Range;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::bath::Bath;
use crate::error::{Error, Result};
use crate::system::System;

/// Shape contract for one trajectory's flat state record.
///
/// A record is `[positions | momenta | aux | time?]` with `dofs` positions,
/// `dofs` momenta, `dofs * memory_modes` auxiliary bath variables, and an
/// optional trailing absolute-time entry. A batch of `N` trajectories is an
/// `N x record_len` matrix, one record per row.
///
/// `dofs` is fixed by the system and `memory_modes` by the bath; the
/// propagation entry points reject batches whose width disagrees with the
/// layout. The time column, when present, is written by the packing helpers
/// only; the engine never touches it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateLayout {
    dofs: usize,
    memory_modes: usize,
    has_time: bool,
}

impl StateLayout {
    pub fn new(dofs: usize, memory_modes: usize) -> Result<Self> {
        if dofs == 0 {
            return Err(Error::param("a state layout needs at least one degree of freedom"));
        }
        Ok(Self {
            dofs,
            memory_modes,
            has_time: false,
        })
    }

    /// Layout matching a concrete system/bath pairing.
    pub fn for_run(system: &dyn System, bath: &dyn Bath) -> Result<Self> {
        Self::new(system.dofs(), bath.memory_modes())
    }

    pub fn with_time(mut self) -> Self {
        self.has_time = true;
        self
    }

    pub fn dofs(&self) -> usize {
        self.dofs
    }

    pub fn memory_modes(&self) -> usize {
        self.memory_modes
    }

    pub fn has_time(&self) -> bool {
        self.has_time
    }

    pub fn record_len(&self) -> usize {
        2 * self.dofs + self.dofs * self.memory_modes + usize::from(self.has_time)
    }

    pub fn positions(&self) -> Range<usize> {
        0..self.dofs
    }

    pub fn momenta(&self) -> Range<usize> {
        self.dofs..2 * self.dofs
    }

    /// The positions+momenta block a [`System`] evaluates on.
    pub fn phase(&self) -> Range<usize> {
        0..2 * self.dofs
    }

    /// All auxiliary bath variables.
    pub fn aux(&self) -> Range<usize> {
        2 * self.dofs..2 * self.dofs + self.dofs * self.memory_modes
    }

    /// The auxiliary variables of one memory mode.
    pub fn aux_mode(&self, mode: usize) -> Range<usize> {
        assert!(mode < self.memory_modes, "memory mode out of range");
        let start = 2 * self.dofs + mode * self.dofs;
        start..start + self.dofs
    }

    pub fn time_index(&self) -> Option<usize> {
        self.has_time.then(|| self.record_len() - 1)
    }

    /// Check that a batch has one full record per row.
    pub fn validate_batch(&self, states: &DMatrix<f64>) -> Result<()> {
        if states.ncols() != self.record_len() {
            return Err(Error::shape(format!(
                "state records have {} entries but the layout requires {} \
                 (dofs={}, memory_modes={}, time={})",
                states.ncols(),
                self.record_len(),
                self.dofs,
                self.memory_modes,
                self.has_time,
            )));
        }
        Ok(())
    }
}

/// Partition rows so that `keep == true` rows end up in front, reporting
/// every row swap through `swap`. Returns the number of kept rows.
///
/// The swap sequence is deterministic: a front cursor advances over kept
/// rows, a back cursor retreats over dropped rows, and mismatched pairs
/// are exchanged. Callers holding per-row data alongside the state batch
/// (absorption bookkeeping, force caches) apply the identical permutation
/// by routing their swaps through the same call.
pub fn partition_rows(keep: &[bool], mut swap: impl FnMut(usize, usize)) -> usize {
    let mut first = 0;
    let mut last = keep.len();
    loop {
        loop {
            if first == last {
                return first;
            }
            if !keep[first] {
                break;
            }
            first += 1;
        }

        loop {
            last -= 1;
            if first == last {
                return first;
            }
            if keep[last] {
                break;
            }
        }

        swap(first, last);
        first += 1;
    }
}
