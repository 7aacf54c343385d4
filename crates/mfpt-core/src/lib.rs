pub mod bath;
pub mod error;
pub mod noise;
pub mod state;
pub mod steppers;
pub mod system;

// Core types
pub type Time = f64;
pub type Seed = u64;

pub use error::{Error, Result};
pub use noise::NoiseGenerator;
pub use state::{partition_rows, StateLayout};

// Capability traits
pub use bath::Bath;
pub use steppers::Stepper;
pub use system::System;

// Reference implementations
pub use bath::{ExpMemoryBath, LangevinBath};
pub use steppers::{Baoab, FastBaoab, LfMiddle};

pub use system::{kinetic_energy, total_energy};
