//! Physical models implementing [`mfpt_core::System`].

mod empty_plane;
mod harmonic;
mod lithium_cyanide;

pub use empty_plane::EmptyPlane;
pub use harmonic::HarmonicOscillator;
pub use lithium_cyanide::LithiumCyanide;
