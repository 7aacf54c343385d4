use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type shared by the propagation core.
///
/// None of these are retried internally; a stochastic integrator cannot
/// silently redo a step without biasing the statistics. Every failure
/// surfaces synchronously from the propagation entry points.
#[derive(Debug, Error)]
pub enum Error {
    /// System, bath, ensemble, or callback disagree on the number of
    /// degrees of freedom, memory modes, or batch size.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Invalid construction or call parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A friction/step-size combination drove the exact Ornstein-Uhlenbeck
    /// update outside its valid domain (e.g. negative noise variance).
    #[error("numerical instability: {0}")]
    Unstable(String),
}

impl Error {
    pub fn shape(msg: impl Into<String>) -> Self {
        Error::ShapeMismatch(msg.into())
    }

    pub fn param(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_informative() {
        let e = Error::shape("momenta are 3x2 but masses are 2x2");
        let msg = format!("{e}");
        assert!(msg.contains("shape mismatch"));
        assert!(msg.contains("momenta"));

        let e = Error::param("friction must be >= 0");
        assert!(format!("{e}").contains("invalid parameter"));
    }
}
