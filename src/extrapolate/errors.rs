/*
MIT License

Copyright (c) 2026 The slabcor developers
*/

//! Error types for the extrapolation module

use thiserror::Error;

/// Result type for extrapolation operations
pub type Result<T> = std::result::Result<T, ExtrapolateError>;

/// Extrapolation and fitting errors
#[derive(Error, Debug)]
pub enum ExtrapolateError {
    /// The scaling plan is unusable (too few steps, zero step size or grid)
    #[error("invalid scaling plan: {0}")]
    Plan(String),

    /// A scaled cell context could not be constructed
    #[error(transparent)]
    Cell(#[from] crate::cell::CellError),

    /// The Poisson solve failed at one of the scaling steps
    #[error("Poisson solve failed at scaling step {step}: {source}")]
    Step {
        step: usize,
        source: crate::poisson::PoissonError,
    },

    /// The energy-curve fit could not be set up
    #[error("energy-curve fit failed: {0}")]
    Fit(String),
}
