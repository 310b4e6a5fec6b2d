/*
MIT License

Copyright (c) 2026 The slabcor developers
*/

//! Error types for the Poisson module

use thiserror::Error;

/// Result type for Poisson operations
pub type Result<T> = std::result::Result<T, PoissonError>;

/// Poisson-solver errors
#[derive(Error, Debug)]
pub enum PoissonError {
    /// Input grids inconsistent with the cell context
    #[error("grid shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A dense in-mode system was singular beyond the regularized constant
    /// mode, which indicates ill-posed dielectric input
    #[error("singular system at transverse mode ({k1}, {k2}): {detail}")]
    SingularMode {
        k1: usize,
        k2: usize,
        detail: String,
    },
}
