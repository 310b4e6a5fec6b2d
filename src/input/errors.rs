/*
MIT License

Copyright (c) 2026 The slabcor developers
*/

//! Error types for the input module

use thiserror::Error;

/// Result type for input validation
pub type Result<T> = std::result::Result<T, InputError>;

/// Fatal parameter-bundle defects; recoverable issues are normalized with a
/// warning instead
#[derive(Error, Debug)]
pub enum InputError {
    /// Charge positions must form an N×3 matrix of fractional coordinates
    #[error("charge positions must form an N x 3 matrix, got {rows} x {cols}")]
    PositionShape { rows: usize, cols: usize },

    /// Dielectric diagonals are a scalar or a 3-vector
    #[error("dielectric tensor must have 1 or 3 diagonal components, got {0}")]
    DielectricShape(usize),

    /// Dielectric entries must be non-negative
    #[error("dielectric tensor is not defined properly: {0:?}")]
    NegativeDielectric(Vec<f64>),
}
