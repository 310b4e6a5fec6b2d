/*
MIT License

Copyright (c) 2026 The slabcor developers
*/

//! Error types for the utils module

use thiserror::Error;

/// Errors that can occur in the utils module
#[derive(Error, Debug)]
pub enum UtilsError {
    /// Linear algebra errors (shape mismatches, singular systems)
    #[error("Linear algebra error: {0}")]
    LinearAlgebra(String),

    /// Grid manipulation errors
    #[error("Grid error: {0}")]
    Grid(String),
}

/// A specialized Result type for utils operations
pub type Result<T> = std::result::Result<T, UtilsError>;
