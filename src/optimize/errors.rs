/*
MIT License

Copyright (c) 2026 The slabcor developers
*/

//! Error types for the optimization module

use thiserror::Error;

/// Result type for optimizer operations
pub type Result<T> = std::result::Result<T, OptimizeError>;

/// Optimizer-driver errors
#[derive(Error, Debug)]
pub enum OptimizeError {
    /// The optimizer rejected its configuration (bounds, budgets, constraints)
    #[error("optimizer rejected configuration: {0}")]
    Configuration(String),

    /// Model evaluation failed outside the penalized objective path
    #[error(transparent)]
    Poisson(#[from] crate::poisson::PoissonError),
}
