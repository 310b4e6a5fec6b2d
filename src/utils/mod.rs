/*
MIT License

Copyright (c) 2026 The slabcor developers
*/

//! Shared numerical utilities: unit conversions, FFT helpers, periodic-grid
//! operations, and dense complex linear solves.

pub mod constants;
pub mod errors;
pub mod fft;
pub mod grid;
pub mod linear_algebra;

pub use errors::{Result, UtilsError};
