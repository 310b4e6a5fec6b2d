/*
MIT License

Copyright (c) 2026 The slabcor developers
*/

//! The Gaussian-charge-in-layered-dielectric model
//!
//! A localized defect charge is approximated by a sum of isotropic Gaussians
//! embedded in a dielectric medium that blends smoothly between an in-slab
//! and an out-of-slab tensor across the two interfaces.

mod charge;
mod dielectric;

pub use charge::{gaussian_density, model_density, model_energy};
pub use dielectric::dielectric_profile;

/// Two-region dielectric description of the slab.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DielectricModel {
    /// Tensor diagonal between the (sorted) interfaces.
    pub diel_in: [f64; 3],
    /// Tensor diagonal outside the interfaces.
    pub diel_out: [f64; 3],
    /// erf blending width at the interfaces, Bohr.
    pub taper: f64,
}
