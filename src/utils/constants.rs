/*
MIT License

Copyright (c) 2026 The slabcor developers
*/

//! Physical constants and unit conversions
//!
//! All internal math runs in atomic units (Bohr, Hartree); potentials and
//! energies are converted to eV at the comparison and reporting boundaries.

/// Bohr radius in Angstroms
pub const BOHR_RADIUS: f64 = 0.529177;

/// Conversion from Bohr to Angstroms
pub const BOHR_TO_ANGSTROM: f64 = BOHR_RADIUS;

/// Conversion from Angstroms to Bohr
pub const ANGSTROM_TO_BOHR: f64 = 1.0 / BOHR_RADIUS;

/// Rydberg energy in eV
pub const RYDBERG: f64 = 13.6057;

/// Conversion from eV to Hartree
pub const EV_TO_HARTREE: f64 = 1.0 / (2.0 * RYDBERG);

/// Conversion from Hartree to eV
pub const HARTREE_TO_EV: f64 = 2.0 * RYDBERG;
