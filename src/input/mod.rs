/*
MIT License

Copyright (c) 2026 The slabcor developers
*/

//! Model parameters and input validation
//!
//! [`Parameters`] mirrors the public configuration keys one-to-one and is
//! serde-derivable, so any configuration frontend (INI, TOML, JSON) can
//! produce it. [`Parameters::validated`] normalizes the bundle into the
//! canonical form the rest of the crate assumes: recoverable defects are
//! fixed with a warning, fatal ones are typed errors for the shell to
//! report.

pub mod errors;

pub use errors::{InputError, Result};

use crate::extrapolate::ExtrapolationMode;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Derivative-free optimizer selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OptAlgorithm {
    /// Linear-approximation trust region with constraint support
    #[default]
    Cobyla,
    /// Quadratic trust region, unconstrained (single charge only)
    Bobyqa,
}

impl OptAlgorithm {
    /// Parse a configuration string, falling back to COBYLA with a warning
    /// for unrecognized names.
    pub fn parse_lossy(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "COBYLA" => OptAlgorithm::Cobyla,
            "BOBYQA" => OptAlgorithm::Bobyqa,
            other => {
                warn!("unknown optimization algorithm {other:?}, using COBYLA instead");
                OptAlgorithm::Cobyla
            }
        }
    }
}

/// Model parameter bundle, mirroring the public configuration keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Fractional charge positions, one row per Gaussian
    pub charge_position: Array2<f64>,
    /// Fraction of the total defect charge carried by each Gaussian
    pub charge_fraction: Vec<f64>,
    /// Gaussian widths in Bohr
    pub charge_sigma: Vec<f64>,
    /// Fractional interface positions along the normal axis
    pub interfaces: [f64; 2],
    /// Dielectric diagonal inside the slab (scalar or 3-vector)
    pub diel_in: Vec<f64>,
    /// Dielectric diagonal outside the slab (scalar or 3-vector)
    pub diel_out: Vec<f64>,
    /// erf smoothing width of the dielectric interfaces, Bohr
    pub diel_taper: f64,
    /// Let the optimizer vary charge widths, fractions, and positions
    pub optimize_charge: bool,
    /// Let the optimizer vary the interface positions
    pub optimize_interfaces: bool,
    /// Derivative-free algorithm for the parameter fit
    pub optimize_algorithm: OptAlgorithm,
    /// Relative-x convergence tolerance of the optimizer
    pub optimize_tolerance: f64,
    /// Evaluation budget of the optimizer (0 = unlimited)
    pub optimize_maxsteps: u32,
    /// Wall-clock budget of the optimizer in seconds (0 = unlimited)
    pub optimize_maxtime: u32,
    /// Grid multiplier for the optimization stage
    pub optimize_grid_x: f64,
    /// Grid multiplier for the extrapolation stage
    pub extrapolate_grid_x: f64,
    /// Number of extrapolation steps (at least 3)
    pub extrapolate_steps_number: u32,
    /// Scaling increment between extrapolation steps
    pub extrapolate_steps_size: f64,
    /// Supercell scaling mode of the extrapolation sweep
    pub extrapolation_mode: ExtrapolationMode,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            charge_position: Array2::from_elem((1, 3), 0.5),
            charge_fraction: vec![1.0],
            charge_sigma: vec![1.0],
            interfaces: [0.25, 0.75],
            diel_in: vec![1.0],
            diel_out: vec![1.0],
            diel_taper: 1.0,
            optimize_charge: true,
            optimize_interfaces: true,
            optimize_algorithm: OptAlgorithm::default(),
            optimize_tolerance: 1e-3,
            optimize_maxsteps: 0,
            optimize_maxtime: 0,
            optimize_grid_x: 0.8,
            extrapolate_grid_x: 1.0,
            extrapolate_steps_number: 4,
            extrapolate_steps_size: 0.5,
            extrapolation_mode: ExtrapolationMode::default(),
        }
    }
}

impl Parameters {
    /// Normalize the bundle into canonical form.
    ///
    /// Sign-only defects are absolute-valued, interfaces are wrapped into
    /// [0, 1), scalar dielectrics are expanded to diagonals, and mismatched
    /// per-charge array lengths fall back to defaults, all with a warning.
    /// A malformed position matrix or a negative dielectric entry is fatal.
    pub fn validated(mut self) -> Result<Parameters> {
        if self.charge_position.ncols() != 3 {
            return Err(InputError::PositionShape {
                rows: self.charge_position.nrows(),
                cols: self.charge_position.ncols(),
            });
        }
        let n_charges = self.charge_position.nrows();

        for sigma in &mut self.charge_sigma {
            *sigma = sigma.abs();
        }
        self.diel_taper = self.diel_taper.abs();
        self.optimize_tolerance = self.optimize_tolerance.abs();
        self.optimize_grid_x = self.optimize_grid_x.abs();
        self.extrapolate_grid_x = self.extrapolate_grid_x.abs();
        self.extrapolate_steps_size = self.extrapolate_steps_size.abs();
        for interface in &mut self.interfaces {
            *interface = interface.rem_euclid(1.0);
        }

        self.diel_in = expand_dielectric(self.diel_in)?;
        self.diel_out = expand_dielectric(self.diel_out)?;

        if self.optimize_tolerance > 1.0 {
            self.optimize_tolerance = 1e-3;
            warn!(
                "optimization tolerance is not defined properly, \
                 using optimize_tolerance={}",
                self.optimize_tolerance
            );
        }

        if self.charge_sigma.len() != n_charges {
            self.charge_sigma = vec![1.0; n_charges];
            warn!(
                "number of charge_sigma entries does not match the number of charges, \
                 using sigma=1 for all of them"
            );
        }
        if self.charge_fraction.len() != self.charge_sigma.len() {
            self.charge_fraction = vec![1.0; n_charges];
            warn!(
                "number of charge_fraction entries does not match charge_sigma, \
                 equal charge fractions will be assumed"
            );
        }

        if self.extrapolate_steps_number < 3 {
            warn!("extrapolation cannot be done with fewer than 3 steps");
            self.extrapolate_steps_number = 3;
        }

        Ok(self)
    }

    /// In-slab dielectric diagonal as a fixed 3-vector; call after
    /// [`Parameters::validated`].
    pub fn diel_in_tensor(&self) -> [f64; 3] {
        diagonal3(&self.diel_in)
    }

    /// Out-of-slab dielectric diagonal as a fixed 3-vector; call after
    /// [`Parameters::validated`].
    pub fn diel_out_tensor(&self) -> [f64; 3] {
        diagonal3(&self.diel_out)
    }
}

/// Expand a scalar dielectric to a diagonal and reject negative entries.
fn expand_dielectric(diel: Vec<f64>) -> Result<Vec<f64>> {
    let expanded = match diel.len() {
        1 => vec![diel[0]; 3],
        3 => diel,
        n => return Err(InputError::DielectricShape(n)),
    };
    if expanded.iter().any(|v| *v < 0.0) {
        return Err(InputError::NegativeDielectric(expanded));
    }
    Ok(expanded)
}

/// Collapse a validated 1- or 3-component diagonal into a 3-vector.
fn diagonal3(values: &[f64]) -> [f64; 3] {
    match values {
        [s] => [*s, *s, *s],
        [x, y, z] => [*x, *y, *z],
        _ => [1.0, 1.0, 1.0],
    }
}
