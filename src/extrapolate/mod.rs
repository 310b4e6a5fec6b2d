/*
MIT License

Copyright (c) 2026 The slabcor developers
*/

//! Finite-size scaling of the model energy and the isolated-limit fit
//!
//! The optimized model is re-solved in a sequence of enlarged supercells;
//! the energies against inverse scale are then fitted with a four-parameter
//! analytic curve whose intercept is the isolated-defect energy. Every
//! scaling step builds a fresh [`CellGrid`], so no shared state needs to be
//! restored afterwards.

pub mod errors;

pub use errors::{ExtrapolateError, Result};

use crate::cell::CellGrid;
use crate::model::{dielectric_profile, model_density, model_energy, DielectricModel};
use crate::optimize::ModelVariables;
use crate::poisson;
use ndarray::Array2;
use nlopt::{Algorithm, Nlopt, Target};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Supercell scaling mode of the extrapolation sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ExtrapolationMode {
    /// Isotropic scaling of all three axes; the slab thickness is preserved
    /// by shifting the interfaces and charges along the normal axis.
    #[default]
    ThreeD,
    /// Transverse scaling only: interface and charge coordinates shrink by
    /// the scaling factor, leaving the Cartesian slab thickness unchanged.
    TwoD,
}

/// Supercell scaling plan.
#[derive(Debug, Clone, Copy)]
pub struct ExtrapolationPlan {
    /// Scaling mode (2D slab or full 3D)
    pub mode: ExtrapolationMode,
    /// Number of steps; step n uses factor `1 + step_size·(n+1)`
    pub steps: u32,
    /// Scaling increment between steps
    pub step_size: f64,
    /// Grid multiplier applied to the base grid for every step
    pub grid_multiplier: f64,
}

/// Model energies sampled across supercell scalings.
#[derive(Debug, Clone)]
pub struct ExtrapolationSamples {
    /// Inverse scaling factor per step, decreasing toward the isolated limit
    pub inverse_factors: Vec<f64>,
    /// Neutralized model energy per step, eV
    pub energies: Vec<f64>,
}

/// Sweep the supercell scaling and record the model energy at each size.
pub fn extrapolate(
    cell0: &CellGrid,
    dielectric: &DielectricModel,
    vars: &ModelVariables,
    plan: &ExtrapolationPlan,
) -> Result<ExtrapolationSamples> {
    if plan.steps < 3 {
        return Err(ExtrapolateError::Plan(format!(
            "extrapolation needs at least 3 steps, got {}",
            plan.steps
        )));
    }
    if plan.step_size <= 0.0 {
        return Err(ExtrapolateError::Plan(format!(
            "step size must be positive, got {}",
            plan.step_size
        )));
    }

    let grid0 = cell0.grid();
    let mut grid_ext = [0usize; 3];
    for axis in 0..3 {
        grid_ext[axis] = (grid0[axis] as f64 * plan.grid_multiplier).ceil() as usize;
    }
    if grid_ext.iter().any(|n| *n == 0) {
        return Err(ExtrapolateError::Plan(format!(
            "grid multiplier {} empties the grid",
            plan.grid_multiplier
        )));
    }

    let normal = cell0.normal_axis();
    let n_steps = (plan.steps - 1) as usize;
    let mut inverse_factors = Vec::with_capacity(n_steps);
    let mut energies = Vec::with_capacity(n_steps);

    for step in 0..n_steps {
        let factor = 1.0 + plan.step_size * (step + 1) as f64;
        let cell = cell0.scaled(factor, grid_ext)?;

        let (interfaces, positions) = match plan.mode {
            ExtrapolationMode::ThreeD => scale_slab(vars, normal, factor),
            ExtrapolationMode::TwoD => scale_uniform(vars, factor),
        };

        let diels = dielectric_profile(&cell, interfaces, dielectric);
        let rho = model_density(&cell, &vars.sigma, &vars.q, &positions, true);
        let potential = poisson::solve(&cell, &rho, &diels)
            .map_err(|source| ExtrapolateError::Step { step, source })?;
        let energy = model_energy(&cell, &rho, &potential);

        debug!(factor, energy, "extrapolation step");
        inverse_factors.push(1.0 / factor);
        energies.push(energy);
    }

    Ok(ExtrapolationSamples {
        inverse_factors,
        energies,
    })
}

/// 2D mode: all fractional coordinates shrink by the factor, so Cartesian
/// positions along every axis are unchanged while the cell grows.
fn scale_uniform(vars: &ModelVariables, factor: f64) -> ([f64; 2], Array2<f64>) {
    let interfaces = [vars.interfaces[0] / factor, vars.interfaces[1] / factor];
    let positions = vars.positions.mapv(|p| p / factor);
    (interfaces, positions)
}

/// 3D mode: the farther interface moves outward so the slab keeps its
/// physical thickness, and each charge keeps its Cartesian distance to its
/// original nearest interface.
fn scale_slab(vars: &ModelVariables, normal: usize, factor: f64) -> ([f64; 2], Array2<f64>) {
    let interfaces = vars.interfaces;
    let far = if interfaces[0] <= interfaces[1] { 1 } else { 0 };

    let mut shifted = interfaces;
    shifted[far] += (interfaces[0] - interfaces[1]).abs() * (factor - 1.0);
    shifted[0] /= factor;
    shifted[1] /= factor;

    let mut positions = vars.positions.mapv(|p| p / factor);
    for charge in 0..vars.positions.nrows() {
        let coordinate = vars.positions[[charge, normal]];
        let nearest = if (coordinate - interfaces[0]).abs() < (coordinate - interfaces[1]).abs() {
            0
        } else {
            1
        };
        positions[[charge, normal]] += shifted[nearest] - interfaces[nearest] / factor;
    }

    (shifted, positions)
}

/// Four-coefficient finite-size model of the energy curve,
/// `Ê(s) = c1 + c2·s + c3·s² + (c2 − M)/c4 · exp(−c4·s)`,
/// where M is the Madelung term and s the inverse scaling factor.
#[derive(Debug, Clone, Copy)]
pub struct EnergyFit {
    /// Fitted coefficients c1..c4
    pub coefficients: [f64; 4],
    /// Madelung term the curve was fitted with
    pub madelung_term: f64,
}

impl EnergyFit {
    /// Isolated-defect limit of the model energy (the s → 0 intercept).
    pub fn isolated_energy(&self) -> f64 {
        self.coefficients[0]
    }

    /// Evaluate the fitted curve at inverse scale `s`.
    pub fn evaluate(&self, s: f64) -> f64 {
        let [c1, c2, c3, c4] = self.coefficients;
        c1 + c2 * s + c3 * s * s + (c2 - self.madelung_term) / c4 * (-c4 * s).exp()
    }
}

/// Fit the finite-size energy curve with COBYLA from the canonical (1,1,1,1)
/// starting point, minimizing the sum of squared residuals.
pub fn fit_energy_curve(
    samples: &ExtrapolationSamples,
    madelung_term: f64,
    tolerance: f64,
) -> Result<EnergyFit> {
    if samples.inverse_factors.len() != samples.energies.len() || samples.energies.is_empty() {
        return Err(ExtrapolateError::Fit(format!(
            "inconsistent samples: {} sizes vs {} energies",
            samples.inverse_factors.len(),
            samples.energies.len()
        )));
    }

    let sizes = samples.inverse_factors.clone();
    let energies = samples.energies.clone();
    let objective = move |c: &[f64], _gradient: Option<&mut [f64]>, _data: &mut ()| -> f64 {
        if c[3].abs() < 1e-12 {
            // the exponential term degenerates; steer the optimizer away
            return 1e300;
        }
        sizes
            .iter()
            .zip(energies.iter())
            .map(|(&s, &e)| {
                let model =
                    c[0] + c[1] * s + c[2] * s * s + (c[1] - madelung_term) / c[3] * (-c[3] * s).exp();
                (e - model) * (e - model)
            })
            .sum()
    };

    let mut opt = Nlopt::new(Algorithm::Cobyla, 4, objective, Target::Minimize, ());
    opt.set_xtol_rel(tolerance)
        .map_err(|fail| ExtrapolateError::Fit(format!("{fail:?}")))?;

    let mut coefficients = vec![1.0; 4];
    match opt.optimize(&mut coefficients) {
        Ok((_, residual)) => debug!(residual, "energy-curve fit finished"),
        Err((fail, _)) => warn!("nonlinear energy fit did not converge cleanly: {fail:?}"),
    }

    Ok(EnergyFit {
        coefficients: [
            coefficients[0],
            coefficients[1],
            coefficients[2],
            coefficients[3],
        ],
        madelung_term,
    })
}
