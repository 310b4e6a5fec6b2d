/*
MIT License

Copyright (c) 2026 The slabcor developers
*/

//! # slabcor
//!
//! Electrostatic finite-size corrections for charged point defects in slab
//! supercells.
//!
//! A charged defect computed under 3D periodic boundary conditions carries a
//! spurious interaction with its own images. This crate models the localized
//! defect charge as a sum of Gaussians embedded in an anisotropic dielectric
//! medium that blends smoothly between the slab and the vacuum, fits the
//! model against the reference defect potential, and extrapolates the model
//! energy to the isolated limit to obtain the correction term.
//!
//! The pipeline, exposed as [`run_correction`]:
//!
//! 1. validate and normalize the parameter bundle ([`input`]),
//! 2. fit interface positions and per-Gaussian widths, charges, and centers
//!    with a derivative-free optimizer ([`optimize`]), each evaluation
//!    solving an anisotropic Poisson equation ([`poisson`]) for the model
//!    density ([`model`]),
//! 3. sweep enlarged supercells and fit the energy-versus-inverse-size curve
//!    to recover the isolated-defect energy ([`extrapolate`]).
//!
//! File-format parsing, axis reorientation, planar averaging, and the CLI
//! shell live with collaborating crates; this library works on grids, a
//! [`cell::CellGrid`], and a [`input::Parameters`] bundle, all in atomic
//! units with eV at the reporting boundary.

pub mod cell;
pub mod extrapolate;
pub mod input;
pub mod model;
pub mod optimize;
pub mod poisson;
pub mod utils;

use cell::CellGrid;
use extrapolate::{EnergyFit, ExtrapolationPlan, ExtrapolationSamples};
use model::DielectricModel;
use ndarray::Array3;
use optimize::{ModelVariables, OptimizeOptions, OptimizeOutcome};
use tracing::{info, warn};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything the correction pipeline produces.
#[derive(Debug)]
pub struct CorrectionReport {
    /// Model variables accepted by the optimizer
    pub variables: optimize::ModelVariables,
    /// Final model state (dielectric profile, density, potential, error)
    pub state: optimize::ModelState,
    /// Mean squared potential error of the first optimizer evaluation
    pub initial_mse: f64,
    /// Final mean squared potential error
    pub mse: f64,
    /// Sampled (1/factor, energy) curve of the scaling sweep
    pub samples: ExtrapolationSamples,
    /// Fitted finite-size energy curve
    pub fit: EnergyFit,
    /// Model energy in the periodic cell at scale 1, eV
    pub periodic_energy: f64,
    /// Isolated-limit model energy (fit intercept), eV
    pub isolated_energy: f64,
    /// Correction energy (isolated − periodic), eV
    pub correction_energy: f64,
}

/// Run the full correction pipeline.
///
/// `defect_potential` is the charged-minus-neutral potential difference in
/// eV and `defect_charge` the corresponding charge-density difference in
/// electrons/Bohr³, both on the cell grid. The total defect charge is
/// integrated from `defect_charge` and split over the Gaussians according to
/// `charge_fraction`. `madelung_term` is the Madelung constant of the
/// supercell supplied by the caller.
pub fn run_correction(
    parameters: input::Parameters,
    cell: &CellGrid,
    defect_potential: &Array3<f64>,
    defect_charge: &Array3<f64>,
    madelung_term: f64,
) -> anyhow::Result<CorrectionReport> {
    let parameters = parameters.validated()?;
    let dielectric = DielectricModel {
        diel_in: parameters.diel_in_tensor(),
        diel_out: parameters.diel_out_tensor(),
        taper: parameters.diel_taper,
    };

    let total_charge = utils::grid::integrate(defect_charge, cell);
    info!(total_charge, "reference grids ingested");

    let variables = ModelVariables {
        interfaces: parameters.interfaces,
        sigma: parameters.charge_sigma.clone(),
        q: parameters
            .charge_fraction
            .iter()
            .map(|fraction| fraction * total_charge)
            .collect(),
        positions: parameters.charge_position.clone(),
    };

    let options = OptimizeOptions {
        algorithm: parameters.optimize_algorithm,
        tolerance: parameters.optimize_tolerance,
        max_eval: parameters.optimize_maxsteps,
        max_time_s: parameters.optimize_maxtime,
        optimize_charge: parameters.optimize_charge,
        optimize_interfaces: parameters.optimize_interfaces,
    };

    info!("fitting the model against the reference potential");
    let outcome = optimize_with_grid_multiplier(
        cell,
        &dielectric,
        defect_potential,
        variables,
        &options,
        parameters.optimize_grid_x,
    )?;

    if outcome.mse > outcome.initial_mse {
        warn!(
            initial_mse = outcome.initial_mse,
            final_mse = outcome.mse,
            "optimization did not improve on the starting parameters"
        );
    }

    // Periodic model energy at scale 1, from the neutralized density
    let density = model::model_density(
        cell,
        &outcome.variables.sigma,
        &outcome.variables.q,
        &outcome.variables.positions,
        true,
    );
    let diels = model::dielectric_profile(cell, outcome.variables.interfaces, &dielectric);
    let potential = poisson::solve(cell, &density, &diels)?;
    let periodic_energy = model::model_energy(cell, &density, &potential);

    info!(periodic_energy, "extrapolating toward the isolated limit");
    let plan = ExtrapolationPlan {
        mode: parameters.extrapolation_mode,
        steps: parameters.extrapolate_steps_number,
        step_size: parameters.extrapolate_steps_size,
        grid_multiplier: parameters.extrapolate_grid_x,
    };
    let samples = extrapolate::extrapolate(cell, &dielectric, &outcome.variables, &plan)?;
    let fit = extrapolate::fit_energy_curve(&samples, madelung_term, parameters.optimize_tolerance)?;

    let isolated_energy = fit.isolated_energy();
    let correction_energy = isolated_energy - periodic_energy;
    info!(
        isolated_energy,
        correction_energy, "correction pipeline finished"
    );

    Ok(CorrectionReport {
        initial_mse: outcome.initial_mse,
        mse: outcome.mse,
        variables: outcome.variables,
        state: outcome.state,
        samples,
        fit,
        periodic_energy,
        isolated_energy,
        correction_energy,
    })
}

/// Run the parameter fit, optionally on a resampled grid.
///
/// With a grid multiplier other than 1 the optimization runs on a coarser
/// (or finer) sampling of the reference potential, and the accepted
/// parameters are re-evaluated on the full grid afterwards.
fn optimize_with_grid_multiplier(
    cell: &CellGrid,
    dielectric: &DielectricModel,
    reference: &Array3<f64>,
    variables: ModelVariables,
    options: &OptimizeOptions,
    grid_multiplier: f64,
) -> anyhow::Result<OptimizeOutcome> {
    let full_grid = cell.grid();
    let mut scaled_grid = [0usize; 3];
    for axis in 0..3 {
        scaled_grid[axis] = (full_grid[axis] as f64 * grid_multiplier).ceil() as usize;
    }

    if grid_multiplier <= 0.0 || scaled_grid == full_grid {
        return Ok(optimize::optimize_model(
            cell,
            dielectric,
            reference,
            variables,
            options,
        )?);
    }

    info!(?scaled_grid, "optimizing on a resampled grid");
    let scaled_cell = CellGrid::new(cell.lengths(), scaled_grid, cell.normal_axis())?;
    let scaled_reference = utils::grid::resample_periodic(reference, scaled_grid);
    let coarse = optimize::optimize_model(
        &scaled_cell,
        dielectric,
        &scaled_reference,
        variables,
        options,
    )?;

    // Accepted parameters, re-evaluated on the full grid
    let state = optimize::evaluate_model(cell, dielectric, &coarse.variables, reference)?;
    Ok(OptimizeOutcome {
        mse: state.mse,
        initial_mse: coarse.initial_mse,
        evaluations: coarse.evaluations,
        variables: coarse.variables,
        state,
    })
}
