/*
MIT License

Copyright (c) 2026 The slabcor developers
*/

//! Derivative-free fitting of the model parameters
//!
//! The optimizer varies interface positions and per-Gaussian widths,
//! charges, and centers to minimize the mean-squared error between the model
//! potential and the reference defect potential. Variables travel through a
//! flat vector whose indexing is owned by [`PackLayout`]; bounds, the
//! total-charge constraint, and the single-charge pinning rule are all
//! derived from that one layout.

pub mod errors;

pub use errors::{OptimizeError, Result};

use crate::cell::CellGrid;
use crate::input::OptAlgorithm;
use crate::model::{dielectric_profile, model_density, DielectricModel};
use crate::poisson;
use crate::utils::constants::HARTREE_TO_EV;
use ndarray::{Array2, Array3, Zip};
use nlopt::{Algorithm, FailState, Nlopt, SuccessState, Target};
use num_complex::Complex64;
use std::cell::RefCell;
use tracing::{debug, info, warn};

/// Sentinel marking "no evaluation recorded yet".
const UNSET_MSE: f64 = -1.0;
/// Finite penalty returned to the optimizer when an evaluation fails; keeps
/// the optimizer well-behaved where NaN would derail it.
const EVAL_PENALTY: f64 = 1e30;
/// Tolerance of the total-charge equality constraint.
const CHARGE_CONSTRAINT_TOL: f64 = 1e-8;

/// Free variables of the model, rewritten in place by the optimizer.
#[derive(Debug, Clone)]
pub struct ModelVariables {
    /// Fractional interface positions along the normal axis
    pub interfaces: [f64; 2],
    /// Gaussian widths, Bohr
    pub sigma: Vec<f64>,
    /// Gaussian charges; their sum is the conserved total defect charge
    pub q: Vec<f64>,
    /// Fractional charge positions, one row per Gaussian
    pub positions: Array2<f64>,
}

impl ModelVariables {
    /// Number of Gaussians in the model.
    pub fn n_charges(&self) -> usize {
        self.q.len()
    }

    /// Total defect charge carried by the model.
    pub fn total_charge(&self) -> f64 {
        self.q.iter().sum()
    }
}

/// Derived fields of one model evaluation.
#[derive(Debug, Clone)]
pub struct ModelState {
    /// Per-slice dielectric diagonal along the normal axis
    pub diels: Array2<f64>,
    /// Model charge density (real part physical)
    pub density: Array3<Complex64>,
    /// Model potential in Hartree
    pub potential: Array3<Complex64>,
    /// Model minus reference potential, eV
    pub potential_error: Array3<f64>,
    /// Mean squared potential error (percent-scaled)
    pub mse: f64,
}

/// Stopping and algorithm options for the parameter fit.
#[derive(Debug, Clone, Copy)]
pub struct OptimizeOptions {
    /// Requested algorithm; may fall back to COBYLA (see [`optimize_model`])
    pub algorithm: OptAlgorithm,
    /// Relative-x convergence tolerance
    pub tolerance: f64,
    /// Evaluation budget, 0 for unlimited
    pub max_eval: u32,
    /// Wall-clock budget in seconds, 0 for unlimited
    pub max_time_s: u32,
    /// Vary per-charge widths, charges, and positions
    pub optimize_charge: bool,
    /// Vary the interface positions
    pub optimize_interfaces: bool,
}

/// Accepted variables plus the derived state they produce.
#[derive(Debug)]
pub struct OptimizeOutcome {
    /// Variables accepted by the optimizer
    pub variables: ModelVariables,
    /// Model state evaluated at the accepted variables
    pub state: ModelState,
    /// Final mean squared error
    pub mse: f64,
    /// Error of the very first evaluation, for convergence reporting
    pub initial_mse: f64,
    /// Number of objective evaluations performed
    pub evaluations: usize,
}

/// Index bookkeeping for the flat optimizer vector
/// `[i0, i1, (σ, q, x, y, z) per charge]`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PackLayout {
    n_charges: usize,
}

impl PackLayout {
    const INTERFACE_VARS: usize = 2;
    const VARS_PER_CHARGE: usize = 5;

    pub(crate) fn new(n_charges: usize) -> Self {
        Self { n_charges }
    }

    pub(crate) fn len(&self) -> usize {
        Self::INTERFACE_VARS + Self::VARS_PER_CHARGE * self.n_charges
    }

    fn sigma_index(&self, charge: usize) -> usize {
        Self::INTERFACE_VARS + Self::VARS_PER_CHARGE * charge
    }

    fn q_index(&self, charge: usize) -> usize {
        self.sigma_index(charge) + 1
    }

    fn position_index(&self, charge: usize, axis: usize) -> usize {
        self.sigma_index(charge) + 2 + axis
    }

    pub(crate) fn pack(&self, vars: &ModelVariables) -> Vec<f64> {
        let mut x = vec![0.0; self.len()];
        x[0] = vars.interfaces[0];
        x[1] = vars.interfaces[1];
        for charge in 0..self.n_charges {
            x[self.sigma_index(charge)] = vars.sigma[charge];
            x[self.q_index(charge)] = vars.q[charge];
            for axis in 0..3 {
                x[self.position_index(charge, axis)] = vars.positions[[charge, axis]];
            }
        }
        x
    }

    pub(crate) fn unpack(&self, x: &[f64], vars: &mut ModelVariables) {
        vars.interfaces = [x[0], x[1]];
        for charge in 0..self.n_charges {
            vars.sigma[charge] = x[self.sigma_index(charge)];
            vars.q[charge] = x[self.q_index(charge)];
            for axis in 0..3 {
                vars.positions[[charge, axis]] = x[self.position_index(charge, axis)];
            }
        }
    }

    fn total_charge(&self, x: &[f64]) -> f64 {
        (0..self.n_charges).map(|c| x[self.q_index(c)]).sum()
    }

    /// Lower and upper bounds for the packed vector. Pinned variables carry
    /// equal bounds; a lone charge keeps its q pinned even when charges are
    /// free, since the constraint leaves it no freedom anyway.
    fn bounds(
        &self,
        vars: &ModelVariables,
        optimize_charge: bool,
        optimize_interfaces: bool,
    ) -> (Vec<f64>, Vec<f64>) {
        let pinned = self.pack(vars);
        let mut lower = pinned.clone();
        let mut upper = pinned;

        if optimize_interfaces {
            lower[0] = 0.0;
            lower[1] = 0.0;
            upper[0] = 1.0;
            upper[1] = 1.0;
        }

        if optimize_charge {
            let total = vars.total_charge();
            let q_min = total.min(0.0);
            let q_max = total.max(0.0);
            for charge in 0..self.n_charges {
                lower[self.sigma_index(charge)] = 0.1;
                upper[self.sigma_index(charge)] = 7.0;
                lower[self.q_index(charge)] = q_min;
                upper[self.q_index(charge)] = q_max;
                for axis in 0..3 {
                    lower[self.position_index(charge, axis)] = 0.0;
                    upper[self.position_index(charge, axis)] = 1.0;
                }
            }
        }

        if self.n_charges == 1 {
            lower[self.q_index(0)] = vars.q[0];
            upper[self.q_index(0)] = vars.q[0];
        }

        (lower, upper)
    }
}

/// Evaluate the model at a set of variables: dielectric profile, Gaussian
/// density, periodic potential, and the pointwise error against the
/// reference defect potential (eV).
pub fn evaluate_model(
    cell: &CellGrid,
    dielectric: &DielectricModel,
    vars: &ModelVariables,
    reference: &Array3<f64>,
) -> Result<ModelState> {
    let diels = dielectric_profile(cell, vars.interfaces, dielectric);
    let density = model_density(cell, &vars.sigma, &vars.q, &vars.positions, false);
    let potential = poisson::solve(cell, &density, &diels)?;

    let potential_error = Zip::from(&potential)
        .and(reference)
        .map_collect(|v, r| v.re * HARTREE_TO_EV - *r);
    let mse =
        potential_error.iter().map(|e| e * e).sum::<f64>() / potential_error.len() as f64 * 100.0;

    Ok(ModelState {
        diels,
        density,
        potential,
        potential_error,
        mse,
    })
}

/// Running record shared between optimizer callbacks and the driver.
struct EvalRecord {
    initial_mse: f64,
    evaluations: usize,
}

/// Fit the model variables against the reference potential.
///
/// Runs COBYLA (or BOBYQA for a single unconstrained charge) over the
/// packed layout, honoring bounds, the total-charge equality constraint, and
/// the evaluation/time budgets. Backend failures and budget exhaustion keep
/// the best parameters found so far; the returned state is re-evaluated at
/// the accepted variables.
pub fn optimize_model(
    cell: &CellGrid,
    dielectric: &DielectricModel,
    reference: &Array3<f64>,
    vars: ModelVariables,
    opts: &OptimizeOptions,
) -> Result<OptimizeOutcome> {
    let layout = PackLayout::new(vars.n_charges());
    let algorithm = select_algorithm(opts.algorithm, vars.n_charges());
    let (lower, upper) = layout.bounds(&vars, opts.optimize_charge, opts.optimize_interfaces);
    let mut x = layout.pack(&vars);
    let q_total = vars.total_charge();

    // The nlopt callback is a plain Fn; evaluation state lives in interior-
    // mutable cells owned by this frame.
    let record = RefCell::new(EvalRecord {
        initial_mse: UNSET_MSE,
        evaluations: 0,
    });
    let scratch = RefCell::new(vars.clone());

    let objective = |x: &[f64], _gradient: Option<&mut [f64]>, _data: &mut ()| -> f64 {
        let mut unpacked = scratch.borrow_mut();
        layout.unpack(x, &mut unpacked);
        let mut rec = record.borrow_mut();
        rec.evaluations += 1;
        match evaluate_model(cell, dielectric, &unpacked, reference) {
            Ok(state) if state.mse.is_finite() => {
                if rec.initial_mse < 0.0 {
                    rec.initial_mse = state.mse;
                }
                debug!(evaluation = rec.evaluations, mse = state.mse, "model evaluated");
                state.mse
            }
            Ok(_) => {
                warn!("non-finite potential error, penalizing this step");
                EVAL_PENALTY
            }
            Err(err) => {
                warn!("model evaluation failed, penalizing this step: {err}");
                EVAL_PENALTY
            }
        }
    };

    let mut opt = Nlopt::new(algorithm, layout.len(), objective, Target::Minimize, ());
    nlopt_setup(opt.set_lower_bounds(&lower))?;
    nlopt_setup(opt.set_upper_bounds(&upper))?;
    nlopt_setup(opt.set_xtol_rel(opts.tolerance))?;
    if opts.max_eval > 0 {
        nlopt_setup(opt.set_maxeval(opts.max_eval))?;
    }
    if opts.max_time_s > 0 {
        nlopt_setup(opt.set_maxtime(opts.max_time_s as f64))?;
    }
    if layout.n_charges > 1 {
        // Keep the total defect charge fixed while individual charges move
        let constraint =
            move |x: &[f64], _gradient: Option<&mut [f64]>, _data: &mut ()| -> f64 {
                layout.total_charge(x) - q_total
            };
        nlopt_setup(opt.add_equality_constraint(constraint, (), CHARGE_CONSTRAINT_TOL))?;
    }

    info!(
        parameters = layout.len(),
        algorithm = ?algorithm,
        "starting parameter optimization"
    );

    match opt.optimize(&mut x) {
        Ok((state, value)) => {
            match state {
                SuccessState::MaxEvalReached => warn!(
                    "optimization ended after {} evaluations before reaching \
                     the requested accuracy",
                    opts.max_eval
                ),
                SuccessState::MaxTimeReached => warn!(
                    "optimization ended after {} seconds of search before \
                     reaching the requested accuracy",
                    opts.max_time_s
                ),
                _ => {}
            }
            debug!(final_mse = value, "optimization finished");
        }
        Err((fail, _)) => {
            warn!(
                "parameter optimization failed: {fail:?}; keeping the best \
                 parameters found so far"
            );
        }
    }
    drop(opt);

    let mut variables = vars;
    layout.unpack(&x, &mut variables);
    let state = evaluate_model(cell, dielectric, &variables, reference)?;

    let rec = record.into_inner();
    let initial_mse = if rec.initial_mse < 0.0 {
        state.mse
    } else {
        rec.initial_mse
    };

    Ok(OptimizeOutcome {
        mse: state.mse,
        initial_mse,
        evaluations: rec.evaluations,
        variables,
        state,
    })
}

/// Map the requested algorithm onto what the model supports: BOBYQA cannot
/// carry the total-charge equality constraint, so multi-charge models fall
/// back to COBYLA.
fn select_algorithm(requested: OptAlgorithm, n_charges: usize) -> Algorithm {
    match requested {
        OptAlgorithm::Bobyqa if n_charges == 1 => Algorithm::Bobyqa,
        OptAlgorithm::Bobyqa => {
            warn!(
                "BOBYQA does not support models with multiple charges, \
                 using COBYLA instead"
            );
            Algorithm::Cobyla
        }
        OptAlgorithm::Cobyla => Algorithm::Cobyla,
    }
}

fn nlopt_setup(result: std::result::Result<SuccessState, FailState>) -> Result<()> {
    result
        .map(|_| ())
        .map_err(|fail| OptimizeError::Configuration(format!("{fail:?}")))
}
