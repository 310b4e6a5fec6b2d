/*
MIT License

Copyright (c) 2026 The slabcor developers
*/

//! Tests of the derivative-free parameter fit

use approx::assert_relative_eq;
use ndarray::Array2;
use slabcor::cell::CellGrid;
use slabcor::input::OptAlgorithm;
use slabcor::model::DielectricModel;
use slabcor::optimize::{evaluate_model, optimize_model, ModelVariables, OptimizeOptions};
use slabcor::utils::constants::HARTREE_TO_EV;

fn vacuum() -> DielectricModel {
    DielectricModel {
        diel_in: [1.0, 1.0, 1.0],
        diel_out: [1.0, 1.0, 1.0],
        taper: 1.0,
    }
}

/// Scenario: one charge in an isotropic cell, with the reference potential
/// replaced by the model itself. The error must vanish identically.
#[test]
fn test_self_consistent_reference_has_zero_error() {
    let cell = CellGrid::new([20.0; 3], [20, 20, 20], 2).unwrap();
    let vars = ModelVariables {
        interfaces: [0.25, 0.75],
        sigma: vec![2.0],
        q: vec![1.0],
        positions: Array2::from_elem((1, 3), 0.5),
    };

    let zeros = ndarray::Array3::<f64>::zeros((20, 20, 20));
    let state = evaluate_model(&cell, &vacuum(), &vars, &zeros).unwrap();
    let reference = state.potential.mapv(|v| v.re * HARTREE_TO_EV);

    let replay = evaluate_model(&cell, &vacuum(), &vars, &reference).unwrap();
    assert!(replay.mse < 1e-12, "MSE {} should vanish", replay.mse);
}

/// Starting the optimizer at the optimum must not make things worse, and
/// every accepted variable must respect its bounds.
#[test]
fn test_optimizer_respects_bounds_and_does_not_regress() {
    let n = 12;
    let cell = CellGrid::new([16.0; 3], [n, n, n], 2).unwrap();
    let truth = ModelVariables {
        interfaces: [0.25, 0.75],
        sigma: vec![1.8],
        q: vec![1.0],
        positions: Array2::from_elem((1, 3), 0.5),
    };

    let zeros = ndarray::Array3::<f64>::zeros((n, n, n));
    let state = evaluate_model(&cell, &vacuum(), &truth, &zeros).unwrap();
    let reference = state.potential.mapv(|v| v.re * HARTREE_TO_EV);

    let options = OptimizeOptions {
        algorithm: OptAlgorithm::Cobyla,
        tolerance: 1e-4,
        max_eval: 60,
        max_time_s: 0,
        optimize_charge: true,
        optimize_interfaces: true,
    };

    let outcome = optimize_model(&cell, &vacuum(), &reference, truth.clone(), &options).unwrap();

    assert!(outcome.mse <= outcome.initial_mse + 1e-12);
    assert!(outcome.evaluations > 0);

    let vars = &outcome.variables;
    for value in vars.interfaces {
        assert!((0.0..=1.0).contains(&value));
    }
    assert!((0.1..=7.0).contains(&vars.sigma[0]));
    for axis in 0..3 {
        assert!((0.0..=1.0).contains(&vars.positions[[0, axis]]));
    }
    // A lone charge never moves
    assert_relative_eq!(vars.q[0], 1.0, epsilon = 1e-14);
}

/// Scenario: a two-charge model under the total-charge equality constraint.
/// The optimizer may shuffle charge between the Gaussians but must conserve
/// the total.
#[test]
fn test_total_charge_is_conserved_for_two_charges() {
    let n = 10;
    let cell = CellGrid::new([14.0; 3], [n, n, n], 2).unwrap();

    // Reference built from a slightly different charge split
    let truth = ModelVariables {
        interfaces: [0.25, 0.75],
        sigma: vec![1.6, 1.4],
        q: vec![0.6, 0.4],
        positions: Array2::from_shape_vec((2, 3), vec![0.5, 0.5, 0.45, 0.5, 0.5, 0.55])
            .unwrap(),
    };
    let zeros = ndarray::Array3::<f64>::zeros((n, n, n));
    let reference = evaluate_model(&cell, &vacuum(), &truth, &zeros)
        .unwrap()
        .potential
        .mapv(|v| v.re * HARTREE_TO_EV);

    let start = ModelVariables {
        interfaces: [0.25, 0.75],
        sigma: vec![1.5, 1.5],
        q: vec![0.7, 0.3],
        positions: Array2::from_shape_vec((2, 3), vec![0.5, 0.5, 0.45, 0.5, 0.5, 0.55])
            .unwrap(),
    };

    let options = OptimizeOptions {
        algorithm: OptAlgorithm::Cobyla,
        tolerance: 1e-3,
        max_eval: 0,
        max_time_s: 0,
        optimize_charge: true,
        optimize_interfaces: false,
    };

    let outcome = optimize_model(&cell, &vacuum(), &reference, start, &options).unwrap();

    assert_relative_eq!(outcome.variables.total_charge(), 1.0, epsilon = 1e-8);
    for charge in 0..2 {
        assert!((0.0..=1.0).contains(&outcome.variables.q[charge]));
        assert!((0.1..=7.0).contains(&outcome.variables.sigma[charge]));
    }
    // Interfaces were frozen
    assert_relative_eq!(outcome.variables.interfaces[0], 0.25);
    assert_relative_eq!(outcome.variables.interfaces[1], 0.75);
}

/// A BOBYQA request with multiple charges falls back to COBYLA and still
/// conserves the total charge.
#[test]
fn test_bobyqa_falls_back_for_multiple_charges() {
    let n = 8;
    let cell = CellGrid::new([12.0; 3], [n, n, n], 2).unwrap();
    let vars = ModelVariables {
        interfaces: [0.25, 0.75],
        sigma: vec![1.5, 1.5],
        q: vec![0.5, 0.5],
        positions: Array2::from_shape_vec((2, 3), vec![0.5, 0.5, 0.4, 0.5, 0.5, 0.6])
            .unwrap(),
    };
    let zeros = ndarray::Array3::<f64>::zeros((n, n, n));
    let reference = evaluate_model(&cell, &vacuum(), &vars, &zeros)
        .unwrap()
        .potential
        .mapv(|v| v.re * HARTREE_TO_EV);

    let options = OptimizeOptions {
        algorithm: OptAlgorithm::Bobyqa,
        tolerance: 1e-3,
        max_eval: 40,
        max_time_s: 0,
        optimize_charge: true,
        optimize_interfaces: false,
    };

    let outcome = optimize_model(&cell, &vacuum(), &reference, vars, &options).unwrap();
    assert_relative_eq!(outcome.variables.total_charge(), 1.0, epsilon = 1e-8);
}
