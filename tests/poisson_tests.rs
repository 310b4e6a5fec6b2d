/*
MIT License

Copyright (c) 2026 The slabcor developers
*/

//! End-to-end tests of the anisotropic Poisson solver

use approx::assert_relative_eq;
use slabcor::cell::CellGrid;
use slabcor::model::{dielectric_profile, gaussian_density, DielectricModel};
use slabcor::poisson;
use slabcor::utils::constants::HARTREE_TO_EV;
use statrs::function::erf::erf;

/// An isotropic medium reduces the solver to the screened Coulomb problem;
/// potential differences between two points near the charge must match the
/// real-space erf form of a Gaussian charge, up to small image effects.
#[test]
fn test_isotropic_gaussian_matches_erf_potential() {
    let eps = 1.0;
    let length = 20.0;
    let n = 32;
    let cell = CellGrid::new([length; 3], [n; 3], 2).unwrap();
    let sigma = 1.0;
    let center_index = n / 2;
    let center = [10.0, 10.0, 10.0];

    let rho = gaussian_density(&cell, 1.0, center, sigma);
    let diels = ndarray::Array2::from_elem((n, 3), eps);
    let v = poisson::solve(&cell, &rho, &diels).unwrap();

    // Sample along z at 3 and 6 voxels from the center
    let spacing = length / n as f64;
    let r1 = 3.0 * spacing;
    let r2 = 6.0 * spacing;
    let v1 = v[[center_index, center_index, center_index + 3]].re;
    let v2 = v[[center_index, center_index, center_index + 6]].re;

    let analytic = |r: f64| erf(r / (sigma * 2.0_f64.sqrt())) / (eps * r);
    let expected = analytic(r1) - analytic(r2);

    assert_relative_eq!(v1 - v2, expected, epsilon = 0.01);
}

/// Scenario: slab with dielectric contrast. The potential must stay smooth
/// across the interfaces; a solver that mishandled the ε(z) coupling would
/// kink there.
#[test]
fn test_slab_potential_is_continuous_across_interfaces() {
    let n = 32;
    let cell = CellGrid::new([20.0; 3], [n; 3], 2).unwrap();
    let model = DielectricModel {
        diel_in: [5.0, 5.0, 10.0],
        diel_out: [1.0, 1.0, 1.0],
        taper: 1.0,
    };
    let diels = dielectric_profile(&cell, [0.3, 0.7], &model);
    let rho = gaussian_density(&cell, 1.0, [10.0, 10.0, 10.0], 2.0);

    let v = poisson::solve(&cell, &rho, &diels).unwrap();

    let mid = n / 2;
    let mut max_jump: f64 = 0.0;
    for k in 0..n {
        let next = (k + 1) % n;
        let jump = (v[[mid, mid, next]].re - v[[mid, mid, k]].re).abs() * HARTREE_TO_EV;
        max_jump = max_jump.max(jump);
    }
    assert!(
        max_jump < 0.1,
        "potential jumps {} eV between adjacent slices",
        max_jump
    );

    // The imaginary part is a numerical artifact and stays negligible
    let max_imag = v.iter().map(|c| c.im.abs()).fold(0.0, f64::max);
    assert!(max_imag < 1e-8);
}

/// Scenario: the normal axis is a label, not a layout. Solving a permuted
/// copy of the same slab with `normal_axis = 0` must reproduce the z-normal
/// solution up to index permutation.
#[test]
fn test_normal_axis_permutation_equivalence() {
    let lengths = [10.0, 12.0, 14.0];
    let grid = [8, 10, 12];
    let interfaces = [0.3, 0.7];
    let fractional = [0.35, 0.55, 0.6];
    let sigma = 1.3;

    // z-normal reference
    let cell_z = CellGrid::new(lengths, grid, 2).unwrap();
    let model_z = DielectricModel {
        diel_in: [3.0, 4.0, 6.0],
        diel_out: [1.0, 1.0, 1.0],
        taper: 1.0,
    };
    let diels_z = dielectric_profile(&cell_z, interfaces, &model_z);
    let center_z = cell_z.to_cartesian(fractional);
    let rho_z = gaussian_density(&cell_z, 1.0, center_z, sigma);
    let v_z = poisson::solve(&cell_z, &rho_z, &diels_z).unwrap();

    // Same physics with axes rotated so the normal becomes axis 0:
    // new (x, y, z) = old (z, x, y)
    let cell_x = CellGrid::new(
        [lengths[2], lengths[0], lengths[1]],
        [grid[2], grid[0], grid[1]],
        0,
    )
    .unwrap();
    let model_x = DielectricModel {
        diel_in: [6.0, 3.0, 4.0],
        diel_out: [1.0, 1.0, 1.0],
        taper: 1.0,
    };
    let diels_x = dielectric_profile(&cell_x, interfaces, &model_x);
    let center_x = cell_x.to_cartesian([fractional[2], fractional[0], fractional[1]]);
    let rho_x = gaussian_density(&cell_x, 1.0, center_x, sigma);
    let v_x = poisson::solve(&cell_x, &rho_x, &diels_x).unwrap();

    for i in 0..grid[0] {
        for j in 0..grid[1] {
            for k in 0..grid[2] {
                assert_relative_eq!(
                    v_x[[k, i, j]].re,
                    v_z[[i, j, k]].re,
                    epsilon = 1e-6
                );
            }
        }
    }
}
