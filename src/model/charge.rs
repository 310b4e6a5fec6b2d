/*
MIT License

Copyright (c) 2026 The slabcor developers
*/

//! Gaussian model charge densities built in reciprocal space

use crate::cell::CellGrid;
use crate::utils::constants::HARTREE_TO_EV;
use crate::utils::fft::{frequencies, ifft3};
use crate::utils::grid::integrate_re;
use ndarray::{Array2, Array3};
use num_complex::Complex64;

/// Density of a normalized Gaussian with total charge `q` and width `sigma`
/// (Bohr), centered at the Cartesian position `center`.
///
/// The Gaussian is assembled in reciprocal space,
/// `ρ̂(G) = q · exp(−σ²|G|²/2) · exp(−i G·center)`,
/// and transformed back. The phase factor is an exact periodic translation,
/// so narrow Gaussians are placed without real-space sampling error, and the
/// G = 0 coefficient pins the total charge to `q`.
pub fn gaussian_density(
    cell: &CellGrid,
    q: f64,
    center: [f64; 3],
    sigma: f64,
) -> Array3<Complex64> {
    let grid = cell.grid();
    let lengths = cell.lengths();

    let gx = frequencies(grid[0], lengths[0]);
    let gy = frequencies(grid[1], lengths[1]);
    let gz = frequencies(grid[2], lengths[2]);

    let half_sigma_sq = 0.5 * sigma * sigma;
    let mut rhok = Array3::<Complex64>::zeros((grid[0], grid[1], grid[2]));
    for (i, &gxi) in gx.iter().enumerate() {
        for (j, &gyj) in gy.iter().enumerate() {
            for (k, &gzk) in gz.iter().enumerate() {
                let g_sq = gxi * gxi + gyj * gyj + gzk * gzk;
                let phase = gxi * center[0] + gyj * center[1] + gzk * center[2];
                rhok[[i, j, k]] =
                    Complex64::from_polar(q * (-half_sigma_sq * g_sq).exp(), -phase);
            }
        }
    }

    let mut rho = ifft3(&rhok);
    let inv_voxel = 1.0 / cell.voxel_vol();
    rho.mapv_inplace(|v| v * inv_voxel);
    rho
}

/// Sum of Gaussian charges on the cell grid.
///
/// Positions are fractional, one row per charge. With `neutralize` set, the
/// total charge is removed again as a uniform background, leaving a neutral
/// cell for energy integrals.
pub fn model_density(
    cell: &CellGrid,
    sigma: &[f64],
    q: &[f64],
    positions: &Array2<f64>,
    neutralize: bool,
) -> Array3<Complex64> {
    let grid = cell.grid();
    let mut rho = Array3::<Complex64>::zeros((grid[0], grid[1], grid[2]));

    for charge in 0..q.len() {
        let fractional = [
            positions[[charge, 0]],
            positions[[charge, 1]],
            positions[[charge, 2]],
        ];
        let center = cell.to_cartesian(fractional);
        rho += &gaussian_density(cell, q[charge], center, sigma[charge]);
    }

    if neutralize {
        let background = integrate_re(&rho, cell) / cell.volume();
        rho.mapv_inplace(|v| v - background);
    }

    rho
}

/// Electrostatic energy `½ ∫ V ρ dV` of a model density in its own
/// potential, converted to eV.
pub fn model_energy(
    cell: &CellGrid,
    density: &Array3<Complex64>,
    potential: &Array3<Complex64>,
) -> f64 {
    let interaction: f64 = potential
        .iter()
        .zip(density.iter())
        .map(|(v, r)| (v * r).re)
        .sum();
    0.5 * interaction * cell.voxel_vol() * HARTREE_TO_EV
}
