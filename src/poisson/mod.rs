/*
MIT License

Copyright (c) 2026 The slabcor developers
*/

//! Anisotropic Poisson solver for a charge in a layered dielectric
//!
//! Solves `∇·(ε(z)∇V) = −4π ρ` on a periodic orthorhombic cell where the
//! diagonal dielectric tensor varies along the slab-normal axis only. In
//! reciprocal space the z-dependence of ε couples every plane along the
//! normal axis: each transverse mode (k₁, k₂) yields one dense
//! circulant-Toeplitz system of size N_normal. The modes are independent, so
//! they are solved in a rayon work-stealing loop, each task owning one
//! disjoint line of the output spectrum.
//!
//! The dense per-mode solves dominate the cost at O(N₁·N₂·N_normal³). The
//! circulant structure of ε̂ would admit an O(N_normal log N_normal) scheme
//! per mode; that remains an open optimization.

pub mod errors;

pub use errors::{PoissonError, Result};

use crate::cell::CellGrid;
use crate::utils::fft::{fft3, fft_real, frequencies, ifft3};
use crate::utils::linear_algebra::lu_solve;
use faer::{col, Mat};
use ndarray::{Array2, Array3};
use num_complex::Complex64;
use rayon::prelude::*;
use std::f64::consts::PI;

/// Solve the anisotropic Poisson equation for the given density and
/// per-slice dielectric profile.
///
/// `diels` holds one tensor diagonal per grid slice along the cell's normal
/// axis, in natural axis order. The solver accepts any `normal_axis` by
/// index arithmetic; inputs are never permuted. The returned potential is
/// gauged to zero average over the cell.
pub fn solve(
    cell: &CellGrid,
    rho: &Array3<Complex64>,
    diels: &Array2<f64>,
) -> Result<Array3<Complex64>> {
    let dims = cell.grid();
    if rho.dim() != (dims[0], dims[1], dims[2]) {
        return Err(PoissonError::ShapeMismatch(format!(
            "density grid {:?} does not match cell grid {:?}",
            rho.dim(),
            dims
        )));
    }

    let normal = cell.normal_axis();
    let n_normal = dims[normal];
    if diels.dim() != (n_normal, 3) {
        return Err(PoissonError::ShapeMismatch(format!(
            "dielectric profile {:?} does not match {} slices along the normal axis",
            diels.dim(),
            n_normal
        )));
    }

    let (t1, t2) = cell.transverse_axes();
    let lengths = cell.lengths();
    let g_normal = frequencies(n_normal, lengths[normal]);
    let g1 = frequencies(dims[t1], lengths[t1]);
    let g2 = frequencies(dims[t2], lengths[t2]);

    // 4π on the source term for atomic units
    let mut rhok = fft3(rho);
    rhok.mapv_inplace(|v| v * (4.0 * PI));

    // Convolution with ε̂ along the normal axis becomes a circulant Toeplitz
    // matrix per tensor component: T_c[i, j] = ε̂_c[(i − j) mod N] / N.
    let toeplitz: Vec<Mat<Complex64>> = (0..3)
        .map(|component| {
            let column: Vec<f64> = (0..n_normal).map(|k| diels[[k, component]]).collect();
            let hat = fft_real(&column);
            let mut t = Mat::<Complex64>::zeros(n_normal, n_normal);
            for i in 0..n_normal {
                for j in 0..n_normal {
                    let shift = (i as isize - j as isize).rem_euclid(n_normal as isize) as usize;
                    t.write(i, j, hat[shift] / n_normal as f64);
                }
            }
            t
        })
        .collect();

    // Normal-axis block shared by every mode: T_normal ⊙ (G_n ⊗ G_n)
    let mut a_normal = Mat::<Complex64>::zeros(n_normal, n_normal);
    for i in 0..n_normal {
        for j in 0..n_normal {
            a_normal.write(
                i,
                j,
                toeplitz[normal].read(i, j) * (g_normal[i] * g_normal[j]),
            );
        }
    }

    let modes: Vec<(usize, usize)> = (0..dims[t1])
        .flat_map(|i| (0..dims[t2]).map(move |j| (i, j)))
        .collect();

    // One dense solve per transverse mode; tasks own disjoint output lines.
    let lines: Vec<Result<((usize, usize), col::Col<Complex64>)>> = modes
        .into_par_iter()
        .map(|(i, j)| {
            let g1_sq = g1[i] * g1[i];
            let g2_sq = g2[j] * g2[j];

            let mut system = Mat::<Complex64>::zeros(n_normal, n_normal);
            for r in 0..n_normal {
                for s in 0..n_normal {
                    system.write(
                        r,
                        s,
                        a_normal.read(r, s)
                            + toeplitz[t1].read(r, s) * g1_sq
                            + toeplitz[t2].read(r, s) * g2_sq,
                    );
                }
            }

            if i == 0 && j == 0 {
                // The constant mode is singular by construction; pin it here
                // and gauge it out after the solve.
                system.write(0, 0, Complex64::new(1.0, 0.0));
            }

            let mut rhs = col::Col::<Complex64>::zeros(n_normal);
            for k in 0..n_normal {
                rhs.write(k, rhok[line_index(normal, t1, t2, i, j, k)]);
            }

            let solution = lu_solve(system, &rhs).map_err(|e| PoissonError::SingularMode {
                k1: i,
                k2: j,
                detail: e.to_string(),
            })?;
            Ok(((i, j), solution))
        })
        .collect();

    let mut vk = Array3::<Complex64>::zeros((dims[0], dims[1], dims[2]));
    for line in lines {
        let ((i, j), solution) = line?;
        for k in 0..n_normal {
            vk[line_index(normal, t1, t2, i, j, k)] = solution.read(k);
        }
    }

    // G = 0 holds the average potential over the cell
    vk[[0, 0, 0]] = Complex64::new(0.0, 0.0);

    Ok(ifft3(&vk))
}

/// Grid index of point k along the normal axis at transverse mode (i, j).
fn line_index(normal: usize, t1: usize, t2: usize, i: usize, j: usize, k: usize) -> [usize; 3] {
    let mut index = [0usize; 3];
    index[t1] = i;
    index[t2] = j;
    index[normal] = k;
    index
}
