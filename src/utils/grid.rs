/*
MIT License

Copyright (c) 2026 The slabcor developers
*/

//! Scalar-field operations on periodic grids

use crate::cell::CellGrid;
use ndarray::Array3;
use num_complex::Complex64;

/// Integral of a real scalar field over the cell.
pub fn integrate(field: &Array3<f64>, cell: &CellGrid) -> f64 {
    field.sum() * cell.voxel_vol()
}

/// Integral of the real part of a complex field over the cell.
pub fn integrate_re(field: &Array3<Complex64>, cell: &CellGrid) -> f64 {
    field.iter().map(|v| v.re).sum::<f64>() * cell.voxel_vol()
}

/// Mean of the real part of a complex field.
pub fn mean_re(field: &Array3<Complex64>) -> f64 {
    field.iter().map(|v| v.re).sum::<f64>() / field.len() as f64
}

/// Resample a real scalar field onto a new grid with periodic trilinear
/// interpolation. Both grids sample the same cell, with point (0, 0, 0) at
/// the origin.
pub fn resample_periodic(field: &Array3<f64>, dims: [usize; 3]) -> Array3<f64> {
    let (nx, ny, nz) = field.dim();
    let old = [nx, ny, nz];

    Array3::from_shape_fn((dims[0], dims[1], dims[2]), |(i, j, k)| {
        let target = [i, j, k];
        let mut lower = [0usize; 3];
        let mut upper = [0usize; 3];
        let mut weight = [0f64; 3];
        for axis in 0..3 {
            let x = target[axis] as f64 * old[axis] as f64 / dims[axis] as f64;
            let base = x.floor() as usize % old[axis];
            lower[axis] = base;
            upper[axis] = (base + 1) % old[axis];
            weight[axis] = x - x.floor();
        }

        let mut value = 0.0;
        for (cx, wx) in [(lower[0], 1.0 - weight[0]), (upper[0], weight[0])] {
            for (cy, wy) in [(lower[1], 1.0 - weight[1]), (upper[1], weight[1])] {
                for (cz, wz) in [(lower[2], 1.0 - weight[2]), (upper[2], weight[2])] {
                    value += wx * wy * wz * field[[cx, cy, cz]];
                }
            }
        }
        value
    })
}
