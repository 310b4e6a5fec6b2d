/*
MIT License

Copyright (c) 2026 The slabcor developers
*/

//! FFT helpers for periodic 3D grids
//!
//! Thin wrappers around `rustfft` that transform a 3D complex grid one axis
//! at a time and expose reciprocal-lattice frequencies in FFT storage order.
//! rustfft leaves transforms unnormalized; the inverse helpers here apply the
//! 1/N factor so that `ifft3(fft3(a)) == a`.

use ndarray::Array3;
use num_complex::Complex64;
use rustfft::FftPlanner;
use std::f64::consts::PI;

/// Reciprocal-lattice frequencies `2π g / L` along one axis, in FFT storage
/// order: index 0 holds G = 0 and the upper half of the spectrum holds the
/// negative frequencies (the Nyquist frequency of an even-length axis is
/// stored as negative).
pub fn frequencies(n: usize, length: f64) -> Vec<f64> {
    let step = 2.0 * PI / length;
    (0..n)
        .map(|j| {
            let g = if j < n.div_ceil(2) {
                j as isize
            } else {
                j as isize - n as isize
            };
            g as f64 * step
        })
        .collect()
}

/// Forward 3D FFT, unnormalized.
pub fn fft3(grid: &Array3<Complex64>) -> Array3<Complex64> {
    let mut out = grid.clone();
    transform3(&mut out, true);
    out
}

/// Inverse 3D FFT, normalized by the total number of grid points.
pub fn ifft3(grid: &Array3<Complex64>) -> Array3<Complex64> {
    let mut out = grid.clone();
    transform3(&mut out, false);
    let scale = 1.0 / out.len() as f64;
    out.mapv_inplace(|v| v * scale);
    out
}

/// Forward 1D FFT of a real sequence, unnormalized.
pub fn fft_real(values: &[f64]) -> Vec<Complex64> {
    let mut buffer: Vec<Complex64> = values.iter().map(|&v| Complex64::new(v, 0.0)).collect();
    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_forward(buffer.len()).process(&mut buffer);
    buffer
}

/// Transform each axis of the grid in turn with 1D line FFTs.
fn transform3(grid: &mut Array3<Complex64>, forward: bool) {
    let (nx, ny, nz) = grid.dim();
    let mut planner = FftPlanner::<f64>::new();
    let fft_x = if forward {
        planner.plan_fft_forward(nx)
    } else {
        planner.plan_fft_inverse(nx)
    };
    let fft_y = if forward {
        planner.plan_fft_forward(ny)
    } else {
        planner.plan_fft_inverse(ny)
    };
    let fft_z = if forward {
        planner.plan_fft_forward(nz)
    } else {
        planner.plan_fft_inverse(nz)
    };

    let mut line: Vec<Complex64> = Vec::with_capacity(nx.max(ny).max(nz));

    for j in 0..ny {
        for k in 0..nz {
            line.clear();
            line.extend((0..nx).map(|i| grid[[i, j, k]]));
            fft_x.process(&mut line);
            for (i, v) in line.iter().enumerate() {
                grid[[i, j, k]] = *v;
            }
        }
    }

    for i in 0..nx {
        for k in 0..nz {
            line.clear();
            line.extend((0..ny).map(|j| grid[[i, j, k]]));
            fft_y.process(&mut line);
            for (j, v) in line.iter().enumerate() {
                grid[[i, j, k]] = *v;
            }
        }
    }

    for i in 0..nx {
        for j in 0..ny {
            line.clear();
            line.extend((0..nz).map(|k| grid[[i, j, k]]));
            fft_z.process(&mut line);
            for (k, v) in line.iter().enumerate() {
                grid[[i, j, k]] = *v;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_frequencies_order() {
        let f = frequencies(4, 2.0 * PI);
        assert_relative_eq!(f[0], 0.0);
        assert_relative_eq!(f[1], 1.0);
        assert_relative_eq!(f[2], -2.0);
        assert_relative_eq!(f[3], -1.0);

        let f = frequencies(5, 2.0 * PI);
        assert_relative_eq!(f[2], 2.0);
        assert_relative_eq!(f[3], -2.0);
        assert_relative_eq!(f[4], -1.0);
    }

    #[test]
    fn test_fft3_round_trip() {
        let mut grid = Array3::<Complex64>::zeros((4, 6, 5));
        for (idx, v) in grid.iter_mut().enumerate() {
            *v = Complex64::new(idx as f64 * 0.37 - 1.0, (idx as f64).sin());
        }

        let back = ifft3(&fft3(&grid));
        for (a, b) in grid.iter().zip(back.iter()) {
            assert_relative_eq!(a.re, b.re, epsilon = 1e-10);
            assert_relative_eq!(a.im, b.im, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_fft3_constant_is_zero_mode() {
        let grid = Array3::<Complex64>::from_elem((4, 4, 4), Complex64::new(2.5, 0.0));
        let hat = fft3(&grid);
        assert_relative_eq!(hat[[0, 0, 0]].re, 2.5 * 64.0, epsilon = 1e-10);
        assert!(hat.iter().skip(1).all(|v| v.norm() < 1e-8));
    }
}
