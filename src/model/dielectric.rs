/*
MIT License

Copyright (c) 2026 The slabcor developers
*/

//! Position-dependent dielectric profile across the slab interfaces

use super::DielectricModel;
use crate::cell::CellGrid;
use ndarray::Array2;
use statrs::function::erf::erf;

/// Signed distance from `p` to `c` on a ring of circumference `length`,
/// folded into [-length/2, length/2).
fn periodic_distance(p: f64, c: f64, length: f64) -> f64 {
    (p - c + 0.5 * length).rem_euclid(length) - 0.5 * length
}

/// Build the per-slice diagonal dielectric tensor along the slab normal.
///
/// `interfaces` are fractional positions of the two slab boundaries along
/// the normal axis. Row k of the result is the tensor diagonal at grid slice
/// k: `diel_in` between the sorted interfaces, `diel_out` outside, blended
/// by `erf(d/taper)` of the periodic signed distance d to the nearer
/// interface. The profile is continuous and periodic for any taper width.
pub fn dielectric_profile(
    cell: &CellGrid,
    interfaces: [f64; 2],
    model: &DielectricModel,
) -> Array2<f64> {
    let length = cell.normal_length();
    let n_points = cell.normal_grid();

    let mut cartesian = [interfaces[0] * length, interfaces[1] * length];
    if cartesian[0] > cartesian[1] {
        cartesian.swap(0, 1);
    }

    let step = length / n_points as f64;
    let mut diels = Array2::<f64>::zeros((n_points, 3));

    for k in 0..n_points {
        let position = k as f64 * step;
        let d0 = periodic_distance(position, cartesian[0], length);
        let d1 = periodic_distance(position, cartesian[1], length);

        // The nearer interface decides the blend; its side decides the sign.
        let (min_distance, side) = if d0.abs() < d1.abs() {
            (d0, -1.0)
        } else {
            (d1, 1.0)
        };

        let edge = erf(min_distance / model.taper);
        for c in 0..3 {
            let diel_sum = model.diel_in[c] + model.diel_out[c];
            let diel_diff = model.diel_out[c] - model.diel_in[c];
            diels[[k, c]] = (diel_diff * side * edge + diel_sum) / 2.0;
        }
    }

    diels
}
