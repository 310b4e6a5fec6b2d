/*
MIT License

Copyright (c) 2026 The slabcor developers
*/

//! Supercell geometry context
//!
//! [`CellGrid`] bundles the orthorhombic cell lengths, the sampling grid, and
//! the slab-normal axis. It is an immutable value constructed per use: the
//! extrapolation engine builds a fresh context for every scaling step instead
//! of mutating shared state, which keeps the transverse-mode and per-step
//! parallelism free of aliasing.

use thiserror::Error;

/// Errors raised when constructing a cell context
#[derive(Error, Debug)]
pub enum CellError {
    /// Cell lengths must be positive and finite
    #[error("cell lengths must be positive, got {0:?}")]
    NonPositiveLength([f64; 3]),

    /// Grid dimensions must be non-zero
    #[error("grid dimensions must be non-zero, got {0:?}")]
    EmptyGrid([usize; 3]),

    /// The slab-normal axis index must select one of the three axes
    #[error("normal axis must be 0, 1 or 2, got {0}")]
    InvalidAxis(usize),
}

/// Orthorhombic supercell with its real-space sampling grid.
#[derive(Debug, Clone, PartialEq)]
pub struct CellGrid {
    lengths: [f64; 3],
    grid: [usize; 3],
    normal_axis: usize,
    voxel_vol: f64,
}

impl CellGrid {
    /// Create a cell context from edge lengths (Bohr), grid dimensions, and
    /// the slab-normal axis index.
    pub fn new(lengths: [f64; 3], grid: [usize; 3], normal_axis: usize) -> Result<Self, CellError> {
        if lengths.iter().any(|l| !l.is_finite() || *l <= 0.0) {
            return Err(CellError::NonPositiveLength(lengths));
        }
        if grid.iter().any(|n| *n == 0) {
            return Err(CellError::EmptyGrid(grid));
        }
        if normal_axis > 2 {
            return Err(CellError::InvalidAxis(normal_axis));
        }

        let voxel_vol = lengths
            .iter()
            .zip(grid.iter())
            .map(|(l, n)| l / *n as f64)
            .product();

        Ok(Self {
            lengths,
            grid,
            normal_axis,
            voxel_vol,
        })
    }

    /// Edge lengths in Bohr.
    pub fn lengths(&self) -> [f64; 3] {
        self.lengths
    }

    /// Samples per axis.
    pub fn grid(&self) -> [usize; 3] {
        self.grid
    }

    /// Index of the slab-normal axis.
    pub fn normal_axis(&self) -> usize {
        self.normal_axis
    }

    /// Volume of one grid voxel.
    pub fn voxel_vol(&self) -> f64 {
        self.voxel_vol
    }

    /// Cell volume.
    pub fn volume(&self) -> f64 {
        self.lengths.iter().product()
    }

    /// Cell length along the slab normal.
    pub fn normal_length(&self) -> f64 {
        self.lengths[self.normal_axis]
    }

    /// Grid dimension along the slab normal.
    pub fn normal_grid(&self) -> usize {
        self.grid[self.normal_axis]
    }

    /// The two non-normal axes, in ascending order.
    pub fn transverse_axes(&self) -> (usize, usize) {
        match self.normal_axis {
            0 => (1, 2),
            1 => (0, 2),
            _ => (0, 1),
        }
    }

    /// A context scaled uniformly by `factor`, sampled on a replacement grid.
    pub fn scaled(&self, factor: f64, grid: [usize; 3]) -> Result<Self, CellError> {
        let lengths = [
            self.lengths[0] * factor,
            self.lengths[1] * factor,
            self.lengths[2] * factor,
        ];
        Self::new(lengths, grid, self.normal_axis)
    }

    /// Cartesian coordinates of a fractional position.
    pub fn to_cartesian(&self, fractional: [f64; 3]) -> [f64; 3] {
        [
            fractional[0] * self.lengths[0],
            fractional[1] * self.lengths[1],
            fractional[2] * self.lengths[2],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_voxel_volume() {
        let cell = CellGrid::new([10.0, 20.0, 30.0], [10, 10, 10], 2).unwrap();
        assert_relative_eq!(cell.voxel_vol(), 6.0, epsilon = 1e-12);
        assert_relative_eq!(cell.volume(), 6000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_normal_axis_helpers() {
        let cell = CellGrid::new([10.0, 20.0, 30.0], [4, 8, 16], 1).unwrap();
        assert_relative_eq!(cell.normal_length(), 20.0);
        assert_eq!(cell.normal_grid(), 8);
        assert_eq!(cell.transverse_axes(), (0, 2));
    }

    #[test]
    fn test_scaled_keeps_axis() {
        let cell = CellGrid::new([10.0, 10.0, 10.0], [8, 8, 8], 0).unwrap();
        let larger = cell.scaled(1.5, [8, 8, 8]).unwrap();
        assert_relative_eq!(larger.lengths()[2], 15.0);
        assert_eq!(larger.normal_axis(), 0);
        assert_relative_eq!(larger.voxel_vol(), cell.voxel_vol() * 1.5_f64.powi(3));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(CellGrid::new([0.0, 1.0, 1.0], [4, 4, 4], 2).is_err());
        assert!(CellGrid::new([1.0, 1.0, 1.0], [4, 0, 4], 2).is_err());
        assert!(CellGrid::new([1.0, 1.0, 1.0], [4, 4, 4], 3).is_err());
    }
}
