//! Circular neighbourhood stencils (disc masks) on the Cartesian grid.
//!
//! Two families are built from the same membership rule
//! `(i·dx)² + (j·dx)² ≤ r²` (boundary inclusive):
//! - a single normalized disc for background averaging, half-width
//!   `max(1, ceil(r/dx))`, weights summing to 1;
//! - five binary discs at radii `R-4 .. R` km for uncertain-zone stamping,
//!   half-width `floor(r/dx)`.
//!
//! The two rounding rules differ on purpose: each matches the builder used
//! by the published reference code for that family.

use crate::params::RainTypeParams;

/// A rectangular weight matrix marking which offsets fall within a disc.
/// Fresh stencils are square with odd side length 2n+1; `chop` produces
/// trimmed rectangles for cores near the domain edge.
#[derive(Debug, Clone)]
pub struct DiscStencil {
    /// Row-major weights. Zero outside the disc.
    pub weights: Vec<f32>,
    pub rows: usize,
    pub cols: usize,
}

impl DiscStencil {
    /// Normalized disc for background averaging: weights sum to 1.
    pub fn background(radius_km: f32, dx_km: f32) -> Self {
        let half = ((radius_km / dx_km).ceil() as usize).max(1);
        let mut stencil = Self::disc(half, radius_km, dx_km);
        let total: f64 = stencil.weights.iter().map(|&w| w as f64).sum();
        for w in &mut stencil.weights {
            *w = (*w as f64 / total) as f32;
        }
        stencil
    }

    /// Binary membership disc for uncertain-zone stamping.
    pub fn proximity(radius_km: f32, dx_km: f32) -> Self {
        let half = (radius_km / dx_km).floor() as usize;
        Self::disc(half, radius_km, dx_km)
    }

    fn disc(half: usize, radius_km: f32, dx_km: f32) -> Self {
        let side = 2 * half + 1;
        let mut weights = vec![0.0f32; side * side];
        let r2 = radius_km as f64 * radius_km as f64;
        let n = half as isize;
        for i in -n..=n {
            for j in -n..=n {
                let di = i as f64 * dx_km as f64;
                let dj = j as f64 * dx_km as f64;
                if di * di + dj * dj <= r2 {
                    weights[((i + n) * side as isize + (j + n)) as usize] = 1.0;
                }
            }
        }
        Self {
            weights,
            rows: side,
            cols: side,
        }
    }

    /// Half-width n of an unchopped (square, odd-sided) stencil.
    #[inline]
    pub fn half_width(&self) -> usize {
        debug_assert_eq!(self.rows, self.cols);
        self.rows / 2
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.weights[row * self.cols + col]
    }

    /// Trim rows/columns from each edge so a stencil centered near the
    /// domain boundary fits the valid sub-window. Each cut is the clamped
    /// overflow amount on that side; the surviving pattern lines up exactly
    /// with the corresponding sub-region of the untrimmed stencil.
    pub fn chop(&self, top: usize, right: usize, bottom: usize, left: usize) -> Self {
        let rows = self.rows - top - bottom;
        let cols = self.cols - left - right;
        let mut weights = Vec::with_capacity(rows * cols);
        for r in top..self.rows - bottom {
            for c in left..self.cols - right {
                weights.push(self.weights[r * self.cols + c]);
            }
        }
        Self {
            weights,
            rows,
            cols,
        }
    }
}

/// Precomputed stencils for one (parameter set, grid spacing) pair.
/// Built once per classifier and shared across calls; nothing here is
/// global or mutated after construction.
#[derive(Debug, Clone)]
pub struct StencilSet {
    /// Normalized background-averaging disc.
    pub background: DiscStencil,
    /// Binary discs at radii R-4 .. R km; index 0 is the smallest.
    pub proximity: Vec<DiscStencil>,
}

impl StencilSet {
    pub fn new(params: &RainTypeParams) -> Self {
        let dx = params.grid_spacing_km;
        let base = params.max_conv_radius_km;
        Self {
            background: DiscStencil::background(params.background_radius_km, dx),
            proximity: (0..5)
                .map(|k| DiscStencil::proximity(base - (4 - k) as f32, dx))
                .collect(),
        }
    }
}
