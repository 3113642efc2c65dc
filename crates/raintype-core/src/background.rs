//! Background reflectivity: disc-mean smoothing with missing-data
//! renormalization.
//!
//! A plain windowed mean is biased low wherever the disc overlaps missing
//! cells or the domain edge. Following the reference formulation, two
//! convolutions are taken with the same normalized disc, one over linear
//! reflectivity (missing replaced by 0) and one over a 0/1 validity mask,
//! and divided cellwise, so only the weight that actually saw data
//! contributes. Boundary handling is half-sample symmetric reflection.
//!
//! The result is NaN where the center cell is missing or where no valid
//! neighbor fell inside the disc; both are "no defensible background".

use crate::grid::ReflectivityGrid;
use crate::stencil::DiscStencil;
use crate::units::{dbz_to_linear, linear_to_dbz};

#[cfg(feature = "threading")]
use rayon::prelude::*;

/// Compute the background reflectivity field in dBZ.
///
/// `disc` must be a normalized background stencil (weights summing to 1);
/// the renormalization keeps the result exact for any valid subset of it.
pub fn compute_background(refl: &ReflectivityGrid, disc: &DiscStencil) -> Vec<f32> {
    let (width, height) = (refl.width, refl.height);

    // Linear reflectivity with missing cells zeroed, plus the validity mask.
    let mut linear = vec![0.0f64; width * height];
    let mut valid = vec![0.0f64; width * height];
    for (i, &dbz) in refl.data.iter().enumerate() {
        if !dbz.is_nan() {
            linear[i] = dbz_to_linear(dbz as f64);
            valid[i] = 1.0;
        }
    }

    let row = |r: usize| smooth_row(r, width, height, &linear, &valid, disc);

    #[cfg(feature = "threading")]
    let rows: Vec<Vec<f32>> = (0..height).into_par_iter().map(row).collect();
    #[cfg(not(feature = "threading"))]
    let rows: Vec<Vec<f32>> = (0..height).map(row).collect();

    rows.concat()
}

fn smooth_row(
    r: usize,
    width: usize,
    height: usize,
    linear: &[f64],
    valid: &[f64],
    disc: &DiscStencil,
) -> Vec<f32> {
    let n = disc.half_width() as isize;
    let mut out = Vec::with_capacity(width);

    for c in 0..width {
        // Missing center: no defensible background, as in the reference.
        if valid[r * width + c] == 0.0 {
            out.push(f32::NAN);
            continue;
        }

        let mut num = 0.0f64;
        let mut den = 0.0f64;
        for di in -n..=n {
            let rr = reflect(r as isize + di, height);
            for dj in -n..=n {
                let w = disc.get((di + n) as usize, (dj + n) as usize) as f64;
                if w == 0.0 {
                    continue;
                }
                let cc = reflect(c as isize + dj, width);
                let idx = rr * width + cc;
                num += w * linear[idx];
                den += w * valid[idx];
            }
        }

        if den > 0.0 {
            out.push(linear_to_dbz(num / den) as f32);
        } else {
            out.push(f32::NAN);
        }
    }
    out
}

/// Half-sample symmetric index reflection: -1 → 0, -2 → 1, n → n-1.
/// Iterated so stencils wider than the grid still resolve.
#[inline]
fn reflect(mut i: isize, len: usize) -> usize {
    let len = len as isize;
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= len {
            i = 2 * len - 1 - i;
        } else {
            return i as usize;
        }
    }
}
