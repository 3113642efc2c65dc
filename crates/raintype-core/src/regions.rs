//! Contiguous echo objects: 4-connected labeling and area-dependent
//! convective thresholds.
//!
//! Small, spatially isolated echoes are often shallow convection that the
//! classic background-excess test files under stratiform. Each maximal
//! 4-connected raining object (edges touch, corners do not) therefore gets
//! an area-dependent override threshold:
//! - area < A_low: the object is excised entirely (weak echo);
//! - A_low ≤ area < A_med: threshold drops to Z_shallow;
//! - A_med ≤ area ≤ A_high: linear ramp from Z_shallow up to Z_th;
//! - area > A_high: the full Z_th stands.
//!
//! After every object's threshold is in place, one global finalization pass
//! promotes `refl ≥ threshold` cells to isolated cores and `refl ≥ Z_th`
//! cells to full cores. The global pass runs over the whole grid, so a cell
//! of a just-excised object can come back as a core if its raw reflectivity
//! clears Z_th, a documented quirk of the reference code, kept as is.

use crate::classify::{CoreState, RainType};
use crate::grid::ReflectivityGrid;
use crate::params::RainTypeParams;

/// A maximal 4-connected set of raining cells.
#[derive(Debug, Clone)]
pub struct EchoRegion {
    /// Flat row-major cell indices belonging to the object.
    pub cells: Vec<usize>,
    /// Areal coverage: cell count × dx².
    pub area_km2: f32,
}

/// Label maximal 4-connected components of `refl ≥ weak_echo_thres`.
/// Missing cells never rain; an empty result is a valid degenerate case.
pub fn label_echo_regions(
    refl: &ReflectivityGrid,
    weak_echo_thres: f32,
    dx_km: f32,
) -> Vec<EchoRegion> {
    let (width, height) = (refl.width, refl.height);
    let raining = |i: usize| refl.data[i] >= weak_echo_thres; // NaN compares false
    let mut seen = vec![false; width * height];
    let mut regions = Vec::new();
    let cell_area = dx_km * dx_km;

    for start in 0..width * height {
        if seen[start] || !raining(start) {
            continue;
        }

        // Flood fill with an explicit stack; only edge-sharing neighbors.
        let mut cells = Vec::new();
        let mut stack = vec![start];
        seen[start] = true;
        while let Some(i) = stack.pop() {
            cells.push(i);
            let (r, c) = (i / width, i % width);
            let mut visit = |j: usize| {
                if !seen[j] && raining(j) {
                    seen[j] = true;
                    stack.push(j);
                }
            };
            if r > 0 {
                visit(i - width);
            }
            if r + 1 < height {
                visit(i + width);
            }
            if c > 0 {
                visit(i - 1);
            }
            if c + 1 < width {
                visit(i + 1);
            }
        }

        let area_km2 = cells.len() as f32 * cell_area;
        regions.push(EchoRegion { cells, area_km2 });
    }
    regions
}

/// Override threshold for an object of the given area, or None where the
/// default `conv_thres_dbz` stands. The sub-minimum case is handled by the
/// excision branch in `apply_area_overrides`, not here.
pub(crate) fn area_threshold(area_km2: f32, p: &RainTypeParams) -> Option<f32> {
    if area_km2 >= p.min_size_km2 && area_km2 < p.start_slope_km2 {
        Some(p.shallow_conv_min)
    } else if area_km2 >= p.start_slope_km2 && area_km2 <= p.max_size_km2 {
        let t = (area_km2 - p.start_slope_km2) / (p.max_size_km2 - p.start_slope_km2);
        Some(p.shallow_conv_min + t * (p.conv_thres_dbz - p.shallow_conv_min))
    } else {
        None
    }
}

/// Refine core states and classifications with object-size logic, then run
/// the global core finalization over the whole grid.
pub fn apply_area_overrides(
    refl: &ReflectivityGrid,
    regions: &[EchoRegion],
    cores: &mut [CoreState],
    classes: &mut [Option<RainType>],
    p: &RainTypeParams,
) {
    let mut conv_thres = vec![p.conv_thres_dbz; refl.data.len()];

    for region in regions {
        let area = region.area_km2;

        // Mid-sized objects are isolated convection; start them all as
        // fringe, stronger labels may take over below.
        if area >= p.min_size_km2 && area <= p.max_size_km2 {
            for &i in &region.cells {
                classes[i] = Some(RainType::IsoConvFringe);
            }
        }

        if area < p.min_size_km2 {
            for &i in &region.cells {
                cores[i] = CoreState::NotCore;
                classes[i] = Some(RainType::WeakEcho);
            }
        } else if let Some(threshold) = area_threshold(area, p) {
            for &i in &region.cells {
                conv_thres[i] = threshold;
            }
        }
    }

    // Global finalization: per-cell thresholds are assigned at most once and
    // only ever lowered, so one pass after the loop is exact. The full-core
    // check runs second and always wins.
    for (i, &dbz) in refl.data.iter().enumerate() {
        if dbz >= conv_thres[i] {
            cores[i] = CoreState::Isolated;
        }
        if dbz >= p.conv_thres_dbz {
            cores[i] = CoreState::Convective;
        }
    }
}
