//! Rain-type classification state machine.
//!
//! Orchestrates the full pipeline of Powell, Houze & Brodzik (2016, JTECH):
//! background smoothing, cosine-shaped adaptive core detection, object-size
//! refinement, uncertain-zone stamping, and the final override pass. Later
//! steps always win, which is what guarantees the output categories
//! partition the grid.
//!
//! Required excess over background (equation 1 of the paper):
//!   zDiff = 2.5 + a·cos(π·bg / (2b)),   bg ≥ 0
//!   zDiff = a,                           bg < 0
//!
//! NaN backgrounds make every comparison false, so missing data falls
//! through each stage untouched and is labeled NO_ECHO at the end.

use serde::{Deserialize, Serialize};

use crate::background::compute_background;
use crate::error::RainTypeResult;
use crate::grid::ReflectivityGrid;
use crate::params::RainTypeParams;
use crate::regions::{apply_area_overrides, label_echo_regions};
use crate::stencil::StencilSet;
use crate::uncertain::stamp_uncertain_zones;

/// Final per-cell rain-type category. Codes 0-6 follow the reference
/// output convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RainType {
    /// No defensible reflectivity value at this cell.
    NoEcho = 0,
    Stratiform = 1,
    Convective = 2,
    /// Stratiform-looking echo close enough to a convective core that its
    /// type cannot be asserted with confidence.
    Uncertain = 3,
    /// Small isolated object whose reflectivity clears its area-dependent
    /// threshold.
    IsoConvCore = 4,
    /// Remainder of a small isolated object around its core.
    IsoConvFringe = 5,
    WeakEcho = 6,
}

impl RainType {
    /// Integer code used in gridded output files.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Intermediate per-cell core label, mutated through the detection passes.
/// `Unset` cells that survive every pass fall through to STRATIFORM;
/// `NotCore` is a definite rejection that maps to WEAK_ECHO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreState {
    Unset,
    NotCore,
    Convective,
    Isolated,
}

/// Classification result: one category per input cell.
#[derive(Debug, Clone, Serialize)]
pub struct RainTypeMap {
    /// Row-major rain types, same shape as the input grid.
    pub types: Vec<RainType>,
    pub width: usize,
    pub height: usize,
}

impl RainTypeMap {
    /// Per-category cell counts, indexed by `RainType::code()`.
    pub fn counts(&self) -> [usize; 7] {
        let mut counts = [0usize; 7];
        for &t in &self.types {
            counts[t.code() as usize] += 1;
        }
        counts
    }
}

/// Classifier owning a validated parameter set and the stencils built for
/// it. Build once, classify any number of grids at the same spacing.
pub struct RainTypeClassifier {
    params: RainTypeParams,
    stencils: StencilSet,
}

impl RainTypeClassifier {
    pub fn new(params: RainTypeParams) -> RainTypeResult<Self> {
        params.validate()?;
        let stencils = StencilSet::new(&params);
        Ok(Self { params, stencils })
    }

    pub fn params(&self) -> &RainTypeParams {
        &self.params
    }

    /// Classify one reflectivity grid into the seven rain-type categories.
    pub fn classify(&self, refl: &ReflectivityGrid) -> RainTypeResult<RainTypeMap> {
        let p = &self.params;
        let len = refl.data.len();

        tracing::debug!(
            width = refl.width,
            height = refl.height,
            valid = refl.valid_count(),
            "classifying reflectivity grid"
        );

        // --- Stage 1: background reflectivity ---
        let background = compute_background(refl, &self.stencils.background);

        // --- Stage 2: adaptive core test + weak-echo floor ---
        let mut cores = detect_cores(&refl.data, &background, p);

        // --- Stage 3: object-size refinement ---
        let regions = label_echo_regions(refl, p.weak_echo_thres, p.grid_spacing_km);
        let mut classes: Vec<Option<RainType>> = vec![None; len];
        apply_area_overrides(refl, &regions, &mut cores, &mut classes, p);
        tracing::debug!(
            regions = regions.len(),
            cores = cores.iter().filter(|&&s| s == CoreState::Convective).count(),
            "core detection complete"
        );

        // --- Stage 4: derive the classification grid ---
        let mut types = derive_classes(&refl.data, &cores, &classes, p.weak_echo_thres);

        // --- Stage 5: uncertain zones around cores ---
        stamp_uncertain_zones(
            &background,
            &cores,
            &mut types,
            &self.stencils,
            p,
            refl.width,
            refl.height,
        );

        // --- Stage 6: final override pass ---
        finalize_overrides(&refl.data, &cores, &mut types, p.weak_echo_thres);

        let map = RainTypeMap {
            types,
            width: refl.width,
            height: refl.height,
        };
        let counts = map.counts();
        tracing::debug!(
            stratiform = counts[RainType::Stratiform.code() as usize],
            convective = counts[RainType::Convective.code() as usize],
            uncertain = counts[RainType::Uncertain.code() as usize],
            "classification complete"
        );
        Ok(map)
    }
}

/// One-shot convenience: validate, build stencils, classify.
pub fn classify_rain_types(
    refl: &ReflectivityGrid,
    params: RainTypeParams,
) -> RainTypeResult<RainTypeMap> {
    RainTypeClassifier::new(params)?.classify(refl)
}

/// Excess over background required for a convective core at the given
/// background value.
pub(crate) fn required_excess(bg: f64, p: &RainTypeParams) -> f64 {
    let a = p.min_z_diff as f64;
    if bg < 0.0 {
        a
    } else {
        let b = p.deep_cos_zero as f64;
        2.5 + a * (std::f64::consts::PI * bg * 0.5 / b).cos()
    }
}

/// Stage-2 core detection: the inclusive excess test, then the weak-echo
/// floor. Cells failing both comparisons (including all-NaN ones) stay
/// `Unset`.
pub(crate) fn detect_cores(refl: &[f32], background: &[f32], p: &RainTypeParams) -> Vec<CoreState> {
    let mut cores = vec![CoreState::Unset; refl.len()];
    for i in 0..refl.len() {
        let bg = background[i] as f64;
        if refl[i] as f64 - bg >= required_excess(bg, p) {
            cores[i] = CoreState::Convective;
        }
    }
    for i in 0..refl.len() {
        if refl[i] < p.weak_echo_thres {
            cores[i] = CoreState::NotCore;
        }
    }
    cores
}

/// Stage-4 derivation, in reference order: core labels, then the sentinel
/// fallthrough to STRATIFORM, then missing and weak-echo overwrites.
fn derive_classes(
    refl: &[f32],
    cores: &[CoreState],
    classes: &[Option<RainType>],
    weak_echo_thres: f32,
) -> Vec<RainType> {
    let mut types: Vec<RainType> = cores
        .iter()
        .zip(classes)
        .map(|(core, class)| match core {
            CoreState::Convective => RainType::Convective,
            CoreState::Isolated => RainType::IsoConvCore,
            CoreState::NotCore => RainType::WeakEcho,
            CoreState::Unset => class.unwrap_or(RainType::Stratiform),
        })
        .collect();
    for (i, &dbz) in refl.iter().enumerate() {
        if dbz.is_nan() {
            types[i] = RainType::NoEcho;
        } else if dbz < weak_echo_thres {
            types[i] = RainType::WeakEcho;
        }
    }
    types
}

/// Final named override pass: cores, missing data, and weak echo can never
/// be displaced by the uncertain-zone stamping.
fn finalize_overrides(
    refl: &[f32],
    cores: &[CoreState],
    types: &mut [RainType],
    weak_echo_thres: f32,
) {
    for i in 0..types.len() {
        match cores[i] {
            CoreState::Convective => types[i] = RainType::Convective,
            CoreState::Isolated => types[i] = RainType::IsoConvCore,
            _ => {}
        }
        if refl[i].is_nan() {
            types[i] = RainType::NoEcho;
        } else if refl[i] < weak_echo_thres {
            types[i] = RainType::WeakEcho;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn required_excess_matches_cosine_formula() {
        let p = RainTypeParams::default();
        // bg = 0: cos(0) = 1 → 2.5 + a.
        assert_relative_eq!(required_excess(0.0, &p), 22.5, epsilon = 1e-12);
        // bg = b: cos(π/2) → 2.5.
        assert_relative_eq!(required_excess(40.0, &p), 2.5, epsilon = 1e-9);
        // Negative background short-circuits to a.
        assert_relative_eq!(required_excess(-5.0, &p), 20.0, epsilon = 1e-12);
        // NaN background keeps the comparison unsatisfiable.
        assert!(required_excess(f64::NAN, &p).is_nan());
    }

    #[test]
    fn core_test_threshold_is_inclusive() {
        // Fixed background of 0 dBZ → required excess exactly 22.5.
        let p = RainTypeParams::default();
        let background = vec![0.0f32; 3];
        let refl = vec![22.5, 22.49, 30.0];
        let cores = detect_cores(&refl, &background, &p);
        assert_eq!(cores[0], CoreState::Convective); // equality counts
        assert_eq!(cores[1], CoreState::Unset);
        assert_eq!(cores[2], CoreState::Convective);
    }

    #[test]
    fn weak_echo_floor_beats_core_test() {
        let p = RainTypeParams::default();
        // Background so low the excess test fires, but below the weak floor.
        let background = vec![-40.0f32; 1];
        let refl = vec![5.0f32];
        let cores = detect_cores(&refl, &background, &p);
        assert_eq!(cores[0], CoreState::NotCore);
    }

    #[test]
    fn missing_cells_classify_as_no_echo() {
        let mut grid = ReflectivityGrid::filled(10, 10, 25.0);
        grid.set(0, 0, f32::NAN);
        grid.set(5, 7, f32::NAN);
        let map = classify_rain_types(&grid, RainTypeParams::default()).unwrap();
        assert_eq!(map.types[0], RainType::NoEcho);
        assert_eq!(map.types[5 * 10 + 7], RainType::NoEcho);
        // And nowhere else.
        let n_missing = map.types.iter().filter(|&&t| t == RainType::NoEcho).count();
        assert_eq!(n_missing, 2);
    }

    #[test]
    fn sub_threshold_field_is_all_weak_echo() {
        let grid = ReflectivityGrid::filled(15, 15, 4.0);
        let map = classify_rain_types(&grid, RainTypeParams::default()).unwrap();
        assert!(map.types.iter().all(|&t| t == RainType::WeakEcho));
    }

    #[test]
    fn flat_moderate_field_is_all_stratiform() {
        // 50×50 at 1 km spacing → one 2500 km² object, above A_high, so no
        // fringe relabeling; background settles at 30 dBZ, excess is zero.
        let grid = ReflectivityGrid::filled(50, 50, 30.0);
        let map = classify_rain_types(&grid, RainTypeParams::default()).unwrap();
        assert!(map.types.iter().all(|&t| t == RainType::Stratiform));
    }

    #[test]
    fn output_is_a_partition() {
        // Mixed field: missing, weak, moderate, and a strong core.
        let mut grid = ReflectivityGrid::filled(40, 40, 24.0);
        for c in 0..40 {
            grid.set(0, c, f32::NAN);
            grid.set(1, c, 3.0);
        }
        grid.set(20, 20, 55.0);
        let map = classify_rain_types(&grid, RainTypeParams::default()).unwrap();

        assert_eq!(map.counts().iter().sum::<usize>(), 40 * 40);
        // NO_ECHO exactly where input was missing.
        for (i, &t) in map.types.iter().enumerate() {
            assert_eq!(t == RainType::NoEcho, grid.data[i].is_nan());
        }
        // The hard-threshold core survived every later pass.
        assert_eq!(map.types[20 * 40 + 20], RainType::Convective);
        // Weak row stayed weak.
        assert!(map.types[40..80].iter().all(|&t| t == RainType::WeakEcho));
    }

    #[test]
    fn strong_core_marks_surrounding_uncertain_zone() {
        // 45×45 so the single echo object (2025 km²) exceeds A_high and the
        // surroundings stay stratiform rather than fringe.
        let mut grid = ReflectivityGrid::filled(45, 45, 24.0);
        grid.set(20, 20, 60.0);
        let map = classify_rain_types(&grid, RainTypeParams::default()).unwrap();

        assert_eq!(map.types[20 * 45 + 20], RainType::Convective);
        // Cells just around the core sit inside the stamped disc.
        assert_eq!(map.types[20 * 45 + 21], RainType::Uncertain);
        assert_eq!(map.types[15 * 45 + 20], RainType::Uncertain);
        // Far corner is outside every band radius.
        assert_eq!(map.types[0], RainType::Stratiform);
    }
}
