//! Uncertain-zone stamping around convective cores.
//!
//! Echoes near a convective core look stratiform but cannot be asserted to
//! be; each full core (not the isolated variant) stamps a disc of
//! "uncertain" onto its surroundings. Stronger backgrounds get larger
//! discs: the radius steps from R-4 up to R km across five background
//! bands below Z_conv. Stamps accumulate into a hit-count grid, which is
//! then zeroed wherever the current classification is anything other than
//! stratiform, so cores, weak echo, and fringe cells are immune.

use crate::classify::{CoreState, RainType};
use crate::params::RainTypeParams;
use crate::stencil::{DiscStencil, StencilSet};

/// Stamp uncertain zones around every `CoreState::Convective` cell and
/// relabel the stratiform cells they cover. `background` is the smoothed
/// field in dBZ; `types` is the classification after the derivation pass.
pub fn stamp_uncertain_zones(
    background: &[f32],
    cores: &[CoreState],
    types: &mut [RainType],
    stencils: &StencilSet,
    p: &RainTypeParams,
    width: usize,
    height: usize,
) {
    let mut hits = vec![0u32; width * height];
    let (w, h) = (width as isize, height as isize);

    for (i, &core) in cores.iter().enumerate() {
        if core != CoreState::Convective {
            continue;
        }
        let r = (i / width) as isize;
        let c = (i % width) as isize;

        let band = radius_band(background[i], p.dbz_for_max_conv_radius);
        let stencil = &stencils.proximity[band];
        let n = stencil.half_width() as isize;

        // Clamp the stamp window to the grid; the cut amounts are the
        // clamped overflow on each side.
        let r0 = (r - n).max(0);
        let r1 = (r + n).min(h - 1);
        let c0 = (c - n).max(0);
        let c1 = (c + n).min(w - 1);
        let top = (r0 - (r - n)) as usize;
        let bottom = ((r + n) - r1) as usize;
        let left = (c0 - (c - n)) as usize;
        let right = ((c + n) - c1) as usize;

        if top == 0 && right == 0 && bottom == 0 && left == 0 {
            stamp(&mut hits, stencil, r0 as usize, c0 as usize, width);
        } else {
            let trimmed = stencil.chop(top, right, bottom, left);
            stamp(&mut hits, &trimmed, r0 as usize, c0 as usize, width);
        }
    }

    // Only cells still believed stratiform are open to reclassification.
    for (i, hit) in hits.iter_mut().enumerate() {
        if types[i] != RainType::Stratiform {
            *hit = 0;
        }
    }
    let mut stamped = 0usize;
    for (i, &hit) in hits.iter().enumerate() {
        if hit != 0 {
            types[i] = RainType::Uncertain;
            stamped += 1;
        }
    }
    tracing::debug!(uncertain = stamped, "uncertain zones stamped");
}

fn stamp(hits: &mut [u32], stencil: &DiscStencil, r0: usize, c0: usize, width: usize) {
    for sr in 0..stencil.rows {
        for sc in 0..stencil.cols {
            if stencil.get(sr, sc) > 0.0 {
                hits[(r0 + sr) * width + (c0 + sc)] += 1;
            }
        }
    }
}

/// Which of the five proximity discs applies at the given background.
/// Band 4 is the full R km radius; each 5 dBZ step below Z_conv drops to
/// the next smaller disc, monotonically.
fn radius_band(bg: f32, z_conv: f32) -> usize {
    if bg >= z_conv {
        4
    } else if bg > z_conv - 5.0 {
        3
    } else if bg > z_conv - 10.0 {
        2
    } else if bg > z_conv - 15.0 {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_setup() -> (RainTypeParams, StencilSet) {
        let p = RainTypeParams::default();
        let stencils = StencilSet::new(&p);
        (p, stencils)
    }

    #[test]
    fn band_boundaries_follow_background() {
        // Defaults put Z_conv at 46 dBZ; band edges sit at 31/36/41/46.
        assert_eq!(radius_band(46.0, 46.0), 4);
        assert_eq!(radius_band(45.0, 46.0), 3);
        assert_eq!(radius_band(41.0, 46.0), 2); // edge values fall downward
        assert_eq!(radius_band(36.5, 46.0), 2);
        assert_eq!(radius_band(36.0, 46.0), 1);
        assert_eq!(radius_band(31.5, 46.0), 1);
        assert_eq!(radius_band(31.0, 46.0), 0);
        assert_eq!(radius_band(-10.0, 46.0), 0);
    }

    #[test]
    fn max_band_core_stamps_full_radius_disc() {
        // 21×21 grid, core at center with background exactly Z_conv: the
        // stamped disc has the full R = 10 km radius.
        let (p, stencils) = default_setup();
        let len = 21 * 21;
        let center = 10 * 21 + 10;
        let mut background = vec![20.0f32; len];
        background[center] = p.dbz_for_max_conv_radius;
        let mut cores = vec![CoreState::Unset; len];
        cores[center] = CoreState::Convective;
        let mut types = vec![RainType::Stratiform; len];
        types[center] = RainType::Convective;

        stamp_uncertain_zones(&background, &cores, &mut types, &stencils, &p, 21, 21);

        for r in 0..21usize {
            for c in 0..21usize {
                let i = r * 21 + c;
                if i == center {
                    assert_eq!(types[i], RainType::Convective, "core itself is immune");
                    continue;
                }
                let dr = r as f32 - 10.0;
                let dc = c as f32 - 10.0;
                let inside = dr * dr + dc * dc <= 100.0;
                let expected = if inside {
                    RainType::Uncertain
                } else {
                    RainType::Stratiform
                };
                assert_eq!(types[i], expected, "cell ({r}, {c})");
            }
        }
    }

    #[test]
    fn non_stratiform_cells_are_immune() {
        let (p, stencils) = default_setup();
        let len = 11 * 11;
        let center = 5 * 11 + 5;
        let background = vec![46.0f32; len];
        let mut cores = vec![CoreState::Unset; len];
        cores[center] = CoreState::Convective;
        let mut types = vec![RainType::Stratiform; len];
        types[center] = RainType::Convective;
        types[5 * 11 + 6] = RainType::WeakEcho;
        types[5 * 11 + 4] = RainType::IsoConvFringe;
        types[4 * 11 + 5] = RainType::NoEcho;

        stamp_uncertain_zones(&background, &cores, &mut types, &stencils, &p, 11, 11);

        assert_eq!(types[5 * 11 + 6], RainType::WeakEcho);
        assert_eq!(types[5 * 11 + 4], RainType::IsoConvFringe);
        assert_eq!(types[4 * 11 + 5], RainType::NoEcho);
        assert_eq!(types[5 * 11 + 7], RainType::Uncertain);
    }

    #[test]
    fn isolated_cores_do_not_stamp() {
        let (p, stencils) = default_setup();
        let len = 9 * 9;
        let background = vec![46.0f32; len];
        let mut cores = vec![CoreState::Unset; len];
        cores[4 * 9 + 4] = CoreState::Isolated;
        let mut types = vec![RainType::Stratiform; len];
        types[4 * 9 + 4] = RainType::IsoConvCore;

        stamp_uncertain_zones(&background, &cores, &mut types, &stencils, &p, 9, 9);

        assert!(types.iter().all(|&t| t != RainType::Uncertain));
    }

    #[test]
    fn corner_core_clips_without_misalignment() {
        // Core at (0, 0) with a disc radius far wider than the written
        // region on the low sides. The surviving pattern must equal the
        // lower-right quadrant of the unclipped stencil.
        let p = RainTypeParams {
            max_conv_radius_km: 5.0,
            ..Default::default()
        };
        let stencils = StencilSet::new(&p);
        let (width, height) = (7usize, 7usize);
        let len = width * height;
        let mut background = vec![20.0f32; len];
        background[0] = p.dbz_for_max_conv_radius; // band 4 → radius 5 km
        let mut cores = vec![CoreState::Unset; len];
        cores[0] = CoreState::Convective;
        let mut types = vec![RainType::Stratiform; len];
        types[0] = RainType::Convective;

        stamp_uncertain_zones(&background, &cores, &mut types, &stencils, &p, width, height);

        let stencil = &stencils.proximity[4];
        let n = stencil.half_width();
        for r in 0..height {
            for c in 0..width {
                if r == 0 && c == 0 {
                    continue;
                }
                let covered = r <= n && c <= n && stencil.get(n + r, n + c) > 0.0;
                let expected = if covered {
                    RainType::Uncertain
                } else {
                    RainType::Stratiform
                };
                assert_eq!(types[r * width + c], expected, "cell ({r}, {c})");
            }
        }
    }
}
