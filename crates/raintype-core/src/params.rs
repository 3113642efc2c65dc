use serde::{Deserialize, Serialize};

use crate::error::{RainTypeError, RainTypeResult};

/// Tunable thresholds of the rain-type classification, following Table 1 of
/// Powell et al. (2016). Defaults are for an S-band radar over a tropical
/// marine region; `conv_thres_dbz` is the most sensitive of the set and
/// should be lowered for C-band or wider beams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RainTypeParams {
    /// Base reflectivity excess over background required for a convective
    /// core ("a" in the paper).
    pub min_z_diff: f32,
    /// Background value at which the required excess reaches its minimum
    /// ("b" in the paper).
    pub deep_cos_zero: f32,
    /// Minimum convective threshold for small echo objects (Z_shallow).
    pub shallow_conv_min: f32,
    /// Absolute reflectivity at or above which an echo is always convective
    /// (Z_th).
    pub conv_thres_dbz: f32,
    /// Background value at which the maximum uncertain radius applies
    /// (Z_conv); should sit close to `conv_thres_dbz`.
    pub dbz_for_max_conv_radius: f32,
    /// Floor below which an echo can never be a core (Z_weak). 7 dBZ is
    /// about as low as possible without entering Bragg-scatter territory.
    pub weak_echo_thres: f32,
    /// Radius (km) of the disc over which background reflectivity is
    /// averaged (R_bg).
    pub background_radius_km: f32,
    /// Outer radius (km) of the uncertain zone around a convective core
    /// (R_conv). The stamped family spans R_conv-4 .. R_conv km.
    pub max_conv_radius_km: f32,
    /// Echo objects smaller than this (km²) are dismissed as weak echo
    /// (A_low).
    pub min_size_km2: f32,
    /// Area (km²) at which the object threshold starts sloping from
    /// `shallow_conv_min` toward `conv_thres_dbz` (A_med).
    pub start_slope_km2: f32,
    /// Objects larger than this (km²) keep the full convective threshold
    /// (A_high).
    pub max_size_km2: f32,
    /// Horizontal grid spacing in km (square, uniform cells).
    pub grid_spacing_km: f32,
}

impl Default for RainTypeParams {
    fn default() -> Self {
        Self {
            min_z_diff: 20.0,
            deep_cos_zero: 40.0,
            shallow_conv_min: 28.0,
            conv_thres_dbz: 43.0,
            dbz_for_max_conv_radius: 46.0,
            weak_echo_thres: 7.0,
            background_radius_km: 5.0,
            max_conv_radius_km: 10.0,
            min_size_km2: 8.0,
            start_slope_km2: 50.0,
            max_size_km2: 2000.0,
            grid_spacing_km: 1.0,
        }
    }
}

impl RainTypeParams {
    /// Check the structural constraints the algorithm relies on.
    /// Negated comparisons so that NaN parameters are rejected too.
    pub fn validate(&self) -> RainTypeResult<()> {
        if !(self.grid_spacing_km > 0.0) || !self.grid_spacing_km.is_finite() {
            return Err(invalid("grid_spacing_km", "must be a positive finite km value"));
        }
        if !(self.background_radius_km > 0.0) {
            return Err(invalid("background_radius_km", "must be positive"));
        }
        if !(self.max_conv_radius_km >= 5.0) {
            return Err(invalid(
                "max_conv_radius_km",
                "uncertain-zone discs span radii R-4..R km, so R must be at least 5",
            ));
        }
        if !(self.min_size_km2 > 0.0) {
            return Err(invalid("min_size_km2", "must be positive"));
        }
        if !(self.min_size_km2 <= self.start_slope_km2 && self.start_slope_km2 <= self.max_size_km2)
        {
            return Err(invalid(
                "start_slope_km2",
                "area thresholds must satisfy min_size <= start_slope <= max_size",
            ));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, message: &str) -> RainTypeError {
    RainTypeError::InvalidParameter {
        name,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(RainTypeParams::default().validate().is_ok());
    }

    #[test]
    fn zero_spacing_rejected() {
        let params = RainTypeParams {
            grid_spacing_km: 0.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn nan_spacing_rejected() {
        let params = RainTypeParams {
            grid_spacing_km: f32::NAN,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn small_uncertain_radius_rejected() {
        let params = RainTypeParams {
            max_conv_radius_km: 4.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn unordered_area_thresholds_rejected() {
        let params = RainTypeParams {
            start_slope_km2: 5000.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }
}
