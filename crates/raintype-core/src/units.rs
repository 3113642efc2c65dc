//! dBZ ↔ linear reflectivity conversions.
//!
//! Radar reflectivity is logarithmic: Z = 10^(dBZ/10). Background averaging
//! must happen in linear units, so every smoothing pass round-trips through
//! these two functions. NaN propagates; log of a non-positive value yields
//! NaN/−∞, which downstream code treats as missing rather than an error.

/// Convert a reflectivity value in dBZ to linear units.
#[inline]
pub fn dbz_to_linear(dbz: f64) -> f64 {
    10f64.powf(0.1 * dbz)
}

/// Convert a linear reflectivity value back to dBZ.
#[inline]
pub fn linear_to_dbz(z: f64) -> f64 {
    10.0 * z.log10()
}
