use serde::{Deserialize, Serialize};

use crate::error::{RainTypeError, RainTypeResult};

/// A 2D Cartesian radar reflectivity field in dBZ, row-major.
/// Missing cells hold NaN; values use f32, intermediate math uses f64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectivityGrid {
    /// Row-major reflectivity values in dBZ.
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
}

impl ReflectivityGrid {
    /// Create a new grid filled with the given value.
    pub fn filled(width: usize, height: usize, fill: f32) -> Self {
        Self {
            data: vec![fill; width * height],
            width,
            height,
        }
    }

    /// Wrap an existing row-major buffer, validating its shape.
    pub fn from_vec(data: Vec<f32>, width: usize, height: usize) -> RainTypeResult<Self> {
        if width == 0 || height == 0 {
            return Err(RainTypeError::EmptyGrid { width, height });
        }
        if data.len() != width * height {
            return Err(RainTypeError::ShapeMismatch {
                len: data.len(),
                width,
                height,
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Wrap a buffer whose missing cells are encoded with a sentinel value
    /// (e.g. -9999), translating the sentinel to NaN at the boundary.
    pub fn from_sentinel(
        mut data: Vec<f32>,
        width: usize,
        height: usize,
        missing_value: f32,
    ) -> RainTypeResult<Self> {
        for v in &mut data {
            if *v == missing_value {
                *v = f32::NAN;
            }
        }
        Self::from_vec(data, width, height)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: f32) {
        self.data[row * self.width + col] = val;
    }

    /// Number of cells holding a defensible reflectivity value.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }
}
