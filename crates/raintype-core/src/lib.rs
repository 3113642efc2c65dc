//! Rain-type classification of Cartesian gridded radar reflectivity.
//!
//! Implements the convective/stratiform partitioning scheme of Powell,
//! Houze & Brodzik (2016, JTECH), an update of Steiner et al. (1995) that
//! adds an "uncertain" category near convective cores and recovers
//! isolated, often shallow, convection that the classic background-excess
//! test files under stratiform.
//!
//! Pipeline, strictly staged (each stage completes before the next reads):
//! 1. background reflectivity via renormalized disc-mean smoothing
//!    ([`background`]);
//! 2. cosine-shaped adaptive core detection against that background
//!    ([`classify`]);
//! 3. 4-connected echo objects with area-dependent threshold overrides
//!    ([`regions`]);
//! 4. uncertain-zone stamping around each core, edge-clipped
//!    ([`uncertain`]);
//! 5. a final override pass guaranteeing the seven output categories
//!    partition the grid.
//!
//! The whole computation is a pure function from (grid, parameters) to a
//! classification grid; missing data is NaN throughout and surfaces as
//! `NO_ECHO`, never as an error.
//!
//! ```
//! use raintype_core::{classify_rain_types, RainTypeParams, ReflectivityGrid};
//!
//! let grid = ReflectivityGrid::filled(64, 64, 30.0);
//! let map = classify_rain_types(&grid, RainTypeParams::default()).unwrap();
//! assert_eq!(map.types.len(), 64 * 64);
//! ```

pub mod background;
pub mod classify;
pub mod error;
pub mod grid;
pub mod params;
pub mod regions;
pub mod stencil;
pub mod uncertain;
pub mod units;

pub use classify::{classify_rain_types, CoreState, RainType, RainTypeClassifier, RainTypeMap};
pub use error::{RainTypeError, RainTypeResult};
pub use grid::ReflectivityGrid;
pub use params::RainTypeParams;
pub use regions::{label_echo_regions, EchoRegion};
pub use stencil::{DiscStencil, StencilSet};
