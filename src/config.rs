//! Configuration for embedding geometry estimators.
//!
//! This module provides the [`GeometryConfig`] struct which centralizes the
//! numerical floors and tolerances used by every estimator, along with a few
//! presets.
//!
//! # Example
//!
//! ```
//! use embedding_geometry::GeometryConfig;
//!
//! // Use default configuration
//! let config = GeometryConfig::default();
//!
//! // Trim the TwoNN tail harder and guard the pseudo-inverse more tightly
//! let strict = GeometryConfig::strict().with_reduction_factor(10);
//! assert!(strict.validate().is_ok());
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, Result};
use crate::intrinsic_dim::DEFAULT_REDUCTION_FACTOR;

/// Configuration for embedding geometry computation.
///
/// # TwoNN Parameters
///
/// - `distance_floor`: nearest-neighbor distances below this are floored and
///   the sample is discarded.
/// - `degeneracy_eps`: distance ratios `mu <= 1 + eps` carry no information.
/// - `reduction_factor`: only the lowest `n / reduction_factor` ratios enter
///   the regression.
/// - `distance_tile_rows`: rows per block of the pairwise distance matrix.
///
/// # Linear Algebra Guards
///
/// - `singular_value_rtol`: relative singular value threshold for the
///   alignment pseudo-inverse. Zero disables the guard.
/// - `variance_floor`: optional relative energy floor for centered matrices.
///   Identical rows are always detected exactly; zero adds no further check.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeometryConfig {
    /// Floor applied to nearest-neighbor distances (default 1e-8).
    pub distance_floor: f64,

    /// Ratios `mu <= 1 + degeneracy_eps` are dropped before regression.
    pub degeneracy_eps: f64,

    /// Upper-tail trimming factor for the TwoNN regression (>= 1).
    pub reduction_factor: usize,

    /// Singular values `s <= rtol * s_max` are rejected by the alignment
    /// estimator. `0.0` accepts everything except exact zeros.
    pub singular_value_rtol: f64,

    /// Extra relative energy floor for zero-variance detection (default 0).
    /// Data varying by a few ulps around a large offset falls below small
    /// positive floors.
    pub variance_floor: f64,

    /// Rows per tile of the pairwise distance computation.
    pub distance_tile_rows: usize,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            distance_floor: 1e-8,
            degeneracy_eps: 1e-8,
            reduction_factor: DEFAULT_REDUCTION_FACTOR,
            singular_value_rtol: 1e-10,
            variance_floor: 0.0,
            distance_tile_rows: 256,
        }
    }
}

impl GeometryConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if !(self.distance_floor > 0.0 && self.distance_floor.is_finite()) {
            return Err(GeometryError::invalid_config(
                "distance_floor must be positive and finite",
            ));
        }
        if !(self.degeneracy_eps >= 0.0 && self.degeneracy_eps.is_finite()) {
            return Err(GeometryError::invalid_config(
                "degeneracy_eps must be non-negative and finite",
            ));
        }
        if self.reduction_factor < 1 {
            return Err(GeometryError::invalid_config(
                "reduction_factor must be at least 1",
            ));
        }
        if !(0.0..1.0).contains(&self.singular_value_rtol) {
            return Err(GeometryError::invalid_config(
                "singular_value_rtol must be in [0, 1)",
            ));
        }
        if !(0.0..1.0).contains(&self.variance_floor) {
            return Err(GeometryError::invalid_config(
                "variance_floor must be in [0, 1)",
            ));
        }
        if self.distance_tile_rows < 1 {
            return Err(GeometryError::invalid_config(
                "distance_tile_rows must be at least 1",
            ));
        }
        Ok(())
    }

    /// Preset with a tighter pseudo-inverse guard.
    ///
    /// Rejects alignment inputs with a condition number above 1e6. Suited to
    /// embeddings that were stored as `f32`.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            singular_value_rtol: 1e-6,
            ..Self::default()
        }
    }

    /// Preset that disables the relative singular value guard.
    ///
    /// Only exact zero singular values are rejected; ill-conditioned inputs
    /// produce whatever the unregularized pseudo-inverse yields.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            singular_value_rtol: 0.0,
            ..Self::default()
        }
    }

    /// Set the TwoNN reduction factor.
    #[must_use]
    pub const fn with_reduction_factor(mut self, factor: usize) -> Self {
        self.reduction_factor = factor;
        self
    }

    /// Set the nearest-neighbor distance floor.
    #[must_use]
    pub const fn with_distance_floor(mut self, floor: f64) -> Self {
        self.distance_floor = floor;
        self
    }

    /// Set the degeneracy epsilon for distance ratios.
    #[must_use]
    pub const fn with_degeneracy_eps(mut self, eps: f64) -> Self {
        self.degeneracy_eps = eps;
        self
    }

    /// Set the relative singular value tolerance.
    #[must_use]
    pub const fn with_singular_value_rtol(mut self, rtol: f64) -> Self {
        self.singular_value_rtol = rtol;
        self
    }

    /// Set the relative zero-variance floor.
    #[must_use]
    pub const fn with_variance_floor(mut self, floor: f64) -> Self {
        self.variance_floor = floor;
        self
    }

    /// Set the number of rows per distance tile.
    #[must_use]
    pub const fn with_distance_tile_rows(mut self, rows: usize) -> Self {
        self.distance_tile_rows = rows;
        self
    }
}
