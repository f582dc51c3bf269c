//! Anisotropy of an embedding's covariance spectrum.
//!
//! The covariance eigenvalues are taken from the singular values of the
//! column-centered matrix, `lambda_i = s_i^2 / (n - 1)`, which avoids forming
//! the `d x d` covariance matrix. Anisotropy is the share of total variance
//! carried by the dominant principal direction:
//!
//! - `1.0` for rank-1 data (all points on a line)
//! - about `1 / min(n, d)` for an isotropic cloud

use log::debug;
use nalgebra::{DMatrix, Scalar};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::GeometryConfig;
use crate::error::{GeometryError, Result};
use crate::math::linalg::{
    center_columns, has_zero_variance, promote, rows_identical, validate_embedding,
};

/// Minimum number of samples for a covariance estimate.
pub const MIN_SAMPLES: usize = 2;

/// Covariance eigen-spectrum of an embedding.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CovarianceSpectrum {
    /// Covariance eigenvalues, descending, non-negative.
    pub eigenvalues: Vec<f64>,

    /// Number of samples the spectrum was estimated from.
    pub n_samples: usize,
}

impl CovarianceSpectrum {
    /// Sum of all eigenvalues.
    #[must_use]
    pub fn total_variance(&self) -> f64 {
        self.eigenvalues.iter().sum()
    }

    /// Largest eigenvalue over the sum of all eigenvalues, in `(0, 1]`.
    #[must_use]
    pub fn anisotropy(&self) -> f64 {
        self.eigenvalues.first().copied().unwrap_or(0.0) / self.total_variance()
    }

    /// Fraction of total variance explained by each principal direction.
    #[must_use]
    pub fn explained_variance_ratio(&self) -> Vec<f64> {
        let total = self.total_variance();
        self.eigenvalues.iter().map(|&v| v / total).collect()
    }

    /// Effective rank: exponential of the entropy of the variance shares.
    ///
    /// Ranges from 1 (rank-1 data) to the number of eigenvalues (isotropic).
    #[must_use]
    pub fn effective_rank(&self) -> f64 {
        let entropy: f64 = -self
            .explained_variance_ratio()
            .iter()
            .filter(|&&p| p > 0.0)
            .map(|&p| p * p.ln())
            .sum::<f64>();
        entropy.exp()
    }
}

/// Compute the covariance eigen-spectrum of an embedding matrix.
///
/// # Arguments
///
/// * `emb` - Embedding matrix of shape `(n_samples, n_features)`
/// * `config` - Geometry configuration (uses `variance_floor`)
///
/// # Errors
///
/// - [`GeometryError::InsufficientSamples`] if `n_samples < 2`
/// - [`GeometryError::DegenerateInput`] if all rows are identical
/// - [`GeometryError::InvalidInput`] for non-finite entries
pub fn covariance_spectrum<T>(emb: &DMatrix<T>, config: &GeometryConfig) -> Result<CovarianceSpectrum>
where
    T: Scalar + Copy + Into<f64>,
{
    config.validate()?;
    let emb = promote(emb);
    validate_embedding(&emb, MIN_SAMPLES)?;

    let n = emb.nrows();
    if rows_identical(&emb) {
        return Err(GeometryError::degenerate(
            "all samples are identical; total variance is zero",
        ));
    }
    let centered = center_columns(&emb);
    if has_zero_variance(centered.norm_squared(), emb.norm_squared(), config.variance_floor) {
        return Err(GeometryError::degenerate(
            "all samples are identical; total variance is zero",
        ));
    }

    let denom = (n - 1) as f64;
    let mut eigenvalues: Vec<f64> = centered
        .singular_values()
        .iter()
        .map(|s| s * s / denom)
        .collect();
    eigenvalues.sort_by(|a, b| b.total_cmp(a));

    debug!(
        "covariance spectrum of {}x{} embedding: top eigenvalue {:.6e}, {} eigenvalues",
        n,
        emb.ncols(),
        eigenvalues[0],
        eigenvalues.len()
    );

    Ok(CovarianceSpectrum {
        eigenvalues,
        n_samples: n,
    })
}

/// Anisotropy of an embedding matrix with the default configuration.
///
/// # Errors
///
/// See [`covariance_spectrum`].
///
/// # Example
///
/// ```
/// use embedding_geometry::anisotropy;
/// use nalgebra::DMatrix;
///
/// // Points on a line: all variance along one direction.
/// let emb = DMatrix::from_row_slice(3, 2, &[0.0, 0.0, 1.0, 2.0, 2.0, 4.0]);
/// let a = anisotropy(&emb)?;
/// assert!((a - 1.0).abs() < 1e-12);
/// # Ok::<(), embedding_geometry::GeometryError>(())
/// ```
pub fn anisotropy<T>(emb: &DMatrix<T>) -> Result<f64>
where
    T: Scalar + Copy + Into<f64>,
{
    anisotropy_with_config(emb, &GeometryConfig::default())
}

/// Anisotropy of an embedding matrix.
///
/// # Errors
///
/// See [`covariance_spectrum`].
pub fn anisotropy_with_config<T>(emb: &DMatrix<T>, config: &GeometryConfig) -> Result<f64>
where
    T: Scalar + Copy + Into<f64>,
{
    Ok(covariance_spectrum(emb, config)?.anisotropy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rank_one_is_one() {
        let emb = DMatrix::from_fn(10, 3, |i, j| (i as f64) * (j as f64 + 1.0) + 0.5);
        assert_relative_eq!(anisotropy(&emb).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_axis_aligned_spectrum() {
        // Centered, orthogonal columns with variances 2 and 1 (n - 1 = 3).
        let emb = DMatrix::from_row_slice(4, 2, &[
            -3.0_f64.sqrt(), 0.0,
            3.0_f64.sqrt(), 0.0,
            0.0, -1.5_f64.sqrt(),
            0.0, 1.5_f64.sqrt(),
        ]);
        let spectrum = covariance_spectrum(&emb, &GeometryConfig::default()).unwrap();
        assert_relative_eq!(spectrum.eigenvalues[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(spectrum.eigenvalues[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(spectrum.total_variance(), 3.0, epsilon = 1e-12);
        assert_relative_eq!(spectrum.anisotropy(), 2.0 / 3.0, epsilon = 1e-12);
        let ratio = spectrum.explained_variance_ratio();
        assert_relative_eq!(ratio[0] + ratio[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_eigenvalues_descending() {
        let emb = DMatrix::from_fn(8, 4, |i, j| ((i * 5 + j * 3) % 7) as f64 - (j as f64) * 0.1);
        let spectrum = covariance_spectrum(&emb, &GeometryConfig::default()).unwrap();
        assert_eq!(spectrum.eigenvalues.len(), 4);
        for w in spectrum.eigenvalues.windows(2) {
            assert!(w[0] >= w[1]);
        }
        assert!(spectrum.eigenvalues.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_effective_rank_bounds() {
        let line = DMatrix::from_fn(6, 2, |i, j| i as f64 * (j as f64 + 1.0));
        let spectrum = covariance_spectrum(&line, &GeometryConfig::default()).unwrap();
        assert_relative_eq!(spectrum.effective_rank(), 1.0, epsilon = 1e-6);

        // Square corners: equal variance in both directions.
        let square = DMatrix::from_row_slice(4, 2, &[1.0, 1.0, -1.0, 1.0, 1.0, -1.0, -1.0, -1.0]);
        let spectrum = covariance_spectrum(&square, &GeometryConfig::default()).unwrap();
        assert_relative_eq!(spectrum.effective_rank(), 2.0, epsilon = 1e-10);
        assert_relative_eq!(spectrum.anisotropy(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_identical_rows_degenerate() {
        let emb = DMatrix::from_element(5, 3, 0.7);
        assert!(matches!(
            anisotropy(&emb),
            Err(GeometryError::DegenerateInput { .. })
        ));
    }

    #[test]
    fn test_single_sample() {
        let emb = DMatrix::from_row_slice(1, 3, &[1.0, 2.0, 3.0]);
        assert_eq!(
            anisotropy(&emb),
            Err(GeometryError::insufficient_samples(2, 1))
        );
    }

    #[test]
    fn test_f32_input() {
        let emb = DMatrix::from_row_slice(3, 2, &[0.0f32, 0.0, 1.0, 0.0, 0.0, 1.0]);
        let a = anisotropy(&emb).unwrap();
        assert!(a > 0.0 && a <= 1.0);
    }
}
