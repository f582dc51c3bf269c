//! Procrustes-style similarity between two embeddings of the same samples.
//!
//! Both point sets are centered and scaled to unit Frobenius norm, then `Y`
//! is reconstructed from `X` with the least-squares linear map of
//! [`crate::alignment`]. The similarity is `1 - ||X A - Y||^2`:
//!
//! - `1.0` when `Y` is an exact linear image of `X`
//! - lower as the best linear map explains less of `Y`
//!
//! This is a fit-quality score, not a correlation coefficient. Callers must
//! not assume it stays inside `[0, 1]` once rounding and ill-conditioning
//! enter.
//!
//! The centered-residual variant scores the displacement `y0 - x` instead of
//! `y0`: how well a linear map of `x` explains what changed between the two.

use log::debug;
use nalgebra::{DMatrix, Scalar};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::alignment::fit_linear_alignment;
use crate::config::GeometryConfig;
use crate::error::{GeometryError, Result};
use crate::math::linalg::{
    center_and_normalize, promote, rows_identical, squared_error, validate_embedding,
};

/// Minimum number of samples; centering a single row leaves nothing.
pub const MIN_SAMPLES: usize = 2;

/// Outcome of a Procrustes fit.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProcrustesReport {
    /// `1 - residual_energy`.
    pub similarity: f64,

    /// Squared residual of the normalized reconstruction.
    pub residual_energy: f64,

    /// Number of samples compared.
    pub n_samples: usize,

    /// Feature dimension of both point sets.
    pub dim: usize,
}

/// Procrustes similarity of `y` reconstructed from `x`.
///
/// With no more samples than features, centered `x` is rank deficient and
/// the default guard rejects it. [`procrustes_report`] with
/// [`GeometryConfig::permissive`] inverts every nonzero singular value
/// instead, giving the unregularized score; its near-zero singular values
/// make that score sensitive to rounding.
///
/// # Errors
///
/// See [`procrustes_report`].
///
/// # Example
///
/// ```
/// use embedding_geometry::procrustes_similarity;
/// use nalgebra::DMatrix;
///
/// let x = DMatrix::from_row_slice(4, 2, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 2.0, 3.0]);
/// // A linear map plus a shift is explained perfectly.
/// let y = x.map(|v| 2.0 * v + 1.0);
/// let sim = procrustes_similarity(&x, &y)?;
/// assert!((sim - 1.0).abs() < 1e-10);
/// # Ok::<(), embedding_geometry::GeometryError>(())
/// ```
pub fn procrustes_similarity<T>(x: &DMatrix<T>, y: &DMatrix<T>) -> Result<f64>
where
    T: Scalar + Copy + Into<f64>,
{
    Ok(procrustes_report(x, y, &GeometryConfig::default())?.similarity)
}

/// Procrustes similarity of the displacement `y0 - x` reconstructed from `x`.
///
/// # Errors
///
/// See [`procrustes_report_centered`].
pub fn procrustes_similarity_centered<T>(x: &DMatrix<T>, y0: &DMatrix<T>) -> Result<f64>
where
    T: Scalar + Copy + Into<f64>,
{
    Ok(procrustes_report_centered(x, y0, &GeometryConfig::default())?.similarity)
}

/// Full Procrustes report of `y` reconstructed from `x`.
///
/// # Errors
///
/// - [`GeometryError::ShapeMismatch`] if `x` and `y` differ in shape
/// - [`GeometryError::InsufficientSamples`] for fewer than two rows
/// - [`GeometryError::DegenerateInput`] if the rows of `x` are identical, or
///   either set fails a positive `variance_floor`
/// - [`GeometryError::NumericalInstability`] if centered `x` is not full
///   column rank (for instance more features than samples)
pub fn procrustes_report<T>(
    x: &DMatrix<T>,
    y: &DMatrix<T>,
    config: &GeometryConfig,
) -> Result<ProcrustesReport>
where
    T: Scalar + Copy + Into<f64>,
{
    check_shapes(x, y)?;
    fit_normalized(&promote(x), &promote(y), config)
}

/// Full Procrustes report of the displacement `y0 - x` reconstructed from `x`.
///
/// When `y0 - x` has identical rows (for instance `y0 == x`) the zero map
/// reproduces the displacement exactly, so the similarity is `1.0`.
///
/// # Errors
///
/// Same as [`procrustes_report`].
pub fn procrustes_report_centered<T>(
    x: &DMatrix<T>,
    y0: &DMatrix<T>,
    config: &GeometryConfig,
) -> Result<ProcrustesReport>
where
    T: Scalar + Copy + Into<f64>,
{
    check_shapes(x, y0)?;
    let x = promote(x);
    let displacement = promote(y0) - &x;
    fit_normalized(&x, &displacement, config)
}

fn check_shapes<T: Scalar>(x: &DMatrix<T>, y: &DMatrix<T>) -> Result<()> {
    if x.shape() != y.shape() {
        return Err(GeometryError::shape_mismatch(x.shape(), y.shape()));
    }
    Ok(())
}

fn fit_normalized(x: &DMatrix<f64>, y: &DMatrix<f64>, config: &GeometryConfig) -> Result<ProcrustesReport> {
    config.validate()?;
    validate_embedding(x, MIN_SAMPLES)?;
    validate_embedding(y, MIN_SAMPLES)?;
    let (n_samples, dim) = x.shape();

    let x_norm = center_and_normalize(x, config.variance_floor)
        .ok_or_else(|| GeometryError::degenerate("source point set has zero variance"))?;

    if rows_identical(y) {
        // The zero map reconstructs a constant target exactly.
        debug!("procrustes {n_samples}x{dim}: target rows are identical, similarity 1");
        return Ok(ProcrustesReport {
            similarity: 1.0,
            residual_energy: 0.0,
            n_samples,
            dim,
        });
    }
    let y_norm = center_and_normalize(y, config.variance_floor)
        .ok_or_else(|| GeometryError::degenerate("target point set falls below the variance floor"))?;

    let alignment = fit_linear_alignment(&x_norm, &y_norm, config)?;
    let residual_energy = squared_error(&alignment.reconstruction, &y_norm);
    let similarity = 1.0 - residual_energy;

    debug!("procrustes {n_samples}x{dim}: residual {residual_energy:.6e}, similarity {similarity:.6}");

    Ok(ProcrustesReport {
        similarity,
        residual_energy,
        n_samples,
        dim,
    })
}
