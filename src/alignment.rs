//! Least-squares linear alignment between two point sets.
//!
//! Given `X` (`n x p`) and `Y` (`n x q`), finds `A` (`p x q`) minimizing
//! `||X A - Y||^2` through the SVD pseudo-inverse of `X`:
//!
//! ```text
//! X = U S V^T        A = V S^-1 U^T Y        Y_est = X A
//! ```
//!
//! Every singular value is inverted; there is no regularization and no rank
//! truncation. `X` should have full column rank. Instead of letting a
//! near-zero singular value blow `A` up, the estimator rejects
//! `s <= singular_value_rtol * s_max` with
//! [`GeometryError::NumericalInstability`].

use log::{debug, warn};
use nalgebra::{DMatrix, DVector, Scalar};

use crate::config::GeometryConfig;
use crate::error::{GeometryError, Result};
use crate::math::linalg::{promote, squared_error};

/// Fitted linear map from the `X` space into the `Y` space.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearAlignment {
    /// The map `A`, shape `(p, q)`.
    pub transform: DMatrix<f64>,

    /// The reconstruction `X A`, shape `(n, q)`.
    pub reconstruction: DMatrix<f64>,

    /// Singular values of `X`, descending.
    pub singular_values: DVector<f64>,
}

impl LinearAlignment {
    /// Sum of squared residuals `||X A - Y||^2` against a target.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ShapeMismatch`] if `y` is not the shape of
    /// the reconstruction.
    pub fn residual_sum_of_squares(&self, y: &DMatrix<f64>) -> Result<f64> {
        if y.shape() != self.reconstruction.shape() {
            return Err(GeometryError::shape_mismatch(
                self.reconstruction.shape(),
                y.shape(),
            ));
        }
        Ok(squared_error(&self.reconstruction, y))
    }

    /// Ratio of the largest to the smallest singular value of `X`.
    #[must_use]
    pub fn condition_number(&self) -> f64 {
        let max = self.singular_values.max();
        let min = self.singular_values.min();
        max / min
    }
}

/// Fit the least-squares linear map from `x` to `y`.
///
/// # Arguments
///
/// * `x` - Source points, shape `(n, p)`
/// * `y` - Target points, shape `(n, q)`
/// * `config` - Geometry configuration (uses `singular_value_rtol`)
///
/// # Errors
///
/// - [`GeometryError::ShapeMismatch`] if the row counts differ
/// - [`GeometryError::InvalidInput`] if either matrix is empty or non-finite
/// - [`GeometryError::NumericalInstability`] if the SVD fails or a singular
///   value of `x` is zero or below `singular_value_rtol * s_max`
pub fn fit_linear_alignment(
    x: &DMatrix<f64>,
    y: &DMatrix<f64>,
    config: &GeometryConfig,
) -> Result<LinearAlignment> {
    config.validate()?;
    if x.nrows() != y.nrows() {
        return Err(GeometryError::shape_mismatch(
            (x.nrows(), y.ncols()),
            y.shape(),
        ));
    }
    if x.is_empty() || y.is_empty() {
        return Err(GeometryError::invalid_input("alignment inputs must not be empty"));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(GeometryError::invalid_input(
            "alignment inputs contain non-finite values",
        ));
    }

    let svd = x
        .clone()
        .try_svd(true, true, f64::EPSILON, 0)
        .ok_or_else(|| GeometryError::numerical_instability("SVD did not converge"))?;
    let (u, v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => {
            return Err(GeometryError::numerical_instability(
                "SVD did not return singular vectors",
            ))
        }
    };
    let singular_values = svd.singular_values;

    let s_max = singular_values.max();
    let cutoff = config.singular_value_rtol * s_max;
    if let Some((i, &s)) = singular_values
        .iter()
        .enumerate()
        .find(|(_, s)| **s <= 0.0 || **s <= cutoff)
    {
        warn!(
            "pseudo-inverse guard tripped: singular value {i} = {s:e} vs max {s_max:e} \
             (rtol {:e})",
            config.singular_value_rtol
        );
        return Err(GeometryError::numerical_instability(format!(
            "singular value {i} of X is {s:e} (max {s_max:e}); X is not full column rank"
        )));
    }

    // A = V S^-1 U^T Y
    let mut scaled = u.transpose() * y;
    for (mut row, &s) in scaled.row_iter_mut().zip(singular_values.iter()) {
        row /= s;
    }
    let transform = v_t.transpose() * scaled;
    let reconstruction = x * &transform;

    debug!(
        "linear alignment {}x{} -> {}x{}: condition number {:.3e}",
        x.nrows(),
        x.ncols(),
        y.nrows(),
        y.ncols(),
        s_max / singular_values.min()
    );

    Ok(LinearAlignment {
        transform,
        reconstruction,
        singular_values,
    })
}

/// Reconstruct `y` as a linear function of `x`, returning `X A`.
///
/// Uses the default configuration.
///
/// # Errors
///
/// See [`fit_linear_alignment`].
///
/// # Example
///
/// ```
/// use embedding_geometry::linear_alignment_estimate;
/// use nalgebra::DMatrix;
///
/// let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
/// let est = linear_alignment_estimate(&x, &x)?;
/// assert!((est - x).norm() < 1e-12);
/// # Ok::<(), embedding_geometry::GeometryError>(())
/// ```
pub fn linear_alignment_estimate<T>(x: &DMatrix<T>, y: &DMatrix<T>) -> Result<DMatrix<f64>>
where
    T: Scalar + Copy + Into<f64>,
{
    let alignment = fit_linear_alignment(&promote(x), &promote(y), &GeometryConfig::default())?;
    Ok(alignment.reconstruction)
}
