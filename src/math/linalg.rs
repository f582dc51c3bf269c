//! Linear algebra utilities for embedding matrices.
//!
//! Embedding matrices are `nalgebra` [`DMatrix`] values with one sample per
//! row and one feature per column. Every helper here returns a new matrix;
//! caller-supplied matrices are never mutated.

use nalgebra::{DMatrix, DVector, Scalar};

use crate::error::{GeometryError, Result};

/// Promote an embedding matrix to double precision.
///
/// Accepts `f32` and `f64` matrices alike; all estimators compute in `f64`.
#[must_use]
pub fn promote<T>(emb: &DMatrix<T>) -> DMatrix<f64>
where
    T: Scalar + Copy + Into<f64>,
{
    emb.map(Into::into)
}

/// Build an embedding matrix from row slices.
///
/// # Errors
///
/// Returns an error if there are no rows, the rows are empty, or the rows
/// have different lengths.
///
/// # Example
///
/// ```
/// use embedding_geometry::math::matrix_from_rows;
///
/// let m = matrix_from_rows(&[[0.0, 1.0], [2.0, 3.0], [4.0, 5.0]])?;
/// assert_eq!(m.shape(), (3, 2));
/// assert_eq!(m[(2, 1)], 5.0);
/// # Ok::<(), embedding_geometry::GeometryError>(())
/// ```
pub fn matrix_from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<DMatrix<f64>> {
    let first = rows
        .first()
        .ok_or_else(|| GeometryError::invalid_input("no rows supplied"))?;
    let dim = first.as_ref().len();
    if dim == 0 {
        return Err(GeometryError::invalid_input("rows must not be empty"));
    }

    if let Some((i, row)) = rows
        .iter()
        .enumerate()
        .find(|(_, row)| row.as_ref().len() != dim)
    {
        return Err(GeometryError::invalid_input(format!(
            "row {i} has {} features, expected {dim}",
            row.as_ref().len()
        )));
    }

    Ok(DMatrix::from_fn(rows.len(), dim, |i, j| rows[i].as_ref()[j]))
}

/// Check shape and finiteness of an embedding matrix.
///
/// # Errors
///
/// - [`GeometryError::InvalidInput`] if the matrix has no columns or holds a
///   NaN or infinite entry.
/// - [`GeometryError::InsufficientSamples`] if it has fewer than
///   `min_samples` rows.
pub fn validate_embedding(emb: &DMatrix<f64>, min_samples: usize) -> Result<()> {
    if emb.ncols() == 0 {
        return Err(GeometryError::invalid_input(
            "embedding matrix has no feature columns",
        ));
    }
    if emb.nrows() < min_samples {
        return Err(GeometryError::insufficient_samples(min_samples, emb.nrows()));
    }

    for (j, column) in emb.column_iter().enumerate() {
        if let Some(i) = column.iter().position(|v| !v.is_finite()) {
            return Err(GeometryError::invalid_input(format!(
                "non-finite value at ({i}, {j})"
            )));
        }
    }

    Ok(())
}

/// Per-feature mean across samples.
#[must_use]
pub fn column_means(emb: &DMatrix<f64>) -> DVector<f64> {
    DVector::from_iterator(emb.ncols(), emb.column_iter().map(|c| c.mean()))
}

/// Subtract each column's mean from that column.
#[must_use]
pub fn center_columns(emb: &DMatrix<f64>) -> DMatrix<f64> {
    let means = column_means(emb);
    let mut centered = emb.clone();
    for (mut column, &mean) in centered.column_iter_mut().zip(means.iter()) {
        for v in column.iter_mut() {
            *v -= mean;
        }
    }
    centered
}

/// Mean Euclidean norm of the rows.
#[must_use]
pub fn mean_row_norm(emb: &DMatrix<f64>) -> f64 {
    if emb.nrows() == 0 {
        return 0.0;
    }
    let total: f64 = emb.row_iter().map(|row| row.norm()).sum();
    total / emb.nrows() as f64
}

/// Whether every row equals the first one, compared exactly.
///
/// Decided on the raw values, before any mean is taken. Centering identical
/// rows leaves a rounding residue that grows with the number of samples.
#[must_use]
pub fn rows_identical(emb: &DMatrix<f64>) -> bool {
    emb.column_iter().all(|column| {
        let mut values = column.iter();
        match values.next() {
            Some(&first) => values.all(|&v| v == first),
            None => true,
        }
    })
}

/// Secondary zero-variance guard on a centered matrix.
///
/// `centered_energy` and `raw_energy` are squared Frobenius norms after and
/// before centering. Exact zero always counts; a positive `floor` also
/// rejects energy below `floor * raw_energy`. Identical rows are caught by
/// [`rows_identical`] first.
#[must_use]
pub fn has_zero_variance(centered_energy: f64, raw_energy: f64, floor: f64) -> bool {
    centered_energy <= 0.0 || centered_energy <= floor * raw_energy
}

/// Center columns and scale to unit Frobenius norm.
///
/// Returns `None` when the rows are identical or the centered energy fails
/// the `variance_floor` guard.
#[must_use]
pub fn center_and_normalize(emb: &DMatrix<f64>, variance_floor: f64) -> Option<DMatrix<f64>> {
    if rows_identical(emb) {
        return None;
    }
    let centered = center_columns(emb);
    let energy = centered.norm_squared();
    if has_zero_variance(energy, emb.norm_squared(), variance_floor) {
        return None;
    }
    Some(centered / energy.sqrt())
}

/// Sum of squared entries of `a - b`.
#[must_use]
pub fn squared_error(a: &DMatrix<f64>, b: &DMatrix<f64>) -> f64 {
    debug_assert_eq!(a.shape(), b.shape());
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> DMatrix<f64> {
        DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 9.0])
    }

    #[test]
    fn test_promote_f32() {
        let m = DMatrix::from_row_slice(2, 2, &[1.5f32, -2.0, 0.25, 4.0]);
        let p = promote(&m);
        assert_eq!(p[(0, 0)], 1.5);
        assert_eq!(p[(1, 0)], 0.25);
    }

    #[test]
    fn test_matrix_from_rows() {
        let m = matrix_from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.shape(), (2, 2));
        assert_eq!(m[(1, 0)], 3.0);

        assert!(matrix_from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_err());
        assert!(matrix_from_rows::<Vec<f64>>(&[]).is_err());
        assert!(matrix_from_rows(&[Vec::<f64>::new()]).is_err());
    }

    #[test]
    fn test_validate_embedding() {
        let m = sample();
        assert!(validate_embedding(&m, 3).is_ok());
        assert_eq!(
            validate_embedding(&m, 4),
            Err(GeometryError::insufficient_samples(4, 3))
        );

        let mut bad = m.clone();
        bad[(1, 1)] = f64::NAN;
        assert!(matches!(
            validate_embedding(&bad, 2),
            Err(GeometryError::InvalidInput(_))
        ));

        let empty = DMatrix::<f64>::zeros(4, 0);
        assert!(validate_embedding(&empty, 2).is_err());
    }

    #[test]
    fn test_center_columns() {
        let m = sample();
        let c = center_columns(&m);
        let means = column_means(&c);
        assert_relative_eq!(means[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(means[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(c[(0, 0)], -2.0, epsilon = 1e-12);
        // Input untouched
        assert_eq!(m[(0, 0)], 1.0);
    }

    #[test]
    fn test_mean_row_norm() {
        let m = DMatrix::from_row_slice(2, 2, &[3.0, 4.0, 0.0, 1.0]);
        assert_relative_eq!(mean_row_norm(&m), 3.0);
    }

    #[test]
    fn test_center_and_normalize() {
        let m = sample();
        let n = center_and_normalize(&m, 1e-24).unwrap();
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);

        let constant = DMatrix::from_element(4, 3, 0.1);
        assert!(center_and_normalize(&constant, 1e-24).is_none());

        let zeros = DMatrix::<f64>::zeros(4, 3);
        assert!(center_and_normalize(&zeros, 1e-24).is_none());
    }

    #[test]
    fn test_rows_identical_is_exact() {
        let constant = DMatrix::from_fn(100_000, 3, |_, j| [0.1, 0.7, 1e-3][j]);
        assert!(rows_identical(&constant));
        assert!(center_and_normalize(&constant, 0.0).is_none());

        let mut one_ulp = DMatrix::from_element(5, 2, 1e9);
        one_ulp[(3, 1)] = 1e9 + 1.2e-7;
        assert!(!rows_identical(&one_ulp));
        assert!(center_and_normalize(&one_ulp, 0.0).is_some());
    }

    #[test]
    fn test_squared_error() {
        let a = DMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
        let b = DMatrix::from_row_slice(1, 2, &[0.0, 4.0]);
        assert_relative_eq!(squared_error(&a, &b), 5.0);
    }
}
