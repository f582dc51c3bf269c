//! Intrinsic dimension estimation with the TwoNN method.
//!
//! For every sample the ratio `mu = r2 / r1` of its second- to first-nearest
//! neighbor distance is computed. Under a locally uniform density on a
//! `d`-dimensional manifold, `mu` is Pareto distributed with
//! `F(mu) = 1 - mu^(-d)`, so `-log(1 - F)` is linear in `log(mu)` with slope
//! `d`. The estimate is the least-squares slope through the origin over the
//! lower part of the empirical distribution.
//!
//! # Pipeline
//!
//! 1. Promote to `f64`, subtract the mean sample
//! 2. Divide by the mean row norm (global scale normalization)
//! 3. Nearest and second-nearest neighbor distances (tiled)
//! 4. Floor `r1` at `distance_floor`; floored samples get `mu = -1`
//! 5. Sort `mu`, drop every `mu <= 1 + degeneracy_eps` from the front
//! 6. Empirical CDF `F = (dropped + k) / n` for the k-th kept ratio
//! 7. Keep the lowest `min(kept / reduction_factor, kept - 1)` points
//! 8. Slope `sum(x * y) / sum(x * x)`, `x = log(mu)`, `y = -log(1 - F)`

use log::debug;
use nalgebra::{DMatrix, Scalar};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::GeometryConfig;
use crate::diagnostics::{DiagnosticObserver, NoopObserver};
use crate::error::{GeometryError, Result};
use crate::math::linalg::{
    center_columns, has_zero_variance, mean_row_norm, promote, rows_identical, validate_embedding,
};
use crate::math::neighbors::two_nearest_neighbors;

/// Minimum number of samples for a second nearest neighbor to exist.
pub const MIN_SAMPLES: usize = 3;

/// Default upper-tail trimming factor.
pub const DEFAULT_REDUCTION_FACTOR: usize = 5;

/// Ratio assigned to samples whose nearest neighbor is below the floor.
const BAD_RATIO: f64 = -1.0;

/// Result of a TwoNN estimate.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TwoNnEstimate {
    /// Estimated intrinsic dimension (regression slope).
    pub dimension: f64,

    /// Number of samples in the input.
    pub n_samples: usize,

    /// Samples whose nearest-neighbor distance fell below the floor.
    pub bad_samples: usize,

    /// Samples dropped because `mu <= 1 + eps` (includes `bad_samples`).
    pub useless_items: usize,

    /// Number of points entering the regression.
    pub regression_points: usize,
}

/// Estimate intrinsic dimension with a given reduction factor.
///
/// Uses the default configuration otherwise.
///
/// # Errors
///
/// See [`estimate_intrinsic_dimension_observed`].
pub fn intrinsic_dimension<T>(emb: &DMatrix<T>, reduction_factor: usize) -> Result<f64>
where
    T: Scalar + Copy + Into<f64>,
{
    let config = GeometryConfig::default().with_reduction_factor(reduction_factor);
    Ok(estimate_intrinsic_dimension(emb, &config)?.dimension)
}

/// Estimate intrinsic dimension with full bookkeeping.
///
/// # Errors
///
/// See [`estimate_intrinsic_dimension_observed`].
pub fn estimate_intrinsic_dimension<T>(emb: &DMatrix<T>, config: &GeometryConfig) -> Result<TwoNnEstimate>
where
    T: Scalar + Copy + Into<f64>,
{
    estimate_intrinsic_dimension_observed(emb, config, &mut NoopObserver)
}

/// Estimate intrinsic dimension, reporting intermediate sequences to an
/// observer.
///
/// # Arguments
///
/// * `emb` - Embedding matrix of shape `(n_samples, n_features)`
/// * `config` - Floors, epsilon, reduction factor and tile size
/// * `observer` - Receives sorted ratios, regression points and the result
///
/// # Errors
///
/// - [`GeometryError::InsufficientSamples`] if `n_samples < 3`
/// - [`GeometryError::DegenerateInput`] if all samples coincide, if every
///   ratio is degenerate, or if the reduction factor leaves no regression
///   points
/// - [`GeometryError::NumericalInstability`] if the slope is not finite
/// - [`GeometryError::InvalidInput`] / [`GeometryError::InvalidConfig`] for
///   bad input or configuration
pub fn estimate_intrinsic_dimension_observed<T>(
    emb: &DMatrix<T>,
    config: &GeometryConfig,
    observer: &mut dyn DiagnosticObserver,
) -> Result<TwoNnEstimate>
where
    T: Scalar + Copy + Into<f64>,
{
    config.validate()?;
    let emb = promote(emb);
    validate_embedding(&emb, MIN_SAMPLES)?;
    let n = emb.nrows();

    // =========================================================================
    // 1-2. CENTER AND NORMALIZE BY MEAN ROW NORM
    // =========================================================================
    if rows_identical(&emb) {
        return Err(GeometryError::degenerate("all samples coincide"));
    }
    let centered = center_columns(&emb);
    if has_zero_variance(centered.norm_squared(), emb.norm_squared(), config.variance_floor) {
        return Err(GeometryError::degenerate("centered samples fall below the variance floor"));
    }
    let avg_len = mean_row_norm(&centered);
    let normalized = centered / avg_len;

    // =========================================================================
    // 3-4. NEIGHBOR DISTANCES AND RATIOS
    // =========================================================================
    let pairs = two_nearest_neighbors(&normalized, config.distance_tile_rows)?;

    let mut bad_samples = 0;
    let mut mu: Vec<f64> = pairs
        .iter()
        .map(|p| {
            if p.r1 < config.distance_floor {
                bad_samples += 1;
                BAD_RATIO
            } else {
                p.r2 / p.r1
            }
        })
        .collect();

    // =========================================================================
    // 5. SORT AND DROP DEGENERATE RATIOS
    // =========================================================================
    mu.sort_by(f64::total_cmp);
    let threshold = 1.0 + config.degeneracy_eps;
    let useless_items = mu.partition_point(|&m| m <= threshold);
    observer.on_sorted_ratios(&mu, useless_items);

    let kept = &mu[useless_items..];
    if kept.is_empty() {
        return Err(GeometryError::degenerate(format!(
            "all {n} distance ratios are degenerate (mu <= 1 + {})",
            config.degeneracy_eps
        )));
    }

    // =========================================================================
    // 6-7. EMPIRICAL CDF ON THE LOWER PART
    // =========================================================================
    let n_kept = kept.len();
    let num_dots = (n_kept / config.reduction_factor).min(n_kept - 1);
    if num_dots == 0 {
        return Err(GeometryError::degenerate(format!(
            "{n_kept} usable ratios leave no regression points with reduction factor {}",
            config.reduction_factor
        )));
    }

    let total = (n_kept + useless_items) as f64;
    let (log_mu, neg_log_survival): (Vec<f64>, Vec<f64>) = kept[..num_dots]
        .iter()
        .enumerate()
        .map(|(k, &m)| {
            let f_emp = (useless_items + k + 1) as f64 / total;
            (m.ln(), -(1.0 - f_emp).ln())
        })
        .unzip();
    observer.on_regression(&log_mu, &neg_log_survival);

    // =========================================================================
    // 8. REGRESSION THROUGH THE ORIGIN
    // =========================================================================
    let sxy: f64 = log_mu
        .iter()
        .zip(neg_log_survival.iter())
        .map(|(x, y)| x * y)
        .sum();
    let sxx: f64 = log_mu.iter().map(|x| x * x).sum();
    let dimension = sxy / sxx;
    if !dimension.is_finite() {
        return Err(GeometryError::numerical_instability(format!(
            "TwoNN slope is not finite (sxy = {sxy:e}, sxx = {sxx:e})"
        )));
    }
    observer.on_dimension(dimension);

    debug!(
        "twonn on {n} samples: {useless_items} dropped ({bad_samples} below floor), \
         {num_dots} regression points, dimension {dimension:.4}"
    );

    Ok(TwoNnEstimate {
        dimension,
        n_samples: n,
        bad_samples,
        useless_items,
        regression_points: num_dots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingObserver;
    use approx::assert_relative_eq;

    /// Points on a line with geometrically growing gaps.
    fn geometric_line(n: usize) -> DMatrix<f64> {
        DMatrix::from_fn(n, 2, |i, j| {
            let t = 1.3_f64.powi(i as i32);
            if j == 0 { t } else { 2.0 * t }
        })
    }

    #[test]
    fn test_too_few_samples() {
        let emb = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 1.0, 1.0]);
        assert_eq!(
            intrinsic_dimension(&emb, 5),
            Err(GeometryError::insufficient_samples(3, 2))
        );
    }

    #[test]
    fn test_zero_reduction_factor_rejected() {
        let emb = geometric_line(10);
        assert!(matches!(
            intrinsic_dimension(&emb, 0),
            Err(GeometryError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_identical_points_degenerate() {
        let emb = DMatrix::from_element(6, 3, 1.25);
        assert!(matches!(
            intrinsic_dimension(&emb, 1),
            Err(GeometryError::DegenerateInput { .. })
        ));
    }

    #[test]
    fn test_evenly_spaced_line_keeps_only_endpoints() {
        // Interior points have r1 == r2; end points have r2 = 2 r1.
        let emb = DMatrix::from_fn(8, 1, |i, _| i as f64);
        let config = GeometryConfig::default().with_reduction_factor(1);
        let mut rec = RecordingObserver::new();
        let result = estimate_intrinsic_dimension_observed(&emb, &config, &mut rec);
        // Two ratios survive, one regression point remains.
        let est = result.unwrap();
        assert_eq!(est.useless_items, 6);
        assert_eq!(est.regression_points, 1);
        assert_eq!(rec.kept_mu().len(), 2);
        assert_relative_eq!(rec.kept_mu()[0], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unit_vectors_fixed_value() {
        // Two ratios are exactly 1; the other three are sqrt(2). With
        // reduction factor 1 the regression uses F = 3/5 and 4/5, so
        // d = -(ln 0.4 + ln 0.2) / (2 ln sqrt 2) = log2(12.5).
        let emb = crate::math::linalg::matrix_from_rows(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
        ])
        .unwrap();
        let config = GeometryConfig::default().with_reduction_factor(1);
        let mut rec = RecordingObserver::new();
        let est = estimate_intrinsic_dimension_observed(&emb, &config, &mut rec).unwrap();

        assert_eq!(est.useless_items, 2);
        assert_eq!(est.regression_points, 2);
        for &m in rec.kept_mu() {
            assert_relative_eq!(m, 2.0_f64.sqrt(), epsilon = 1e-12);
        }
        assert_relative_eq!(est.dimension, 12.5_f64.log2(), epsilon = 1e-9);
        assert_relative_eq!(est.dimension, 3.643_856_189_774_724, epsilon = 1e-9);
    }

    #[test]
    fn test_duplicates_flagged_bad() {
        let emb = DMatrix::from_row_slice(6, 1, &[0.0, 0.0, 1.0, 3.0, 7.0, 15.0]);
        let config = GeometryConfig::default().with_reduction_factor(1);
        let est = estimate_intrinsic_dimension(&emb, &config).unwrap();
        assert_eq!(est.bad_samples, 2);
        assert!(est.useless_items >= 2);
        assert_eq!(est.n_samples, 6);
    }

    #[test]
    fn test_regression_matches_closed_form() {
        let emb = geometric_line(12);
        let config = GeometryConfig::default().with_reduction_factor(2);
        let mut rec = RecordingObserver::new();
        let est = estimate_intrinsic_dimension_observed(&emb, &config, &mut rec).unwrap();

        let sxy: f64 = rec.log_mu.iter().zip(&rec.neg_log_survival).map(|(x, y)| x * y).sum();
        let sxx: f64 = rec.log_mu.iter().map(|x| x * x).sum();
        assert_relative_eq!(est.dimension, sxy / sxx, epsilon = 1e-12);
        assert_eq!(rec.dimension, Some(est.dimension));
        assert_eq!(rec.log_mu.len(), est.regression_points);
        assert_eq!(rec.sorted_mu.len(), 12);
    }

    #[test]
    fn test_empirical_cdf_denominator_counts_dropped() {
        let emb = geometric_line(12);
        let config = GeometryConfig::default().with_reduction_factor(1);
        let mut rec = RecordingObserver::new();
        let est = estimate_intrinsic_dimension_observed(&emb, &config, &mut rec).unwrap();

        let f0 = (est.useless_items + 1) as f64 / 12.0;
        assert_relative_eq!(rec.neg_log_survival[0], -(1.0 - f0).ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_observer_does_not_change_result() {
        let emb = geometric_line(15);
        let config = GeometryConfig::default().with_reduction_factor(2);
        let plain = estimate_intrinsic_dimension(&emb, &config).unwrap();
        let mut rec = RecordingObserver::new();
        let observed = estimate_intrinsic_dimension_observed(&emb, &config, &mut rec).unwrap();
        assert_eq!(plain, observed);
    }

    #[test]
    fn test_scale_and_shift_invariance() {
        let emb = geometric_line(14);
        let moved = emb.map(|v| v * 37.0 - 4.0);
        let config = GeometryConfig::default().with_reduction_factor(2);
        let a = estimate_intrinsic_dimension(&emb, &config).unwrap();
        let b = estimate_intrinsic_dimension(&moved, &config).unwrap();
        assert_relative_eq!(a.dimension, b.dimension, epsilon = 1e-9);
    }
}
