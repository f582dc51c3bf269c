//! Pairwise Euclidean distances and nearest-neighbor selection.
//!
//! Distances are computed one tile of rows at a time so that memory stays at
//! `tile_rows x n` instead of `n x n`. Each distance is the direct
//! `sqrt(sum((a - b)^2))` form, not the Gram-matrix expansion, so duplicate
//! points come out at exactly zero.

use std::ops::Range;

use log::trace;
use nalgebra::DMatrix;

use crate::error::{GeometryError, Result};

/// Nearest and second-nearest neighbor distances of one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborPair {
    /// Distance to the nearest other sample.
    pub r1: f64,
    /// Distance to the second-nearest other sample.
    pub r2: f64,
}

/// Distances from the samples in `rows` to every sample.
///
/// `samples` holds one sample per column (the transpose of an embedding
/// matrix). The tile has shape `(rows.len(), n)`.
fn distance_tile(samples: &DMatrix<f64>, rows: Range<usize>) -> DMatrix<f64> {
    let n = samples.ncols();
    let start = rows.start;
    DMatrix::from_fn(rows.len(), n, |a, j| {
        samples
            .column(start + a)
            .iter()
            .zip(samples.column(j).iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt()
    })
}

/// Full pairwise Euclidean distance matrix of an embedding.
///
/// Intended for small inputs and inspection; the TwoNN estimator works on
/// tiles through [`two_nearest_neighbors`].
#[must_use]
pub fn pairwise_distances(emb: &DMatrix<f64>) -> DMatrix<f64> {
    let samples = emb.transpose();
    distance_tile(&samples, 0..samples.ncols())
}

/// Smallest and second-smallest value of `row`, skipping index `skip`.
///
/// The skipped entry is removed, not masked: another sample sitting at
/// distance zero still counts as a neighbor.
fn two_smallest_excluding(row: impl Iterator<Item = f64>, skip: usize) -> NeighborPair {
    let mut r1 = f64::INFINITY;
    let mut r2 = f64::INFINITY;
    for (_, d) in row.enumerate().filter(|(j, _)| *j != skip) {
        if d < r1 {
            r2 = r1;
            r1 = d;
        } else if d < r2 {
            r2 = d;
        }
    }
    NeighborPair { r1, r2 }
}

/// Nearest and second-nearest neighbor distance for every sample.
///
/// # Arguments
///
/// * `emb` - Embedding matrix, one sample per row
/// * `tile_rows` - Number of rows per distance tile
///
/// # Errors
///
/// Returns [`GeometryError::InsufficientSamples`] if there are fewer than
/// three samples, since a second neighbor would not exist.
pub fn two_nearest_neighbors(emb: &DMatrix<f64>, tile_rows: usize) -> Result<Vec<NeighborPair>> {
    let n = emb.nrows();
    if n < 3 {
        return Err(GeometryError::insufficient_samples(3, n));
    }
    let tile_rows = tile_rows.max(1);
    let samples = emb.transpose();

    let mut pairs = Vec::with_capacity(n);
    let mut start = 0;
    while start < n {
        let end = (start + tile_rows).min(n);
        trace!("distance tile rows {start}..{end} of {n}");
        let tile = distance_tile(&samples, start..end);
        for (a, row) in tile.row_iter().enumerate() {
            pairs.push(two_smallest_excluding(row.iter().copied(), start + a));
        }
        start = end;
    }

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line_points() -> DMatrix<f64> {
        DMatrix::from_row_slice(4, 2, &[0.0, 0.0, 1.0, 0.0, 3.0, 0.0, 6.0, 0.0])
    }

    #[test]
    fn test_pairwise_distances() {
        let d = pairwise_distances(&line_points());
        assert_eq!(d.shape(), (4, 4));
        assert_relative_eq!(d[(0, 3)], 6.0);
        assert_relative_eq!(d[(3, 0)], 6.0);
        assert_relative_eq!(d[(1, 2)], 2.0);
        for i in 0..4 {
            assert_eq!(d[(i, i)], 0.0);
        }
    }

    #[test]
    fn test_two_nearest() {
        let pairs = two_nearest_neighbors(&line_points(), 256).unwrap();
        assert_eq!(pairs[0], NeighborPair { r1: 1.0, r2: 3.0 });
        assert_eq!(pairs[1], NeighborPair { r1: 1.0, r2: 2.0 });
        assert_eq!(pairs[2], NeighborPair { r1: 2.0, r2: 3.0 });
        assert_eq!(pairs[3], NeighborPair { r1: 3.0, r2: 5.0 });
    }

    #[test]
    fn test_tiling_matches_single_tile() {
        let m = DMatrix::from_fn(17, 3, |i, j| ((i * 7 + j * 3) % 11) as f64 * 0.37 + i as f64);
        let whole = two_nearest_neighbors(&m, 1000).unwrap();
        for tile in [1, 2, 5, 16] {
            assert_eq!(two_nearest_neighbors(&m, tile).unwrap(), whole);
        }
    }

    #[test]
    fn test_duplicates_are_neighbors() {
        // Rows 0 and 1 coincide: each is the other's nearest at distance 0.
        let m = DMatrix::from_row_slice(3, 1, &[2.0, 2.0, 5.0]);
        let pairs = two_nearest_neighbors(&m, 2).unwrap();
        assert_eq!(pairs[0], NeighborPair { r1: 0.0, r2: 3.0 });
        assert_eq!(pairs[1], NeighborPair { r1: 0.0, r2: 3.0 });
        assert_eq!(pairs[2], NeighborPair { r1: 3.0, r2: 3.0 });
    }

    #[test]
    fn test_too_few_samples() {
        let m = DMatrix::from_row_slice(2, 1, &[0.0, 1.0]);
        assert_eq!(
            two_nearest_neighbors(&m, 4),
            Err(GeometryError::insufficient_samples(3, 2))
        );
    }
}
