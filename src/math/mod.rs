//! Mathematical utilities for embedding geometry.
//!
//! This module provides:
//! - [`linalg`]: promotion, centering, normalization and validation helpers
//! - [`neighbors`]: tiled pairwise distances and two-nearest-neighbor search

pub mod linalg;
pub mod neighbors;

pub use linalg::{center_columns, column_means, matrix_from_rows, mean_row_norm, promote};
pub use neighbors::{pairwise_distances, two_nearest_neighbors, NeighborPair};
