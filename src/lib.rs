//! Embedding Geometry Library
//!
//! Geometric diagnostics of embedding spaces produced by representation
//! learning models.
//!
//! This library measures how a point cloud of embeddings is shaped and how
//! two embeddings of the same samples relate to each other:
//!
//! # Features
//!
//! - **Anisotropy**: share of variance on the dominant principal direction
//! - **Intrinsic dimension**: TwoNN estimator from nearest-neighbor ratios
//! - **Linear alignment**: least-squares map between two point sets via SVD
//! - **Procrustes similarity**: fit quality of that map, plain or on the
//!   displacement between the two sets
//! - **Layer reports**: all of the above across a stack of model layers
//!
//! # Quick Start
//!
//! ```
//! use embedding_geometry::{anisotropy, intrinsic_dimension, procrustes_similarity};
//! use nalgebra::DMatrix;
//!
//! let emb = DMatrix::from_row_slice(5, 3, &[
//!     0.0, 0.0, 0.0,
//!     1.0, 0.0, 0.0,
//!     0.0, 1.0, 0.0,
//!     0.0, 0.0, 1.0,
//!     1.0, 1.0, 1.0,
//! ]);
//!
//! let a = anisotropy(&emb)?;
//! assert!(a > 0.0 && a <= 1.0);
//!
//! let d = intrinsic_dimension(&emb, 1)?;
//! assert!(d.is_finite());
//!
//! let shifted = emb.map(|v| v + 0.5);
//! let sim = procrustes_similarity(&emb, &shifted)?;
//! assert!((sim - 1.0).abs() < 1e-10);
//! # Ok::<(), embedding_geometry::GeometryError>(())
//! ```
//!
//! # Errors
//!
//! Inputs that would make an estimator return NaN (too few samples,
//! identical rows, rank-deficient alignment sources, all-degenerate TwoNN
//! ratios) are reported as [`GeometryError`] values instead.
//!
//! # Logging
//!
//! Estimators emit `debug!`/`trace!` records through the `log` facade. No
//! logger is installed by the library.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod alignment;
pub mod anisotropy;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod intrinsic_dim;
pub mod math;
pub mod procrustes;
pub mod report;

// Re-exports for convenient access
pub use alignment::{fit_linear_alignment, linear_alignment_estimate, LinearAlignment};
pub use anisotropy::{anisotropy, anisotropy_with_config, covariance_spectrum, CovarianceSpectrum};
pub use config::GeometryConfig;
pub use diagnostics::{DiagnosticObserver, LogObserver, NoopObserver, RecordingObserver};
pub use error::{GeometryError, Result};
pub use intrinsic_dim::{
    estimate_intrinsic_dimension, estimate_intrinsic_dimension_observed, intrinsic_dimension,
    TwoNnEstimate, DEFAULT_REDUCTION_FACTOR,
};
pub use math::matrix_from_rows;
pub use procrustes::{
    procrustes_report, procrustes_report_centered, procrustes_similarity,
    procrustes_similarity_centered, ProcrustesReport,
};
pub use report::{analyze_embedding, analyze_layers, EmbeddingGeometry, LayerGeometry};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
