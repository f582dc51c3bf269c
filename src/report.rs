//! Combined geometry reports for one embedding or a stack of layers.
//!
//! [`analyze_embedding`] runs the covariance spectrum and TwoNN estimators on
//! a single embedding. [`analyze_layers`] does the same for every layer of a
//! model evaluated on the same samples, and scores how linear each
//! layer-to-layer transition is with both Procrustes variants.

use log::info;
use nalgebra::{DMatrix, Scalar};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::anisotropy::covariance_spectrum;
use crate::config::GeometryConfig;
use crate::error::{GeometryError, Result};
use crate::intrinsic_dim::{estimate_intrinsic_dimension, TwoNnEstimate};
use crate::math::linalg::promote;
use crate::procrustes::{procrustes_report, procrustes_report_centered};

/// Geometry summary of a single embedding.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EmbeddingGeometry {
    /// Number of samples (rows).
    pub n_samples: usize,

    /// Ambient dimension (columns).
    pub ambient_dim: usize,

    /// Share of variance on the dominant direction.
    pub anisotropy: f64,

    /// Exponential of the variance-share entropy.
    pub effective_rank: f64,

    /// TwoNN intrinsic dimension estimate.
    pub intrinsic_dimension: TwoNnEstimate,
}

/// Geometry of one layer plus its transition to the next layer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LayerGeometry {
    /// Position of the layer in the input slice.
    pub layer: usize,

    /// Geometry of this layer's embedding.
    pub geometry: EmbeddingGeometry,

    /// Procrustes similarity of the next layer from this one.
    /// `None` for the last layer.
    pub next_similarity: Option<f64>,

    /// Procrustes similarity of the change to the next layer.
    /// `None` for the last layer.
    pub next_similarity_centered: Option<f64>,
}

/// Analyze a single embedding.
///
/// # Errors
///
/// Propagates any error from the covariance spectrum or TwoNN estimators.
pub fn analyze_embedding<T>(emb: &DMatrix<T>, config: &GeometryConfig) -> Result<EmbeddingGeometry>
where
    T: Scalar + Copy + Into<f64>,
{
    let emb = promote(emb);
    let spectrum = covariance_spectrum(&emb, config)?;
    let intrinsic_dimension = estimate_intrinsic_dimension(&emb, config)?;

    Ok(EmbeddingGeometry {
        n_samples: emb.nrows(),
        ambient_dim: emb.ncols(),
        anisotropy: spectrum.anisotropy(),
        effective_rank: spectrum.effective_rank(),
        intrinsic_dimension,
    })
}

/// Analyze a stack of per-layer embeddings of the same samples.
///
/// # Arguments
///
/// * `layers` - One embedding per layer, all of identical shape
/// * `config` - Geometry configuration shared by every estimator
///
/// # Errors
///
/// - [`GeometryError::InvalidInput`] if `layers` is empty
/// - [`GeometryError::ShapeMismatch`] if two consecutive layers differ
/// - Any error of [`analyze_embedding`] or the Procrustes estimators
pub fn analyze_layers<T>(layers: &[DMatrix<T>], config: &GeometryConfig) -> Result<Vec<LayerGeometry>>
where
    T: Scalar + Copy + Into<f64>,
{
    if layers.is_empty() {
        return Err(GeometryError::invalid_input("no layers supplied"));
    }

    let mut report = Vec::with_capacity(layers.len());
    for (layer, emb) in layers.iter().enumerate() {
        let geometry = analyze_embedding(emb, config)?;

        let (next_similarity, next_similarity_centered) = match layers.get(layer + 1) {
            Some(next) => (
                Some(procrustes_report(emb, next, config)?.similarity),
                Some(procrustes_report_centered(emb, next, config)?.similarity),
            ),
            None => (None, None),
        };

        info!(
            "layer {layer}: anisotropy {:.4}, intrinsic dim {:.3}, next similarity {:?}",
            geometry.anisotropy, geometry.intrinsic_dimension.dimension, next_similarity
        );

        report.push(LayerGeometry {
            layer,
            geometry,
            next_similarity,
            next_similarity_centered,
        });
    }

    Ok(report)
}
