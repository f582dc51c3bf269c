//! Serializes a layer report to JSON for external plotting.
//!
//! Run with: cargo test --features serde --test export_report

#![cfg(feature = "serde")]

use embedding_geometry::{
    analyze_layers, estimate_intrinsic_dimension_observed, GeometryConfig, RecordingObserver,
};
use nalgebra::DMatrix;
use serde::Serialize;

#[derive(Serialize)]
struct ExportData {
    config: GeometryConfig,
    layers: Vec<embedding_geometry::LayerGeometry>,
    twonn_trace: RecordingObserver,
}

/// Trefoil-like curve sampled with uneven spacing.
fn curve(n: usize, warp: f64) -> DMatrix<f64> {
    DMatrix::from_fn(n, 3, |i, j| {
        let t = 0.11 * i as f64 + 0.002 * (i * i) as f64;
        match j {
            0 => t.sin() + 2.0 * (2.0 * t).sin() + warp * t,
            1 => t.cos() - 2.0 * (2.0 * t).cos(),
            _ => -(3.0 * t).sin() * (1.0 + warp),
        }
    })
}

#[test]
fn export_layer_report_json() {
    let config = GeometryConfig::default().with_reduction_factor(2);
    let layers = vec![curve(120, 0.0), curve(120, 0.1), curve(120, 0.3)];
    let report = analyze_layers(&layers, &config).unwrap();

    let mut trace = RecordingObserver::new();
    estimate_intrinsic_dimension_observed(&layers[0], &config, &mut trace).unwrap();

    let export = ExportData {
        config: config.clone(),
        layers: report,
        twonn_trace: trace,
    };
    let json = serde_json::to_string_pretty(&export).unwrap();

    assert!(json.contains("\"reduction_factor\": 2"));
    assert!(json.contains("\"next_similarity\""));
    assert!(json.contains("\"sorted_mu\""));

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["layers"].as_array().unwrap().len(), 3);
    assert!(value["layers"][2]["next_similarity"].is_null());
}
