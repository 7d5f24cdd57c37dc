//! JSON configuration and report helpers for batch verification.

use crate::{
    analytical_jacobian, error_distances, normal_check, numerical_jacobian_with,
    restore_parallelogram, restore_rectangle, verify_batch, BisectionParams, Jacobian,
    NumericalJacobianParams, Parallelogram, RectangleCheckParams, Rectangle,
};
use log::{debug, info};
use quad_rectify_core::{FocalLength, PerspectiveModel, Quad2};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum QuadRectifyIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn default_expected_ratio() -> f64 {
    1.0
}

fn default_accuracy() -> f64 {
    1.0
}

/// Input for the `verify` and `jacobian` commands.
///
/// Quads are given in pixel coordinates; they are shifted to the principal
/// point before restoration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyConfig {
    pub image_width: f64,
    pub image_height: f64,
    #[serde(default)]
    pub focal_length: FocalLength,
    #[serde(default = "default_expected_ratio")]
    pub expected_ratio: f64,
    #[serde(default = "default_accuracy")]
    pub accuracy: f64,
    /// Run the oblique-view filter with this threshold when set.
    #[serde(default)]
    pub min_normal_cos: Option<f64>,
    #[serde(default)]
    pub bisection: BisectionParams,
    #[serde(default)]
    pub jacobian: NumericalJacobianParams,
    pub quads: Vec<Quad2>,
    #[serde(default)]
    pub output_path: Option<String>,
}

impl VerifyConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, QuadRectifyIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), QuadRectifyIoError> {
        write_pretty(self, path)
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("quad_rectify_report.json"))
    }

    pub fn model(&self) -> PerspectiveModel {
        PerspectiveModel::with_focal(self.image_width, self.image_height, self.focal_length)
    }

    pub fn check_params(&self) -> RectangleCheckParams {
        RectangleCheckParams {
            expected_ratio: self.expected_ratio,
            accuracy: self.accuracy,
        }
    }

    fn centered_quads(&self) -> Vec<Quad2> {
        let model = self.model();
        self.quads
            .iter()
            .map(|q| model.quad_to_centered(q))
            .collect()
    }
}

fn write_pretty<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<(), QuadRectifyIoError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// Per-quad verification outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuadReport {
    pub index: usize,
    /// Parallelogram restored with the configured focal length.
    pub parallelogram: Option<Parallelogram>,
    /// Rectangle and focal length solved from the quad alone.
    pub rectangle: Option<Rectangle>,
    #[serde(default)]
    pub restore_error: Option<String>,
    pub is_rectangle: bool,
    pub error_distance: f64,
    #[serde(default)]
    pub normal_ok: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyReport {
    pub focal_length: f64,
    pub expected_ratio: f64,
    pub accuracy: f64,
    pub quads: Vec<QuadReport>,
}

impl VerifyReport {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, QuadRectifyIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), QuadRectifyIoError> {
        write_pretty(self, path)
    }

    pub fn accepted(&self) -> usize {
        self.quads.iter().filter(|q| q.is_rectangle).count()
    }
}

/// Restore, verify and score every quad of `config`.
pub fn run_verify(config: &VerifyConfig) -> VerifyReport {
    let flen = config.model().focal_length;
    let quads = config.centered_quads();
    let params = config.check_params();

    let verdicts = verify_batch(&quads, flen, &params);
    let distances = error_distances(&quads, flen, params.expected_ratio, &config.bisection);

    let reports: Vec<QuadReport> = quads
        .iter()
        .zip(verdicts.into_iter().zip(distances))
        .enumerate()
        .map(|(index, (q, (is_rectangle, error_distance)))| {
            let (parallelogram, restore_error) = match restore_parallelogram(q, flen) {
                Ok(p) => (Some(p), None),
                Err(err) => {
                    debug!("quad #{index}: {err}");
                    (None, Some(err.to_string()))
                }
            };
            let normal_ok = config
                .min_normal_cos
                .and_then(|min_cos| normal_check(q, flen, min_cos).ok());
            QuadReport {
                index,
                parallelogram,
                rectangle: restore_rectangle(q).ok(),
                restore_error,
                is_rectangle,
                error_distance,
                normal_ok,
            }
        })
        .collect();

    let report = VerifyReport {
        focal_length: flen,
        expected_ratio: params.expected_ratio,
        accuracy: params.accuracy,
        quads: reports,
    };
    info!(
        "verified {} quads at f={flen:.2}: {} accepted",
        report.quads.len(),
        report.accepted()
    );
    report
}

/// Jacobian of one quad, or why it could not be computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JacobianEntry {
    pub index: usize,
    pub jacobian: Option<Jacobian>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Jacobians of every quad of `config`.
pub fn run_jacobian(config: &VerifyConfig, numerical: bool) -> Vec<JacobianEntry> {
    let flen = config.model().focal_length;
    config
        .centered_quads()
        .iter()
        .enumerate()
        .map(|(index, q)| {
            let res = if numerical {
                numerical_jacobian_with(q, flen, &config.jacobian)
            } else {
                analytical_jacobian(q, flen)
            };
            match res {
                Ok(j) => JacobianEntry {
                    index,
                    jacobian: Some(j),
                    error: None,
                },
                Err(err) => JacobianEntry {
                    index,
                    jacobian: None,
                    error: Some(err.to_string()),
                },
            }
        })
        .collect()
}
