//! Standard scaling with pre-fitted column statistics.

use crate::error::ModelError;
use crate::features::vector::{FeatureVector, FEATURE_COLUMNS, FEATURE_COUNT};
use crate::model::FeatureScaler;
use ndarray::Array1;
use serde::Deserialize;
use std::path::Path;

/// A feature vector after scaling. Positional, training column order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledVector(pub [f64; FEATURE_COUNT]);

impl ScaledVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Exported scaler state: per-column `mean` and `scale` as fitted.
#[derive(Debug, Deserialize)]
struct ScalerDocument {
    #[serde(alias = "mean_")]
    mean: Vec<f64>,
    #[serde(alias = "scale_")]
    scale: Vec<f64>,
    #[serde(default, alias = "feature_names_in_")]
    feature_names: Option<Vec<String>>,
}

/// `(x - mean) / scale`, column by column.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Build a scaler from raw statistics, checking they cover exactly the
    /// 22 feature columns. A zero scale (constant column at fit time) is
    /// treated as 1.
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, ModelError> {
        for (artifact, values) in [("scaler mean", &mean), ("scaler scale", &scale)] {
            if values.len() != FEATURE_COUNT {
                return Err(ModelError::FeatureCount {
                    artifact,
                    expected: FEATURE_COUNT,
                    found: values.len(),
                });
            }
        }
        if let Some(index) = mean
            .iter()
            .zip(&scale)
            .position(|(m, s)| !m.is_finite() || !s.is_finite())
        {
            return Err(ModelError::InvalidScaler { index });
        }

        let scale = scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect::<Vec<_>>();

        Ok(Self {
            mean: Array1::from_vec(mean),
            scale: Array1::from_vec(scale),
        })
    }

    /// Parse a scaler export from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        let doc: ScalerDocument = serde_json::from_str(json)?;
        if let Some(names) = &doc.feature_names {
            check_column_names("scaler", names)?;
        }
        Self::new(doc.mean, doc.scale)
    }

    /// Load a scaler export from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, ModelError> {
        let json = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

impl FeatureScaler for StandardScaler {
    fn transform(&self, features: &FeatureVector) -> ScaledVector {
        let row = Array1::from_vec(features.to_array().to_vec());
        let scaled = (row - &self.mean) / &self.scale;

        let mut out = [0.0f64; FEATURE_COUNT];
        for (slot, value) in out.iter_mut().zip(scaled.iter()) {
            *slot = *value;
        }
        ScaledVector(out)
    }
}

/// Fail unless `names` lists the training columns in training order.
pub(crate) fn check_column_names(artifact: &'static str, names: &[String]) -> Result<(), ModelError> {
    if names.len() != FEATURE_COUNT {
        return Err(ModelError::FeatureCount {
            artifact,
            expected: FEATURE_COUNT,
            found: names.len(),
        });
    }
    for (index, (found, expected)) in names.iter().zip(FEATURE_COLUMNS).enumerate() {
        if found != expected {
            return Err(ModelError::ColumnMismatch {
                artifact,
                index,
                expected,
                found: found.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaler_json(mean: f64, scale: f64, names: Option<Vec<&str>>) -> String {
        serde_json::json!({
            "mean": vec![mean; FEATURE_COUNT],
            "scale": vec![scale; FEATURE_COUNT],
            "feature_names": names,
        })
        .to_string()
    }

    #[test]
    fn test_transform_is_affine_per_column() {
        let mean: Vec<f64> = (0..FEATURE_COUNT).map(|i| i as f64).collect();
        let scale = vec![2.0; FEATURE_COUNT];
        let scaler = StandardScaler::new(mean, scale).unwrap();

        let vector = FeatureVector {
            url_length: 10,
            redirect_1: 1,
            ..FeatureVector::default()
        };
        let scaled = scaler.transform(&vector);

        assert_eq!(scaled.0[0], 5.0);
        assert_eq!(scaled.0[1], -0.5);
        assert_eq!(scaled.0[21], (1.0 - 21.0) / 2.0);
    }

    #[test]
    fn test_zero_scale_treated_as_one() {
        let scaler = StandardScaler::new(vec![1.0; FEATURE_COUNT], vec![0.0; FEATURE_COUNT]).unwrap();
        let scaled = scaler.transform(&FeatureVector::default());
        assert!(scaled.as_slice().iter().all(|v| *v == -1.0));
    }

    #[test]
    fn test_rejects_wrong_column_count() {
        let err = StandardScaler::new(vec![0.0; 21], vec![1.0; 21]).unwrap_err();
        assert!(matches!(err, ModelError::FeatureCount { found: 21, .. }));
    }

    #[test]
    fn test_rejects_reordered_names() {
        let mut names: Vec<&str> = FEATURE_COLUMNS.to_vec();
        names.swap(0, 1);
        let err = StandardScaler::from_json_str(&scaler_json(0.0, 1.0, Some(names))).unwrap_err();
        assert!(matches!(err, ModelError::ColumnMismatch { index: 0, .. }));
    }

    #[test]
    fn test_accepts_sklearn_attribute_names() {
        let json = serde_json::json!({
            "mean_": vec![0.0; FEATURE_COUNT],
            "scale_": vec![1.0; FEATURE_COUNT],
            "feature_names_in_": FEATURE_COLUMNS,
        })
        .to_string();
        assert!(StandardScaler::from_json_str(&json).is_ok());
    }

    #[test]
    fn test_from_path_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = StandardScaler::from_path(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }
}
