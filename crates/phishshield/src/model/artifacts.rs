//! Startup loading of the trained scaler and ensemble.

use crate::error::ModelError;
use crate::model::{FeatureScaler, ProbabilityModel, StandardScaler, TreeEnsemble};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Scaler and model, shared read-only by every request.
#[derive(Clone)]
pub struct ModelArtifacts {
    pub scaler: Arc<dyn FeatureScaler>,
    pub model: Arc<dyn ProbabilityModel>,
}

impl ModelArtifacts {
    /// Load both artifacts from JSON files. Any schema mismatch is an error;
    /// callers are expected to abort startup on failure.
    pub fn load(model_path: &Path, scaler_path: &Path) -> Result<Self, ModelError> {
        let scaler = StandardScaler::from_path(scaler_path)?;
        info!("loaded scaler from {}", scaler_path.display());

        let model = TreeEnsemble::from_path(model_path)?;
        info!(
            trees = model.num_trees(),
            "loaded tree ensemble from {}",
            model_path.display()
        );

        Ok(Self::new(Arc::new(scaler), Arc::new(model)))
    }

    /// Wrap already-built components.
    pub fn new(scaler: Arc<dyn FeatureScaler>, model: Arc<dyn ProbabilityModel>) -> Self {
        Self { scaler, model }
    }
}

impl std::fmt::Debug for ModelArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifacts").finish_non_exhaustive()
    }
}
