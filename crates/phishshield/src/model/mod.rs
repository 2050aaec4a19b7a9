//! Trained artifacts: the feature scaler and the boosted-tree ensemble.
//!
//! Both are loaded once at startup and are read-only afterwards; they sit
//! behind `Arc<dyn ...>` so any number of requests can share them.

pub mod artifacts;
pub mod ensemble;
pub mod scaler;
pub mod verdict;

use crate::features::FeatureVector;

pub use artifacts::ModelArtifacts;
pub use ensemble::TreeEnsemble;
pub use scaler::{ScaledVector, StandardScaler};
pub use verdict::{Label, Verdict};

/// Per-column normalization fitted at training time.
pub trait FeatureScaler: Send + Sync {
    /// Scale every column of `features`, preserving column order.
    fn transform(&self, features: &FeatureVector) -> ScaledVector;
}

/// A binary classifier producing the probability of the positive
/// (legitimate) class.
pub trait ProbabilityModel: Send + Sync {
    /// Probability in `[0, 1]` for one scaled row.
    fn score(&self, scaled: &ScaledVector) -> f64;
}
