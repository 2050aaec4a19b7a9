//! Error types surfaced by the library.
//!
//! Analysis itself never fails; only two things can: loading the trained
//! artifacts at startup ([`ModelError`]) and validating a feature vector
//! submitted directly by a caller ([`ValidationError`]).

use std::path::PathBuf;
use thiserror::Error;

/// The scaler or ensemble could not be loaded or does not match the
/// 22-column feature schema. Fatal at startup.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid artifact JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{artifact} has {found} columns, the feature vector has {expected}")]
    FeatureCount {
        artifact: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{artifact} column {index} is {found:?}, expected {expected:?}")]
    ColumnMismatch {
        artifact: &'static str,
        index: usize,
        expected: &'static str,
        found: String,
    },

    #[error("unsupported booster {0:?}, only gbtree is supported")]
    UnsupportedBooster(String),

    #[error("unsupported objective {0:?}")]
    UnsupportedObjective(String),

    #[error("invalid base_score {0:?}")]
    InvalidBaseScore(String),

    #[error("tree {tree} is malformed: {reason}")]
    MalformedTree { tree: usize, reason: String },

    #[error("scaler column {index} has non-finite statistics")]
    InvalidScaler { index: usize },
}

/// A directly submitted feature vector was rejected before scoring.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("invalid feature payload: {0}")]
    Malformed(String),

    #[error("{column} must be 0 or 1, got {value}")]
    NotAFlag { column: &'static str, value: u32 },

    #[error("Redirect_0 and Redirect_1 cannot both be set")]
    RedirectConflict,

    #[error("LetterToDigitRatio must be finite and non-negative, got {0}")]
    InvalidRatio(f64),
}
