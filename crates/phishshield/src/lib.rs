//! PhishShield core: classify a URL as phishing or legitimate.
//!
//! The pipeline derives a fixed 22-column feature vector from the URL's
//! lexical structure and the fetched page, scales it with a pre-fitted
//! standard scaler, and scores it with a gradient-boosted tree ensemble.
//!
//! ```text
//! URL ─┬─ analysis::url_structure ─────────────────────┐
//!      └─ acquisition::fetcher ─ analysis::html_content ┴─ features::assembler
//!                                                          │
//!                              model::scaler ─ model::ensemble ─ Verdict
//! ```

pub mod acquisition;
pub mod analysis;
pub mod error;
pub mod features;
pub mod model;
pub mod pipeline;

pub use acquisition::{ContentFetcher, FetchConfig};
pub use error::{ModelError, ValidationError};
pub use features::vector::{FeatureVector, FEATURE_COLUMNS, FEATURE_COUNT};
pub use model::verdict::{Label, Verdict};
pub use model::ModelArtifacts;
pub use pipeline::{AnalysisReport, AnalysisRequest, ExtractedFeatures, PhishDetector, UrlReport};
