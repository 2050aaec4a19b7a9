//! End-to-end classification.
//!
//! [`PhishDetector`] owns the shared, read-only pieces (scaler, model and
//! fetcher) and runs a request through the analyzers, the assembler and the
//! scorer. URL analysis never fails: an unreachable page only degrades the
//! content columns. Directly submitted vectors are validated first.

use crate::acquisition::{ContentFetcher, FetchOutcome, RedirectState};
use crate::analysis::{ContentFeatures, UrlStructure};
use crate::error::ValidationError;
use crate::features::{assemble, FeatureVector};
use crate::model::{FeatureScaler, ModelArtifacts, ProbabilityModel, Verdict};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What a caller asks the detector to classify.
#[derive(Debug, Clone)]
pub enum AnalysisRequest {
    /// Fetch and analyze a URL. `fetch_timeout` falls back to the fetcher's
    /// configured timeout.
    Url {
        url: String,
        fetch_timeout: Option<Duration>,
    },
    /// Score a pre-computed feature vector.
    Features(FeatureVector),
}

/// Feature vector derived from a URL, before scoring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedFeatures {
    pub features: FeatureVector,
    pub redirect_state: RedirectState,
    /// Why the page could not be fetched, when it could not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
}

/// Result of classifying a URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlReport {
    pub url: String,
    pub features: FeatureVector,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
}

/// Result of [`PhishDetector::analyze`].
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisReport {
    Url(UrlReport),
    Features {
        features: FeatureVector,
        verdict: Verdict,
    },
}

impl AnalysisReport {
    pub fn verdict(&self) -> &Verdict {
        match self {
            AnalysisReport::Url(report) => &report.verdict,
            AnalysisReport::Features { verdict, .. } => verdict,
        }
    }

    pub fn features(&self) -> &FeatureVector {
        match self {
            AnalysisReport::Url(report) => &report.features,
            AnalysisReport::Features { features, .. } => features,
        }
    }
}

/// Run the analyzers for `url` and assemble the vector.
///
/// The structural analysis and the fetch run concurrently; the HTML analysis
/// runs afterwards on a blocking worker since the parsed tree is not `Send`.
pub async fn extract_features(
    fetcher: &ContentFetcher,
    url: &str,
    timeout: Duration,
) -> ExtractedFeatures {
    let (structure, outcome) = tokio::join!(
        async { UrlStructure::analyze(url) },
        fetcher.fetch_with_timeout(url, timeout),
    );

    let redirect_state = outcome.redirect_state();
    let (body, fetch_error) = match outcome {
        FetchOutcome::Fetched(page) => (Some(page.body), None),
        FetchOutcome::Failed { reason } => (None, Some(reason)),
    };

    let content = match body {
        Some(body) => {
            let page_url = url.to_string();
            tokio::task::spawn_blocking(move || ContentFeatures::analyze(Some(&body), &page_url))
                .await
                .unwrap_or_else(|e| {
                    warn!(url, error = %e, "HTML analysis task failed");
                    ContentFeatures::default()
                })
        }
        None => ContentFeatures::default(),
    };
    debug!(url, ?structure, ?content, ?redirect_state, "analyzed");

    ExtractedFeatures {
        features: assemble(&structure, redirect_state, &content),
        redirect_state,
        fetch_error,
    }
}

/// Shared classifier. Build once, wrap in `Arc`, use from any task.
#[derive(Clone)]
pub struct PhishDetector {
    scaler: Arc<dyn FeatureScaler>,
    model: Arc<dyn ProbabilityModel>,
    fetcher: ContentFetcher,
}

impl PhishDetector {
    pub fn new(artifacts: ModelArtifacts, fetcher: ContentFetcher) -> Self {
        Self {
            scaler: artifacts.scaler,
            model: artifacts.model,
            fetcher,
        }
    }

    pub fn fetcher(&self) -> &ContentFetcher {
        &self.fetcher
    }

    /// Scale and score a vector without validating it.
    pub fn score(&self, features: &FeatureVector) -> Verdict {
        let scaled = self.scaler.transform(features);
        Verdict::from_probability(self.model.score(&scaled))
    }

    /// Validate, then score, a directly submitted vector.
    pub fn classify_features(&self, features: FeatureVector) -> Result<Verdict, ValidationError> {
        features.validate()?;
        Ok(self.score(&features))
    }

    /// Derive the feature vector for `url` without scoring it.
    pub async fn extract_features(&self, url: &str, timeout: Duration) -> ExtractedFeatures {
        extract_features(&self.fetcher, url, timeout).await
    }

    /// Full pipeline with the fetcher's configured timeout.
    pub async fn classify_url(&self, url: &str) -> UrlReport {
        self.classify_url_with_timeout(url, self.fetcher.config().timeout)
            .await
    }

    /// Full pipeline with an explicit fetch timeout.
    pub async fn classify_url_with_timeout(&self, url: &str, timeout: Duration) -> UrlReport {
        let extracted = extract_features(&self.fetcher, url, timeout).await;
        let verdict = self.score(&extracted.features);
        info!(
            url,
            label = %verdict.label,
            probability = verdict.probability,
            degraded = extracted.fetch_error.is_some(),
            "classified URL"
        );
        UrlReport {
            url: url.to_string(),
            features: extracted.features,
            verdict,
            fetch_error: extracted.fetch_error,
        }
    }

    /// Dispatch over both request shapes.
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisReport, ValidationError> {
        match request {
            AnalysisRequest::Url { url, fetch_timeout } => {
                let timeout = fetch_timeout.unwrap_or(self.fetcher.config().timeout);
                Ok(AnalysisReport::Url(
                    self.classify_url_with_timeout(&url, timeout).await,
                ))
            }
            AnalysisRequest::Features(features) => {
                let verdict = self.classify_features(features.clone())?;
                Ok(AnalysisReport::Features { features, verdict })
            }
        }
    }
}

impl std::fmt::Debug for PhishDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhishDetector")
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}
