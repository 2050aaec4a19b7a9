//! JSON request and response bodies of the HTTP API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use phishshield::{FeatureVector, UrlReport, Verdict};
use serde::{Deserialize, Serialize};

/// `GET /` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// `GET /health` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Width of the feature vector the model expects.
    pub features: usize,
}

/// `POST /predict_url` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictUrlRequest {
    pub url: String,
}

/// `POST /predict` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// 1 legitimate, 0 phishing
    pub prediction: u8,
    pub result: String,
    pub probability: f64,
}

impl From<&Verdict> for PredictionResponse {
    fn from(verdict: &Verdict) -> Self {
        Self {
            prediction: verdict.prediction(),
            result: verdict.label.to_string(),
            probability: verdict.probability,
        }
    }
}

/// `POST /predict_url` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlPredictionResponse {
    pub url: String,
    pub prediction: u8,
    pub result: String,
    pub probability: f64,
    pub features: FeatureVector,
    /// Present when the page could not be fetched and content features
    /// were zeroed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
}

impl From<UrlReport> for UrlPredictionResponse {
    fn from(report: UrlReport) -> Self {
        let PredictionResponse {
            prediction,
            result,
            probability,
        } = PredictionResponse::from(&report.verdict);
        Self {
            url: report.url,
            prediction,
            result,
            probability,
            features: report.features,
            fetch_error: report.fetch_error,
        }
    }
}

/// Error body: `{"error": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A request the service refuses to classify. Rendered as 422.
#[derive(Debug, Clone)]
pub struct ApiError(pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse { error: self.0 }),
        )
            .into_response()
    }
}

impl From<phishshield::ValidationError> for ApiError {
    fn from(err: phishshield::ValidationError) -> Self {
        Self(err.to_string())
    }
}
