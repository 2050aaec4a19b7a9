//! HTTP request handlers.
//!
//! Every failure a caller can cause (bad JSON, missing or mistyped fields,
//! out-of-range values) becomes a 422 with `{"error": ...}`.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use phishshield::{FeatureVector, PhishDetector, Verdict, FEATURE_COUNT};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::types::*;
use crate::audit::{AuditEvent, AuditLogger};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub detector: Arc<PhishDetector>,
    pub audit: Option<Arc<Mutex<AuditLogger>>>,
}

impl AppState {
    pub fn new(detector: Arc<PhishDetector>) -> Self {
        Self {
            detector,
            audit: None,
        }
    }

    pub fn with_audit(mut self, logger: AuditLogger) -> Self {
        self.audit = Some(Arc::new(Mutex::new(logger)));
        self
    }

    fn record(&self, event: AuditEvent) {
        let Some(audit) = &self.audit else {
            return;
        };
        let result = match audit.lock() {
            Ok(mut logger) => logger.log(&event),
            Err(poisoned) => poisoned.into_inner().log(&event),
        };
        if let Err(e) = result {
            warn!(error = %e, "failed to write audit event");
        }
    }
}

/// Liveness banner
pub async fn root() -> impl IntoResponse {
    Json(MessageResponse {
        message: "PhishShield API is running".to_string(),
    })
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        features: FEATURE_COUNT,
    })
}

/// Classify a directly submitted feature vector.
pub async fn predict(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let span = info_span!("predict", %request_id);

    span.in_scope(|| {
        let started = Instant::now();
        let outcome = parse_body(body)
            .and_then(|value| FeatureVector::from_json(value).map_err(ApiError::from))
            .and_then(|features| {
                state
                    .detector
                    .classify_features(features)
                    .map_err(ApiError::from)
            });
        let elapsed = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(verdict) => {
                info!(label = %verdict.label, probability = verdict.probability, "scored features");
                state.record(AuditEvent::new(&request_id, "predict", None, Some(&verdict), elapsed, "ok"));
                Json(PredictionResponse::from(&verdict)).into_response()
            }
            Err(err) => {
                debug!(error = %err.0, "rejected feature payload");
                state.record(AuditEvent::new(&request_id, "predict", None, None, elapsed, "invalid"));
                err.into_response()
            }
        }
    })
}

/// Fetch, analyze and classify a URL.
pub async fn predict_url(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let span = info_span!("predict_url", %request_id);

    async move {
        let started = Instant::now();
        let request = match parse_body(body).and_then(|value| {
            serde_json::from_value::<PredictUrlRequest>(value)
                .map_err(|e| ApiError(format!("invalid request: {e}")))
        }) {
            Ok(request) => request,
            Err(err) => {
                debug!(error = %err.0, "rejected URL payload");
                state.record(AuditEvent::new(&request_id, "predict_url", None, None, 0, "invalid"));
                return err.into_response();
            }
        };

        let report = state.detector.classify_url(&request.url).await;
        let elapsed = started.elapsed().as_millis() as u64;
        let status = if report.fetch_error.is_some() {
            "degraded"
        } else {
            "ok"
        };
        let verdict: Verdict = report.verdict;
        state.record(AuditEvent::new(
            &request_id,
            "predict_url",
            Some(&request.url),
            Some(&verdict),
            elapsed,
            status,
        ));

        Json(UrlPredictionResponse::from(report)).into_response()
    }
    .instrument(span)
    .await
}

fn parse_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError(rejection.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_include;
    use phishshield::model::{FeatureScaler, ProbabilityModel, ScaledVector};
    use phishshield::{ContentFetcher, FetchConfig, ModelArtifacts, FEATURE_COLUMNS};
    use serde_json::json;
    use std::time::Duration;

    struct Identity;

    impl FeatureScaler for Identity {
        fn transform(&self, features: &FeatureVector) -> ScaledVector {
            ScaledVector(features.to_array())
        }
    }

    /// Legitimate iff the page is served over HTTPS.
    struct HttpsModel;

    impl ProbabilityModel for HttpsModel {
        fn score(&self, scaled: &ScaledVector) -> f64 {
            if scaled.0[8] > 0.5 {
                0.9
            } else {
                0.1
            }
        }
    }

    fn state() -> AppState {
        let fetcher = ContentFetcher::new(FetchConfig {
            timeout: Duration::from_secs(2),
            ..FetchConfig::default()
        })
        .unwrap();
        let detector = PhishDetector::new(
            ModelArtifacts::new(Arc::new(Identity), Arc::new(HttpsModel)),
            fetcher,
        );
        AppState::new(Arc::new(detector))
    }

    fn payload(overrides: Value) -> Value {
        let mut map = serde_json::Map::new();
        for name in FEATURE_COLUMNS {
            map.insert(name.to_string(), json!(0));
        }
        if let Value::Object(extra) = overrides {
            map.extend(extra);
        }
        Value::Object(map)
    }

    async fn body_json(response: Response) -> (u16, Value) {
        let status = response.status().as_u16();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_predict_scores_valid_payload() {
        let body = payload(json!({"IsHTTPS": 1, "Redirect_0": 1, "LetterToDigitRatio": 12.5}));
        let response = predict(State(state()), Ok(Json(body))).await;
        let (status, json) = body_json(response).await;

        assert_eq!(status, 200);
        assert_json_include!(
            actual: json,
            expected: json!({"prediction": 1, "result": "Legitimate", "probability": 0.9})
        );
    }

    #[tokio::test]
    async fn test_predict_rejects_missing_field() {
        let mut body = payload(json!({}));
        body.as_object_mut().unwrap().remove("NoOfJS");
        let (status, json) = body_json(predict(State(state()), Ok(Json(body))).await).await;

        assert_eq!(status, 422);
        assert!(json["error"].as_str().unwrap().contains("NoOfJS"));
    }

    #[tokio::test]
    async fn test_predict_rejects_out_of_range_values() {
        for overrides in [
            json!({"URLLength": -3}),
            json!({"HasTitle": 2}),
            json!({"Redirect_0": 1, "Redirect_1": 1}),
            json!({"NoOfImage": "many"}),
        ] {
            let response = predict(State(state()), Ok(Json(payload(overrides.clone())))).await;
            let (status, json) = body_json(response).await;
            assert_eq!(status, 422, "payload {overrides} should be rejected");
            assert!(json["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_predict_url_degrades_on_unreachable_host() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let url = format!("http://127.0.0.1:{port}/");

        let response = predict_url(State(state()), Ok(Json(json!({ "url": url })))).await;
        let (status, json) = body_json(response).await;

        assert_eq!(status, 200);
        assert_json_include!(
            actual: json.clone(),
            expected: json!({
                "url": url,
                "prediction": 0,
                "result": "Phishing",
                "features": {"Redirect_0": 0, "Redirect_1": 0, "NoOfImage": 0, "Abnormal_URL": 1}
            })
        );
        assert!(json["fetch_error"].is_string());
    }

    #[tokio::test]
    async fn test_predict_url_requires_url_field() {
        let response = predict_url(State(state()), Ok(Json(json!({"link": "x"})))).await;
        let (status, json) = body_json(response).await;
        assert_eq!(status, 422);
        assert!(json["error"].as_str().unwrap().contains("url"));
    }

    #[tokio::test]
    async fn test_audit_records_each_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let state = state().with_audit(AuditLogger::open(&path).unwrap());

        let body = payload(json!({"IsHTTPS": 1}));
        predict(State(state.clone()), Ok(Json(body))).await;
        predict(State(state), Ok(Json(json!({"nope": true})))).await;

        let lines: Vec<Value> = std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["status"], "ok");
        assert_eq!(lines[0]["result"], "Legitimate");
        assert_eq!(lines[1]["status"], "invalid");
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let (_, json) = body_json(root().await.into_response()).await;
        assert_eq!(json, json!({"message": "PhishShield API is running"}));

        let (status, json) = body_json(health().await.into_response()).await;
        assert_eq!(status, 200);
        assert_json_include!(actual: json, expected: json!({"status": "ok", "features": 22}));
    }
}
