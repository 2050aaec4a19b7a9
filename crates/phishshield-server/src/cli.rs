//! Subcommand implementations for the `phishshield` binary.

use anyhow::{Context, Result};
use phishshield::pipeline::extract_features;
use phishshield::{
    ContentFetcher, ExtractedFeatures, FetchConfig, ModelArtifacts, PhishDetector, UrlReport,
    FEATURE_COLUMNS,
};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::audit::AuditLogger;
use crate::config::{resolve_artifacts, resolve_timeout, ArtifactArgs, ServeArgs, ServerConfig};
use crate::http::types::UrlPredictionResponse;
use crate::http::{AppState, HttpServer};

const DEFAULT_LOG_FILTER: &str = "phishshield=info,phishshield_server=info";

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays machine-readable.
pub fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// `phishshield serve`
pub async fn serve(args: &ServeArgs) -> Result<()> {
    let config = ServerConfig::from_args(args)?;
    info!("starting PhishShield v{}", env!("CARGO_PKG_VERSION"));

    let artifacts = ModelArtifacts::load(&config.model_path, &config.scaler_path)
        .context("failed to load model artifacts")?;
    let fetcher = ContentFetcher::new(config.fetch.clone()).context("failed to build fetcher")?;
    let detector = Arc::new(PhishDetector::new(artifacts, fetcher));

    let mut state = AppState::new(detector);
    if let Some(path) = &config.audit_log {
        state = state.with_audit(AuditLogger::open(path)?);
        info!("audit log: {}", path.display());
    }

    HttpServer::new(config.listen, config.cors_enabled, state)
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("received shutdown signal");
        })
        .await
}

/// `phishshield check <URL>`
pub async fn check(url: &str, artifacts: &ArtifactArgs, timeout: Option<u64>, json: bool) -> Result<()> {
    let (model_path, scaler_path) = resolve_artifacts(artifacts, &process_env);
    let timeout = resolve_timeout(timeout, &process_env)?;

    let artifacts = ModelArtifacts::load(&model_path, &scaler_path)
        .context("failed to load model artifacts")?;
    let fetcher = ContentFetcher::new(FetchConfig {
        timeout,
        ..FetchConfig::default()
    })
    .context("failed to build fetcher")?;
    let detector = PhishDetector::new(artifacts, fetcher);

    let report = detector.classify_url_with_timeout(url, timeout).await;
    if json {
        let body = UrlPredictionResponse::from(report);
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        print!("{}", render_report(&report));
    }
    Ok(())
}

/// `phishshield features <URL>`
pub async fn features(url: &str, timeout: Option<u64>, json: bool) -> Result<()> {
    let timeout = resolve_timeout(timeout, &process_env)?;
    let fetcher = ContentFetcher::new(FetchConfig {
        timeout,
        ..FetchConfig::default()
    })
    .context("failed to build fetcher")?;

    let extracted = extract_features(&fetcher, url, timeout).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&extracted)?);
    } else {
        print!("{}", render_features(&extracted));
    }
    Ok(())
}

/// Human-readable verdict.
pub fn render_report(report: &UrlReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "URL:          {}", report.url);
    let _ = writeln!(
        out,
        "Result:       {} (prediction {})",
        report.verdict.label,
        report.verdict.prediction()
    );
    let _ = writeln!(out, "Probability:  {:.4}", report.verdict.probability);
    if let Some(reason) = &report.fetch_error {
        let _ = writeln!(out, "Fetch:        failed, content features zeroed ({reason})");
    }
    out
}

/// One `column  value` line per feature, in training order.
pub fn render_features(extracted: &ExtractedFeatures) -> String {
    let mut out = String::new();
    for (name, value) in FEATURE_COLUMNS.iter().zip(extracted.features.to_array()) {
        let _ = writeln!(out, "{name:<20} {value}");
    }
    if let Some(reason) = &extracted.fetch_error {
        let _ = writeln!(out, "# fetch failed: {reason}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use phishshield::acquisition::RedirectState;
    use phishshield::{FeatureVector, Verdict};

    #[test]
    fn test_render_report_mentions_degraded_fetch() {
        let report = UrlReport {
            url: "http://10.0.0.1/".into(),
            features: FeatureVector::default(),
            verdict: Verdict::from_probability(0.12),
            fetch_error: Some("connection refused".into()),
        };
        let text = render_report(&report);
        assert!(text.contains("Phishing (prediction 0)"));
        assert!(text.contains("0.1200"));
        assert!(text.contains("connection refused"));
    }

    #[test]
    fn test_render_features_lists_every_column_in_order() {
        let extracted = ExtractedFeatures {
            features: FeatureVector {
                url_length: 24,
                redirect_0: 1,
                ..FeatureVector::default()
            },
            redirect_state: RedirectState::NoRedirects,
            fetch_error: None,
        };
        let text = render_features(&extracted);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 22);
        assert!(lines[0].starts_with("URLLength") && lines[0].ends_with("24"));
        assert!(lines[20].starts_with("Redirect_0") && lines[20].ends_with('1'));
    }
}
