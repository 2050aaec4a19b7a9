//! Server configuration: CLI flags, environment overrides, defaults.
//!
//! Precedence per setting is flag, then `PHISHSHIELD_*` environment
//! variable, then built-in default.

use anyhow::{Context, Result};
use clap::Args;
use phishshield::FetchConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LISTEN: &str = "0.0.0.0:8000";
pub const DEFAULT_MODEL_PATH: &str = "xgb_model.json";
pub const DEFAULT_SCALER_PATH: &str = "scaler.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const ENV_LISTEN: &str = "PHISHSHIELD_LISTEN";
pub const ENV_MODEL: &str = "PHISHSHIELD_MODEL";
pub const ENV_SCALER: &str = "PHISHSHIELD_SCALER";
pub const ENV_TIMEOUT_SECS: &str = "PHISHSHIELD_TIMEOUT_SECS";
pub const ENV_AUDIT_LOG: &str = "PHISHSHIELD_AUDIT_LOG";

/// Paths of the trained artifacts.
#[derive(Args, Debug, Clone, Default)]
pub struct ArtifactArgs {
    /// XGBoost JSON model [default: xgb_model.json]
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Fitted scaler JSON [default: scaler.json]
    #[arg(long)]
    pub scaler: Option<PathBuf>,
}

/// Flags accepted by `phishshield serve`.
#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Address to bind [default: 0.0.0.0:8000]
    #[arg(short, long)]
    pub listen: Option<String>,

    #[command(flatten)]
    pub artifacts: ArtifactArgs,

    /// Page fetch timeout in seconds [default: 10]
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// User-Agent sent when fetching pages
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Append one JSON line per classification to this file
    #[arg(long)]
    pub audit_log: Option<PathBuf>,

    /// Disable the permissive CORS layer
    #[arg(long)]
    pub no_cors: bool,
}

/// Resolved configuration of the HTTP service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
    pub fetch: FetchConfig,
    pub audit_log: Option<PathBuf>,
    pub cors_enabled: bool,
}

impl ServerConfig {
    /// Resolve flags against the process environment.
    pub fn from_args(args: &ServeArgs) -> Result<Self> {
        Self::from_args_with_env(args, |key| std::env::var(key).ok())
    }

    /// Resolve flags against an arbitrary environment lookup.
    pub fn from_args_with_env<F>(args: &ServeArgs, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen = args
            .listen
            .clone()
            .or_else(|| env(ENV_LISTEN))
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let listen: SocketAddr = listen
            .parse()
            .with_context(|| format!("invalid listen address: {listen}"))?;

        let (model_path, scaler_path) = resolve_artifacts(&args.artifacts, &env);
        let timeout = resolve_timeout(args.timeout, &env)?;

        let mut fetch = FetchConfig {
            timeout,
            ..FetchConfig::default()
        };
        if let Some(ua) = &args.user_agent {
            fetch.user_agent = ua.clone();
        }

        Ok(Self {
            listen,
            model_path,
            scaler_path,
            fetch,
            audit_log: args
                .audit_log
                .clone()
                .or_else(|| env(ENV_AUDIT_LOG).map(PathBuf::from)),
            cors_enabled: !args.no_cors,
        })
    }
}

/// Model and scaler paths, flag > env > default.
pub fn resolve_artifacts<F>(args: &ArtifactArgs, env: &F) -> (PathBuf, PathBuf)
where
    F: Fn(&str) -> Option<String>,
{
    let model = args
        .model
        .clone()
        .or_else(|| env(ENV_MODEL).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));
    let scaler = args
        .scaler
        .clone()
        .or_else(|| env(ENV_SCALER).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SCALER_PATH));
    (model, scaler)
}

/// Fetch timeout, flag > env > default.
pub fn resolve_timeout<F>(flag: Option<u64>, env: &F) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = match flag {
        Some(secs) => secs,
        None => match env(ENV_TIMEOUT_SECS) {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_TIMEOUT_SECS} is not a number: {raw}"))?,
            None => DEFAULT_TIMEOUT_SECS,
        },
    };
    anyhow::ensure!(secs > 0, "fetch timeout must be at least one second");
    Ok(Duration::from_secs(secs))
}
