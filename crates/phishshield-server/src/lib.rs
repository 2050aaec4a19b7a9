//! PhishShield service: HTTP API, command-line front end and audit log
//! around the `phishshield` classifier.

pub mod audit;
pub mod cli;
pub mod config;
pub mod http;

pub use config::ServerConfig;
