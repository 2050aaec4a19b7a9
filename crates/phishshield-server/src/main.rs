//! PhishShield: classify URLs as phishing or legitimate.

use anyhow::Result;
use clap::{Parser, Subcommand};
use phishshield_server::cli;
use phishshield_server::config::{ArtifactArgs, ServeArgs};

#[derive(Parser)]
#[command(name = "phishshield")]
#[command(about = "Phishing URL classifier and HTTP API")]
#[command(version)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the model and serve the HTTP API
    Serve(ServeArgs),

    /// Classify one URL and print the verdict
    Check {
        /// URL to classify
        url: String,

        #[command(flatten)]
        artifacts: ArtifactArgs,

        /// Page fetch timeout in seconds [default: 10]
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the feature vector extracted from a URL
    Features {
        /// URL to analyze
        url: String,

        /// Page fetch timeout in seconds [default: 10]
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::init_tracing(cli.log_json);

    match cli.command {
        Commands::Serve(args) => cli::serve(&args).await,
        Commands::Check {
            url,
            artifacts,
            timeout,
            json,
        } => cli::check(&url, &artifacts, timeout, json).await,
        Commands::Features { url, timeout, json } => cli::features(&url, timeout, json).await,
    }
}
