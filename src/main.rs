use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use uniform_ledger::cli::{Args, CliApp};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()))
        })
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("🦀 Uniform ledger starting...");

    let app = CliApp::new().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    app.run(args).await
}
