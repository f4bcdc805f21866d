//! regwatch-export - write every audit report to a CSV file

use anyhow::{Context, Result};
use clap::Parser;
use regwatch_common::config::CompiledDefaults;
use regwatch_common::db::init_database_pool;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "regwatch-export")]
#[command(about = "Export regwatch audit reports to CSV")]
#[command(version)]
struct Args {
    #[arg(long, env = "REGWATCH_DATABASE_URL", default_value = CompiledDefaults::DATABASE_URL)]
    database_url: String,

    /// Destination file, overwritten if it exists
    #[arg(short, long, default_value = "audit_reports.csv")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "regwatch_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let pool = init_database_pool(&args.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", args.database_url))?;

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let rows = regwatch_api::export::export_audit_reports(&pool, BufWriter::new(file))
        .await
        .context("Export failed")?;

    info!("Wrote {} audit report(s) to {}", rows, args.output.display());
    Ok(())
}
