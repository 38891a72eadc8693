use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use intake::{load_bureau_report, Config, OcrOrchestrator};

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "Extract KTP identity fields and SLIK bureau tables for loan intake")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read a KTP photo and print the extracted identity fields
    Ktp {
        path: PathBuf,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Parse a SLIK report (.txt) and print it as a table
    Slik {
        path: PathBuf,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{output}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "intake=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();

    match args.command {
        Command::Ktp { path, pretty } => {
            let orchestrator = OcrOrchestrator::new(&config)?;
            let image = tokio::fs::read(&path).await?;

            let cancel_token = CancellationToken::new();
            let token = cancel_token.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupted, stopping OCR attempts...");
                    token.cancel();
                }
            });

            tracing::info!("Reading KTP from {}...", path.display());
            let extraction = orchestrator
                .extract_identity_with_cancel(image, cancel_token)
                .await?;
            if let Some(warning) = &extraction.warning {
                tracing::warn!("KTP reader warning: {}", warning);
            }
            print_json(&extraction, pretty)?;
        }
        Command::Slik { path, pretty } => {
            let limit = config.preprocessing.max_upload_bytes as u64;
            let table = load_bureau_report(&path, limit).await?;
            if let Some(name) = table.debtor_name() {
                tracing::info!("Debtor: {}", name);
            }
            print_json(&table, pretty)?;
        }
    }

    Ok(())
}
