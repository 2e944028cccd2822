use clap::{Parser, Subcommand};
use kpi_collector::browser::{LoginFlow, SessionStore};
use kpi_collector::collector::{render, ReportCollector};
use kpi_collector::services::Orchestrator;
use kpi_collector::{CollectorError, Config};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "kpi-collector", version, about = "Collects daily report listings using a browser-acquired session")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Launch the interactive browser login and store the session cookies
    Login {
        /// Login deadline in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Collect reports with the stored session (fails if not authenticated)
    Collect {
        /// Start month, YYYY-MM
        #[arg(long)]
        start: String,
        /// End month, YYYY-MM (inclusive)
        #[arg(long)]
        end: String,
        /// Output file for the markdown digest
        #[arg(long, short, default_value = "reports.md")]
        output: PathBuf,
    },
    /// Collect, logging in first when the stored session is missing or stale
    Auto {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long, short, default_value = "reports.md")]
        output: PathBuf,
        /// Login deadline in seconds
        #[arg(long)]
        login_timeout: Option<u64>,
    },
    /// Report whether stored credentials exist and still grant access
    Status,
    /// Remove stored credentials and the isolated browser profile
    Clear,
    /// Print a rendered report file and the path a CSV summary belongs at
    Summary { file: PathBuf },
}

#[tokio::main]
async fn main() {
    if let Ok(path) = dotenvy::dotenv() {
        eprintln!("loaded .env from {}", path.display());
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,kpi_collector=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("❌ {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CollectorError> {
    let mut config = Config::from_env();

    match cli.command {
        Command::Login { timeout } => {
            if let Some(secs) = timeout {
                config.login_timeout = Duration::from_secs(secs);
            }
            let config = Arc::new(config);
            let store = SessionStore::new(&config.data_dir);

            let flow = LoginFlow::new(config, store);
            let cookies = flow.run().await.into_result()?;
            tracing::info!("✅ login succeeded, {} cookies stored", cookies);
            Ok(())
        }

        Command::Collect { start, end, output } => {
            let config = Arc::new(config);
            let store = SessionStore::new(&config.data_dir);

            let collector = ReportCollector::new(config, store)?;
            let summary = collector.collect(&start, &end, &output).await?;
            report_summary(&summary);
            Ok(())
        }

        Command::Auto {
            start,
            end,
            output,
            login_timeout,
        } => {
            if let Some(secs) = login_timeout {
                config.login_timeout = Duration::from_secs(secs);
            }
            let orchestrator = Orchestrator::new(Arc::new(config));
            let summary = orchestrator.auto_collect(&start, &end, &output).await?;
            report_summary(&summary);
            Ok(())
        }

        Command::Status => {
            let config = Arc::new(config);
            let store = SessionStore::new(&config.data_dir);

            if !store.exists() {
                tracing::info!("no stored session ({})", store.credential_file().display());
                return Ok(());
            }

            let collector = ReportCollector::new(config, store)?;
            collector.load_credentials()?;
            if collector.check_session_valid().await {
                tracing::info!("✅ stored session is valid");
            } else {
                tracing::warn!("⚠️ stored session exists but no longer grants access");
            }
            Ok(())
        }

        Command::Clear => {
            let store = SessionStore::new(&config.data_dir);
            store.clear()?;
            tracing::info!("✓ credentials and browser profile cleared");
            Ok(())
        }

        Command::Summary { file } => {
            let (content, csv_path) = render::summary_source(&file)?;
            println!("{}", content);
            tracing::info!("suggested summary path: {}", csv_path.display());
            Ok(())
        }
    }
}

fn report_summary(summary: &kpi_collector::collector::CollectSummary) {
    tracing::info!(
        "📊 {} items across {} period(s) -> {}",
        summary.total_items,
        summary.periods,
        summary.output_path.display()
    );
    if !summary.failed_periods.is_empty() {
        tracing::warn!(
            "⚠️ {} period(s) failed and were skipped: {}",
            summary.failed_periods.len(),
            summary.failed_periods.join(", ")
        );
    }
}
