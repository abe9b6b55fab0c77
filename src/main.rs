use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use ssl_watcher::api;
use ssl_watcher::config::{self, Config};
use ssl_watcher::delivery::{Delivery, EmailDelivery, LogDelivery, RecipientStore};
use ssl_watcher::monitor::{Monitor, Scheduler};
use ssl_watcher::observability;
use ssl_watcher::observability::metrics::MetricsCollector;
use ssl_watcher::report::PdfReport;
use ssl_watcher::state::MonitorState;
use ssl_watcher::tls::{Inspector, TlsInspector};

#[derive(Parser)]
#[command(name = "ssl-watcher")]
#[command(about = "TLS certificate expiry monitor with email alerts", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monitor and management API (default)
    Run,
    /// Inspect one domain and print the result as JSON
    Inspect {
        /// Domain or URL to inspect
        domain: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if std::path::Path::new(&cli.config).exists() {
        config::load_config(&cli.config)?
    } else {
        Config::default()
    };
    config::validate_config(&config)?;
    let _guard = observability::logging::init_logging(&config.logging);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await,
        Commands::Inspect { domain } => inspect(&config, &domain).await,
    }
}

async fn inspect(config: &Config, domain: &str) -> Result<()> {
    let inspector = TlsInspector::new(Duration::from_secs(config.monitor.connect_timeout_secs))?;
    let snapshot = inspector.inspect(domain).await;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

async fn run(config: Config) -> Result<()> {
    info!("Starting SSL Watcher...");

    let recipients = Arc::new(RecipientStore::new(&config.recipients.path));
    recipients
        .ensure_exists()
        .context("Failed to initialize recipient store")?;

    let metrics = Arc::new(MetricsCollector::new().context("Failed to register metrics")?);
    let inspector = Arc::new(TlsInspector::new(Duration::from_secs(
        config.monitor.connect_timeout_secs,
    ))?);

    let delivery: Arc<dyn Delivery> = match &config.smtp {
        Some(smtp) => {
            info!("Email alerts via {}:{}", smtp.server, smtp.port);
            Arc::new(EmailDelivery::new(smtp.clone()))
        }
        None => {
            warn!("No [smtp] section configured, alerts will only be logged");
            Arc::new(LogDelivery)
        }
    };

    let monitor = Monitor::new(
        MonitorState::from_config(&config.monitor),
        inspector,
        Arc::new(PdfReport::new()),
        delivery,
        recipients,
        metrics,
    )
    .with_max_concurrent_checks(config.monitor.max_concurrent_checks);

    let scheduler = Scheduler::new(
        monitor.clone(),
        Duration::from_secs(config.monitor.check_interval_secs),
    )
    .spawn();

    let (addr, app) = api::server::create_api_server(&config.server.listen_addr, monitor)?;

    tokio::select! {
        result = api::server::run_api_server(addr, app) => {
            if let Err(e) = &result {
                error!("API server error: {}", e);
            }
            scheduler.shutdown().await;
            return result;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutting down...");
        }
    }

    scheduler.shutdown().await;
    Ok(())
}
