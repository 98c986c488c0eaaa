use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use std::fs::File;
use std::io::Write;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dpdp_shield::cli::Cli;
use dpdp_shield::config::Config;

/// File writer for dashboard mode; logging to the terminal would corrupt
/// the alternate screen.
#[derive(Clone)]
struct LogFile(Arc<Mutex<File>>);

impl Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.lock().flush()
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogFile {
    type Writer = LogFile;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(&cli.config)?;
    if let Some(api_url) = &cli.api_url {
        config.server.base_url = api_url.clone();
    }

    // Initialize logging
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    match &cli.command {
        Some(command) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();

            dpdp_shield::cli::run_command(command, &config).await
        }
        None => {
            std::fs::create_dir_all(&config.server.data_dir).with_context(|| {
                format!(
                    "Failed to create data directory: {}",
                    config.server.data_dir.display()
                )
            })?;
            let log_path = config.server.data_dir.join("dpdp-shield.log");
            let log_file = File::options()
                .create(true)
                .append(true)
                .open(&log_path)
                .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(LogFile(Arc::new(Mutex::new(log_file)))),
                )
                .init();

            tracing::info!("Starting DPDP Shield v{}", env!("CARGO_PKG_VERSION"));
            dpdp_shield::ui::run(config).await
        }
    }
}
