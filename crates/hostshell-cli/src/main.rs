use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use hostshell_infrastructure::HostPaths;

mod bootstrap;
mod remotes;
mod repl;

use bootstrap::{BootstrapOptions, HostBootstrap};

const DEFAULT_LOG_FILTER: &str = "hostshell=info";

#[derive(Parser, Debug)]
#[command(name = "hostshell")]
#[command(about = "Host shell composing customer and admin remotes around shared state", long_about = None)]
struct Cli {
    /// Path to config.toml (default: <config dir>/hostshell/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the persisted state
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Keep state in memory only
    #[arg(long)]
    ephemeral: bool,

    /// Start with every remote unreachable
    #[arg(long, conflicts_with = "http")]
    offline: bool,

    /// Probe each remote's entry bundle over HTTP before mounting it
    #[arg(long)]
    http: bool,

    /// Log filter level for hostshell crates (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Log to stderr instead of the rolling log file
    #[arg(long)]
    log_stderr: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(&cli)?;

    let host = HostBootstrap::build(BootstrapOptions {
        config_path: cli.config,
        state_dir: cli.state_dir,
        ephemeral: cli.ephemeral,
        offline: cli.offline,
        http: cli.http,
        base_dir: None,
    })
    .await?;

    let result = repl::run(&host).await;
    host.shutdown().await;
    tracing::info!("[Main] Exited");
    result
}

/// Installs the global subscriber. The returned guard must live until exit
/// so buffered file output is flushed.
fn init_tracing(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let filter = match &cli.log_level {
        Some(level) => EnvFilter::try_new(format!("hostshell={}", level))?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    let logs_dir = if cli.log_stderr {
        None
    } else {
        HostPaths::default().logs_dir().ok()
    };

    match logs_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::daily(&dir, "hostshell.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(writer)
                .try_init();
            Ok(Some(guard))
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
            Ok(None)
        }
    }
}
