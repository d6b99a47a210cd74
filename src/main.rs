use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use iliad_usage::app;
use iliad_usage::config::{default_config_path, Config, Env, ResolvedConfig};
use iliad_usage::credentials::{Credentials, TerminalPrompt};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "iliad-usage")]
#[command(about = "Show data usage from your Iliad account")]
#[command(version, long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_COMMIT_HASH"), ")"))]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print form and response diagnostics
    #[arg(short, long)]
    debug: bool,

    /// Monthly data allowance in GB (overrides ILIAD_DATA_GB)
    #[arg(long, value_name = "GB")]
    data_gb: Option<u64>,
}

fn init_tracing(debug: bool) {
    let default_filter = if debug { "iliad_usage=debug,warn" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(
            fmt::layer()
                .with_writer(io::stdout)
                .with_target(false)
                .with_level(true),
        )
        .init();
}

fn load_config(cli: &Cli, env: &Env) -> Result<ResolvedConfig> {
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&config_path)?,
    };

    let mut resolved = ResolvedConfig::resolve(config, env)
        .with_context(|| format!("Invalid configuration ({})", config_path.display()))?;

    if cli.debug {
        resolved.debug = true;
    }
    if let Some(data_gb) = cli.data_gb {
        resolved.total_capacity_gb = Some(data_gb);
    }

    Ok(resolved)
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let env = Env::from_process();
    let config = load_config(&cli, &env)?;
    init_tracing(config.debug);

    let credentials = Credentials::resolve(&env, &TerminalPrompt)?;

    let mut stdout = io::stdout();
    let outcome = app::check_usage(&config, &credentials, &mut stdout).await;
    let status = app::report_outcome(outcome, &mut stdout)?;
    Ok(ExitCode::from(status))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Existing environment variables take precedence over `.env`.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            println!("Error: {err:#}");
            ExitCode::from(app::EXIT_FAILURE)
        }
    }
}
