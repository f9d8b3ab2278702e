use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use workdesk_cli::WorkdeskCli;
use workdesk_shell_core::ShellConfig;

const LOG_ENV: &str = "WORKDESK_LOG";

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = WorkdeskCli::parse();
    let config = ShellConfig::from_env().context("invalid WORKDESK_* layout settings")?;
    let stdout = std::io::stdout();
    workdesk_cli::run(cli, &config, &mut stdout.lock())
}
