use clap::Parser;
use tracing::Level;

mod cli;
mod commands;
mod config;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = config::CliConfig::load(&cli.config)?;

    let level = match cli.verbose {
        0 => config.log_level.parse().unwrap_or(Level::WARN),
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    commands::run_command(cli, config)
}
