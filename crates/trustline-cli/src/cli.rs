use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "trustline",
    about = "Trustline: hash-chained identity ledger and trust scoring",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (TOML). Missing files fall back to defaults.
    #[arg(long, global = true, default_value = "trustline.toml")]
    pub config: PathBuf,

    /// Override `storage.data_dir` from the configuration.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a default configuration and an empty ledger
    Init(InitArgs),
    /// Create an identity for a principal
    Create(CreateArgs),
    /// Verify an identity (trust threshold and chain integrity)
    Verify(IdentityArgs),
    /// Attach verification evidence to an identity
    Attest(AttestArgs),
    /// Show the public trust projection of an identity
    Show(IdentityArgs),
    /// Search the public ledger
    Search(SearchArgs),
    /// Show aggregate ledger statistics
    Stats,
    /// Walk an identity's chain and report the first break, if any
    Audit(IdentityArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing configuration file.
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct CreateArgs {
    /// Principal id, typically an email address.
    pub principal: String,
    /// Extra principal attribute, as KEY=VALUE. Repeatable.
    #[arg(long = "attr", value_parser = parse_key_val)]
    pub attributes: Vec<(String, String)>,
}

#[derive(Args)]
pub struct IdentityArgs {
    /// Identity hash (hex, optionally prefixed with `id:`).
    pub identity: String,
}

#[derive(Args)]
pub struct AttestArgs {
    pub identity: String,
    /// Verification kind, e.g. EMAIL_VERIFIED or GOVERNMENT_ID.
    pub kind: String,
    /// Evidence payload as JSON.
    #[arg(long, default_value = "{}")]
    pub data: String,
}

#[derive(Args)]
pub struct SearchArgs {
    #[arg(long)]
    pub min_score: Option<u8>,
    #[arg(long)]
    pub kind: Option<String>,
    /// RFC 3339 timestamp; keeps identities created at or after it.
    #[arg(long)]
    pub created_after: Option<String>,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
    if key.is_empty() {
        return Err(format!("empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}
