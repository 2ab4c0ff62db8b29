use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use trustline_trust::{
    ChainReport, IdentityHash, JsonFileStore, LedgerStats, PrincipalData, PublicLedgerEntry,
    SearchCriteria, TrustError, TrustService, VerificationKind,
};

use crate::cli::*;
use crate::config::CliConfig;

struct Session {
    format: OutputFormat,
    data_dir: PathBuf,
    config: CliConfig,
}

impl Session {
    fn open_store(&self) -> anyhow::Result<Arc<JsonFileStore>> {
        let store = JsonFileStore::open(
            &self.data_dir,
            &self.config.trust.network_name,
            &self.config.trust.version,
        )
        .with_context(|| format!("opening data directory {}", self.data_dir.display()))?;
        Ok(Arc::new(store))
    }

    fn service(&self) -> anyhow::Result<TrustService> {
        let store = self.open_store()?;
        Ok(
            TrustService::new(self.config.trust.clone(), store.clone(), store.clone())
                .with_principal_index(store),
        )
    }

    fn emit_json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

pub fn run_command(cli: Cli, config: CliConfig) -> anyhow::Result<()> {
    let ctx = Session {
        format: cli.format,
        data_dir: cli
            .data_dir
            .clone()
            .unwrap_or_else(|| config.storage.data_dir.clone()),
        config,
    };
    match cli.command {
        Command::Init(args) => cmd_init(&ctx, &cli.config, args),
        Command::Create(args) => cmd_create(&ctx, args),
        Command::Verify(args) => cmd_verify(&ctx, args),
        Command::Attest(args) => cmd_attest(&ctx, args),
        Command::Show(args) => cmd_show(&ctx, args),
        Command::Search(args) => cmd_search(&ctx, args),
        Command::Stats => cmd_stats(&ctx),
        Command::Audit(args) => cmd_audit(&ctx, args),
    }
}

fn parse_identity(raw: &str) -> anyhow::Result<IdentityHash> {
    IdentityHash::from_hex(raw).with_context(|| format!("invalid identity hash `{raw}`"))
}

fn cmd_init(ctx: &Session, config_path: &std::path::Path, args: InitArgs) -> anyhow::Result<()> {
    let wrote_config = if args.force || !config_path.exists() {
        let mut config = ctx.config.clone();
        config.storage.data_dir = ctx.data_dir.clone();
        config.save(config_path)?;
        true
    } else {
        false
    };
    let created = ctx.open_store()?.initialize()?;
    tracing::info!(data_dir = %ctx.data_dir.display(), created, "ledger initialized");

    match ctx.format {
        OutputFormat::Json => ctx.emit_json(&serde_json::json!({
            "config": config_path,
            "config_written": wrote_config,
            "data_dir": ctx.data_dir,
            "ledger_created": created,
        })),
        OutputFormat::Text => {
            let verb = if created { "Initialized" } else { "Reinitialized" };
            println!(
                "{} {} Trustline ledger in {}",
                "✓".green().bold(),
                verb,
                ctx.data_dir.display().to_string().bold()
            );
            println!("  Network: {}", ctx.config.trust.network_name.cyan());
            if wrote_config {
                println!("  Config: {}", config_path.display().to_string().yellow());
            }
            Ok(())
        }
    }
}

fn cmd_create(ctx: &Session, args: CreateArgs) -> anyhow::Result<()> {
    let principal = args
        .attributes
        .into_iter()
        .fold(PrincipalData::email(args.principal), |p, (k, v)| p.with_attribute(k, v));
    let identity = ctx.service()?.create_identity(&principal)?;

    match ctx.format {
        OutputFormat::Json => ctx.emit_json(&identity.public_entry()),
        OutputFormat::Text => {
            println!("{} Identity created", "✓".green().bold());
            println!("  Identity: {}", identity.identity_hash.to_hex().cyan());
            println!("  Public key: {}", identity.public_key);
            println!("  Scheme: {}", identity.metadata.signature_scheme);
            println!("  Trust score: {}", score_label(identity.trust_score.value()));
            Ok(())
        }
    }
}

fn cmd_verify(ctx: &Session, args: IdentityArgs) -> anyhow::Result<()> {
    let hash = parse_identity(&args.identity)?;
    match ctx.service()?.verify_identity(&hash) {
        Ok(outcome) => match ctx.format {
            OutputFormat::Json => ctx.emit_json(&outcome),
            OutputFormat::Text => {
                println!("{} Identity verified", "✓".green().bold());
                println!("  Trust score: {}", score_label(outcome.trust_score.value()));
                println!("  Verified at: {}", outcome.verified_at.to_rfc3339());
                Ok(())
            }
        },
        Err(e) if e.is_rejection() => {
            match ctx.format {
                OutputFormat::Json => ctx.emit_json(&serde_json::json!({
                    "verified": false,
                    "error": e.to_string(),
                }))?,
                OutputFormat::Text => {
                    println!("{} Verification failed: {}", "✗".red().bold(), e);
                }
            }
            std::process::exit(2);
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_attest(ctx: &Session, args: AttestArgs) -> anyhow::Result<()> {
    let hash = parse_identity(&args.identity)?;
    let data: serde_json::Value =
        serde_json::from_str(&args.data).context("--data must be valid JSON")?;
    let kind = VerificationKind::from(args.kind.as_str());
    let known = kind.is_known();
    let identity = ctx.service()?.add_verification(&hash, kind.clone(), data)?;

    match ctx.format {
        OutputFormat::Json => ctx.emit_json(&identity.public_entry().summary()),
        OutputFormat::Text => {
            println!("{} Added {}", "✓".green().bold(), kind.as_str().yellow());
            if !known {
                println!("  {}", "unrecognized kind, default delta applied".dimmed());
            }
            println!("  Trust score: {}", score_label(identity.trust_score.value()));
            println!("  Chain length: {}", identity.transactions.len());
            Ok(())
        }
    }
}

fn cmd_show(ctx: &Session, args: IdentityArgs) -> anyhow::Result<()> {
    let hash = parse_identity(&args.identity)?;
    let entry = match ctx.service()?.get_public_trust_score(&hash) {
        Ok(entry) => entry,
        Err(TrustError::NotFound(_)) => anyhow::bail!("identity {} not found", hash.short_id()),
        Err(e) => return Err(e.into()),
    };

    match ctx.format {
        OutputFormat::Json => ctx.emit_json(&entry),
        OutputFormat::Text => {
            print_entry(&entry);
            println!("  Transactions:");
            for record in &entry.transactions {
                println!(
                    "    {}  {}  {}",
                    record.id.short_id().yellow(),
                    record.kind,
                    record.timestamp.to_rfc3339().dimmed()
                );
            }
            Ok(())
        }
    }
}

fn cmd_search(ctx: &Session, args: SearchArgs) -> anyhow::Result<()> {
    let mut criteria = SearchCriteria::default();
    if let Some(min) = args.min_score {
        criteria = criteria.min_trust_score(min);
    }
    if let Some(kind) = args.kind.as_deref() {
        criteria = criteria.verification_kind(VerificationKind::from(kind));
    }
    if let Some(raw) = args.created_after.as_deref() {
        let at = DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("invalid --created-after `{raw}`"))?
            .with_timezone(&Utc);
        criteria = criteria.created_after(at);
    }
    let hits = ctx.service()?.search_ledger(&criteria)?;

    match ctx.format {
        OutputFormat::Json => ctx.emit_json(&hits),
        OutputFormat::Text => {
            if hits.is_empty() {
                println!("No matching identities.");
            }
            for entry in &hits {
                println!(
                    "{}  {}  {} verification(s)  created {}",
                    entry.identity_hash.short_id().cyan(),
                    score_label(entry.trust_score.value()),
                    entry.verifications.len(),
                    entry.created_at.to_rfc3339().dimmed()
                );
            }
            Ok(())
        }
    }
}

fn cmd_stats(ctx: &Session) -> anyhow::Result<()> {
    let stats: LedgerStats = ctx.service()?.ledger_stats()?;
    match ctx.format {
        OutputFormat::Json => ctx.emit_json(&stats),
        OutputFormat::Text => {
            println!("{}", ctx.config.trust.network_name.bold());
            println!("  Identities: {}", stats.total_identities);
            println!("  Average trust score: {}", score_label(stats.average_trust_score));
            println!("  Transactions: {}", stats.total_transactions);
            println!("  Verifications: {}", stats.total_verifications);
            println!("  High trust (>= 80): {}", stats.high_trust_identities);
            println!("  Verified identities: {}", stats.verified_identities);
            Ok(())
        }
    }
}

fn cmd_audit(ctx: &Session, args: IdentityArgs) -> anyhow::Result<()> {
    let hash = parse_identity(&args.identity)?;
    let report: ChainReport = ctx.service()?.audit_chain(&hash)?;
    match ctx.format {
        OutputFormat::Json => ctx.emit_json(&report)?,
        OutputFormat::Text => {
            if report.valid {
                println!("{} Chain integrity verified", "✓".green().bold());
                println!("  Records: {}", report.length);
            } else {
                println!("{} Chain compromised", "✗".red().bold());
                if let (Some(index), Some(reason)) = (report.broken_at, report.reason) {
                    println!("  First break: record {} ({})", index, reason);
                }
            }
        }
    }
    if !report.valid {
        std::process::exit(2);
    }
    Ok(())
}

fn print_entry(entry: &PublicLedgerEntry) {
    println!("Identity {}", entry.identity_hash.to_hex().cyan().bold());
    println!("  Public key: {}", entry.public_key);
    println!("  Trust score: {}", score_label(entry.trust_score.value()));
    println!("  Created: {}", entry.created_at.to_rfc3339());
    println!("  Last verified: {}", entry.last_verified.to_rfc3339());
    if entry.verifications.is_empty() {
        println!("  Verifications: {}", "none".dimmed());
    } else {
        println!("  Verifications:");
        for v in &entry.verifications {
            println!("    {}  {}", v.kind.as_str().yellow(), v.verified_at.to_rfc3339().dimmed());
        }
    }
}

fn score_label(score: u8) -> colored::ColoredString {
    let text = score.to_string();
    match score {
        80.. => text.green().bold(),
        50..=79 => text.yellow(),
        _ => text.red(),
    }
}
