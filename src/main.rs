//! BlinkGuard CLI
//!
//! Offline analysis and registry administration against the configured
//! registry file:
//! - `analyze` a simulation JSON file
//! - `check`, `report`, `verify`, `list` registry entries
//! - `sync` entries from a remote BlinkGuard server

use std::path::PathBuf;
use std::sync::Arc;

use blinkguard::{
    GuardConfig, MaliciousUrlEntry, RegistryClient, RegistryMatcher, RegistryStore,
    SafetyAnalysisService, ScoreAggregator, TransactionSimulation,
};
use blinkguard::utils::constants::UNKNOWN_DOMAIN;
use clap::{Parser, Subcommand};
use eyre::{eyre, Result, WrapErr};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "blinkguard", version, about = "Pre-signing safety checks for Solana Blinks")]
struct Cli {
    /// Registry file (overrides BLINKGUARD_REGISTRY_PATH)
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score a transaction simulation stored as JSON
    Analyze {
        /// Path to a TransactionSimulation JSON file
        simulation: PathBuf,
        /// Domain that served the Blink
        #[arg(long)]
        domain: Option<String>,
        /// Blink URL, checked against the registry first
        #[arg(long)]
        url: Option<String>,
        /// Print the raw JSON verdict
        #[arg(long)]
        json: bool,
    },
    /// Look a URL up in the registry
    Check { url: String },
    /// Report a malicious URL (stored unverified)
    Report {
        url: String,
        #[arg(long)]
        reason: String,
        #[arg(long, default_value = "cli")]
        reported_by: String,
    },
    /// Mark a reported URL as verified
    Verify {
        url: String,
        /// Clear the verified flag instead
        #[arg(long)]
        revoke: bool,
    },
    /// List registry entries
    List {
        #[arg(long)]
        verified_only: bool,
    },
    /// Pull entries from a remote BlinkGuard registry
    Sync {
        /// Remote base URL (overrides BLINKGUARD_REMOTE_URL)
        #[arg(long)]
        remote: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let mut config = GuardConfig::from_env()?;
    if let Some(path) = cli.registry {
        config.registry_path = path;
    }

    let store = Arc::new(RegistryStore::open(&config.registry_path)?);
    let result = run(cli.command, &config, store.clone()).await;
    store.close();
    result
}

async fn run(command: Command, config: &GuardConfig, store: Arc<RegistryStore>) -> Result<()> {
    match command {
        Command::Analyze {
            simulation: path,
            domain,
            url,
            json,
        } => {
            let raw = std::fs::read_to_string(&path)
                .wrap_err_with(|| format!("Cannot read {}", path.display()))?;
            let simulation: TransactionSimulation = serde_json::from_str(&raw)
                .wrap_err_with(|| format!("Invalid simulation JSON in {}", path.display()))?;

            let service = SafetyAnalysisService::new(
                RegistryMatcher::new(store),
                ScoreAggregator::new(Arc::new(config.heuristics.clone())),
            );
            let domain = domain
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| UNKNOWN_DOMAIN.to_string());
            let analysis = service.analyze(url.as_deref(), Some(&simulation), &domain)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                print!("{}", analysis.summary());
            }
        }

        Command::Check { url } => {
            let result = RegistryMatcher::new(store).check(&url)?;
            match result.reason {
                Some(reason) if result.is_malicious => {
                    println!("🔴 {} is flagged: {}", url, reason);
                }
                _ => println!("✅ {} is not flagged", url),
            }
        }

        Command::Report {
            url,
            reason,
            reported_by,
        } => {
            let entry = store.report(MaliciousUrlEntry::report(&url, &reason, &reported_by)?)?;
            if entry.verified {
                println!("📝 Updated {} (domain {}), still verified", entry.url, entry.domain);
            } else {
                println!("📝 Reported {} (domain {}), pending verification", entry.url, entry.domain);
            }
        }

        Command::Verify { url, revoke } => {
            if !store.set_verified(&url, !revoke)? {
                return Err(eyre!("No registry entry for {}", url));
            }
            if revoke {
                println!("↩️  Verification revoked for {}", url);
            } else {
                println!("✅ Verified {}", url);
            }
        }

        Command::List { verified_only } => {
            let entries = store.read()?;
            let shown: Vec<&MaliciousUrlEntry> = entries
                .iter()
                .filter(|e| !verified_only || e.verified)
                .collect();

            for entry in &shown {
                println!(
                    "{} {}  [{}]  {}  (by {})",
                    if entry.verified { "✅" } else { "⏳" },
                    entry.url,
                    entry.domain,
                    entry.reason,
                    entry.reported_by
                );
            }
            println!("{} of {} entries", shown.len(), entries.len());
        }

        Command::Sync { remote } => {
            let base_url = remote.unwrap_or_else(|| config.remote_url.clone());
            let client = RegistryClient::new(base_url);
            let report = client.sync_into(store).await?;
            println!(
                "🔄 Synced from {}: {} fetched, {} added, {} updated",
                client.base_url(),
                report.fetched,
                report.added,
                report.updated
            );
        }
    }

    Ok(())
}
