use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dos_sync::config::SyncConfig;
use dos_sync::diagnostics::TracingSink;
use dos_sync::dos::JsonDos;
use dos_sync::matching::{MatchingRules, StaticFlags};
use dos_sync::reconcile::{Collaborators, Outcome, Reconciler};
use dos_sync::request::{JsonLinesSender, RoutingContext};

#[derive(Debug, Parser)]
#[command(name = "dos-sync")]
#[command(about = "Reconcile NHS UK change events against DoS")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Reconcile one change event and print the change requests as JSON lines
    Reconcile {
        /// Change event JSON file
        #[arg(long)]
        event: PathBuf,

        /// Directory of DoS fixture files
        #[arg(long)]
        dos: PathBuf,

        /// Feature flag rules (JSON); overrides DOS_SYNC_FLAGS_PATH
        #[arg(long)]
        flags: Option<PathBuf>,

        #[arg(long, default_value = "local")]
        correlation_id: String,

        #[arg(long, default_value_t = 1)]
        sequence: u64,

        /// Holding-queue record id to carry in request metadata
        #[arg(long)]
        record_id: Option<String>,

        /// Date before which date-specific hours are ignored (default: today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = SyncConfig::from_env().context("reading configuration")?;

    match cli.command {
        Commands::Reconcile {
            event,
            dos,
            flags,
            correlation_id,
            sequence,
            record_id,
            today,
        } => {
            let json = std::fs::read_to_string(&event)
                .with_context(|| format!("reading {}", event.display()))?;
            let store = JsonDos::load(&dos)
                .with_context(|| format!("loading DoS fixtures from {}", dos.display()))?;

            let flags = match flags.or_else(|| config.flags_path.clone()) {
                Some(path) => StaticFlags::from_file(path)?,
                None => StaticFlags::default(),
            };

            let sender = JsonLinesSender::new(std::io::stdout());
            let sink = TracingSink;
            let collaborators = Collaborators::from_store(&store, &flags, &sender, &sink);

            let routing = RoutingContext {
                correlation_id,
                sequence_number: sequence,
                message_received: Utc::now().timestamp_millis(),
                record_id,
            };
            let today = today.unwrap_or_else(|| Local::now().date_naive());

            let reconciler = Reconciler::new(MatchingRules::default(), config);
            match reconciler.reconcile_payload(&json, &routing, today, collaborators)? {
                Outcome::NoTargets => info!("no DoS services to update"),
                Outcome::ClosedOrHidden { service_ids } => {
                    info!(?service_ids, "organisation is closed or hidden, nothing sent");
                }
                Outcome::Ambiguous { service_ids } => {
                    info!(?service_ids, "ambiguous pharmacy profiling, nothing sent");
                }
                Outcome::Sent {
                    requests,
                    dead_lettered,
                } => info!(
                    sent = requests.len(),
                    dead_lettered = dead_lettered.len(),
                    "reconciliation complete"
                ),
            }
        }
    }

    Ok(())
}
