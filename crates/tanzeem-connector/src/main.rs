//! CLI binary entry point for the Tanzeem connector.
//!
//! Usage:
//!   tanzeem-connector [OPTIONS] <COMMAND>
//!
//! Commands:
//!   run                         Run the sync scheduler until Ctrl-C
//!   sync <jamaats|members>      Run one sync now
//!   map <JAMAAT_NO> <MUQAM_ID>  Map a Jamaat to a Muqam
//!   unmap <JAMAAT_NO>           Clear a Jamaat's Muqam
//!   stats                       Print mapping coverage
//!   resolve <CHANDA_NO>         Print a member's hierarchy
//!   provision <CHANDA_NO>       Create an account with cached hierarchy
//!   refresh <CHANDA_NO>         Recompute an account's cached hierarchy
//!   add-zone|add-dila|add-muqam Seed the administrative tiers

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use tanzeem_connector::{ConnectorConfig, TanzeemConnector};
use tanzeem_protocol::{ChandaNo, DilaId, MuqamId, ZoneId};
use tanzeem_sync::SyncKind;

/// Tanzeem Connector - membership hierarchy sync and administration.
#[derive(Parser, Debug)]
#[command(name = "tanzeem-connector")]
#[command(about = "Keeps the Tanzeem hierarchy in sync with the external directory")]
#[command(version)]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Store snapshot path (overrides config).
    #[arg(long, value_name = "FILE")]
    store: Option<PathBuf>,

    /// Directory export path (overrides config).
    #[arg(long, value_name = "FILE")]
    directory: Option<PathBuf>,

    /// Increase logging verbosity (can be repeated: -v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the sync scheduler until interrupted.
    Run,
    /// Run one sync now.
    Sync {
        #[arg(value_enum)]
        kind: KindArg,
    },
    /// Map a Jamaat (by external number) to a Muqam.
    Map { jamaat_no: i64, muqam_id: MuqamId },
    /// Clear a Jamaat's Muqam.
    Unmap { jamaat_no: i64 },
    /// Print mapping coverage.
    Stats,
    /// Print the resolved hierarchy of a member.
    Resolve { chanda_no: String },
    /// Create an account with the member's resolved hierarchy.
    Provision {
        chanda_no: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Recompute an account's cached hierarchy.
    Refresh { chanda_no: String },
    /// Add a Zone.
    AddZone { name: String },
    /// Add a Dila under a Zone.
    AddDila {
        name: String,
        #[arg(long)]
        zone: ZoneId,
    },
    /// Add a Muqam under a Dila.
    AddMuqam {
        name: String,
        #[arg(long)]
        dila: DilaId,
    },
    /// List Muqams.
    Muqams,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Jamaats,
    Members,
}

impl From<KindArg> for SyncKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Jamaats => SyncKind::Jamaats,
            KindArg::Members => SyncKind::Members,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ConnectorConfig::load(cli.config.as_deref())?;
    if let Some(store) = cli.store {
        config.store.path = store;
    }
    if let Some(directory) = cli.directory {
        config.directory.snapshot_path = directory;
    }

    init_logging(&config, cli.verbose);

    let connector = TanzeemConnector::open(config).await?;
    let cancel = CancellationToken::new();

    match cli.command {
        Command::Run => {
            let trigger = cancel.clone();
            tokio::spawn(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                    return;
                }
                tracing::info!("Shutdown requested");
                trigger.cancel();
            });
            connector.run(cancel).await;
        }
        Command::Sync { kind } => {
            let trigger = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    trigger.cancel();
                }
            });
            print_json(&connector.sync(kind.into(), &cancel).await?)?;
        }
        Command::Map { jamaat_no, muqam_id } => {
            let outcome = connector.map(jamaat_no, muqam_id).await?;
            println!("{:?}", outcome);
        }
        Command::Unmap { jamaat_no } => {
            let previous = connector.unmap(jamaat_no).await?;
            println!("unmapped from {}", previous);
        }
        Command::Stats => print_json(&connector.stats()?)?,
        Command::Resolve { chanda_no } => {
            let chanda_no = ChandaNo::parse(&chanda_no)?;
            print_json(&connector.resolve(&chanda_no)?)?;
        }
        Command::Provision { chanda_no, email } => {
            let chanda_no = ChandaNo::parse(&chanda_no)?;
            print_json(&connector.provisioner().provision(&chanda_no, email).await?)?;
        }
        Command::Refresh { chanda_no } => {
            let chanda_no = ChandaNo::parse(&chanda_no)?;
            print_json(&connector.provisioner().refresh(&chanda_no).await?)?;
        }
        Command::AddZone { name } => println!("{}", connector.add_zone(&name).await?),
        Command::AddDila { name, zone } => println!("{}", connector.add_dila(&name, zone).await?),
        Command::AddMuqam { name, dila } => println!("{}", connector.add_muqam(&name, dila).await?),
        Command::Muqams => print_json(&connector.store().muqams()?)?,
    }

    Ok(())
}

fn init_logging(config: &ConnectorConfig, verbose: u8) {
    let log_level = match verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    // Logs go to stderr so command output on stdout stays parseable.
    if config.logging.json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
