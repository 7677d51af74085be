// Permit Ledger - CLI
// reconcile / show / export the permit snapshot, decode and encode contract payloads

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use permit_ledger::db::format_timestamp;
use permit_ledger::{
    decode_permit, decode_specimen, encode_permit_for_submission, export_events_csv,
    get_events_for_entity, load_snapshot, refresh_permit_events, save_snapshot, setup_database,
    sort_permit_events, AccountAddress, AppConfig, MemoryChain, PermitDraft, PermitEvent,
    RawPermit, RawSpecimen, SortAttribute, SpecimenDraft,
};
use permit_ledger::whitelist::{load_country_whitelist, parse_addresses, Selection};

#[derive(Parser)]
#[command(name = "permit-ledger")]
#[command(about = "Reconcile permit lifecycle events into a local snapshot", long_about = None)]
struct Cli {
    /// JSON config file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh the snapshot against a chain fixture and print the permits table
    Reconcile {
        /// Chain fixture: { "logs": [...], "blocks": [...], "whitelisted": [...] }
        #[arg(long)]
        chain: PathBuf,

        #[arg(long)]
        from_block: Option<u64>,

        /// permitHash | exportCountry | importCountry | timestamp | status | blockNumber
        #[arg(long)]
        sort: Option<SortAttribute>,

        #[arg(long, default_value_t = false)]
        descending: bool,
    },

    /// Print the stored snapshot
    Show {
        #[arg(long)]
        sort: Option<SortAttribute>,

        #[arg(long, default_value_t = false)]
        descending: bool,
    },

    /// Write the stored snapshot as CSV
    Export {
        #[arg(long)]
        out: PathBuf,
    },

    /// Show whitelist status of a country's authority addresses and the calls that change it
    Whitelist {
        /// Chain fixture (only "whitelisted" is read)
        #[arg(long)]
        chain: PathBuf,

        /// Country code the addresses are registered for
        #[arg(long)]
        country: String,

        /// Authority address, repeatable
        #[arg(long = "address", required = true)]
        addresses: Vec<String>,

        /// Address to tick for bulk removal, repeatable
        #[arg(long = "remove")]
        remove: Vec<String>,

        /// Account the calls are sent from
        #[arg(long)]
        sender: String,
    },

    /// Print the audit trail of one permit
    History { permit_hash: String },

    /// Decode a positional permit tuple (JSON array) from a file
    DecodePermit { file: PathBuf },

    /// Decode a positional specimen tuple (JSON array) from a file
    DecodeSpecimen { file: PathBuf },

    /// Print the ordered createPermit arguments for a drafted permit
    EncodePermit {
        /// { "permit": {...}, "specimens": [...] }
        draft: PathBuf,

        #[arg(long)]
        sender: String,
    },
}

/// Draft file accepted by `encode-permit`
#[derive(Deserialize)]
struct DraftFile {
    permit: PermitDraft,
    #[serde(default)]
    specimens: Vec<SpecimenDraft>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silent if the file does not exist
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.cmd {
        Commands::Reconcile {
            chain,
            from_block,
            sort,
            descending,
        } => {
            let ascending = resolve_direction(&config, sort, descending);
            run_reconcile(
                &config,
                &chain,
                from_block.unwrap_or(config.from_block),
                sort.unwrap_or(config.sort_by),
                ascending,
            )
            .await?
        }
        Commands::Show { sort, descending } => {
            let ascending = resolve_direction(&config, sort, descending);
            let conn = open_database(&config.database_path)?;
            let events = load_snapshot(&conn)?;
            print_table(&sort_permit_events(events, sort.unwrap_or(config.sort_by), ascending));
        }
        Commands::Export { out } => {
            let conn = open_database(&config.database_path)?;
            let events = sort_permit_events(load_snapshot(&conn)?, config.sort_by, config.ascending);
            let file = fs::File::create(&out).with_context(|| format!("Failed to create {:?}", out))?;
            export_events_csv(file, &events)?;
            println!("✓ Exported {} permits to {:?}", events.len(), out);
        }
        Commands::Whitelist {
            chain,
            country,
            addresses,
            remove,
            sender,
        } => run_whitelist(&chain, &country, &addresses, &remove, &sender).await?,
        Commands::History { permit_hash } => {
            let conn = open_database(&config.database_path)?;
            let trail = get_events_for_entity(&conn, "permit", &permit_hash)?;
            if trail.is_empty() {
                println!("No history for {}", permit_hash);
            }
            for event in trail {
                println!("{}  {:<22} {}", event.timestamp.to_rfc3339(), event.event_type, event.data);
            }
        }
        Commands::DecodePermit { file } => {
            let raw: RawPermit = read_json(&file)?;
            let permit = decode_permit(&raw)?;
            println!("{}", serde_json::to_string_pretty(&permit)?);
        }
        Commands::DecodeSpecimen { file } => {
            let raw: RawSpecimen = read_json(&file)?;
            let specimen = decode_specimen(&raw)?;
            println!("{}", serde_json::to_string_pretty(&specimen)?);
        }
        Commands::EncodePermit { draft, sender } => {
            let draft: DraftFile = read_json(&draft)?;
            let sender = AccountAddress::parse(&sender)?;
            let args = encode_permit_for_submission(&draft.permit, &draft.specimens, &sender)?;
            println!("{}", serde_json::to_string_pretty(&args.to_call_arguments())?);
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// `--descending` wins; an explicit `--sort` is ascending, otherwise the configured direction
fn resolve_direction(config: &AppConfig, sort: Option<SortAttribute>, descending: bool) -> bool {
    if descending {
        return false;
    }
    match sort {
        None => config.ascending,
        Some(_) => true,
    }
}

fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path).with_context(|| format!("Failed to open database {:?}", path))?;
    setup_database(&conn)?;
    Ok(conn)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse {:?}", path))
}

async fn run_reconcile(
    config: &AppConfig,
    chain_path: &Path,
    from_block: u64,
    sort: SortAttribute,
    ascending: bool,
) -> Result<()> {
    let chain = MemoryChain::load(chain_path)?;
    info!(logs = chain.log_count(), "chain fixture loaded");

    let mut conn = open_database(&config.database_path)?;
    let existing = load_snapshot(&conn)?;

    let refreshed = refresh_permit_events(&existing, &chain, &chain, from_block)
        .await
        .context("Refresh failed, snapshot left unchanged")?;

    let diff = save_snapshot(&mut conn, &refreshed)?;
    println!(
        "✓ {} permits ({} new, {} status changes)",
        diff.total, diff.added, diff.status_changed
    );

    print_table(&sort_permit_events(refreshed, sort, ascending));
    Ok(())
}

async fn run_whitelist(
    chain_path: &Path,
    country: &str,
    addresses: &[String],
    remove: &[String],
    sender: &str,
) -> Result<()> {
    let chain = MemoryChain::load(chain_path)?;
    let sender = AccountAddress::parse(sender)?;
    let view = load_country_whitelist(&chain, country, addresses).await?;

    println!("Whitelist for {}", view.country);
    println!("{:<4} {:<44} {:<12} Toggle call", "#", "Address", "Whitelisted");
    println!("{}", "━".repeat(100));
    for entry in &view.entries {
        let call = entry.toggle_call(country);
        println!(
            "{:<4} {:<44} {:<12} {}({})",
            entry.number,
            entry.address,
            if entry.whitelisted { "yes" } else { "no" },
            call.method(),
            serde_json::Value::from(call.arguments(&sender))
        );
    }

    let selection = parse_addresses(remove)?
        .iter()
        .fold(Selection::new(), |selection, address| selection.toggled(address));
    if let Some(call) = selection.removal_call() {
        println!(
            "\nBulk removal: {}({})",
            call.method(),
            serde_json::Value::from(call.arguments(&sender))
        );
    }

    Ok(())
}

fn print_table(events: &[PermitEvent]) {
    println!(
        "{:<68} {:<8} {:<8} {:<26} {:<10}",
        "Permit hash", "Export", "Import", "Timestamp", "Status"
    );
    println!("{}", "━".repeat(124));
    for event in events {
        println!(
            "{:<68} {:<8} {:<8} {:<26} {:<10}",
            event.permit_hash,
            event.export_country,
            event.import_country,
            format_timestamp(event.timestamp),
            event.kind.as_str()
        );
    }
}
