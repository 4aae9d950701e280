//! Command implementations.

use anyhow::{Context, Result};
use clap::Subcommand;
use event_depot::{
    DepotConfig, DepotStatus, Event, EventDepot, FileBlobStore, PersistentArchive,
    DEFAULT_ARCHIVE_CAPACITY,
};
use splyt_config_and_utils::{Config, Paths};
use splyt_instrumentation::{Instrumentation, Properties};
use splyt_transport::HttpTransport;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Data point kinds reportable from the command line.
#[derive(Subcommand)]
pub enum TrackCall {
    NewUser,
    NewDevice,
    /// Update user state from a JSON object
    UserState { properties: String },
    /// Update device state from a JSON object
    DeviceState { properties: String },
    /// Record a collection balance
    Collection {
        name: String,
        balance: f64,
        #[arg(allow_negative_numbers = true)]
        modification: f64,
        #[arg(long)]
        currency: bool,
    },
}

pub async fn send_events(
    config: &Config,
    paths: &Paths,
    file: Option<PathBuf>,
    max_ticks: u32,
) -> Result<()> {
    let events = match file {
        Some(path) => {
            let file = std::fs::File::open(&path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            parse_events(std::io::BufReader::new(file))?
        }
        None => parse_events(std::io::stdin().lock())?,
    };

    let depot = start_depot(config, paths)?;
    let count = events.len();
    for event in events {
        depot.store(event)?;
    }
    info!(count, "Stored events");

    let status = deliver(&depot, max_ticks).await?;
    depot.shutdown().await?;
    report(count, &status);
    Ok(())
}

pub async fn track(
    config: &Config,
    paths: &Paths,
    device_id: String,
    user_id: Option<String>,
    call: TrackCall,
) -> Result<()> {
    let depot = start_depot(config, paths)?;
    let instrumentation = Instrumentation::new(depot.clone(), device_id);
    instrumentation.set_user_id(user_id);

    match call {
        TrackCall::NewUser => instrumentation.new_user()?,
        TrackCall::NewDevice => instrumentation.new_device()?,
        TrackCall::UserState { properties } => {
            instrumentation.update_user_state(&parse_properties(&properties)?)?
        }
        TrackCall::DeviceState { properties } => {
            instrumentation.update_device_state(&parse_properties(&properties)?)?
        }
        TrackCall::Collection {
            name,
            balance,
            modification,
            currency,
        } => instrumentation.update_collection(&name, balance, modification, currency)?,
    }

    let status = deliver(&depot, 1).await?;
    depot.shutdown().await?;
    report(1, &status);
    Ok(())
}

/// Summarize the checkpoint left by earlier runs without starting a depot.
pub fn print_status(paths: &Paths) -> Result<()> {
    println!("{}", status_summary(&paths.depot_dir())?);
    Ok(())
}

fn status_summary(depot_dir: &Path) -> Result<String> {
    let archive = PersistentArchive::new(Box::new(FileBlobStore::open(depot_dir)?));
    let on_disk = archive.list_stale_slots()?.len();

    let Some(checkpoint) = archive.read_checkpoint() else {
        return Ok(format!("No checkpoint ({on_disk} archived bins on disk)"));
    };

    // Depots started by this CLI use the default capacity.
    let archived = checkpoint.archived_bins(DEFAULT_ARCHIVE_CAPACITY);
    Ok(format!(
        "Resend bin: {} events\nHolding bin: {} events\nArchived bins: {} (slots {}..{}, {} on disk)",
        checkpoint.resend_bin.len(),
        checkpoint.holding_bin.len(),
        archived,
        checkpoint.archive_start,
        checkpoint.archive_end,
        on_disk
    ))
}

fn start_depot(config: &Config, paths: &Paths) -> Result<EventDepot> {
    let settings = config
        .collector_settings()
        .context("collector is not configured")?;
    let store = FileBlobStore::open(paths.depot_dir())?;
    let transport = HttpTransport::new()?;

    let depot = EventDepot::new();
    depot.init(
        DepotConfig::from_settings(settings),
        Box::new(store),
        Arc::new(transport),
    )?;
    Ok(depot)
}

/// Tick until nothing is pending or `max_ticks` is used up.
async fn deliver(depot: &EventDepot, max_ticks: u32) -> Result<DepotStatus> {
    let mut status = depot.status().await?;
    for _ in 0..max_ticks {
        if status.is_idle() {
            break;
        }
        depot.process_bins(true)?;
        status = depot.status().await?;
    }
    Ok(status)
}

fn report(count: usize, status: &DepotStatus) {
    if status.is_idle() {
        println!("Delivered {count} event(s)");
    } else {
        warn!(
            resend = status.resend_bin_len,
            holding = status.holding_bin_len,
            archived_bins = status.archived_bins,
            "Undelivered events checkpointed for the next run"
        );
        println!(
            "Stored {count} event(s); {} pending in memory and {} archived bin(s) saved for the next run",
            status.resend_bin_len + status.holding_bin_len,
            status.archived_bins
        );
    }
}

fn parse_events(reader: impl BufRead) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event: Event = serde_json::from_str(line)
            .with_context(|| format!("line {}: not an event", index + 1))?;
        events.push(event);
    }
    Ok(events)
}

fn parse_properties(raw: &str) -> Result<Properties> {
    serde_json::from_str(raw).context("properties must be a JSON object")
}
