//! Splyt CLI - pushes telemetry through the event depot.

mod app;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use splyt_config_and_utils::{init_logging, Config, Paths};

/// Splyt command-line interface.
#[derive(Parser)]
#[command(name = "splyt")]
#[command(about = "Deliver telemetry events to the Splyt data collector")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Also write JSONL logs: `--log-json=PATH`, or <base-dir>/logs/splyt.jsonl when bare
    #[arg(long, global = true, env = "SPLYT_LOG_FILE", num_args = 0..=1, require_equals = true)]
    log_json: Option<Option<PathBuf>>,

    /// Base directory for config, depot storage and logs. Defaults to $SPLYT_HOME or ~/.splyt
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Customer ID issued by Splyt
    #[arg(long, global = true)]
    customer_id: Option<String>,

    /// Data collector host, e.g. https://data.splyt.com
    #[arg(long, global = true)]
    host: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Store events read as JSON lines ({"method": ..., "args": [...]}) and deliver them
    Send {
        /// Input file. Reads stdin when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Maximum number of delivery ticks before checkpointing the rest
        #[arg(long, default_value_t = 20)]
        max_ticks: u32,
    },
    /// Report a single data point
    Track {
        /// Device the data point is attributed to
        #[arg(long, env = "SPLYT_DEVICE_ID")]
        device_id: String,

        /// User the data point is attributed to
        #[arg(long, env = "SPLYT_USER_ID")]
        user_id: Option<String>,

        #[command(subcommand)]
        call: app::TrackCall,
    },
    /// Show events waiting in the depot
    Status,
    /// Print the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let mut config = Config::load(&paths)?;
    if let Some(customer_id) = cli.customer_id {
        config.customer_id = customer_id;
    }
    if let Some(host) = cli.host {
        config.host = host;
    }

    let jsonl = cli.log_json.map(|path| path.unwrap_or_else(|| paths.log_file()));
    init_logging(cli.log_level.as_deref().unwrap_or(&config.log_level), jsonl);

    match cli.command {
        Commands::Send { file, max_ticks } => {
            app::send_events(&config, &paths, file, max_ticks).await?;
        }
        Commands::Track {
            device_id,
            user_id,
            call,
        } => {
            app::track(&config, &paths, device_id, user_id, call).await?;
        }
        Commands::Status => {
            app::print_status(&paths)?;
        }
        Commands::Config { save } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if save {
                config.save(&paths)?;
                println!("Saved to {}", paths.config_file().display());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_log_json_without_path() {
        let cli = Cli::try_parse_from(["splyt", "--log-json", "status"]).unwrap();
        assert_eq!(cli.log_json, Some(None));

        let cli = Cli::try_parse_from(["splyt", "--log-json=/tmp/s.jsonl", "status"]).unwrap();
        assert_eq!(cli.log_json, Some(Some(PathBuf::from("/tmp/s.jsonl"))));
    }
}
