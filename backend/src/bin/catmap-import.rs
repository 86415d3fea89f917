//! Command-line access to the cat database
//!
//! Usage:
//!   catmap-import [--db <path>] import <file.json> [--keep-ids]
//!   catmap-import [--db <path>] export <id>
//!   catmap-import [--db <path>] list

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{ArgAction, Parser, Subcommand};
use tracing::{info, warn};

use catmap::{friendliness_label, serialize_cat, CatId};
use catmap_backend::{import_records, logging, BackendConfig, Repository};

#[derive(Parser, Debug)]
#[command(name = "catmap-import")]
#[command(about = "Import, export and list cats in the cat map database", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: BackendConfig,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store every cat in a JSON array of cat records
    Import {
        file: PathBuf,

        /// Keep the ids in the file instead of assigning new ones
        #[arg(long)]
        keep_ids: bool,
    },
    /// Print one cat as JSON
    Export { id: u32 },
    /// One line per stored cat
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let repo = cli
        .config
        .open()
        .await
        .with_context(|| format!("opening {}", cli.config.db_path.display()))?;

    match cli.command {
        Command::Import { file, keep_ids } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let records: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", file.display()))?;

            let report = import_records(&repo, &records, keep_ids).await?;
            for (index, err) in &report.skipped {
                warn!("record {} skipped: {}", index, err);
            }
            info!(
                "stored {} cats from {}",
                report.stored.len(),
                file.display()
            );
        }
        Command::Export { id } => {
            let Some(cat) = repo.find_by_id(CatId(id)).await? else {
                bail!("no cat with id {}", id);
            };
            println!("{}", serde_json::to_string_pretty(&serialize_cat(&cat))?);
        }
        Command::List => {
            for cat in repo.list().await? {
                let last_seen = cat
                    .sightings()
                    .iter()
                    .map(|s| s.observed_at)
                    .max()
                    .map(|at| at.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "{:>5}  {:<20} {:<8} {:>3} sightings  last seen {:<10}  {}",
                    cat.id().0,
                    cat.name,
                    cat.colour,
                    cat.sightings().len(),
                    last_seen,
                    friendliness_label(&cat).unwrap_or("-")
                );
            }
        }
    }

    Ok(())
}
