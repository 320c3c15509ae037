mod allocation;
mod commands;
mod database;
mod model;

use crate::database::DistrictsDatabase;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

#[derive(Parser)]
struct Opts {
    /// SQLite database path
    #[clap(long, default_value = "districts.db")]
    database_path: PathBuf,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a district with a fixed number of legislative seats.
    CreateDistrict {
        /// District name
        name: String,
        /// Total seats apportioned to the district
        seats: i64,
    },
    /// Register one or more parties in a district, in ballot order.
    AddParties {
        district_id: i64,
        /// Party names
        names: Vec<String>,
    },
    /// Record vote tallies for a district and recalculate its seat allocation.
    RecordVotes {
        district_id: i64,
        /// Total ballots cast in the district
        #[clap(long)]
        total_votes: i64,
        /// Per-party tallies as name=votes pairs
        #[clap(long = "votes")]
        votes: Vec<String>,
    },
    /// Show a district with its parties and current results.
    Show { district_id: i64 },
    /// List all districts.
    ListDistricts,
}

#[tokio::main]
async fn main() {
    let opts = Opts::parse();
    if let Err(e) = run(opts).await {
        eprintln!("{} {}", "Error:".bright_red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(opts: Opts) -> commands::Result<()> {
    let database_url = format!("sqlite:{}", opts.database_path.display());
    let db = DistrictsDatabase::new(&database_url).await?;

    match opts.command {
        Command::CreateDistrict { name, seats } => {
            let district = commands::create_district(&db, &name, seats).await?;
            println!(
                "Created district {} (id {}) with {} seats",
                district.name.bright_green(),
                district.id,
                district.seats.to_string().bright_yellow()
            );
        }
        Command::AddParties { district_id, names } => {
            let parties = commands::add_parties(&db, district_id, &names).await?;
            for party in &parties {
                println!(
                    "Registered party {} (id {})",
                    party.name.bright_green(),
                    party.id
                );
            }
        }
        Command::RecordVotes {
            district_id,
            total_votes,
            votes,
        } => {
            let entries = votes
                .iter()
                .map(|raw| commands::parse_vote_entry(raw))
                .collect::<commands::Result<Vec<_>>>()?;
            let district = commands::record_votes(&db, district_id, total_votes, &entries).await?;

            println!(
                "Recalculated {}: threshold {}, valid {}, disqualified {}",
                district.name.bright_cyan(),
                district.vote_threshold.to_string().bright_yellow(),
                district.valid_votes.to_string().bright_green(),
                district.disqualified_votes.to_string().bright_red()
            );
            let summary = commands::summarize_parties(&district);
            if !summary.is_empty() {
                println!("Seats: {}", summary);
            }
            println!("{}", serde_json::to_string_pretty(&district)?);
        }
        Command::Show { district_id } => {
            let district = commands::show_district(&db, district_id).await?;
            println!("{}", serde_json::to_string_pretty(&district)?);
        }
        Command::ListDistricts => {
            let districts = db.get_all_districts().await?;
            if districts.is_empty() {
                println!("No districts");
            }
            for row in districts {
                println!(
                    "{:>4}  {}  {} seats, {} votes recorded",
                    row.id,
                    row.name.bright_cyan(),
                    row.seats,
                    row.total_votes
                );
            }
        }
    }

    Ok(())
}
