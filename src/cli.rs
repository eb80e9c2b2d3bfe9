use anyhow::Result;
use clap::{Parser, Subcommand};
use compute::{DEFAULT_MAX_DEMAND, DEFAULT_MIN_DEMAND};
use session::{DEFAULT_API_URL, DEFAULT_TIMEOUT_MS};

pub mod commands;

use crate::config::AppConfig;
use commands::{add_data, list_parts, show};

#[derive(Parser)]
#[command(name = "demandcast")]
#[command(about = "Demand forecast dashboard for the terminal")]
#[command(version)]
pub struct Cli {
    /// Base URL of the forecasting backend
    ///
    /// Examples:
    ///   http://localhost:5000
    ///   https://forecast.example.com/v2
    #[arg(long, global = true, env = "DEMANDCAST_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Per-request timeout in milliseconds
    #[arg(long, global = true, env = "DEMANDCAST_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the datasets, train the selected part number and print the dashboard
    Show {
        /// Part number to show instead of the first one
        #[arg(short, long)]
        part: Option<String>,

        /// Print the dashboard view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Append synthetic observations to a part number and save them to the backend
    ///
    /// Each observation extends the series by one month with a whole-number
    /// demand drawn uniformly from `--min-demand` up to, but excluding,
    /// `--max-demand` (110 to 159 by default).
    AddData {
        /// Part number to extend instead of the first one
        #[arg(short, long)]
        part: Option<String>,

        /// Number of observations to append
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,

        /// Seed for reproducible synthetic demand
        #[arg(long, env = "DEMANDCAST_SEED")]
        seed: Option<u64>,

        /// Smallest synthetic demand value
        #[arg(long, env = "DEMANDCAST_MIN_DEMAND", default_value_t = DEFAULT_MIN_DEMAND)]
        min_demand: u32,

        /// Exclusive upper bound for synthetic demand
        #[arg(long, env = "DEMANDCAST_MAX_DEMAND", default_value_t = DEFAULT_MAX_DEMAND)]
        max_demand: u32,

        /// Print the dashboard view as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the part numbers known to the backend
    Parts,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = AppConfig::new(&self.api_url, self.timeout_ms)?;
        match self.command {
            Commands::Show { part, json } => {
                show(&config, part.as_deref(), json).await?;
            }
            Commands::AddData {
                part,
                count,
                seed,
                min_demand,
                max_demand,
                json,
            } => {
                let config = config
                    .with_seed(seed)
                    .with_demand_range(min_demand, max_demand);
                add_data(&config, part.as_deref(), count, json).await?;
            }
            Commands::Parts => {
                list_parts(&config).await?;
            }
        }
        Ok(())
    }
}
