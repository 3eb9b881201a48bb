use clap::{Parser, Subcommand, ValueEnum};

use green_bridge_monitor::models::TimeRange;

#[derive(Parser)]
#[command(name = "green-bridge-monitor")]
#[command(about = "Track Teleporter bridge transfers and their estimated CO₂ savings")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    Transfers,
    Architectures,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP API
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Watch the chain and record bridge transfers
    Listen,
    /// Create the schema and seed reference data
    Setup,
    /// Insert random illustrative transfers
    SeedDemo {
        #[arg(short, long, default_value_t = 15)]
        count: usize,
    },
    Query {
        #[arg(short, long)]
        chain: Option<String>,
        #[arg(short, long, default_value = "all")]
        range: TimeRange,
        #[arg(short, long)]
        limit: Option<i64>,
    },
    Stats,
    /// Fetch from the API and print charts
    Dashboard {
        #[arg(value_enum, default_value_t = View::Transfers)]
        view: View,
        #[arg(long)]
        api_url: Option<String>,
        #[arg(short, long)]
        chain: Option<String>,
        #[arg(short, long, default_value = "all")]
        range: TimeRange,
    },
}
