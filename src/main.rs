mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, View};
use green_bridge_monitor::{
    api,
    carbon::Estimator,
    config::Config,
    dashboard::{render_architectures, render_transfers, DashboardClient},
    database::Database,
    demo::demo_transfers,
    ethereum::BridgeClient,
    indexer::Indexer,
    models::TransferFilter,
};
use log::info;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Serve { port } => {
            let database = Database::new(&config.database_url).await?;
            let seeded = database.seed_architectures().await?;
            if seeded > 0 {
                info!("Added {} architecture rows", seeded);
            }
            api::serve(database, port.unwrap_or(config.port)).await?;
        }
        Commands::Listen => {
            let database = Database::new(&config.database_url).await?;
            let bridge_client = BridgeClient::new(
                &config.fuji_rpc,
                &config.teleporter_address,
                &config.bridge_event_signature,
                Duration::from_secs(config.poll_interval_secs),
            )?;
            let estimator = Estimator::from_config(&config)?;

            let indexer = Indexer::new(
                bridge_client,
                database.clone(),
                estimator,
                config.source_chain_name.clone(),
            );
            indexer.start().await?;
            database.close().await;
        }
        Commands::Setup => {
            let database = Database::new(&config.database_url).await?;
            let seeded = database.seed_architectures().await?;
            let total = database.count_architectures().await?;
            println!(
                "Schema ready at {} ({} architecture rows, {} added)",
                config.database_url, total, seeded
            );
        }
        Commands::SeedDemo { count } => {
            let database = Database::new(&config.database_url).await?;
            for (i, transfer) in demo_transfers(count).iter().enumerate() {
                let id = database.insert_transfer(transfer).await?;
                println!("Dummy event #{} inserted (id {}).", i + 1, id);
            }
        }
        Commands::Query {
            chain,
            range,
            limit,
        } => {
            let database = Database::new(&config.database_url).await?;
            let transfers = database
                .list_transfers(&TransferFilter {
                    chain,
                    since: range.cutoff_from_now(),
                    limit: Some(limit.unwrap_or(100)),
                })
                .await?;

            for transfer in transfers {
                println!("{}", serde_json::to_string_pretty(&transfer)?);
            }
        }
        Commands::Stats => {
            let database = Database::new(&config.database_url).await?;
            let stats = database.get_stats().await?;
            println!("Database Statistics:");
            println!("Total transfers: {}", stats.total_transfers);
            println!("Tokens bridged: {}", stats.total_amount);
            println!("CO₂ saved: {}g", stats.total_carbon_saved);
            println!("Earliest transfer: {}", stats.earliest_timestamp.unwrap_or(0));
            println!("Latest transfer: {}", stats.latest_timestamp.unwrap_or(0));
        }
        Commands::Dashboard {
            view,
            api_url,
            chain,
            range,
        } => {
            let base_url = api_url.unwrap_or_else(|| config.vite_api_url.clone());
            let client = DashboardClient::new(&base_url, Duration::from_secs(10))?;

            eprintln!("Loading Green Bridge Monitor...");
            let rendered = match view {
                View::Transfers => {
                    render_transfers(&client.load_transfers(chain.as_deref(), range).await)
                }
                View::Architectures => render_architectures(&client.load_architectures().await),
            };
            print!("{}", rendered);
        }
    }

    Ok(())
}
