use anyhow::Result;
use serde::Deserialize;

pub const DEFAULT_TELEPORTER_ADDRESS: &str = "0x253b2784c75e510dD0fF1da844684a1aC0aa5fcf";
/// Signature matching the decoded data layout. The deployed messenger may
/// emit its message event under a different signature; deployments must set
/// `BRIDGE_EVENT_SIGNATURE` to the contract's real event or no log will match
/// the topic filter.
pub const DEFAULT_BRIDGE_EVENT_SIGNATURE: &str =
    "SendCrossChainMessage(bytes32,uint64,address,address,bytes)";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub fuji_rpc: String,
    pub teleporter_address: String,
    pub bridge_event_signature: String,
    pub source_chain_name: String,
    pub poll_interval_secs: u64,
    pub carbon_api_url: String,
    #[serde(default)]
    pub carbon_api_key: Option<String>,
    #[serde(default)]
    pub carbon_fixed_estimate: Option<f64>,
    pub estimate_timeout_secs: u64,
    pub vite_api_url: String,
}

impl Config {
    /// Defaults overlaid by the process environment (and `.env`, if present).
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .set_default("port", 3001_i64)?
            .set_default("database_url", "sqlite:./bridge_data.db")?
            .set_default("fuji_rpc", "https://api.avax-test.network/ext/bc/C/rpc")?
            .set_default("teleporter_address", DEFAULT_TELEPORTER_ADDRESS)?
            .set_default("bridge_event_signature", DEFAULT_BRIDGE_EVENT_SIGNATURE)?
            .set_default("source_chain_name", "Fuji")?
            .set_default("poll_interval_secs", 2_i64)?
            .set_default(
                "carbon_api_url",
                "https://api.carbon-ratings.com/v2/emissions/estimate",
            )?
            .set_default("estimate_timeout_secs", 5_i64)?
            .set_default("vite_api_url", "http://localhost:3001")?
            .add_source(config::Environment::default().try_parsing(true))
            .build()?;

        let config: Config = config.try_deserialize()?;
        Ok(config)
    }
}
