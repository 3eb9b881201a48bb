use log::{debug, warn};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

use crate::config::Config;
use crate::error::EstimateUnavailable;

/// Assumed footprint of a transfer over a typical external bridge.
pub const EXTERNAL_BRIDGE_G_CO2: f64 = 100.0;
/// Native-path footprint used when the estimate response carries none.
pub const DEFAULT_NATIVE_G_CO2: f64 = 2.0;

/// Grams of CO₂ saved per transfer. Implementations never fail: when the
/// estimate cannot be produced they return `0.0`.
pub trait SavingsEstimator {
    fn estimate_savings(&self) -> impl Future<Output = f64> + Send;
}

#[derive(Debug, Clone, Copy)]
pub struct FixedEstimate(pub f64);

impl SavingsEstimator for FixedEstimate {
    async fn estimate_savings(&self) -> f64 {
        self.0
    }
}

#[derive(Debug, Deserialize)]
struct EstimateResponse {
    #[serde(default)]
    estimate_g_co2: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CarbonRatingsClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl CarbonRatingsClient {
    pub fn new(
        endpoint: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, EstimateUnavailable> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            api_key,
        })
    }

    pub async fn fetch_native_emissions(&self) -> Result<f64, EstimateUnavailable> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(EstimateUnavailable::MissingApiKey)?;

        let response: EstimateResponse = self
            .http
            .get(&self.endpoint)
            .header("x-api-key", api_key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .estimate_g_co2
            .filter(|grams| *grams != 0.0)
            .unwrap_or(DEFAULT_NATIVE_G_CO2))
    }
}

impl SavingsEstimator for CarbonRatingsClient {
    async fn estimate_savings(&self) -> f64 {
        match self.fetch_native_emissions().await {
            Ok(native) => {
                debug!("Native transfer footprint: {}g CO₂", native);
                EXTERNAL_BRIDGE_G_CO2 - native
            }
            Err(e) => {
                warn!("Error fetching carbon estimate: {}", e);
                0.0
            }
        }
    }
}

/// The estimator chosen by configuration: a fixed constant when one is set,
/// otherwise the external estimate endpoint.
#[derive(Debug, Clone)]
pub enum Estimator {
    Fixed(FixedEstimate),
    CarbonRatings(CarbonRatingsClient),
}

impl Estimator {
    pub fn from_config(config: &Config) -> Result<Self, EstimateUnavailable> {
        Ok(match config.carbon_fixed_estimate {
            Some(grams) => Estimator::Fixed(FixedEstimate(grams)),
            None => Estimator::CarbonRatings(CarbonRatingsClient::new(
                &config.carbon_api_url,
                config.carbon_api_key.clone(),
                Duration::from_secs(config.estimate_timeout_secs),
            )?),
        })
    }
}

impl SavingsEstimator for Estimator {
    async fn estimate_savings(&self) -> f64 {
        match self {
            Estimator::Fixed(fixed) => fixed.estimate_savings().await,
            Estimator::CarbonRatings(client) => client.estimate_savings().await,
        }
    }
}
