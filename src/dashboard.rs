use chrono::DateTime;
use log::error;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::FetchError;
use crate::models::{Architecture, TimeRange, Transfer};

pub const NO_TRANSFERS: &str = "No bridge events yet. Waiting for activity...";
pub const NO_ARCHITECTURES: &str = "No architecture data available.";

const BAR_WIDTH: usize = 40;

pub struct DashboardClient {
    http: reqwest::Client,
    base_url: String,
}

impl DashboardClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| FetchError::Request {
                url: base_url.to_string(),
                source,
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let request_error = |source| FetchError::Request {
            url: url.clone(),
            source,
        };

        self.http
            .get(&url)
            .query(query)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(request_error)?
            .json()
            .await
            .map_err(request_error)
    }

    pub async fn fetch_transfers(
        &self,
        chain: Option<&str>,
        range: TimeRange,
    ) -> Result<Vec<Transfer>, FetchError> {
        let mut query = vec![("range", range.as_str())];
        if let Some(chain) = chain {
            query.push(("chain", chain));
        }
        self.get_json("/api/transfers", &query).await
    }

    pub async fn fetch_architectures(&self) -> Result<Vec<Architecture>, FetchError> {
        self.get_json("/api/architectures", &[]).await
    }

    /// Failures are logged and rendered as the empty state.
    pub async fn load_transfers(&self, chain: Option<&str>, range: TimeRange) -> Vec<Transfer> {
        self.fetch_transfers(chain, range).await.unwrap_or_else(|e| {
            error!("Error fetching transfers: {}", e);
            Vec::new()
        })
    }

    pub async fn load_architectures(&self) -> Vec<Architecture> {
        self.fetch_architectures().await.unwrap_or_else(|e| {
            error!("Error fetching architectures: {}", e);
            Vec::new()
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: &'static str,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

fn date_label(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Oldest transfer first, whatever order the API returned.
pub fn transfer_chart(transfers: &[Transfer]) -> ChartData {
    let mut ordered: Vec<&Transfer> = transfers.iter().collect();
    ordered.sort_by_key(|t| (t.timestamp, t.id));

    ChartData {
        labels: ordered.iter().map(|t| date_label(t.timestamp)).collect(),
        series: vec![
            Series {
                label: "Tokens Bridged",
                values: ordered
                    .iter()
                    .map(|t| t.amount.parse().unwrap_or(0.0))
                    .collect(),
            },
            Series {
                label: "CO₂ Saved (g)",
                values: ordered.iter().map(|t| t.carbon_saved).collect(),
            },
        ],
    }
}

pub fn architecture_chart(architectures: &[Architecture]) -> ChartData {
    let column = |label, value: fn(&Architecture) -> f64| Series {
        label,
        values: architectures.iter().map(value).collect(),
    };

    ChartData {
        labels: architectures.iter().map(|a| a.name.clone()).collect(),
        series: vec![
            column("Throughput (TPS)", |a| a.throughput),
            column("Finality (s)", |a| a.finality),
            column("CO₂ per Transaction (kg)", |a| a.co2_per_transaction),
            column("Energy Efficiency", |a| a.energy_efficiency),
            column("Decentralization", |a| a.decentralization),
            column("Developer Ecosystem", |a| a.developer_ecosystem),
            column("Network Adoption", |a| a.network_adoption),
        ],
    }
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * BAR_WIDTH as f64).round().max(1.0) as usize;
    "█".repeat(len.min(BAR_WIDTH))
}

/// One horizontal bar block per series, each scaled to its own maximum.
pub fn render_chart(chart: &ChartData) -> String {
    let label_width = chart.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let mut out = String::new();

    for series in &chart.series {
        let max = series.values.iter().cloned().fold(0.0, f64::max);
        out.push_str(series.label);
        out.push('\n');
        for (label, value) in chart.labels.iter().zip(&series.values) {
            out.push_str(&format!(
                "  {:<label_width$} | {:<bar_width$} {}\n",
                label,
                bar(*value, max),
                value,
                label_width = label_width,
                bar_width = BAR_WIDTH,
            ));
        }
        out.push('\n');
    }

    out
}

pub fn render_transfers(transfers: &[Transfer]) -> String {
    if transfers.is_empty() {
        return format!("{}\n", NO_TRANSFERS);
    }

    let total_amount: f64 = transfers
        .iter()
        .map(|t| t.amount.parse::<f64>().unwrap_or(0.0))
        .sum();
    let total_saved: f64 = transfers.iter().map(|t| t.carbon_saved).sum();

    let mut out = String::from("🌿 Green Bridge Monitor 🌿\n\n");
    out.push_str(&render_chart(&transfer_chart(transfers)));
    out.push_str(&format!(
        "{} transfers, {} tokens bridged, {}g CO₂ saved\n",
        transfers.len(),
        total_amount,
        total_saved
    ));
    out
}

pub fn render_architectures(architectures: &[Architecture]) -> String {
    if architectures.is_empty() {
        return format!("{}\n", NO_ARCHITECTURES);
    }

    let mut out = String::from("Blockchain Architecture Comparison\n\n");
    out.push_str(&render_chart(&architecture_chart(architectures)));
    for arch in architectures {
        out.push_str(&format!(
            "{}: {} emissions, {} validators at {} kWh / {} kg CO₂ each; \
             {} TPS with {}s finality\n",
            arch.name,
            arch.emissions,
            arch.validator_count,
            arch.energy_per_validator,
            arch.co2_per_validator,
            arch.throughput,
            arch.finality,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(id: i64, amount: &str, carbon_saved: f64, timestamp: i64) -> Transfer {
        Transfer {
            id,
            from_chain: "Fuji".to_string(),
            to_chain: "Chain 1".to_string(),
            amount: amount.to_string(),
            carbon_saved,
            timestamp,
        }
    }

    #[test]
    fn transfer_chart_is_chronological() {
        // 2023-11-14 and 2023-11-15 UTC, newest first as the API returns them.
        let transfers = vec![
            transfer(2, "4.5", 60.0, 1_700_050_000),
            transfer(1, "1.0", 98.0, 1_699_950_000),
        ];

        let chart = transfer_chart(&transfers);
        assert_eq!(chart.labels, vec!["2023-11-14", "2023-11-15"]);
        assert_eq!(chart.series[0].label, "Tokens Bridged");
        assert_eq!(chart.series[0].values, vec![1.0, 4.5]);
        assert_eq!(chart.series[1].values, vec![98.0, 60.0]);
    }

    #[test]
    fn unparseable_amount_charts_as_zero() {
        let chart = transfer_chart(&[transfer(1, "lots", 1.0, 0)]);
        assert_eq!(chart.series[0].values, vec![0.0]);
    }

    #[test]
    fn bars_scale_to_series_maximum() {
        assert_eq!(bar(10.0, 10.0).chars().count(), BAR_WIDTH);
        assert_eq!(bar(5.0, 10.0).chars().count(), BAR_WIDTH / 2);
        assert_eq!(bar(0.0, 10.0), "");
        assert_eq!(bar(0.0001, 50_000.0).chars().count(), 1);
    }

    #[test]
    fn empty_collections_render_empty_state() {
        assert_eq!(render_transfers(&[]), format!("{}\n", NO_TRANSFERS));
        assert_eq!(render_architectures(&[]), format!("{}\n", NO_ARCHITECTURES));
    }

    #[test]
    fn renders_transfer_totals() {
        let out = render_transfers(&[
            transfer(1, "1.5", 10.0, 1_700_000_000),
            transfer(2, "2.5", 20.0, 1_700_000_100),
        ]);
        assert!(out.contains("Tokens Bridged"));
        assert!(out.contains("2 transfers, 4 tokens bridged, 30g CO₂ saved"));
    }

    #[tokio::test]
    async fn unreachable_api_loads_nothing() {
        let client = DashboardClient::new("http://127.0.0.1:9/", Duration::from_secs(1)).unwrap();

        assert!(client.load_transfers(None, TimeRange::All).await.is_empty());
        assert!(client.load_architectures().await.is_empty());
    }
}
