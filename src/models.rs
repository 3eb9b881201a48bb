use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct Transfer {
    pub id: i64,
    pub from_chain: String,
    pub to_chain: String,
    pub amount: String,
    pub carbon_saved: f64,
    pub timestamp: i64,
}

/// A transfer that has not been stored yet. `timestamp` falls back to the
/// store's insertion time when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransfer {
    pub from_chain: String,
    pub to_chain: String,
    pub amount: String,
    pub carbon_saved: f64,
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct Architecture {
    pub id: i64,
    pub name: String,
    pub energy_per_validator: f64,
    pub co2_per_validator: f64,
    pub co2_per_transaction: f64,
    pub throughput: f64,
    pub finality: f64,
    pub energy_efficiency: f64,
    pub validator_count: i64,
    pub emissions: String,
    pub decentralization: f64,
    pub developer_ecosystem: f64,
    pub network_adoption: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[default]
    #[serde(rename = "all")]
    All,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Day => "24h",
            TimeRange::Week => "7d",
            TimeRange::Month => "30d",
            TimeRange::All => "all",
        }
    }

    fn seconds(&self) -> Option<i64> {
        match self {
            TimeRange::Day => Some(86_400),
            TimeRange::Week => Some(7 * 86_400),
            TimeRange::Month => Some(30 * 86_400),
            TimeRange::All => None,
        }
    }

    /// Earliest epoch second still inside the range, measured from `now`.
    pub fn cutoff(&self, now: i64) -> Option<i64> {
        self.seconds().map(|secs| now - secs)
    }

    pub fn cutoff_from_now(&self) -> Option<i64> {
        self.cutoff(Utc::now().timestamp())
    }
}

impl std::str::FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24h" => Ok(TimeRange::Day),
            "7d" => Ok(TimeRange::Week),
            "30d" => Ok(TimeRange::Month),
            "all" => Ok(TimeRange::All),
            other => Err(format!("unknown time range `{}` (expected 24h, 7d, 30d or all)", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferFilter {
    pub chain: Option<String>,
    pub since: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    pub total_transfers: i64,
    pub total_amount: f64,
    pub total_carbon_saved: f64,
    pub earliest_timestamp: Option<i64>,
    pub latest_timestamp: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_range_cutoffs() {
        let now = 1_700_000_000;
        assert_eq!(TimeRange::Day.cutoff(now), Some(now - 86_400));
        assert_eq!(TimeRange::Week.cutoff(now), Some(now - 604_800));
        assert_eq!(TimeRange::Month.cutoff(now), Some(now - 2_592_000));
        assert_eq!(TimeRange::All.cutoff(now), None);
    }

    #[test]
    fn time_range_parses_query_values() {
        assert_eq!("7d".parse::<TimeRange>().unwrap(), TimeRange::Week);
        assert!("1y".parse::<TimeRange>().is_err());

        let parsed: TimeRange = serde_json::from_str("\"24h\"").unwrap();
        assert_eq!(parsed, TimeRange::Day);
    }

    #[test]
    fn transfer_serializes_camel_case() {
        let transfer = Transfer {
            id: 1,
            from_chain: "Fuji".to_string(),
            to_chain: "Chain 43113".to_string(),
            amount: "1.0".to_string(),
            carbon_saved: 98.0,
            timestamp: 1_700_000_000,
        };
        let value = serde_json::to_value(&transfer).unwrap();
        assert_eq!(value["fromChain"], "Fuji");
        assert_eq!(value["toChain"], "Chain 43113");
        assert_eq!(value["carbonSaved"], 98.0);
    }
}
