use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use log::{debug, info};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::AppState;
use crate::error::ApiError;
use crate::models::{NewTransfer, TimeRange, TransferFilter};

#[derive(Debug, Default, Deserialize)]
pub struct TransferQuery {
    pub chain: Option<String>,
    pub range: Option<TimeRange>,
}

impl TransferQuery {
    fn into_filter(self) -> TransferFilter {
        TransferFilter {
            chain: self.chain.filter(|chain| !chain.trim().is_empty()),
            since: self.range.unwrap_or_default().cutoff_from_now(),
            limit: None,
        }
    }
}

/// Accepts `1000`, `2.5` or `"2.5"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(serde_json::Number),
    Text(String),
}

impl AmountInput {
    fn normalize(self) -> Result<String, String> {
        let text = match self {
            AmountInput::Number(number) => number.to_string(),
            AmountInput::Text(text) => text.trim().to_string(),
        };
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => Ok(text),
            _ => Err(format!("Invalid amount `{}`", text)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransferRequest {
    pub from_chain: Option<String>,
    pub to_chain: Option<String>,
    pub amount: Option<AmountInput>,
    pub carbon_saved: Option<f64>,
    pub timestamp: Option<i64>,
}

impl CreateTransferRequest {
    pub fn into_new_transfer(self) -> Result<NewTransfer, String> {
        let from_chain = self.from_chain.filter(|c| !c.trim().is_empty());
        let to_chain = self.to_chain.filter(|c| !c.trim().is_empty());

        let mut missing = Vec::new();
        if from_chain.is_none() {
            missing.push("fromChain");
        }
        if to_chain.is_none() {
            missing.push("toChain");
        }
        if self.amount.is_none() {
            missing.push("amount");
        }
        if self.carbon_saved.is_none() {
            missing.push("carbonSaved");
        }

        match (from_chain, to_chain, self.amount, self.carbon_saved) {
            (Some(from_chain), Some(to_chain), Some(amount), Some(carbon_saved)) => {
                if !carbon_saved.is_finite() {
                    return Err("Invalid carbonSaved".to_string());
                }
                Ok(NewTransfer {
                    from_chain,
                    to_chain,
                    amount: amount.normalize()?,
                    carbon_saved,
                    timestamp: self.timestamp,
                })
            }
            _ => Err(format!("Missing required fields: {}", missing.join(", "))),
        }
    }
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "message": "Green Bridge Monitor API is running" }))
}

pub async fn list_transfers(
    State(data): State<Arc<AppState>>,
    query: Result<Query<TransferQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    debug!("Received request for transfers: {:?}", query);

    let transfers = data.db.list_transfers(&query.into_filter()).await?;

    Ok(Json(transfers))
}

pub async fn create_transfer(
    State(data): State<Arc<AppState>>,
    payload: Result<Json<CreateTransferRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let transfer = payload.into_new_transfer().map_err(ApiError::BadRequest)?;

    let id = data.db.insert_transfer(&transfer).await?;

    info!(
        "Stored transfer {}: {} {} -> {}",
        id, transfer.amount, transfer.from_chain, transfer.to_chain
    );
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn list_architectures(
    State(data): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Received request for architectures");

    let architectures = data.db.list_architectures().await?;
    Ok(Json(architectures))
}

pub async fn get_architecture(
    State(data): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Received request for architecture: {}", id);

    // Non-numeric ids can never match a row.
    let id: i64 = id.parse().map_err(|_| ApiError::NotFound)?;

    let architecture = data.db.get_architecture(id).await?;
    Ok(Json(architecture))
}
