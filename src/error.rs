use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use serde_json::json;
use thiserror::Error;

/// A watched log whose data is not a bridge message.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("log data does not match the bridge message layout: {0}")]
    Abi(#[from] ethers::abi::Error),
    #[error("bridge message field `{0}` has an unexpected type")]
    Field(&'static str),
    #[error("destination chain id does not fit in 64 bits")]
    ChainIdOverflow,
    #[error("log is missing its block number")]
    MissingBlockNumber,
}

#[derive(Debug, Error)]
pub enum EstimateUnavailable {
    #[error("no carbon API key configured")]
    MissingApiKey,
    #[error("carbon estimate request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Storage(#[from] sqlx::Error),
    #[error("architecture {0} not found")]
    NotFound(i64),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Every API failure renders as `{"error": <message>}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Architecture not found")]
    NotFound,
    #[error("{0}")]
    Storage(sqlx::Error),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => ApiError::NotFound,
            StoreError::Storage(e) => ApiError::Storage(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Storage(e) => {
                error!("Database error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
