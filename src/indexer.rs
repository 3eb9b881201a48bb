use anyhow::Result;
use ethers_core::types::Log;
use ethers_providers::StreamExt;
use log::{debug, error, info, warn};

use crate::{
    carbon::SavingsEstimator,
    database::Database,
    error::StoreError,
    ethereum::{decode_bridge_message, log_block_number, BridgeClient, BridgeMessage},
};

pub struct Indexer<E> {
    bridge_client: BridgeClient,
    database: Database,
    estimator: E,
    source_chain: String,
}

impl<E: SavingsEstimator> Indexer<E> {
    pub fn new(
        bridge_client: BridgeClient,
        database: Database,
        estimator: E,
        source_chain: impl Into<String>,
    ) -> Self {
        Self {
            bridge_client,
            database,
            estimator,
            source_chain: source_chain.into(),
        }
    }

    /// Runs until the log subscription ends. Individual events never stop it.
    pub async fn start(&self) -> Result<()> {
        info!(
            "Listening for Teleporter bridge events on {}...",
            self.source_chain
        );

        let mut logs = self.bridge_client.watch().await?;
        while let Some(log) = logs.next().await {
            self.handle_log(log).await;
        }

        warn!("Log subscription ended; ingestion stopped");
        Ok(())
    }

    async fn handle_log(&self, log: Log) {
        debug!("New Warp/Teleporter event in tx {:?}", log.transaction_hash);

        let message = match decode_bridge_message(&log.data) {
            Ok(message) => message,
            Err(e) => {
                warn!(
                    "Dropping log {:?} in tx {:?}: {}",
                    log.log_index, log.transaction_hash, e
                );
                return;
            }
        };

        let block_number = match log_block_number(&log) {
            Ok(number) => number,
            Err(e) => {
                warn!("Dropping message 0x{}: {}", hex::encode(message.message_id), e);
                return;
            }
        };

        let timestamp = match self.bridge_client.get_block_timestamp(block_number).await {
            Ok(timestamp) => timestamp,
            Err(e) => {
                error!("Failed to fetch block {}: {}", block_number, e);
                return;
            }
        };

        if let Err(e) = self.record(&message, timestamp).await {
            error!("Failed to insert transfer event: {}", e);
        }
    }

    /// Enriches a decoded message with its savings estimate and stores it.
    pub async fn record(&self, message: &BridgeMessage, timestamp: i64) -> Result<i64, StoreError> {
        let carbon_saved = self.estimator.estimate_savings().await;
        let transfer = message.to_transfer(&self.source_chain, timestamp, carbon_saved);
        let id = self.database.insert_transfer(&transfer).await?;

        info!(
            "Saved: {} bridged to {} - {}g CO₂ saved (message 0x{}).",
            transfer.amount,
            transfer.to_chain,
            carbon_saved,
            hex::encode(message.message_id)
        );

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carbon::{CarbonRatingsClient, FixedEstimate};
    use crate::config::{DEFAULT_BRIDGE_EVENT_SIGNATURE, DEFAULT_TELEPORTER_ADDRESS};
    use crate::models::TransferFilter;
    use ethers::abi::{self, Token};
    use crate::ethereum::event_topic;
    use axum::{extract::State, routing::post, Json, Router};
    use ethers_core::types::{Address, Bytes, H256, U256, U64};
    use serde_json::{json, Value};
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const BLOCK_TIMESTAMP: u64 = 1_700_000_000;

    /// Minimal JSON-RPC node: one log filter that yields a single log, and
    /// block lookups that answer with `block_timestamp` (or no block).
    struct StubChain {
        block_timestamp: Option<u64>,
        log: Value,
        delivered: AtomicBool,
    }

    fn block_json(timestamp: u64) -> Value {
        let zero_hash = format!("{:?}", H256::zero());
        json!({
            "hash": format!("{:?}", H256::repeat_byte(0x0b)),
            "parentHash": zero_hash,
            "sha3Uncles": zero_hash,
            "miner": format!("{:?}", Address::zero()),
            "stateRoot": zero_hash,
            "transactionsRoot": zero_hash,
            "receiptsRoot": zero_hash,
            "number": "0xa",
            "gasUsed": "0x0",
            "gasLimit": "0x1c9c380",
            "extraData": "0x",
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "timestamp": format!("{:#x}", timestamp),
            "difficulty": "0x0",
            "totalDifficulty": "0x0",
            "sealFields": [],
            "uncles": [],
            "transactions": [],
            "size": "0x220",
            "mixHash": zero_hash,
            "nonce": "0x0000000000000000",
            "baseFeePerGas": "0x5d21dba00"
        })
    }

    fn bridge_log_json(dest_chain_id: u64) -> Value {
        let data = abi::encode(&[
            Token::FixedBytes(vec![0x0c; 32]),
            Token::Uint(U256::from(dest_chain_id)),
            Token::Address(Address::repeat_byte(0x11)),
            Token::Address(Address::repeat_byte(0x22)),
            Token::Bytes(vec![]),
        ]);
        json!({
            "address": DEFAULT_TELEPORTER_ADDRESS.to_lowercase(),
            "topics": [format!("{:?}", event_topic(DEFAULT_BRIDGE_EVENT_SIGNATURE))],
            "data": format!("0x{}", hex::encode(data)),
            "blockHash": format!("{:?}", H256::repeat_byte(0x0b)),
            "blockNumber": "0xa",
            "transactionHash": format!("{:?}", H256::repeat_byte(0x0d)),
            "transactionIndex": "0x0",
            "logIndex": "0x0",
            "removed": false
        })
    }

    async fn rpc(State(chain): State<Arc<StubChain>>, Json(request): Json<Value>) -> Json<Value> {
        let result = match request["method"].as_str() {
            Some("eth_newFilter") => json!("0x1"),
            Some("eth_getFilterChanges") => {
                if chain.delivered.swap(true, Ordering::SeqCst) {
                    json!([])
                } else {
                    json!([chain.log.clone()])
                }
            }
            Some("eth_getBlockByNumber") => chain.block_timestamp.map(block_json).unwrap_or(Value::Null),
            _ => Value::Null,
        };
        Json(json!({ "jsonrpc": "2.0", "id": request["id"].clone(), "result": result }))
    }

    async fn stub_node(block_timestamp: Option<u64>) -> BridgeClient {
        let chain = Arc::new(StubChain {
            block_timestamp,
            log: bridge_log_json(43_113),
            delivered: AtomicBool::new(false),
        });
        let app = Router::new().route("/", post(rpc)).with_state(chain);
        let server = axum::Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0)))
            .serve(app.into_make_service());
        let addr = server.local_addr();
        tokio::spawn(server);

        BridgeClient::new(
            &format!("http://{}", addr),
            DEFAULT_TELEPORTER_ADDRESS,
            DEFAULT_BRIDGE_EVENT_SIGNATURE,
            Duration::from_millis(50),
        )
        .unwrap()
    }

    fn bridge_log(dest_chain_id: u64) -> Log {
        serde_json::from_value(bridge_log_json(dest_chain_id)).unwrap()
    }

    fn offline_client() -> BridgeClient {
        BridgeClient::new(
            "http://127.0.0.1:9",
            DEFAULT_TELEPORTER_ADDRESS,
            DEFAULT_BRIDGE_EVENT_SIGNATURE,
            Duration::from_secs(1),
        )
        .unwrap()
    }

    fn message(dest_chain_id: u64) -> BridgeMessage {
        BridgeMessage {
            message_id: H256::repeat_byte(0x01),
            dest_chain_id,
            sender: Address::repeat_byte(0x02),
            recipient: Address::repeat_byte(0x03),
            payload: Bytes::default(),
        }
    }

    #[tokio::test]
    async fn records_one_row_per_message() -> anyhow::Result<()> {
        let database = Database::in_memory().await?;
        let indexer = Indexer::new(offline_client(), database.clone(), FixedEstimate(98.0), "Fuji");

        indexer.record(&message(43_113), 1_700_000_000).await?;
        indexer.record(&message(1), 1_700_000_100).await?;

        let rows = database.list_transfers(&TransferFilter::default()).await?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].from_chain, "Fuji");
        assert_eq!(rows[1].to_chain, "Chain 43113");
        assert_eq!(rows[1].amount, "1.0");
        assert_eq!(rows[1].carbon_saved, 98.0);
        assert_eq!(rows[1].timestamp, 1_700_000_000);

        Ok(())
    }

    #[tokio::test]
    async fn failed_estimate_records_zero_savings() -> anyhow::Result<()> {
        let database = Database::in_memory().await?;
        let estimator =
            CarbonRatingsClient::new("http://127.0.0.1:9/estimate", None, Duration::from_secs(1))?;
        let indexer = Indexer::new(offline_client(), database.clone(), estimator, "Fuji");

        indexer.record(&message(5), 1_700_000_000).await?;

        let rows = database.list_transfers(&TransferFilter::default()).await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].carbon_saved, 0.0);

        Ok(())
    }

    #[tokio::test]
    async fn undecodable_log_is_skipped() -> anyhow::Result<()> {
        let database = Database::in_memory().await?;
        let indexer = Indexer::new(offline_client(), database.clone(), FixedEstimate(1.0), "Fuji");

        let log = Log {
            data: Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]),
            block_number: Some(U64::from(10)),
            ..Default::default()
        };
        indexer.handle_log(log).await;

        assert!(database
            .list_transfers(&TransferFilter::default())
            .await?
            .is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn log_without_block_is_skipped() -> anyhow::Result<()> {
        let database = Database::in_memory().await?;
        let indexer = Indexer::new(offline_client(), database.clone(), FixedEstimate(1.0), "Fuji");

        let data = abi::encode(&[
            Token::FixedBytes(vec![0; 32]),
            Token::Uint(U256::from(1u64)),
            Token::Address(Address::zero()),
            Token::Address(Address::zero()),
            Token::Bytes(vec![]),
        ]);
        let log = Log {
            data: Bytes::from(data),
            ..Default::default()
        };
        indexer.handle_log(log).await;

        assert!(database
            .list_transfers(&TransferFilter::default())
            .await?
            .is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn stores_log_with_its_block_time() -> anyhow::Result<()> {
        let database = Database::in_memory().await?;
        let client = stub_node(Some(BLOCK_TIMESTAMP)).await;
        let indexer = Indexer::new(client, database.clone(), FixedEstimate(98.0), "Fuji");

        indexer.handle_log(bridge_log(43_113)).await;

        let rows = database.list_transfers(&TransferFilter::default()).await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].to_chain, "Chain 43113");
        assert_eq!(rows[0].amount, "1.0");
        assert_eq!(rows[0].carbon_saved, 98.0);
        assert_eq!(rows[0].timestamp, BLOCK_TIMESTAMP as i64);

        Ok(())
    }

    #[tokio::test]
    async fn missing_block_drops_the_event() -> anyhow::Result<()> {
        let database = Database::in_memory().await?;
        let client = stub_node(None).await;
        let indexer = Indexer::new(client, database.clone(), FixedEstimate(98.0), "Fuji");

        indexer.handle_log(bridge_log(43_113)).await;

        assert!(database
            .list_transfers(&TransferFilter::default())
            .await?
            .is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn watch_loop_records_delivered_logs() -> anyhow::Result<()> {
        let database = Database::in_memory().await?;
        let client = stub_node(Some(BLOCK_TIMESTAMP)).await;
        let indexer = Indexer::new(client, database.clone(), FixedEstimate(50.0), "Fuji");

        // The subscription never ends on its own; stop it once the log is in.
        let _ = tokio::time::timeout(Duration::from_secs(2), indexer.start()).await;

        let rows = database.list_transfers(&TransferFilter::default()).await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].from_chain, "Fuji");
        assert_eq!(rows[0].carbon_saved, 50.0);
        assert_eq!(rows[0].timestamp, BLOCK_TIMESTAMP as i64);

        Ok(())
    }
}
