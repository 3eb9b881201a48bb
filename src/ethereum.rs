use anyhow::Result;
use ethers::abi::{self, ParamType, Token};
use ethers::utils::{format_ether, keccak256};
use ethers_core::types::{Address, BlockId, BlockNumber, Bytes, Filter, Log, H256, U256, U64};
use ethers_providers::{FilterWatcher, Http, Middleware, Provider};
use std::sync::Arc;
use std::time::Duration;

use crate::error::DecodeError;
use crate::models::NewTransfer;

/// Data layout of a bridge message log: all fields are non-indexed.
const BRIDGE_MESSAGE_LAYOUT: [ParamType; 5] = [
    ParamType::FixedBytes(32),
    ParamType::Uint(64),
    ParamType::Address,
    ParamType::Address,
    ParamType::Bytes,
];

const WEI_PER_TOKEN: u64 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct BridgeMessage {
    pub message_id: H256,
    pub dest_chain_id: u64,
    pub sender: Address,
    pub recipient: Address,
    pub payload: Bytes,
}

impl BridgeMessage {
    /// The payload layout is application-defined, so every message is
    /// recorded as one whole token.
    pub fn amount(&self) -> String {
        format_token_amount(U256::from(WEI_PER_TOKEN))
    }

    pub fn to_transfer(&self, from_chain: &str, timestamp: i64, carbon_saved: f64) -> NewTransfer {
        NewTransfer {
            from_chain: from_chain.to_string(),
            to_chain: format!("Chain {}", self.dest_chain_id),
            amount: self.amount(),
            carbon_saved,
            timestamp: Some(timestamp),
        }
    }
}

/// `format_ether` with trailing zeros trimmed down to one decimal place.
pub fn format_token_amount(wei: U256) -> String {
    let formatted = format_ether(wei);
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{}.0", whole)
            } else {
                format!("{}.{}", whole, fraction)
            }
        }
        None => format!("{}.0", formatted),
    }
}

pub fn event_topic(signature: &str) -> H256 {
    H256::from(keccak256(signature.as_bytes()))
}

pub fn decode_bridge_message(data: &[u8]) -> Result<BridgeMessage, DecodeError> {
    let mut tokens = abi::decode(&BRIDGE_MESSAGE_LAYOUT, data)?.into_iter();

    let message_id = tokens
        .next()
        .and_then(Token::into_fixed_bytes)
        .filter(|bytes| bytes.len() == 32)
        .map(|bytes| H256::from_slice(&bytes))
        .ok_or(DecodeError::Field("messageId"))?;

    let dest_chain_id = tokens
        .next()
        .and_then(Token::into_uint)
        .ok_or(DecodeError::Field("destChainId"))?;
    if dest_chain_id > U256::from(u64::MAX) {
        return Err(DecodeError::ChainIdOverflow);
    }

    let sender = tokens
        .next()
        .and_then(Token::into_address)
        .ok_or(DecodeError::Field("sender"))?;

    let recipient = tokens
        .next()
        .and_then(Token::into_address)
        .ok_or(DecodeError::Field("recipient"))?;

    let payload = tokens
        .next()
        .and_then(Token::into_bytes)
        .ok_or(DecodeError::Field("payload"))?;

    Ok(BridgeMessage {
        message_id,
        dest_chain_id: dest_chain_id.as_u64(),
        sender,
        recipient,
        payload: Bytes::from(payload),
    })
}

pub fn log_block_number(log: &Log) -> Result<u64, DecodeError> {
    log.block_number
        .map(|number| number.as_u64())
        .ok_or(DecodeError::MissingBlockNumber)
}

pub struct BridgeClient {
    provider: Arc<Provider<Http>>,
    filter: Filter,
    poll_interval: Duration,
}

impl BridgeClient {
    pub fn new(
        rpc_url: &str,
        messenger_address: &str,
        event_signature: &str,
        poll_interval: Duration,
    ) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)?;
        let provider = Arc::new(provider);
        let messenger_address: Address = messenger_address.parse()?;

        let filter = Filter::new()
            .address(messenger_address)
            .topic0(event_topic(event_signature));

        Ok(Self {
            provider,
            filter,
            poll_interval,
        })
    }

    #[cfg(test)]
    pub(crate) fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Long-lived stream of matching logs, polled at the configured interval.
    pub async fn watch(&self) -> Result<FilterWatcher<'_, Http, Log>> {
        let watcher = self.provider.watch(&self.filter).await?;
        Ok(watcher.interval(self.poll_interval))
    }

    pub async fn get_block_timestamp(&self, block_number: u64) -> Result<i64> {
        let block = self
            .provider
            .get_block(BlockId::Number(BlockNumber::Number(U64::from(block_number))))
            .await?
            .ok_or_else(|| anyhow::anyhow!("Block {} not found", block_number))?;

        Ok(block.timestamp.as_u64() as i64)
    }
}
