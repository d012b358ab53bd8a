//! Celo blockchain tools backed by the node's JSON-RPC endpoint.
//!
//! Three read-only tools are exposed to the blockchain agent:
//! `get_latest_block_number`, `get_block_info` and `get_celo_stats`.
//! Each one checks connectivity first so the model sees a clear
//! "Failed to connect" message instead of a transport error.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::AgentsError;
use crate::provider::http::{shared_client, status_to_error};
use crate::tools::tool::{tool_error, AgentTool, Tool};
use crate::tools::types::AgentToolParameters;

const CONNECT_ERROR: &str = "Failed to connect to Celo blockchain";

/// Summary of a block, as returned by `get_block_info`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockInfo {
    pub number: u64,
    pub hash: String,
    pub timestamp: u64,
    pub transactions_count: usize,
    pub miner: String,
    pub gas_used: u64,
    pub gas_limit: u64,
}

/// Chain statistics, as returned by `get_celo_stats`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainStats {
    pub chain_id: u64,
    pub latest_block: u64,
    pub gas_price: u64,
    pub is_connected: bool,
    pub peer_count: Option<u64>,
}

/// Minimal JSON-RPC 2.0 client for a Celo node.
#[derive(Debug)]
pub struct CeloRpcClient {
    url: String,
    chain_id: u64,
    next_id: AtomicU64,
}

impl CeloRpcClient {
    pub fn new(url: impl Into<String>, chain_id: u64) -> Self {
        Self {
            url: url.into(),
            chain_id,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Issue one JSON-RPC call and return its `result`.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, AgentsError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!(method, id, "Celo RPC call");

        let resp = shared_client().post(&self.url).json(&body).send().await?;
        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let envelope: RpcEnvelope = resp.json().await?;
        if let Some(err) = envelope.error {
            return Err(AgentsError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(envelope.result.unwrap_or(Value::Null))
    }

    /// Whether the node answers `eth_chainId`.
    pub async fn is_connected(&self) -> bool {
        self.call("eth_chainId", json!([])).await.is_ok()
    }

    pub async fn block_number(&self) -> Result<u64, AgentsError> {
        let value = self.call("eth_blockNumber", json!([])).await?;
        parse_quantity(&value, "eth_blockNumber")
    }

    pub async fn gas_price(&self) -> Result<u64, AgentsError> {
        let value = self.call("eth_gasPrice", json!([])).await?;
        parse_quantity(&value, "eth_gasPrice")
    }

    /// Peer count, or `None` when the node does not expose it.
    pub async fn peer_count(&self) -> Option<u64> {
        let value = self.call("net_peerCount", json!([])).await.ok()?;
        parse_quantity(&value, "net_peerCount").ok()
    }

    /// Fetch a block by number (latest when `None`).
    pub async fn block(&self, number: Option<u64>) -> Result<BlockInfo, AgentsError> {
        let number = match number {
            Some(n) => n,
            None => self.block_number().await?,
        };
        let value = self
            .call("eth_getBlockByNumber", json!([format!("{number:#x}"), false]))
            .await?;
        if value.is_null() {
            return Err(AgentsError::NotFound(format!("Block {number} not found")));
        }

        let raw: RawBlock = serde_json::from_value(value)?;
        Ok(BlockInfo {
            number: parse_hex(&raw.number, "number")?,
            hash: raw.hash,
            timestamp: parse_hex(&raw.timestamp, "timestamp")?,
            transactions_count: raw.transactions.len(),
            miner: raw.miner,
            gas_used: parse_hex(&raw.gas_used, "gasUsed")?,
            gas_limit: parse_hex(&raw.gas_limit, "gasLimit")?,
        })
    }

    pub async fn stats(&self) -> Result<ChainStats, AgentsError> {
        Ok(ChainStats {
            chain_id: self.chain_id,
            latest_block: self.block_number().await?,
            gas_price: self.gas_price().await?,
            is_connected: self.is_connected().await,
            peer_count: self.peer_count().await,
        })
    }

    async fn ensure_connected(&self, tool_name: &str) -> Result<(), AgentsError> {
        if self.is_connected().await {
            Ok(())
        } else {
            Err(AgentsError::tool(tool_name, CONNECT_ERROR))
        }
    }
}

#[derive(Deserialize)]
struct RpcEnvelope {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBlock {
    number: String,
    hash: String,
    timestamp: String,
    #[serde(default)]
    transactions: Vec<Value>,
    #[serde(default)]
    miner: String,
    gas_used: String,
    gas_limit: String,
}

fn parse_hex(raw: &str, field: &str) -> Result<u64, AgentsError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    u64::from_str_radix(digits, 16)
        .map_err(|e| AgentsError::InvalidState(format!("Bad hex quantity for {field}: {raw} ({e})")))
}

fn parse_quantity(value: &Value, method: &str) -> Result<u64, AgentsError> {
    match value {
        Value::String(s) => parse_hex(s, method),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| AgentsError::InvalidState(format!("Bad quantity from {method}: {n}"))),
        other => Err(AgentsError::InvalidState(format!(
            "Unexpected result from {method}: {other}"
        ))),
    }
}

/// `get_latest_block_number`: the current head of the chain.
pub fn latest_block_number_tool(client: Arc<CeloRpcClient>) -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        "get_latest_block_number",
        "Get the latest block number on the Celo blockchain.",
        AgentToolParameters::empty(),
        move |_args| {
            let client = client.clone();
            async move {
                const NAME: &str = "get_latest_block_number";
                client.ensure_connected(NAME).await?;
                let number = client.block_number().await.map_err(|e| tool_error(NAME, e))?;
                Ok(json!(number))
            }
        },
    ))
}

/// `get_block_info`: details of one block, latest when no number is given.
pub fn block_info_tool(client: Arc<CeloRpcClient>) -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        "get_block_info",
        "Get information about a specific block on the Celo blockchain \
         (timestamp, hash, transaction count, miner, gas). \
         If block_number is not provided, gets the latest block.",
        AgentToolParameters::object()
            .integer("block_number", "The block number to get information for", false)
            .build(),
        move |args| {
            let client = client.clone();
            async move {
                const NAME: &str = "get_block_info";
                let number = args.get_u64_opt("block_number")?;
                client.ensure_connected(NAME).await?;
                let block = client.block(number).await.map_err(|e| tool_error(NAME, e))?;
                Ok(serde_json::to_value(block)?)
            }
        },
    ))
}

/// `get_celo_stats`: chain id, head, gas price and connectivity.
pub fn celo_stats_tool(client: Arc<CeloRpcClient>) -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        "get_celo_stats",
        "Get basic statistics about the Celo blockchain: chain ID, latest block, \
         gas price, connectivity and peer count.",
        AgentToolParameters::empty(),
        move |_args| {
            let client = client.clone();
            async move {
                const NAME: &str = "get_celo_stats";
                client.ensure_connected(NAME).await?;
                let stats = client.stats().await.map_err(|e| tool_error(NAME, e))?;
                Ok(serde_json::to_value(stats)?)
            }
        },
    ))
}

/// All blockchain tools sharing one client.
pub fn blockchain_tools(client: Arc<CeloRpcClient>) -> Vec<Arc<dyn Tool>> {
    vec![
        latest_block_number_tool(client.clone()),
        block_info_tool(client.clone()),
        celo_stats_tool(client),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_quantities() {
        assert_eq!(parse_hex("0x1a", "n").unwrap(), 26);
        assert_eq!(parse_hex("ff", "n").unwrap(), 255);
        assert!(parse_hex("0xzz", "n").is_err());
        assert_eq!(parse_quantity(&json!("0x10"), "m").unwrap(), 16);
        assert_eq!(parse_quantity(&json!(7), "m").unwrap(), 7);
        assert!(parse_quantity(&json!(null), "m").is_err());
    }

    #[test]
    fn tool_names_are_stable() {
        let client = Arc::new(CeloRpcClient::new("http://localhost:8545", 42220));
        let names: Vec<String> = blockchain_tools(client)
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["get_latest_block_number", "get_block_info", "get_celo_stats"]
        );
    }
}
