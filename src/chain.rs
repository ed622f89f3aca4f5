//! Chain-access contract: what the workflows need from a node.
//!
//! The operator only ever performs three things against the chain: read-only
//! contract calls, state-changing submissions, and waiting for a submitted
//! transaction to reach a confirmation depth. Everything else (transports,
//! auth, polling) stays behind this trait so the workflows can be exercised
//! against a scripted client in tests.

use ethers_core::abi::{Abi, Token};
use ethers_core::types::H160;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::amount::Amount;
use crate::errors::Result;

/// A deployed contract: its record name, on-chain address and interface.
#[derive(Debug, Clone)]
pub struct ContractRef {
    pub name: String,
    pub address: H160,
    pub abi: Abi,
}

impl ContractRef {
    /// Address as the bare 40-digit hex string the node RPC expects.
    pub fn address_hex(&self) -> String {
        hex::encode(self.address.as_bytes())
    }
}

/// Options for a state-changing submission.
#[derive(Debug, Clone, Default)]
pub struct SendOpts {
    /// QTUM attached to the call.
    pub amount: Amount,
    /// Gas limit override; the client default applies when unset.
    pub gas_limit: Option<u64>,
    /// Sending address override; the node picks one when unset.
    pub sender: Option<String>,
}

/// A submission accepted by the node's mempool.
#[derive(Debug, Clone)]
pub struct Submission {
    pub txid: String,
}

/// A transaction receipt as returned by `gettransactionreceipt`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Receipt {
    pub block_hash: String,
    pub block_number: u64,
    pub transaction_hash: String,
    pub transaction_index: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_index: Option<u64>,
    pub from: String,
    pub to: Option<String>,
    pub cumulative_gas_used: u64,
    pub gas_used: u64,
    pub contract_address: String,
    pub excepted: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excepted_message: Option<String>,
    pub log: Vec<RawLogEntry>,
    /// Depth at the time the receipt was fetched; filled in by the client.
    pub confirmations: u64,
    /// Logs decoded against the contract ABI; filled in by the operator.
    #[serde(skip_deserializing)]
    pub events: Vec<DecodedEvent>,
}

/// A raw EVM log entry from a receipt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLogEntry {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
}

/// A log entry decoded against an ABI event definition.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedEvent {
    pub name: String,
    pub params: serde_json::Map<String, Value>,
}

/// Node access used by the operator workflows.
#[allow(async_fn_in_trait)]
pub trait ChainClient {
    /// Call a read-only contract method and return its decoded outputs.
    async fn read(&self, contract: &ContractRef, method: &str, args: &[Token]) -> Result<Vec<Token>>;

    /// Submit a state-changing contract call.
    async fn submit(
        &self,
        contract: &ContractRef,
        method: &str,
        args: &[Token],
        opts: SendOpts,
    ) -> Result<Submission>;

    /// Wait until `txid` has at least `confirmations` confirmations.
    async fn confirm(&self, txid: &str, confirmations: u64) -> Result<Receipt>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_parses_node_json() {
        let raw = r#"{
            "blockHash": "1e9ff5a3a7e52f5a1d2f053a8ba17b41ac47ae3bdd10ff1d09b0b6b4a1d062c5",
            "blockNumber": 4991,
            "transactionHash": "5aa8e1e913bbd36ef41c3c4c791fbe5b6a8e67f6c1d3e7f6f3880cde27c7ffd3",
            "transactionIndex": 2,
            "outputIndex": 0,
            "from": "eb6a149ec16aaaa6e47b6c0048520846b69b0937",
            "to": "cea7e3f18393f2e0b57466b559ec4d4afad3b91a",
            "cumulativeGasUsed": 43448,
            "gasUsed": 43448,
            "contractAddress": "cea7e3f18393f2e0b57466b559ec4d4afad3b91a",
            "excepted": "None",
            "log": [
                {
                    "address": "cea7e3f18393f2e0b57466b559ec4d4afad3b91a",
                    "topics": ["ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"],
                    "data": "0000000000000000000000000000000000000000000000000000000000000064"
                }
            ]
        }"#;
        let receipt: Receipt = serde_json::from_str(raw).unwrap();
        assert_eq!(receipt.block_number, 4991);
        assert_eq!(receipt.excepted, "None");
        assert_eq!(receipt.log.len(), 1);
        assert_eq!(receipt.confirmations, 0);
        assert!(receipt.events.is_empty());
    }

    #[test]
    fn address_hex_is_bare_lowercase() {
        let contract = ContractRef {
            name: "Crowdsale".into(),
            address: H160::repeat_byte(0xab),
            abi: serde_json::from_str("[]").unwrap(),
        };
        assert_eq!(contract.address_hex(), "ab".repeat(20));
    }
}
