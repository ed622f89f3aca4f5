//! Deployment records produced by the contract deploy tooling.
//!
//! The records file maps a deploy key (usually `<source>.sol` or a named
//! alias) to the deployed address and ABI. Contracts are looked up first by
//! exact key, then by the contract name recorded inside each entry.

use std::collections::BTreeMap;
use std::path::Path;

use ethers_core::abi::Abi;
use ethers_core::types::H160;
use serde::Deserialize;
use serde_json::Value;

use crate::chain::ContractRef;
use crate::errors::{OpsError, Result};

#[derive(Debug, Deserialize)]
pub struct DeployRecords {
    #[serde(default)]
    contracts: BTreeMap<String, ContractRecord>,
}

#[derive(Debug, Deserialize)]
struct ContractRecord {
    #[serde(default)]
    name: Option<String>,
    address: String,
    abi: Value,
}

impl DeployRecords {
    pub fn load(path: impl AsRef<Path>) -> Result<DeployRecords> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|err| OpsError::Records(format!("cannot read {}: {err}", path.display())))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Resolve a contract by deploy key or recorded name.
    pub fn contract(&self, name: &str) -> Result<ContractRef> {
        let record = self
            .contracts
            .get(name)
            .or_else(|| {
                self.contracts
                    .values()
                    .find(|record| record.name.as_deref() == Some(name))
            })
            .ok_or_else(|| OpsError::Records(format!("contract {name} not in deployment records")))?;
        Ok(ContractRef {
            name: name.to_string(),
            address: parse_address(&record.address)
                .ok_or_else(|| OpsError::Records(format!("contract {name} has a bad address")))?,
            abi: serde_json::from_value::<Abi>(record.abi.clone())?,
        })
    }
}

fn parse_address(s: &str) -> Option<H160> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(stripped).ok()?;
    if bytes.len() != 20 {
        return None;
    }
    Some(H160::from_slice(&bytes))
}
