//! ABI plumbing on top of `ethers_core::abi`.
//!
//! The deployment records carry full contract ABIs, so calldata and outputs
//! are always encoded and decoded against a known interface rather than
//! hand-built selectors.

use ethers_core::abi::{Abi, RawLog, Token};
use ethers_core::types::H256;
use serde_json::Value;
use tracing::debug;

use crate::chain::{DecodedEvent, RawLogEntry};
use crate::errors::{OpsError, Result};

/// Encode a method call into calldata bytes.
pub fn encode_call(abi: &Abi, method: &str, args: &[Token]) -> Result<Vec<u8>> {
    let function = abi
        .function(method)
        .map_err(|_| OpsError::Decode(format!("method {method} not in contract ABI")))?;
    Ok(function.encode_input(args)?)
}

/// Decode the raw return data of a method call.
pub fn decode_output(abi: &Abi, method: &str, data: &[u8]) -> Result<Vec<Token>> {
    let function = abi
        .function(method)
        .map_err(|_| OpsError::Decode(format!("method {method} not in contract ABI")))?;
    Ok(function.decode_output(data)?)
}

/// Decode receipt logs against the contract ABI.
///
/// Entries that match no known event, or fail to decode, are skipped; the
/// receipt still prints with its raw log either way.
pub fn decode_receipt_events(abi: &Abi, log: &[RawLogEntry]) -> Vec<DecodedEvent> {
    let mut events = Vec::new();
    for entry in log {
        let Some(topic0) = entry.topics.first().and_then(|t| parse_topic(t)) else {
            continue;
        };
        let Some(event) = abi.events().find(|e| e.signature() == topic0) else {
            debug!(topic = %hex::encode(topic0.as_bytes()), "no event matches log topic");
            continue;
        };
        let raw = RawLog {
            topics: entry.topics.iter().filter_map(|t| parse_topic(t)).collect(),
            data: match parse_hex_bytes(&entry.data) {
                Ok(data) => data,
                Err(_) => continue,
            },
        };
        match event.parse_log(raw) {
            Ok(parsed) => {
                let mut params = serde_json::Map::new();
                for param in parsed.params {
                    params.insert(param.name, token_to_json(&param.value));
                }
                events.push(DecodedEvent {
                    name: event.name.clone(),
                    params,
                });
            }
            Err(err) => debug!(event = %event.name, %err, "log entry failed to decode"),
        }
    }
    events
}

/// Render a token as JSON, keeping integers as decimal strings so 256-bit
/// values survive intact.
pub fn token_to_json(token: &Token) -> Value {
    match token {
        Token::Address(addr) => Value::String(hex::encode(addr.as_bytes())),
        Token::Uint(n) | Token::Int(n) => Value::String(n.to_string()),
        Token::Bool(b) => Value::Bool(*b),
        Token::String(s) => Value::String(s.clone()),
        Token::Bytes(b) | Token::FixedBytes(b) => Value::String(hex::encode(b)),
        Token::Array(items) | Token::FixedArray(items) | Token::Tuple(items) => {
            Value::Array(items.iter().map(token_to_json).collect())
        }
    }
}

/// Hex string to bytes, tolerating an optional `0x` prefix.
pub fn parse_hex_bytes(s: &str) -> Result<Vec<u8>> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    Ok(hex::decode(stripped)?)
}

fn parse_topic(s: &str) -> Option<H256> {
    let bytes = parse_hex_bytes(s).ok()?;
    if bytes.len() != 32 {
        return None;
    }
    Some(H256::from_slice(&bytes))
}
