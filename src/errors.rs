//! Application-wide error types and the exit-code mapping.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpsError {
    #[error("RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("node error {code}: {message}")]
    Node { code: i64, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ABI error: {0}")]
    Abi(#[from] ethers_core::abi::Error),

    #[error("hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("contract call {method} excepted: {excepted}")]
    Excepted { method: String, excepted: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("deployment records error: {0}")]
    Records(String),

    #[error("unexpected chain data: {0}")]
    Decode(String),

    #[error("invalid amount: {0}")]
    Amount(String),

    #[error("unknown crowdsale state code {0}")]
    UnknownState(u64),

    #[error("crowdsale is already finalized")]
    AlreadyFinalized,
}

impl OpsError {
    /// Process exit code for this error kind.
    ///
    /// `0` is success and `2` is owned by the argument parser (usage errors,
    /// unknown commands), so runtime failures map to `1` and the
    /// already-finalized guard to `3`.
    pub fn exit_code(&self) -> u8 {
        match self {
            OpsError::AlreadyFinalized => 3,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, OpsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_errors_get_their_own_exit_code() {
        assert_eq!(OpsError::AlreadyFinalized.exit_code(), 3);
        assert_eq!(OpsError::Config("x".into()).exit_code(), 1);
        assert_eq!(
            OpsError::Node {
                code: -5,
                message: "boom".into()
            }
            .exit_code(),
            1
        );
    }
}
