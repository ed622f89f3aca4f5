//! Command-line surface of the operator tool.

use clap::{Parser, Subcommand};
use ethers_core::types::H160;

use crate::amount::Amount;

#[derive(Debug, Parser)]
#[command(name = "crowdsale-ops", version, about = "Operate a token crowdsale deployed on a Qtum chain")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
#[command(rename_all = "camelCase")]
pub enum Command {
    /// Print a summary of the sale: supply, state, schedule and progress
    Info,
    /// Wire up the token, crowdsale and finalize agent (safe to re-run)
    Setup,
    /// Assign pre-sale tokens to a receiver at a given price
    Preallocate {
        #[arg(value_parser = parse_address)]
        receiver: H160,
        /// Whole tokens to assign
        tokens: u64,
        /// Price per token in wei
        price: u64,
    },
    /// Invest QTUM into the sale on behalf of an address
    Invest {
        #[arg(value_parser = parse_address)]
        address: H160,
        /// QTUM to invest, e.g. 12.5
        amount: Amount,
    },
    /// Show how much an address invested and the tokens it holds
    InvestedBy {
        #[arg(value_parser = parse_address)]
        address: H160,
    },
    /// Finalize a successful sale, releasing the token
    Finalize,
    /// Move the end of the sale to one minute from now
    Endnow,
    /// Top up the refund pool to cover everything raised
    LoadRefund,
    /// Claim a refund for the given sender address
    Refund {
        /// Base58 address the investment was sent from
        address: String,
    },
    /// Print the crowdsale state
    State,
    /// Print the token balance of an address
    BalanceOf {
        #[arg(value_parser = parse_address)]
        address: H160,
    },
    /// Transfer released tokens between addresses
    Transfer {
        /// Base58 address to send from
        from: String,
        #[arg(value_parser = parse_address)]
        to: H160,
        /// Token units to transfer
        amount: u64,
    },
}

/// Parse a 160-bit contract-style address, `0x` prefix optional.
fn parse_address(s: &str) -> Result<H160, String> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(stripped).map_err(|_| format!("{s} is not hex"))?;
    if bytes.len() != 20 {
        return Err(format!("expected a 20-byte address, got {} bytes", bytes.len()));
    }
    Ok(H160::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn unknown_commands_are_usage_errors() {
        let err = Cli::try_parse_from(["crowdsale-ops", "flarble"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
    }

    #[test]
    fn command_names_keep_their_camel_casing() {
        let addr = "11".repeat(20);
        let cli = Cli::try_parse_from(["crowdsale-ops", "investedBy", addr.as_str()]).unwrap();
        match cli.command {
            Command::InvestedBy { address } => assert_eq!(address, H160::repeat_byte(0x11)),
            other => panic!("parsed as {other:?}"),
        }
        // The all-lowercase spelling is a different, unknown command.
        let err = Cli::try_parse_from(["crowdsale-ops", "investedby", addr.as_str()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
    }

    #[test]
    fn invest_takes_an_address_and_a_qtum_amount() {
        let addr = "22".repeat(20);
        let cli = Cli::try_parse_from(["crowdsale-ops", "invest", addr.as_str(), "0.5"]).unwrap();
        match cli.command {
            Command::Invest { address, amount } => {
                assert_eq!(address, H160::repeat_byte(0x22));
                assert_eq!(amount, Amount::from_sats(50_000_000));
            }
            other => panic!("parsed as {other:?}"),
        }
    }

    #[test]
    fn missing_arguments_are_usage_errors() {
        let err = Cli::try_parse_from(["crowdsale-ops", "invest"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn addresses_accept_an_optional_0x_prefix() {
        let plain = parse_address(&"ab".repeat(20)).unwrap();
        let prefixed = parse_address(&format!("0x{}", "ab".repeat(20))).unwrap();
        assert_eq!(plain, prefixed);
        assert!(parse_address("abcd").is_err());
        assert!(parse_address("zz").is_err());
    }
}
