//! Crowdsale operator workflows.
//!
//! Each public method is one CLI command: a short, strictly sequential run of
//! contract reads and state-changing submissions against the token, crowdsale
//! and finalize-agent contracts. State-changing steps wait for one
//! confirmation before anything else happens, and print the submission id
//! and the confirmed receipt as they go.

use chrono::{DateTime, Utc};
use ethers_core::abi::Token;
use ethers_core::types::{H160, U256};

use crate::abi;
use crate::amount::Amount;
use crate::chain::{ChainClient, ContractRef, Receipt, SendOpts, Submission};
use crate::errors::{OpsError, Result};
use crate::state::CrowdsaleState;

/// Confirmation depth every submission waits for.
pub const CONFIRMATIONS: u64 = 1;

/// invest() mints tokens inside the call and busts the node's default gas
/// ceiling, so it gets a bigger one.
const INVEST_GAS_LIMIT: u64 = 300_000;

/// Fudge against clock skew between this host and the chain.
const END_TIME_FUDGE_SECS: i64 = 60;

/// The three contract handles plus the chain client, built once at startup
/// and passed into every workflow.
pub struct Operator<C> {
    chain: C,
    token: ContractRef,
    crowdsale: ContractRef,
    finalize_agent: ContractRef,
}

impl<C: ChainClient> Operator<C> {
    pub fn new(
        chain: C,
        token: ContractRef,
        crowdsale: ContractRef,
        finalize_agent: ContractRef,
    ) -> Operator<C> {
        Operator {
            chain,
            token,
            crowdsale,
            finalize_agent,
        }
    }

    // ─────────────────────────────────────────────────────────
    // Read helpers
    // ─────────────────────────────────────────────────────────

    async fn read_one(&self, contract: &ContractRef, method: &str, args: &[Token]) -> Result<Token> {
        let mut tokens = self.chain.read(contract, method, args).await?;
        match tokens.pop() {
            Some(token) if tokens.is_empty() => Ok(token),
            _ => Err(OpsError::Decode(format!(
                "{}.{method} did not return exactly one value",
                contract.name
            ))),
        }
    }

    async fn read_as<T>(
        &self,
        contract: &ContractRef,
        method: &str,
        args: &[Token],
        decode: impl FnOnce(&Token) -> Option<T>,
    ) -> Result<T> {
        let token = self.read_one(contract, method, args).await?;
        decode(&token).ok_or_else(|| {
            OpsError::Decode(format!(
                "{}.{method} returned unexpected {token:?}",
                contract.name
            ))
        })
    }

    async fn read_u256(&self, contract: &ContractRef, method: &str, args: &[Token]) -> Result<U256> {
        self.read_as(contract, method, args, |t| t.clone().into_uint())
            .await
    }

    async fn read_u64(&self, contract: &ContractRef, method: &str, args: &[Token]) -> Result<u64> {
        let value = self.read_u256(contract, method, args).await?;
        if value > U256::from(u64::MAX) {
            return Err(OpsError::Decode(format!(
                "{}.{method} does not fit in 64 bits",
                contract.name
            )));
        }
        Ok(value.low_u64())
    }

    async fn read_bool(&self, contract: &ContractRef, method: &str, args: &[Token]) -> Result<bool> {
        self.read_as(contract, method, args, |t| t.clone().into_bool())
            .await
    }

    async fn read_address(&self, contract: &ContractRef, method: &str) -> Result<H160> {
        self.read_as(contract, method, &[], |t| t.clone().into_address())
            .await
    }

    /// On-chain epoch seconds as a date.
    async fn read_date(&self, contract: &ContractRef, field: &str) -> Result<DateTime<Utc>> {
        let secs = self.read_u64(contract, field, &[]).await?;
        i64::try_from(secs)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or_else(|| OpsError::Decode(format!("{field} is out of range for a date")))
    }

    /// A satoshi-denominated field as a QTUM amount.
    async fn read_currency(&self, contract: &ContractRef, field: &str, args: &[Token]) -> Result<Amount> {
        Ok(Amount::from_sats(self.read_u64(contract, field, args).await?))
    }

    async fn confirmed_receipt(&self, contract: &ContractRef, submission: &Submission) -> Result<Receipt> {
        let mut receipt = self.chain.confirm(&submission.txid, CONFIRMATIONS).await?;
        receipt.events = abi::decode_receipt_events(&contract.abi, &receipt.log);
        Ok(receipt)
    }

    // ─────────────────────────────────────────────────────────
    // Workflows
    // ─────────────────────────────────────────────────────────

    /// The `info` command: a read-only snapshot of the sale.
    pub async fn show_info(&self) -> Result<()> {
        println!(
            "token supply: {}",
            self.read_u256(&self.token, "totalSupply", &[]).await?
        );
        println!("crowdsale state: {}", self.read_state().await?);
        println!(
            "crowdsale start date: {}",
            self.read_date(&self.crowdsale, "startsAt").await?
        );
        println!(
            "crowdsale end date: {}",
            self.read_date(&self.crowdsale, "endsAt").await?
        );
        println!(
            "investor count: {}",
            self.read_u256(&self.crowdsale, "investorCount", &[]).await?
        );
        println!(
            "qtum raised: {}",
            self.read_currency(&self.crowdsale, "weiRaised", &[]).await?
        );
        println!(
            "tokens sold: {}",
            self.read_u256(&self.crowdsale, "tokensSold", &[]).await?
        );
        println!(
            "minimum funding goal: {}",
            self.read_currency(&self.crowdsale, "minimumFundingGoal", &[])
                .await?
        );
        println!(
            "minimum goal reached: {}",
            self.read_bool(&self.crowdsale, "isMinimumGoalReached", &[])
                .await?
        );
        Ok(())
    }

    /// The crowdsale's lifecycle state, decoded to its name.
    pub async fn read_state(&self) -> Result<CrowdsaleState> {
        let code = self.read_u64(&self.crowdsale, "getState", &[]).await?;
        CrowdsaleState::try_from(code)
    }

    /// The `setup` command: wire the three agent relationships.
    ///
    /// Every step is guarded by a read of the current value, so re-running
    /// after a partial failure only performs the writes still missing.
    pub async fn setup(&self) -> Result<()> {
        let agent = self.finalize_agent.address;

        if self.read_address(&self.token, "releaseAgent").await? != agent {
            let tx = self
                .chain
                .submit(
                    &self.token,
                    "setReleaseAgent",
                    &[Token::Address(agent)],
                    SendOpts::default(),
                )
                .await?;
            println!("confirming {}.setReleaseAgent: {}", self.token.name, tx.txid);
            let receipt = self.confirmed_receipt(&self.token, &tx).await?;
            print_receipt(&format!("{}.setReleaseAgent", self.token.name), &receipt)?;
        }
        println!("releaseAgent configured");

        if self.read_address(&self.crowdsale, "finalizeAgent").await? != agent {
            let tx = self
                .chain
                .submit(
                    &self.crowdsale,
                    "setFinalizeAgent",
                    &[Token::Address(agent)],
                    SendOpts::default(),
                )
                .await?;
            println!(
                "confirming {}.setFinalizeAgent: {}",
                self.crowdsale.name, tx.txid
            );
            let receipt = self.confirmed_receipt(&self.crowdsale, &tx).await?;
            print_receipt(&format!("{}.setFinalizeAgent", self.crowdsale.name), &receipt)?;
        }
        println!("finalizeAgent configured");

        // The crowdsale mints sold tokens, so it must be an approved mint
        // agent on the token.
        let crowdsale_addr = Token::Address(self.crowdsale.address);
        if !self
            .read_bool(&self.token, "mintAgents", &[crowdsale_addr.clone()])
            .await?
        {
            let tx = self
                .chain
                .submit(
                    &self.token,
                    "setMintAgent",
                    &[crowdsale_addr, Token::Bool(true)],
                    SendOpts::default(),
                )
                .await?;
            println!("confirming {}.setMintAgent: {}", self.token.name, tx.txid);
            let receipt = self.confirmed_receipt(&self.token, &tx).await?;
            print_receipt(&format!("{}.setMintAgent", self.token.name), &receipt)?;
        }
        println!("mintAgents configured");
        Ok(())
    }

    /// The `invest` command: value-bearing `invest(address)` call.
    pub async fn invest(&self, address: H160, amount: Amount) -> Result<()> {
        println!("invest {} {amount}", addr_hex(&address));
        let opts = SendOpts {
            amount,
            gas_limit: Some(INVEST_GAS_LIMIT),
            sender: None,
        };
        let tx = self
            .chain
            .submit(&self.crowdsale, "invest", &[Token::Address(address)], opts)
            .await?;
        println!("invest txid {}", tx.txid);
        let receipt = self.confirmed_receipt(&self.crowdsale, &tx).await?;
        print_receipt("invest", &receipt)
    }

    /// The `investedBy` command: what an address put in and got back.
    pub async fn invested_by(&self, address: H160) -> Result<()> {
        let invested = self
            .read_currency(&self.crowdsale, "investedAmountOf", &[Token::Address(address)])
            .await?;
        println!("invested by: {}", addr_hex(&address));
        println!("amount (qtum): {invested}");
        let balance = self
            .read_u256(&self.token, "balanceOf", &[Token::Address(address)])
            .await?;
        println!("token balance: {balance}");
        Ok(())
    }

    /// The `preallocate` command: pre-sale allocation at a fixed price.
    pub async fn preallocate(&self, receiver: H160, tokens: u64, price: u64) -> Result<()> {
        println!("preallocate {} {tokens} {price}", addr_hex(&receiver));
        let args = [
            Token::Address(receiver),
            Token::Uint(U256::from(tokens)),
            Token::Uint(U256::from(price)),
        ];
        let tx = self
            .chain
            .submit(&self.crowdsale, "preallocate", &args, SendOpts::default())
            .await?;
        println!("preallocate txid {}", tx.txid);
        let receipt = self.confirmed_receipt(&self.crowdsale, &tx).await?;
        print_receipt("preallocate", &receipt)
    }

    /// The `finalize` command. Refuses to touch a sale that is already
    /// finalized; the contract would revert anyway, this fails cheaper and
    /// clearer.
    pub async fn finalize(&self) -> Result<()> {
        if self.read_bool(&self.crowdsale, "finalized", &[]).await? {
            return Err(OpsError::AlreadyFinalized);
        }
        let tx = self
            .chain
            .submit(&self.crowdsale, "finalize", &[], SendOpts::default())
            .await?;
        println!("finalize txid {}", tx.txid);
        let receipt = self.confirmed_receipt(&self.crowdsale, &tx).await?;
        print_receipt("finalize", &receipt)
    }

    /// The `endnow` command: move endsAt to one minute from now.
    pub async fn end_now(&self) -> Result<()> {
        let now = Utc::now().timestamp();
        let ends_at = now.saturating_add(END_TIME_FUDGE_SECS).max(0) as u64;
        println!("ending crowdsale at {ends_at}");
        let tx = self
            .chain
            .submit(
                &self.crowdsale,
                "setEndsAt",
                &[Token::Uint(U256::from(ends_at))],
                SendOpts::default(),
            )
            .await?;
        println!("setEndsAt txid {}", tx.txid);
        let receipt = self.confirmed_receipt(&self.crowdsale, &tx).await?;
        print_receipt("setEndsAt", &receipt)
    }

    /// The `loadRefund` command: top the refund pool up to everything
    /// raised. Returns the amount loaded, `None` when the pool already
    /// covers the raise and no transaction was sent.
    pub async fn load_refund(&self) -> Result<Option<Amount>> {
        let raised = self.read_currency(&self.crowdsale, "weiRaised", &[]).await?;
        let loaded = self
            .read_currency(&self.crowdsale, "loadedRefund", &[])
            .await?;
        let missing = match raised.checked_sub(loaded) {
            Some(missing) if !missing.is_zero() => missing,
            _ => {
                println!("refunds already cover the {raised} qtum raised, nothing to load");
                return Ok(None);
            }
        };
        println!("loading {missing} qtum of refunds");
        let opts = SendOpts {
            amount: missing,
            ..SendOpts::default()
        };
        let tx = self
            .chain
            .submit(&self.crowdsale, "loadRefund", &[], opts)
            .await?;
        println!("loadRefund txid {}", tx.txid);
        let receipt = self.confirmed_receipt(&self.crowdsale, &tx).await?;
        print_receipt("loadRefund", &receipt)?;
        Ok(Some(missing))
    }

    /// The `refund` command: claim a refund for the given sender address.
    pub async fn refund(&self, sender: String) -> Result<()> {
        let opts = SendOpts {
            sender: Some(sender),
            ..SendOpts::default()
        };
        let tx = self
            .chain
            .submit(&self.crowdsale, "refund", &[], opts)
            .await?;
        println!("refund txid {}", tx.txid);
        let receipt = self.confirmed_receipt(&self.crowdsale, &tx).await?;
        print_receipt("refund", &receipt)
    }

    /// The `state` command: have the contract emit its state-transition
    /// events through the diagnostic logState() call. State-changing, unlike
    /// `info`; a plain read would see block.timestamp as 0 on some nodes and
    /// report the wrong phase.
    pub async fn log_state(&self) -> Result<()> {
        let tx = self
            .chain
            .submit(&self.crowdsale, "logState", &[], SendOpts::default())
            .await?;
        println!("logState txid {}", tx.txid);
        let receipt = self.confirmed_receipt(&self.crowdsale, &tx).await?;
        print_receipt("logState", &receipt)
    }

    /// The `balanceOf` command: single token-balance read.
    pub async fn balance_of(&self, address: H160) -> Result<()> {
        let balance = self
            .read_u256(&self.token, "balanceOf", &[Token::Address(address)])
            .await?;
        println!("token balance: {balance}");
        Ok(())
    }

    /// The `transfer` command: move released tokens between addresses.
    pub async fn transfer(&self, from: String, to: H160, amount: u64) -> Result<()> {
        println!("transfer {from} {} {amount}", addr_hex(&to));
        let args = [Token::Address(to), Token::Uint(U256::from(amount))];
        let opts = SendOpts {
            sender: Some(from),
            ..SendOpts::default()
        };
        let tx = self.chain.submit(&self.token, "transfer", &args, opts).await?;
        println!("transfer txid {}", tx.txid);
        let receipt = self.confirmed_receipt(&self.token, &tx).await?;
        print_receipt("transfer", &receipt)
    }
}

fn print_receipt(label: &str, receipt: &Receipt) -> Result<()> {
    println!("{label} receipt:");
    println!("{}", serde_json::to_string_pretty(receipt)?);
    Ok(())
}

fn addr_hex(address: &H160) -> String {
    hex::encode(address.as_bytes())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
