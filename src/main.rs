//! Crowdsale operator CLI — entry point.
//!
//! Parses the command line, loads the deployment records and node RPC
//! credentials, then runs exactly one operator workflow and maps its outcome
//! to a process exit code: 0 on success, 1 on chain or configuration
//! failures, 2 on usage errors (clap), 3 when a domain guard refuses the
//! operation.

mod abi;
mod amount;
mod chain;
mod cli;
mod config;
mod errors;
mod ops;
mod records;
mod rpc;
mod state;

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use config::Config;
use errors::Result;
use ops::Operator;
use records::DeployRecords;
use rpc::QtumClient;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    // Raw-argument echo before dispatch, gated by the DEBUG toggle.
    if std::env::var_os("DEBUG").is_some_and(|v| !v.is_empty()) {
        let argv: Vec<String> = std::env::args().skip(1).collect();
        eprintln!("argv {argv:?}");
    }

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()?;
    let records = DeployRecords::load(&config.records_path)?;
    let token = records.contract(&config.token_contract)?;
    let crowdsale = records.contract(&config.crowdsale_contract)?;
    let finalize_agent = records.contract(&config.finalize_agent_contract)?;

    let chain = QtumClient::new(&config.rpc_url, Duration::from_secs(config.poll_interval_secs))?;
    let operator = Operator::new(chain, token, crowdsale, finalize_agent);

    match cli.command {
        Command::Info => operator.show_info().await,
        Command::Setup => operator.setup().await,
        Command::Preallocate {
            receiver,
            tokens,
            price,
        } => operator.preallocate(receiver, tokens, price).await,
        Command::Invest { address, amount } => operator.invest(address, amount).await,
        Command::InvestedBy { address } => operator.invested_by(address).await,
        Command::Finalize => operator.finalize().await,
        Command::Endnow => operator.end_now().await,
        Command::LoadRefund => operator.load_refund().await.map(|_| ()),
        Command::Refund { address } => operator.refund(address).await,
        Command::State => operator.log_state().await,
        Command::BalanceOf { address } => operator.balance_of(address).await,
        Command::Transfer { from, to, amount } => operator.transfer(from, to, amount).await,
    }
}
