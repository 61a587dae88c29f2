//! ballot-ops command line.
//!
//! # Architecture Overview
//!
//! ```text
//!   CLI args + ballot.toml + BALLOT_PRIVATE_KEYS
//!       │
//!       ▼
//!   BlockchainClient (Ledger) ──▶ Session (mint, delegate, ballots, votes, queries)
//!       │                    └──▶ Deployer (artifacts, deploy, verify)
//!       │                                   │
//!       └──────────────▶ ScenarioRunner ◀───┘ ──▶ records.json
//! ```
//!
//! Results go to stdout as JSON, logs go to stderr.

use alloy::primitives::{Address, U256};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

use ballot_ops::actions::{
    DelegateArgs, MintArgs, NewBallotArgs, SetTargetBlockArgs, Session, VoteArgs,
};
use ballot_ops::blockchain::{wallet, BlockchainClient};
use ballot_ops::config::{load_or_default, BallotConfig};
use ballot_ops::contracts::artifacts::ArtifactStore;
use ballot_ops::deploy::{Deployer, EtherscanVerifier};
use ballot_ops::observability::{logging, metrics};
use ballot_ops::scenario::ScenarioRunner;

#[derive(Parser)]
#[command(name = "ballot-ops", version)]
#[command(about = "Deploy and operate token-weighted ballot contracts", long_about = None)]
struct Cli {
    /// Configuration file (TOML); defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Network name override, e.g. "sepolia"; derived from the chain id when unset.
    #[arg(short, long, global = true)]
    network: Option<String>,

    /// RPC endpoint override.
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the signing identities
    Accounts,
    /// Deploy a contract from its compiled artifact
    Deploy {
        /// Contract name, e.g. "Ballot"
        contract: String,
        /// Constructor parameters as an ordered JSON object
        #[arg(long, default_value = "{}")]
        params: String,
    },
    /// Deploy a contract, then verify its source on the block explorer
    DeployAndVerify {
        contract: String,
        #[arg(long, default_value = "{}")]
        params: String,
    },
    /// Mint governance tokens
    Mint {
        #[arg(long)]
        token: Address,
        #[arg(long)]
        signer: Option<Address>,
        /// Recipient; zero or malformed means the signer
        #[arg(long)]
        to: Option<String>,
        #[arg(long, default_value = "0", value_parser = parse_amount)]
        amount: U256,
    },
    /// Delegate voting power
    Delegate {
        #[arg(long)]
        token: Address,
        #[arg(long)]
        signer: Option<Address>,
        /// Delegatee; zero or malformed means the signer
        #[arg(long)]
        delegatee: Option<String>,
    },
    /// Create a ballot
    CreateBallot {
        #[arg(long)]
        ballot: Address,
        #[arg(long)]
        signer: Option<Address>,
        #[arg(long)]
        name: String,
        /// Comma-separated proposal names
        #[arg(long, value_delimiter = ',')]
        proposals: Vec<String>,
    },
    /// Set the voting power snapshot block of a ballot
    SetTargetBlock {
        #[arg(long)]
        ballot: Address,
        #[arg(long)]
        signer: Option<Address>,
        #[arg(long)]
        name: String,
        #[arg(long)]
        block: u64,
    },
    /// Vote for a proposal
    Vote {
        #[arg(long)]
        ballot: Address,
        #[arg(long)]
        signer: Option<Address>,
        #[arg(long)]
        name: String,
        #[arg(long)]
        proposal: u64,
        #[arg(long, default_value = "0", value_parser = parse_amount)]
        amount: U256,
    },
    /// Show remaining voting power of an account
    VotingPower {
        #[arg(long)]
        ballot: Address,
        #[arg(long)]
        name: String,
        #[arg(long)]
        account: Address,
    },
    /// Show the current winner of a ballot
    WinningProposal {
        #[arg(long)]
        ballot: Address,
        #[arg(long)]
        name: String,
    },
    /// Run the end-to-end demonstration and write its record
    RunFullScenario {
        #[arg(short, long, default_value = "records.json")]
        output: PathBuf,
    },
}

fn parse_amount(raw: &str) -> Result<U256, String> {
    raw.parse::<U256>()
        .map_err(|e| format!("invalid amount '{}': {}", raw, e))
}

fn parse_params(raw: &str) -> Result<Map<String, Value>, Box<dyn std::error::Error>> {
    match serde_json::from_str(raw)? {
        Value::Object(map) => Ok(map),
        _ => Err("constructor parameters must be a JSON object".into()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(network) = cli.network {
        config.network.name = network;
    }
    if let Some(rpc_url) = cli.rpc_url {
        config.network.rpc_url = rpc_url;
    }

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "ballot-ops starting");

    let recorder = config
        .observability
        .metrics_textfile
        .as_ref()
        .and_then(|_| metrics::install_recorder());

    let keys = wallet::keys_from_env()?;
    let client = BlockchainClient::new(config.network.clone(), keys).await?;
    let session = Session::connect(&client, config.network.confirmation_blocks).await?;

    tracing::info!(
        network = %session.network().name,
        chain_id = session.network().chain_id.0,
        rpc_url = %config.network.rpc_url,
        "Connected"
    );

    let result = run(cli.command, &config, &client, session).await;

    if let (Some(handle), Some(path)) = (&recorder, &config.observability.metrics_textfile) {
        if let Err(e) = metrics::write_textfile(handle, Path::new(path)) {
            tracing::warn!(path = %path, error = %e, "Failed to write metrics");
        }
    }
    result
}

async fn run(
    command: Commands,
    config: &BallotConfig,
    client: &BlockchainClient,
    session: Session<'_, BlockchainClient>,
) -> Result<(), Box<dyn std::error::Error>> {
    let confirmations = config.network.confirmation_blocks;
    let deployer = move || Deployer::new(client, ArtifactStore::new(&config.artifacts), confirmations);

    match command {
        Commands::Accounts => {
            print_json(&session.accounts().await?)?;
        }
        Commands::Deploy { contract, params } => {
            let deployed = deployer().deploy(&contract, &parse_params(&params)?).await?;
            print_json(&json!({
                "contract": deployed.name,
                "address": deployed.address,
                "txHash": deployed.tx_hash,
                "blockNumber": deployed.block_number,
                "params": deployed.params,
            }))?;
        }
        Commands::DeployAndVerify { contract, params } => {
            let verifier =
                EtherscanVerifier::from_env(&config.verification, session.network().chain_id.0)?;
            let outcome = deployer()
                .deploy_and_verify(
                    &contract,
                    &parse_params(&params)?,
                    &verifier,
                    config.network.verify_confirmation_blocks,
                )
                .await?;
            let verification = match &outcome.verification {
                Ok(status) => json!({ "status": format!("{:?}", status) }),
                Err(e) => json!({ "status": "Failed", "reason": e.to_string() }),
            };
            print_json(&json!({
                "contract": outcome.contract.name,
                "address": outcome.contract.address,
                "txHash": outcome.contract.tx_hash,
                "blockNumber": outcome.contract.block_number,
                "params": outcome.contract.params,
                "verification": verification,
            }))?;
        }
        Commands::Mint {
            token,
            signer,
            to,
            amount,
        } => {
            let receipt = session
                .mint(MintArgs {
                    signer,
                    contract: token,
                    recipient: to,
                    amount,
                })
                .await;
            print_json(&receipt)?;
        }
        Commands::Delegate {
            token,
            signer,
            delegatee,
        } => {
            let receipt = session
                .delegate(DelegateArgs {
                    signer,
                    contract: token,
                    delegatee,
                })
                .await;
            print_json(&receipt)?;
        }
        Commands::CreateBallot {
            ballot,
            signer,
            name,
            proposals,
        } => {
            let receipt = session
                .new_ballot(NewBallotArgs {
                    signer,
                    contract: ballot,
                    name,
                    proposals,
                })
                .await;
            print_json(&receipt)?;
        }
        Commands::SetTargetBlock {
            ballot,
            signer,
            name,
            block,
        } => {
            let receipt = session
                .set_target_block(SetTargetBlockArgs {
                    signer,
                    contract: ballot,
                    name,
                    block_number: block,
                })
                .await;
            print_json(&receipt)?;
        }
        Commands::Vote {
            ballot,
            signer,
            name,
            proposal,
            amount,
        } => {
            let receipt = session
                .vote(VoteArgs {
                    signer,
                    contract: ballot,
                    ballot: name,
                    proposal,
                    amount,
                })
                .await;
            print_json(&receipt)?;
        }
        Commands::VotingPower {
            ballot,
            name,
            account,
        } => {
            let power = session.voting_power(ballot, &name, account).await?;
            print_json(&json!({ "account": account, "votingPower": power.to_string() }))?;
        }
        Commands::WinningProposal { ballot, name } => {
            print_json(&session.winning_proposal(ballot, &name).await?)?;
        }
        Commands::RunFullScenario { output } => {
            let mut runner = ScenarioRunner::new(session, deployer());
            let record = runner.run_and_persist(&output).await?;
            print_json(&record.winner)?;
        }
    }
    Ok(())
}
