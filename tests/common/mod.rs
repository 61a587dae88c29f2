//! Shared utilities for integration testing: an in-memory ledger running
//! token and ballot semantics, and artifact fixtures.

#![allow(dead_code)]

use alloy::primitives::{keccak256, Address, Bytes, TxHash, B256, I256, U256};
use alloy::sol_types::SolInterface;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use ballot_ops::blockchain::{
    ChainId, Confirmation, ContractCall, Deployment, Ledger, LedgerError, LedgerResult,
    NetworkInfo, SignerPool,
};
use ballot_ops::config::ArtifactsConfig;
use ballot_ops::contracts::{IBallot::IBallotCalls, IVotesToken::IVotesTokenCalls};

/// Creation code prefixes recognised by the mock.
pub const TOKEN_BYTECODE: &str = "0x6001";
pub const BALLOT_BYTECODE: &str = "0x6002";

pub const OVER_BUDGET: &str = "Ballot: trying to vote more than allowed";
pub const ALREADY_EXISTED: &str = "Ballot: already existed";

#[derive(Debug, Default)]
struct BallotState {
    proposals: Vec<(B256, U256)>,
    spent: HashMap<Address, U256>,
    target_block: u64,
}

#[derive(Debug, Default)]
struct State {
    block: u64,
    nonce: u64,
    tokens: Vec<Address>,
    ballots: Vec<Address>,
    balances: HashMap<Address, U256>,
    delegates: HashMap<Address, Address>,
    groups: HashMap<B256, BallotState>,
    mined: HashMap<TxHash, u64>,
    deployments: Vec<Bytes>,
    sent: Vec<ContractCall>,
}

impl State {
    fn votes(&self, account: Address) -> U256 {
        self.delegates
            .iter()
            .filter(|(_, delegatee)| **delegatee == account)
            .map(|(holder, _)| self.balances.get(holder).copied().unwrap_or_default())
            .fold(U256::ZERO, |acc, b| acc + b)
    }

    fn voting_power(&self, name: B256, account: Address) -> U256 {
        let spent = self
            .groups
            .get(&name)
            .and_then(|g| g.spent.get(&account).copied())
            .unwrap_or_default();
        self.votes(account).saturating_sub(spent)
    }

    fn next_hash(&mut self) -> TxHash {
        self.nonce += 1;
        keccak256(self.nonce.to_be_bytes())
    }
}

fn revert(reason: &str) -> LedgerError {
    LedgerError::Reverted(reason.to_string())
}

fn word(value: U256) -> Vec<u8> {
    value.to_be_bytes::<32>().to_vec()
}

/// In-memory ledger with ERC20Votes-like delegation and ballot accounting.
pub struct MockLedger {
    network: NetworkInfo,
    signers: Vec<Address>,
    state: Mutex<State>,
    fail_sends: AtomicBool,
    drop_confirmations: AtomicBool,
    reported_winner: Mutex<Option<I256>>,
    proposal_reads: AtomicUsize,
}

impl MockLedger {
    /// A localhost ledger with `signers` identities.
    pub fn new(signers: usize) -> Self {
        Self::on_network("localhost", 31337, signers)
    }

    pub fn on_network(name: &str, chain_id: u64, signers: usize) -> Self {
        Self {
            network: NetworkInfo {
                name: name.to_string(),
                chain_id: ChainId(chain_id),
            },
            signers: (0..signers).map(|i| Address::repeat_byte(i as u8 + 1)).collect(),
            state: Mutex::new(State::default()),
            fail_sends: AtomicBool::new(false),
            drop_confirmations: AtomicBool::new(false),
            reported_winner: Mutex::new(None),
            proposal_reads: AtomicUsize::new(0),
        }
    }

    pub fn account(&self, index: usize) -> Address {
        self.signers[index]
    }

    /// Make every subsequent send fail before reaching the chain.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Apply sends but report no confirmation for them.
    pub fn drop_confirmations(&self, drop: bool) {
        self.drop_confirmations.store(drop, Ordering::SeqCst);
    }

    /// Answer `winningProposal` with `index` whatever the vote counts are.
    pub fn report_winner(&self, index: i64) {
        let index = I256::from_dec_str(&index.to_string()).unwrap();
        *self.reported_winner.lock().unwrap() = Some(index);
    }

    /// Number of `proposals(..)` reads served so far.
    pub fn proposal_reads(&self) -> usize {
        self.proposal_reads.load(Ordering::SeqCst)
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        let state = self.state.lock().unwrap();
        state.balances.get(&account).copied().unwrap_or_default()
    }

    pub fn votes_of(&self, account: Address) -> U256 {
        self.state.lock().unwrap().votes(account)
    }

    pub fn deployments(&self) -> Vec<Bytes> {
        self.state.lock().unwrap().deployments.clone()
    }

    pub fn sent(&self) -> Vec<ContractCall> {
        self.state.lock().unwrap().sent.clone()
    }

    fn execute(&self, state: &mut State, call: &ContractCall) -> LedgerResult<()> {
        if state.tokens.contains(&call.to) {
            let decoded = IVotesTokenCalls::abi_decode(&call.input)
                .map_err(|e| revert(&e.to_string()))?;
            match decoded {
                IVotesTokenCalls::mint(c) => {
                    *state.balances.entry(c.to).or_default() += c.amount;
                }
                IVotesTokenCalls::delegate(c) => {
                    state.delegates.insert(call.from, c.delegatee);
                }
                _ => return Err(revert("not a transaction")),
            }
            return Ok(());
        }

        if state.ballots.contains(&call.to) {
            let decoded =
                IBallotCalls::abi_decode(&call.input).map_err(|e| revert(&e.to_string()))?;
            match decoded {
                IBallotCalls::newBallot(c) => {
                    if state.groups.contains_key(&c.name) {
                        return Err(revert(ALREADY_EXISTED));
                    }
                    let group = BallotState {
                        proposals: c.proposals.iter().map(|p| (*p, U256::ZERO)).collect(),
                        spent: HashMap::new(),
                        target_block: state.block,
                    };
                    state.groups.insert(c.name, group);
                }
                IBallotCalls::setTargetBlockNumber(c) => {
                    let group = state
                        .groups
                        .get_mut(&c.name)
                        .ok_or_else(|| revert("Ballot: not found"))?;
                    group.target_block = c.blockNumber.to::<u64>();
                }
                IBallotCalls::vote(c) => {
                    let power = state.voting_power(c.name, call.from);
                    if c.amount > power {
                        return Err(revert(OVER_BUDGET));
                    }
                    let group = state
                        .groups
                        .get_mut(&c.name)
                        .ok_or_else(|| revert("Ballot: not found"))?;
                    let index = c.proposal.to::<usize>();
                    let proposal = group
                        .proposals
                        .get_mut(index)
                        .ok_or_else(|| revert("Ballot: invalid proposal"))?;
                    proposal.1 += c.amount;
                    *group.spent.entry(call.from).or_default() += c.amount;
                }
                _ => return Err(revert("not a transaction")),
            }
            return Ok(());
        }

        Err(revert("no contract at target address"))
    }

    fn query(&self, state: &State, to: Address, input: &[u8]) -> LedgerResult<Vec<u8>> {
        if state.tokens.contains(&to) {
            let decoded = IVotesTokenCalls::abi_decode(input).map_err(|e| revert(&e.to_string()))?;
            return match decoded {
                IVotesTokenCalls::balanceOf(c) => {
                    Ok(word(state.balances.get(&c.account).copied().unwrap_or_default()))
                }
                IVotesTokenCalls::getVotes(c) => Ok(word(state.votes(c.account))),
                _ => Err(revert("not a view")),
            };
        }

        if state.ballots.contains(&to) {
            let decoded = IBallotCalls::abi_decode(input).map_err(|e| revert(&e.to_string()))?;
            return match decoded {
                IBallotCalls::votingPower(c) => Ok(word(state.voting_power(c.name, c.account))),
                IBallotCalls::proposals(c) => {
                    self.proposal_reads.fetch_add(1, Ordering::SeqCst);
                    let (name, count) = state
                        .groups
                        .get(&c.ballot)
                        .and_then(|g| g.proposals.get(c.index.to::<usize>()))
                        .copied()
                        .ok_or_else(|| revert("Ballot: invalid proposal"))?;
                    let mut out = name.to_vec();
                    out.extend(word(count));
                    Ok(out)
                }
                IBallotCalls::winningProposal(c) => {
                    if let Some(index) = *self.reported_winner.lock().unwrap() {
                        return Ok(index.to_be_bytes::<32>().to_vec());
                    }
                    let winner = state
                        .groups
                        .get(&c.name)
                        .and_then(|g| {
                            g.proposals
                                .iter()
                                .enumerate()
                                .filter(|(_, (_, count))| !count.is_zero())
                                .max_by(|(ia, (_, a)), (ib, (_, b))| a.cmp(b).then(ib.cmp(ia)))
                                .map(|(i, _)| I256::from_raw(U256::from(i)))
                        })
                        .unwrap_or(I256::MINUS_ONE);
                    Ok(winner.to_be_bytes::<32>().to_vec())
                }
                IBallotCalls::winnerName(c) => {
                    let name = state
                        .groups
                        .get(&c.name)
                        .and_then(|g| g.proposals.iter().max_by_key(|(_, count)| *count))
                        .map(|(name, _)| *name)
                        .unwrap_or_default();
                    Ok(name.to_vec())
                }
                _ => Err(revert("not a view")),
            };
        }

        Err(revert("no contract at target address"))
    }
}

impl Ledger for MockLedger {
    async fn network(&self) -> LedgerResult<NetworkInfo> {
        Ok(self.network.clone())
    }

    async fn signers(&self) -> LedgerResult<SignerPool> {
        Ok(SignerPool::new(self.signers.clone()))
    }

    async fn deploy(
        &self,
        from: Address,
        init_code: Bytes,
        _confirmations: u64,
    ) -> LedgerResult<Deployment> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(LedgerError::Rpc("connection refused".to_string()));
        }

        let mut state = self.state.lock().unwrap();
        let address = from.create(state.nonce);
        if init_code.starts_with(&[0x60, 0x01]) {
            state.tokens.push(address);
        } else if init_code.starts_with(&[0x60, 0x02]) {
            state.ballots.push(address);
        } else {
            return Err(revert("invalid opcode"));
        }

        let tx_hash = state.next_hash();
        state.block += 1;
        let block_number = state.block;
        state.mined.insert(tx_hash, block_number);
        state.deployments.push(init_code);

        Ok(Deployment {
            address,
            tx_hash,
            block_number,
        })
    }

    async fn send(
        &self,
        call: ContractCall,
        _confirmations: u64,
    ) -> LedgerResult<Option<Confirmation>> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(LedgerError::Rpc("connection refused".to_string()));
        }

        let mut state = self.state.lock().unwrap();
        self.execute(&mut state, &call)?;

        let tx_hash = state.next_hash();
        state.block += 1;
        let block_number = state.block;
        state.mined.insert(tx_hash, block_number);
        state.sent.push(call);

        if self.drop_confirmations.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(Confirmation {
            tx_hash,
            block_number,
        }))
    }

    async fn read(&self, to: Address, input: Bytes) -> LedgerResult<Bytes> {
        let state = self.state.lock().unwrap();
        self.query(&state, to, &input).map(Bytes::from)
    }

    async fn wait_for_confirmations(
        &self,
        tx_hash: TxHash,
        _confirmations: u64,
    ) -> LedgerResult<Option<Confirmation>> {
        let state = self.state.lock().unwrap();
        Ok(state.mined.get(&tx_hash).map(|block_number| Confirmation {
            tx_hash,
            block_number: *block_number,
        }))
    }
}

fn write_json(path: &Path, value: &Value) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

/// Hardhat-style artifacts for Token and Ballot, plus build info for Ballot.
pub fn artifacts_dir() -> (tempfile::TempDir, ArtifactsConfig) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write_json(
        &root.join("contracts/Token.sol/Token.json"),
        &json!({
            "contractName": "Token",
            "sourceName": "contracts/Token.sol",
            "abi": [],
            "bytecode": TOKEN_BYTECODE
        }),
    );
    write_json(
        &root.join("contracts/Ballot.sol/Ballot.json"),
        &json!({
            "contractName": "Ballot",
            "sourceName": "contracts/Ballot.sol",
            "abi": [{
                "type": "constructor",
                "stateMutability": "nonpayable",
                "inputs": [{ "name": "token", "type": "address", "internalType": "address" }]
            }],
            "bytecode": BALLOT_BYTECODE
        }),
    );
    write_json(
        &root.join("contracts/Ballot.sol/Ballot.dbg.json"),
        &json!({
            "_format": "hh-sol-dbg-1",
            "buildInfo": "../../build-info/ballot.json"
        }),
    );
    write_json(
        &root.join("build-info/ballot.json"),
        &json!({
            "solcLongVersion": "0.8.24+commit.e11b9ed9",
            "input": { "language": "Solidity", "sources": {} }
        }),
    );

    let config = ArtifactsConfig {
        dir: root.to_string_lossy().into_owned(),
        compile_command: Vec::new(),
    };
    (dir, config)
}

/// Deploy a token and a ballot directly on the mock.
pub async fn deploy_pair(ledger: &MockLedger) -> (Address, Address) {
    let owner = ledger.account(0);
    let token = ledger
        .deploy(owner, TOKEN_BYTECODE.parse().unwrap(), 1)
        .await
        .unwrap()
        .address;
    let ballot = ledger
        .deploy(owner, BALLOT_BYTECODE.parse().unwrap(), 1)
        .await
        .unwrap()
        .address;
    (token, ballot)
}
