//! Ballot executors and queries.

use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::SolCall;
use std::time::Instant;

use crate::actions::receipt::{Action, ActionParams, ProposalRef, Receipt, WinnerSummary};
use crate::actions::{ActionError, ActionResult, Session};
use crate::blockchain::Ledger;
use crate::contracts::{decode_name, encode_name, IBallot};

#[derive(Debug, Clone)]
pub struct NewBallotArgs {
    pub signer: Option<Address>,
    pub contract: Address,
    pub name: String,
    pub proposals: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SetTargetBlockArgs {
    pub signer: Option<Address>,
    pub contract: Address,
    pub name: String,
    pub block_number: u64,
}

#[derive(Debug, Clone)]
pub struct VoteArgs {
    pub signer: Option<Address>,
    pub contract: Address,
    /// Ballot (group) name.
    pub ballot: String,
    /// Proposal index within the ballot.
    pub proposal: u64,
    pub amount: U256,
}

fn vote_summary(proposal: &str, amount: U256) -> String {
    format!("Voted {} with {}.", proposal, amount)
}

impl<'a, L: Ledger> Session<'a, L> {
    /// Create a ballot with the given proposals.
    pub async fn new_ballot(&self, args: NewBallotArgs) -> Receipt {
        let started = Instant::now();
        let params = ActionParams::NewBallot {
            name: args.name.clone(),
            proposals: args.proposals.clone(),
        };

        let signer = match self.resolve_signer(args.signer).await {
            Ok(signer) => signer,
            Err(e) => {
                let from = args.signer.unwrap_or_default();
                let receipt =
                    Receipt::failed(Action::NewBallot, from, args.contract, params, e.to_string());
                return self.finish(receipt, started);
            }
        };

        tracing::info!(name = %args.name, proposals = ?args.proposals, "Creating new ballot...");

        let encoded = encode_name(&args.name).and_then(|name| {
            let proposals = args
                .proposals
                .iter()
                .map(|p| encode_name(p))
                .collect::<Result<Vec<_>, _>>()?;
            Ok((name, proposals))
        });
        let (name, proposals) = match encoded {
            Ok(encoded) => encoded,
            Err(e) => {
                let receipt =
                    Receipt::failed(Action::NewBallot, signer, args.contract, params, e.to_string());
                return self.finish(receipt, started);
            }
        };

        let input = IBallot::newBallotCall { name, proposals }.abi_encode();
        let receipt = self
            .submit(Action::NewBallot, signer, args.contract, params, input, started)
            .await;
        if receipt.hash().is_some() {
            tracing::info!("Ballot is created.");
        }
        receipt
    }

    /// Set the block whose voting power snapshot the ballot uses.
    pub async fn set_target_block(&self, args: SetTargetBlockArgs) -> Receipt {
        let started = Instant::now();
        let params = ActionParams::SetTargetBlock {
            name: args.name.clone(),
            block_number: args.block_number,
        };

        let signer = match self.resolve_signer(args.signer).await {
            Ok(signer) => signer,
            Err(e) => {
                let from = args.signer.unwrap_or_default();
                let receipt = Receipt::failed(
                    Action::SetTargetBlock,
                    from,
                    args.contract,
                    params,
                    e.to_string(),
                );
                return self.finish(receipt, started);
            }
        };

        let name = match encode_name(&args.name) {
            Ok(name) => name,
            Err(e) => {
                let receipt = Receipt::failed(
                    Action::SetTargetBlock,
                    signer,
                    args.contract,
                    params,
                    e.to_string(),
                );
                return self.finish(receipt, started);
            }
        };

        let input = IBallot::setTargetBlockNumberCall {
            name,
            blockNumber: U256::from(args.block_number),
        }
        .abi_encode();
        self.submit(Action::SetTargetBlock, signer, args.contract, params, input, started)
            .await
    }

    /// Cast `amount` of the signer's voting power for one proposal.
    pub async fn vote(&self, args: VoteArgs) -> Receipt {
        let started = Instant::now();
        let mut params = ActionParams::Vote {
            name: args.ballot.clone(),
            amount: args.amount,
            proposal: None,
        };

        let signer = match self.resolve_signer(args.signer).await {
            Ok(signer) => signer,
            Err(e) => {
                let from = args.signer.unwrap_or_default();
                let receipt = Receipt::failed(Action::Vote, from, args.contract, params, e.to_string());
                return self.finish(receipt, started);
            }
        };

        let prepared = self.prepare_vote(signer, &args).await;
        let (ballot, proposal_name) = match prepared {
            Ok((ballot, proposal)) => {
                let proposal_name = proposal.name.clone();
                params = ActionParams::Vote {
                    name: args.ballot.clone(),
                    amount: args.amount,
                    proposal: Some(proposal),
                };
                (ballot, proposal_name)
            }
            Err(e) => {
                let receipt =
                    Receipt::failed(Action::Vote, signer, args.contract, params, e.to_string());
                return self.finish(receipt, started);
            }
        };

        let input = IBallot::voteCall {
            name: ballot,
            proposal: U256::from(args.proposal),
            amount: args.amount,
        }
        .abi_encode();
        let receipt = self
            .submit(Action::Vote, signer, args.contract, params, input, started)
            .await;
        if receipt.hash().is_some() {
            tracing::info!(proposal = args.proposal, "{}", vote_summary(&proposal_name, args.amount));
        }
        receipt
    }

    /// Read the proposal being voted for and the signer's remaining power.
    async fn prepare_vote(
        &self,
        signer: Address,
        args: &VoteArgs,
    ) -> ActionResult<(B256, ProposalRef)> {
        let ballot = encode_name(&args.ballot)?;

        let proposal = self
            .query(
                args.contract,
                IBallot::proposalsCall {
                    ballot,
                    index: U256::from(args.proposal),
                },
            )
            .await?;
        let proposal = ProposalRef {
            name: decode_name(proposal.name)?,
            index: args.proposal,
        };

        let power = self
            .query(
                args.contract,
                IBallot::votingPowerCall {
                    name: ballot,
                    account: signer,
                },
            )
            .await?;
        tracing::info!(voter = %signer, voting_power = %power, proposal = %proposal.name, "Casting vote");

        Ok((ballot, proposal))
    }

    /// Remaining voting power of `account` in a ballot.
    pub async fn voting_power(
        &self,
        contract: Address,
        ballot: &str,
        account: Address,
    ) -> ActionResult<U256> {
        let name = encode_name(ballot)?;
        let power = self
            .query(contract, IBallot::votingPowerCall { name, account })
            .await?;
        tracing::info!(account = %account, voting_power = %power, "Voting power");
        Ok(power)
    }

    /// Current winner of a ballot, or the sentinel when nobody has votes.
    pub async fn winning_proposal(
        &self,
        contract: Address,
        ballot: &str,
    ) -> ActionResult<WinnerSummary> {
        let name = encode_name(ballot)?;
        let index = self
            .query(contract, IBallot::winningProposalCall { name })
            .await?;
        if index.is_negative() {
            return Ok(WinnerSummary::none());
        }
        let index = u64::try_from(index.into_raw())
            .map_err(|_| ActionError::IndexOutOfRange(index.to_string()))?;

        let proposal = self
            .query(
                contract,
                IBallot::proposalsCall {
                    ballot: name,
                    index: U256::from(index),
                },
            )
            .await?;
        if proposal.voteCount.is_zero() {
            return Ok(WinnerSummary::none());
        }

        let winner = WinnerSummary::proposal(decode_name(proposal.name)?, index, proposal.voteCount);
        tracing::info!(winner = %winner.name, total_vote = %winner.total_vote, "Winner");
        Ok(winner)
    }
}
