//! On-chain contract surface: ABI bindings and the fixed-width name codec.
//!
//! Vote accounting, delegation snapshots and winner selection happen inside
//! these contracts. This crate only encodes calls and decodes results.

pub mod artifacts;

use alloy::primitives::B256;
use alloy::sol;
use thiserror::Error;

sol! {
    /// ERC20Votes governance token.
    #[derive(Debug)]
    interface IVotesToken {
        function mint(address to, uint256 amount) external;
        function delegate(address delegatee) external;
        function balanceOf(address account) external view returns (uint256);
        function getVotes(address account) external view returns (uint256);
    }

    /// Token-weighted ballot contract.
    #[derive(Debug)]
    interface IBallot {
        function newBallot(bytes32 name, bytes32[] proposals) external;
        function setTargetBlockNumber(bytes32 name, uint256 blockNumber) external;
        function vote(bytes32 name, uint256 proposal, uint256 amount) external;
        function votingPower(bytes32 name, address account) external view returns (uint256);
        function proposals(bytes32 ballot, uint256 index) external view returns (bytes32 name, uint256 voteCount);
        function winningProposal(bytes32 name) external view returns (int256);
        function winnerName(bytes32 name) external view returns (bytes32);
    }
}

/// Contract name of the governance token artifact.
pub const TOKEN_CONTRACT: &str = "Token";

/// Contract name of the ballot artifact.
pub const BALLOT_CONTRACT: &str = "Ballot";

/// Errors from the `bytes32` string codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("name '{0}' does not fit in bytes32 (at most 31 bytes)")]
    TooLong(String),

    #[error("bytes32 value is not valid UTF-8")]
    InvalidUtf8,
}

/// Encode a human-readable name as a zero-terminated `bytes32` string.
pub fn encode_name(name: &str) -> Result<B256, NameError> {
    let bytes = name.as_bytes();
    if bytes.len() > 31 {
        return Err(NameError::TooLong(name.to_string()));
    }

    let mut word = [0u8; 32];
    word[..bytes.len()].copy_from_slice(bytes);
    Ok(B256::from(word))
}

/// Decode a `bytes32` string, stopping at the first zero byte.
pub fn decode_name(word: B256) -> Result<String, NameError> {
    let end = word.iter().position(|b| *b == 0).unwrap_or(32);
    std::str::from_utf8(&word[..end])
        .map(str::to_string)
        .map_err(|_| NameError::InvalidUtf8)
}
