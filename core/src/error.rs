use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A precondition violation detected by the election state machine.
///
/// Whenever one of these is returned, the ledger has not been modified.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum ElectionError {
    #[error("caller is not the commissioner")]
    Unauthorized,
    #[error("election is active; administration is frozen")]
    ElectionActive,
    #[error("election is already active")]
    AlreadyActive,
    #[error("election is not active")]
    NotActive,
    #[error("election is still active; no result yet")]
    ElectionStillActive,
    #[error("caller is not a registered voter")]
    NotRegistered,
    #[error("voter is already registered")]
    AlreadyRegistered,
    #[error("voter has already voted")]
    AlreadyVoted,
    #[error("no active candidate with that ID")]
    InvalidCandidate,
    #[error("candidate not found")]
    NotFound,
    #[error("candidate name must be between 1 and {} characters", crate::MAX_NAME_LEN)]
    InvalidName,
    #[error("identity cannot be registered as a voter")]
    InvalidIdentity,
    #[error("there are no active candidates")]
    NoCandidates,
    #[error("no votes have been cast")]
    NoVotesCast,
}

impl ElectionError {
    /// Is this a lifecycle error, i.e. the operation was attempted in the wrong state?
    pub fn is_invalid_state_transition(&self) -> bool {
        matches!(
            self,
            Self::ElectionActive | Self::AlreadyActive | Self::NotActive | Self::ElectionStillActive
        )
    }
}

/// Reasons a journal fails to verify or replay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JournalError {
    #[error("journal is empty or does not start with a genesis entry")]
    MissingGenesis,
    #[error("entry {seq} is a second genesis entry")]
    UnexpectedGenesis { seq: u64 },
    #[error("expected entry {expected}, found entry {found}")]
    SequenceGap { expected: u64, found: u64 },
    #[error("entry {seq} does not link to the digest of its predecessor")]
    BrokenLink { seq: u64 },
    #[error("entry {seq} has an incorrect digest")]
    BadDigest { seq: u64 },
    #[error("entry {seq} would have been rejected: {error}")]
    Rejected { seq: u64, error: ElectionError },
    #[error("entry {seq} does not match what the ledger would have recorded")]
    Forged { seq: u64 },
}
