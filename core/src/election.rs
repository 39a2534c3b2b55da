use serde::{Deserialize, Serialize};

/// Candidate IDs are dense, 1-based integers. Zero means "no candidate".
pub type CandidateId = u32;

/// Maximum length of a candidate name, in characters.
pub const MAX_NAME_LEN: usize = 50;

/// States in the election lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ElectionStatus {
    /// Administration is open, voting is closed.
    #[default]
    Inactive,
    /// Voting is open, administration is frozen.
    Active,
}

impl ElectionStatus {
    pub fn is_active(&self) -> bool {
        *self == Self::Active
    }
}

/// What a reset does to the candidate list.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateReset {
    /// Drop every candidate record; IDs start again from 1.
    #[default]
    Clear,
    /// Keep every candidate record but zero their vote counts.
    ZeroCounts,
}

/// What a reset does to the voter registry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoterReset {
    /// Voters stay registered, but their vote from the previous round is cleared.
    #[default]
    KeepRegistered,
    /// Empty the registry; voters must be registered again.
    Clear,
}

/// How [`crate::Ledger::reset_election`] treats existing records.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResetPolicy {
    pub candidates: CandidateReset,
    pub voters: VoterReset,
}
