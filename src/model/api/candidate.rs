use ledger_core::{Candidate, CandidateId};
use serde::{Deserialize, Serialize};

/// A candidate to be admitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSpec {
    pub name: String,
}

/// API-friendly representation of a candidate and their tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDesc {
    pub id: CandidateId,
    pub name: String,
    pub vote_count: u64,
}

impl From<&Candidate> for CandidateDesc {
    fn from(candidate: &Candidate) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name.clone(),
            vote_count: candidate.vote_count,
        }
    }
}
