use ledger_core::{CandidateId, Identity, VoterRecord};
use serde::{Deserialize, Serialize};

/// A voter to be registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterSpec {
    pub identity: Identity,
}

/// A voter's public standing. Unknown identities are reported as unregistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterInfo {
    pub identity: Identity,
    pub registered: bool,
    pub has_voted: bool,
    /// Zero if no vote has been cast.
    pub voted_candidate_id: CandidateId,
}

impl VoterInfo {
    pub fn new(identity: Identity, record: VoterRecord) -> Self {
        Self {
            identity,
            registered: record.registered,
            has_voted: record.has_voted,
            voted_candidate_id: record.voted_candidate_id,
        }
    }
}
