use ledger_core::{AuditEntry, CandidateId, Digest, Identity};
use serde::{Deserialize, Serialize};

/// The vote a caller wishes to cast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteSpec {
    pub candidate_id: CandidateId,
}

/// Proof that a vote made it into the journal.
///
/// The voter can later check that the published journal contains an entry
/// with this sequence number and digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub voter: Identity,
    pub candidate_id: CandidateId,
    pub seq: u64,
    pub digest: Digest,
}

impl VoteReceipt {
    /// A receipt for the vote recorded by `entry`.
    pub fn new(voter: Identity, candidate_id: CandidateId, entry: &AuditEntry) -> Self {
        Self {
            voter,
            candidate_id,
            seq: entry.seq,
            digest: entry.digest,
        }
    }
}
