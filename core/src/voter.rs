use serde::{Deserialize, Serialize};

use crate::election::CandidateId;

/// A voter's standing in the current election.
///
/// The all-false record is what an unknown identity looks like.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoterRecord {
    pub registered: bool,
    pub has_voted: bool,
    /// The candidate voted for, or 0 if no vote has been cast.
    pub voted_candidate_id: CandidateId,
}

impl VoterRecord {
    /// A freshly registered voter who has not voted.
    pub fn registered() -> Self {
        Self {
            registered: true,
            ..Self::default()
        }
    }

    /// Record a vote. Only ever called once per record per round.
    pub(crate) fn record_vote(&mut self, candidate_id: CandidateId) {
        self.has_voted = true;
        self.voted_candidate_id = candidate_id;
    }

    /// Forget the vote from a previous round, keeping the registration.
    pub(crate) fn clear_vote(&mut self) {
        self.has_voted = false;
        self.voted_candidate_id = 0;
    }
}
