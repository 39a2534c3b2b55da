use serde::{Deserialize, Serialize};

use crate::election::{CandidateId, ResetPolicy};
use crate::identity::Identity;

/// A mutating request against the ledger, on behalf of some caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddCandidate { name: String },
    RemoveCandidate { candidate_id: CandidateId },
    RegisterVoter { voter: Identity },
    StartElection,
    EndElection,
    CastVote { candidate_id: CandidateId },
    ResetElection { policy: ResetPolicy },
}

/// A state change that the ledger has accepted.
///
/// Events carry just enough to reproduce the change: applying the same events
/// in the same order to a fresh ledger always yields the same state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// Genesis: fixes the commissioner for the lifetime of the ledger.
    LedgerCreated { commissioner: Identity },
    CandidateAdded {
        candidate_id: CandidateId,
        name: String,
    },
    CandidateRemoved { candidate_id: CandidateId },
    VoterRegistered { voter: Identity },
    ElectionStarted,
    ElectionEnded,
    VoteCast {
        voter: Identity,
        candidate_id: CandidateId,
    },
    ElectionReset { round: u32, policy: ResetPolicy },
}

impl LedgerEvent {
    /// The caller and command that must have produced this event.
    ///
    /// Returns `None` for the genesis event, which no command produces.
    pub fn invocation(&self, commissioner: Identity) -> Option<(Identity, Command)> {
        let invocation = match self {
            Self::LedgerCreated { .. } => return None,
            Self::CandidateAdded { name, .. } => {
                (commissioner, Command::AddCandidate { name: name.clone() })
            }
            Self::CandidateRemoved { candidate_id } => (
                commissioner,
                Command::RemoveCandidate {
                    candidate_id: *candidate_id,
                },
            ),
            Self::VoterRegistered { voter } => {
                (commissioner, Command::RegisterVoter { voter: *voter })
            }
            Self::ElectionStarted => (commissioner, Command::StartElection),
            Self::ElectionEnded => (commissioner, Command::EndElection),
            Self::VoteCast {
                voter,
                candidate_id,
            } => (
                *voter,
                Command::CastVote {
                    candidate_id: *candidate_id,
                },
            ),
            Self::ElectionReset { policy, .. } => {
                (commissioner, Command::ResetElection { policy: *policy })
            }
        };
        Some(invocation)
    }

    /// Short name of the event, for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LedgerCreated { .. } => "ledger_created",
            Self::CandidateAdded { .. } => "candidate_added",
            Self::CandidateRemoved { .. } => "candidate_removed",
            Self::VoterRegistered { .. } => "voter_registered",
            Self::ElectionStarted => "election_started",
            Self::ElectionEnded => "election_ended",
            Self::VoteCast { .. } => "vote_cast",
            Self::ElectionReset { .. } => "election_reset",
        }
    }
}
