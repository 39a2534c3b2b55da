use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::candidate::{valid_name, Candidate, CandidateSlot};
use crate::election::{CandidateId, CandidateReset, ElectionStatus, ResetPolicy, VoterReset};
use crate::error::ElectionError;
use crate::event::{Command, LedgerEvent};
use crate::identity::Identity;
use crate::voter::VoterRecord;

pub type Result<T> = std::result::Result<T, ElectionError>;

/// The complete state of a single election, owned by a single commissioner.
///
/// Every mutation goes through [`Ledger::check`], which validates all
/// preconditions and returns the resulting event without touching any state,
/// followed by [`Ledger::apply`], which cannot fail. This split is what lets
/// callers persist an event before it takes effect, and lets a journal be
/// replayed and re-validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    commissioner: Identity,
    status: ElectionStatus,
    round: u32,
    /// Candidate `id` lives at index `id - 1`.
    candidates: Vec<CandidateSlot>,
    voters: BTreeMap<Identity, VoterRecord>,
    total_votes: u64,
}

/// Summary of the election, as reported by [`Ledger::status`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub active: bool,
    pub candidate_count: u32,
    pub total_votes: u64,
    pub commissioner: Identity,
    pub round: u32,
}

impl Ledger {
    /// Create an empty, inactive ledger administered by `commissioner`.
    pub fn new(commissioner: Identity) -> Self {
        Self {
            commissioner,
            status: ElectionStatus::Inactive,
            round: 1,
            candidates: Vec::new(),
            voters: BTreeMap::new(),
            total_votes: 0,
        }
    }

    pub fn commissioner(&self) -> Identity {
        self.commissioner
    }

    pub fn election_status(&self) -> ElectionStatus {
        self.status
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn total_votes(&self) -> u64 {
        self.total_votes
    }

    /// Number of candidate IDs allocated, including retired candidates.
    pub fn candidate_count(&self) -> u32 {
        // IDs are `u32` and allocated one at a time, so this always fits.
        self.candidates.len() as u32
    }

    /// Validate `command` from `caller` and return the event it would produce.
    ///
    /// Never modifies the ledger.
    pub fn check(&self, caller: Identity, command: Command) -> Result<LedgerEvent> {
        match command {
            Command::AddCandidate { name } => {
                self.require_commissioner(caller)?;
                self.require_inactive()?;
                if !valid_name(&name) {
                    return Err(ElectionError::InvalidName);
                }
                Ok(LedgerEvent::CandidateAdded {
                    candidate_id: self.candidate_count() + 1,
                    name,
                })
            }
            Command::RemoveCandidate { candidate_id } => {
                self.require_commissioner(caller)?;
                self.require_inactive()?;
                self.active_candidate(candidate_id)
                    .ok_or(ElectionError::InvalidCandidate)?;
                Ok(LedgerEvent::CandidateRemoved { candidate_id })
            }
            Command::RegisterVoter { voter } => {
                self.require_commissioner(caller)?;
                if voter.is_null() || voter == self.commissioner {
                    return Err(ElectionError::InvalidIdentity);
                }
                if self.voter_info(voter).registered {
                    return Err(ElectionError::AlreadyRegistered);
                }
                Ok(LedgerEvent::VoterRegistered { voter })
            }
            Command::StartElection => {
                self.require_commissioner(caller)?;
                if self.status.is_active() {
                    return Err(ElectionError::AlreadyActive);
                }
                if self.candidates().next().is_none() {
                    return Err(ElectionError::NoCandidates);
                }
                Ok(LedgerEvent::ElectionStarted)
            }
            Command::EndElection => {
                self.require_commissioner(caller)?;
                if !self.status.is_active() {
                    return Err(ElectionError::NotActive);
                }
                Ok(LedgerEvent::ElectionEnded)
            }
            Command::CastVote { candidate_id } => {
                if !self.status.is_active() {
                    return Err(ElectionError::NotActive);
                }
                let record = self.voter_info(caller);
                if !record.registered {
                    return Err(ElectionError::NotRegistered);
                }
                if record.has_voted {
                    return Err(ElectionError::AlreadyVoted);
                }
                self.active_candidate(candidate_id)
                    .ok_or(ElectionError::InvalidCandidate)?;
                Ok(LedgerEvent::VoteCast {
                    voter: caller,
                    candidate_id,
                })
            }
            Command::ResetElection { policy } => {
                self.require_commissioner(caller)?;
                self.require_inactive()?;
                Ok(LedgerEvent::ElectionReset {
                    round: self.round + 1,
                    policy,
                })
            }
        }
    }

    /// Apply an event previously produced by [`Ledger::check`] against this exact state.
    pub fn apply(&mut self, event: &LedgerEvent) {
        match event {
            LedgerEvent::LedgerCreated { .. } => {}
            LedgerEvent::CandidateAdded { candidate_id, name } => {
                debug_assert_eq!(*candidate_id, self.candidate_count() + 1);
                self.candidates
                    .push(CandidateSlot::Active(Candidate::new(*candidate_id, name)));
            }
            LedgerEvent::CandidateRemoved { candidate_id } => {
                if let Some(slot) = self.slot_mut(*candidate_id) {
                    slot.retire();
                }
            }
            LedgerEvent::VoterRegistered { voter } => {
                self.voters.insert(*voter, VoterRecord::registered());
            }
            LedgerEvent::ElectionStarted => self.status = ElectionStatus::Active,
            LedgerEvent::ElectionEnded => self.status = ElectionStatus::Inactive,
            LedgerEvent::VoteCast {
                voter,
                candidate_id,
            } => {
                self.voters
                    .entry(*voter)
                    .or_insert_with(VoterRecord::registered)
                    .record_vote(*candidate_id);
                if let Some(slot) = self.slot_mut(*candidate_id) {
                    slot.candidate_mut().vote_count += 1;
                }
                self.total_votes += 1;
            }
            LedgerEvent::ElectionReset { round, policy } => {
                match policy.candidates {
                    CandidateReset::Clear => self.candidates.clear(),
                    CandidateReset::ZeroCounts => {
                        for slot in &mut self.candidates {
                            slot.candidate_mut().vote_count = 0;
                        }
                    }
                }
                match policy.voters {
                    VoterReset::KeepRegistered => {
                        for record in self.voters.values_mut() {
                            record.clear_vote();
                        }
                    }
                    VoterReset::Clear => self.voters.clear(),
                }
                self.total_votes = 0;
                self.round = *round;
            }
        }
    }

    /// Validate and apply `command` in one step.
    pub fn execute(&mut self, caller: Identity, command: Command) -> Result<LedgerEvent> {
        let event = self.check(caller, command)?;
        self.apply(&event);
        Ok(event)
    }

    pub fn add_candidate(&mut self, caller: Identity, name: impl Into<String>) -> Result<CandidateId> {
        let name = name.into();
        match self.execute(caller, Command::AddCandidate { name })? {
            LedgerEvent::CandidateAdded { candidate_id, .. } => Ok(candidate_id),
            _ => unreachable!("adding a candidate always yields `CandidateAdded`"),
        }
    }

    pub fn remove_candidate(&mut self, caller: Identity, candidate_id: CandidateId) -> Result<()> {
        self.execute(caller, Command::RemoveCandidate { candidate_id })
            .map(drop)
    }

    pub fn register_voter(&mut self, caller: Identity, voter: Identity) -> Result<()> {
        self.execute(caller, Command::RegisterVoter { voter })
            .map(drop)
    }

    pub fn start_election(&mut self, caller: Identity) -> Result<()> {
        self.execute(caller, Command::StartElection).map(drop)
    }

    pub fn end_election(&mut self, caller: Identity) -> Result<()> {
        self.execute(caller, Command::EndElection).map(drop)
    }

    pub fn cast_vote(&mut self, caller: Identity, candidate_id: CandidateId) -> Result<()> {
        self.execute(caller, Command::CastVote { candidate_id })
            .map(drop)
    }

    pub fn reset_election(&mut self, caller: Identity, policy: ResetPolicy) -> Result<()> {
        self.execute(caller, Command::ResetElection { policy })
            .map(drop)
    }

    /// Look up an active candidate.
    pub fn candidate(&self, candidate_id: CandidateId) -> Result<&Candidate> {
        self.active_candidate(candidate_id)
            .ok_or(ElectionError::NotFound)
    }

    /// All active candidates, in ascending ID order.
    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> + '_ {
        self.candidates.iter().filter_map(CandidateSlot::active)
    }

    /// Every candidate slot ever allocated this round, retired or not.
    pub fn slots(&self) -> &[CandidateSlot] {
        &self.candidates
    }

    /// The voter's record; unknown identities get the all-false record.
    pub fn voter_info(&self, voter: Identity) -> VoterRecord {
        self.voters.get(&voter).copied().unwrap_or_default()
    }

    /// All known voter records, ordered by identity.
    pub fn voters(&self) -> impl Iterator<Item = (&Identity, &VoterRecord)> + '_ {
        self.voters.iter()
    }

    /// The active candidate with the most votes, ties going to the lowest ID.
    pub fn winner(&self) -> Result<&Candidate> {
        if self.status.is_active() {
            return Err(ElectionError::ElectionStillActive);
        }
        if self.total_votes == 0 {
            return Err(ElectionError::NoVotesCast);
        }
        let mut winner = None;
        let mut max_votes = 0;
        for candidate in self.candidates() {
            if candidate.vote_count > max_votes {
                max_votes = candidate.vote_count;
                winner = Some(candidate);
            }
        }
        // Every vote may have gone to candidates that were retired afterwards.
        winner.ok_or(ElectionError::NoVotesCast)
    }

    pub fn status(&self) -> StatusSummary {
        StatusSummary {
            active: self.status.is_active(),
            candidate_count: self.candidate_count(),
            total_votes: self.total_votes,
            commissioner: self.commissioner,
            round: self.round,
        }
    }

    /// Check the structural invariants, returning a description of the first violation.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        for (index, slot) in self.candidates.iter().enumerate() {
            let expected = index as CandidateId + 1;
            if slot.candidate().id != expected {
                return Err(format!(
                    "candidate slot {expected} holds candidate {}",
                    slot.candidate().id
                ));
            }
        }

        let tallied: u64 = self
            .candidates
            .iter()
            .map(|slot| slot.candidate().vote_count)
            .sum();
        if tallied != self.total_votes {
            return Err(format!(
                "candidates hold {tallied} votes but the total is {}",
                self.total_votes
            ));
        }

        let mut voted = 0;
        for (identity, record) in &self.voters {
            if !record.has_voted {
                continue;
            }
            voted += 1;
            if !record.registered {
                return Err(format!("{identity} voted without being registered"));
            }
            if record.voted_candidate_id == 0
                || record.voted_candidate_id > self.candidate_count()
            {
                return Err(format!(
                    "{identity} voted for unknown candidate {}",
                    record.voted_candidate_id
                ));
            }
        }
        if voted != self.total_votes {
            return Err(format!(
                "{voted} voters have voted but the total is {}",
                self.total_votes
            ));
        }

        Ok(())
    }

    fn require_commissioner(&self, caller: Identity) -> Result<()> {
        if caller == self.commissioner {
            Ok(())
        } else {
            Err(ElectionError::Unauthorized)
        }
    }

    fn require_inactive(&self) -> Result<()> {
        if self.status.is_active() {
            Err(ElectionError::ElectionActive)
        } else {
            Ok(())
        }
    }

    fn active_candidate(&self, candidate_id: CandidateId) -> Option<&Candidate> {
        let index = usize::try_from(candidate_id).ok()?.checked_sub(1)?;
        self.candidates.get(index).and_then(CandidateSlot::active)
    }

    fn slot_mut(&mut self, candidate_id: CandidateId) -> Option<&mut CandidateSlot> {
        let index = usize::try_from(candidate_id).ok()?.checked_sub(1)?;
        self.candidates.get_mut(index)
    }
}
