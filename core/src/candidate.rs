use serde::{Deserialize, Serialize};

use crate::election::{CandidateId, MAX_NAME_LEN};

/// A candidate and their running tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub vote_count: u64,
}

impl Candidate {
    pub fn new(id: CandidateId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            vote_count: 0,
        }
    }
}

/// Is this an acceptable candidate name?
pub fn valid_name(name: &str) -> bool {
    let len = name.chars().count();
    (1..=MAX_NAME_LEN).contains(&len)
}

/// A candidate record in the dense candidate list.
///
/// Retired candidates are soft-deleted: they keep their ID and tally for audit
/// purposes but are invisible to enumeration, lookup and the winner scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CandidateSlot {
    Active(Candidate),
    Retired(Candidate),
}

impl CandidateSlot {
    pub fn candidate(&self) -> &Candidate {
        match self {
            Self::Active(candidate) | Self::Retired(candidate) => candidate,
        }
    }

    pub fn candidate_mut(&mut self) -> &mut Candidate {
        match self {
            Self::Active(candidate) | Self::Retired(candidate) => candidate,
        }
    }

    /// The candidate, if still active.
    pub fn active(&self) -> Option<&Candidate> {
        match self {
            Self::Active(candidate) => Some(candidate),
            Self::Retired(_) => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    /// Soft-delete this candidate. Retiring twice is a no-op.
    pub fn retire(&mut self) {
        if let Self::Active(candidate) = self {
            *self = Self::Retired(std::mem::replace(candidate, Candidate::new(0, "")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_bounds() {
        assert!(!valid_name(""));
        assert!(valid_name("A"));
        assert!(valid_name(&"x".repeat(MAX_NAME_LEN)));
        assert!(!valid_name(&"x".repeat(MAX_NAME_LEN + 1)));
        // Counted in characters, not bytes.
        assert!(valid_name(&"é".repeat(MAX_NAME_LEN)));
    }

    #[test]
    fn retire_keeps_tally() {
        let mut slot = CandidateSlot::Active(Candidate {
            id: 3,
            name: "Carol".to_string(),
            vote_count: 4,
        });
        assert!(slot.active().is_some());

        slot.retire();
        assert!(!slot.is_active());
        assert!(slot.active().is_none());
        assert_eq!(slot.candidate().id, 3);
        assert_eq!(slot.candidate().name, "Carol");
        assert_eq!(slot.candidate().vote_count, 4);

        slot.retire();
        assert_eq!(slot.candidate().vote_count, 4);
    }
}
