//! The append-only journal of accepted events.
//!
//! Each entry commits to its predecessor through a SHA-256 digest, so editing,
//! dropping or reordering any entry breaks the chain. Replaying a journal also
//! re-validates every event against the state machine, so a journal with a
//! valid chain but an illegal history is still rejected.

use std::fmt::{Debug, Display, Formatter};

use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};

use crate::error::JournalError;
use crate::event::LedgerEvent;
use crate::identity::Identity;
use crate::ledger::Ledger;

const DIGEST_LEN: usize = 32;

/// A SHA-256 digest, serialized as lowercase hex.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// The digest that the genesis entry links to.
    pub const ZERO: Digest = Digest([0; DIGEST_LEN]);

    /// Compute the digest of an entry from its contents.
    pub fn of(prev: &Digest, seq: u64, event: &LedgerEvent) -> Self {
        let event_bytes =
            serde_json::to_vec(event).expect("Serialisation is infallible");
        let mut hasher = Sha256::new();
        hasher.update(prev.0);
        hasher.update(seq.to_be_bytes());
        hasher.update(event_bytes);
        let mut bytes = [0; DIGEST_LEN];
        bytes.copy_from_slice(&hasher.finalize());
        Self(bytes)
    }
}

impl Display for Digest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&HEXLOWER.encode(&self.0))
    }
}

impl Debug for Digest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Digest({self})")
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let bytes = HEXLOWER_PERMISSIVE
            .decode(raw.as_bytes())
            .map_err(D::Error::custom)?;
        let bytes: [u8; DIGEST_LEN] = bytes
            .try_into()
            .map_err(|_| D::Error::custom("digest must be 32 bytes"))?;
        Ok(Self(bytes))
    }
}

/// One sealed journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub seq: u64,
    pub event: LedgerEvent,
    pub prev_digest: Digest,
    pub digest: Digest,
}

impl AuditEntry {
    /// Does the stored digest match the entry's contents?
    pub fn is_sealed(&self) -> bool {
        self.digest == Digest::of(&self.prev_digest, self.seq, &self.event)
    }
}

/// The tip of a journal: where the next entry goes and what it must link to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChainHead {
    next_seq: u64,
    digest: Digest,
}

impl ChainHead {
    /// The head of an empty journal.
    pub fn empty() -> Self {
        Self {
            next_seq: 0,
            digest: Digest::ZERO,
        }
    }

    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Seal `event` as the next entry. The head itself is unchanged until
    /// [`ChainHead::advance`] is called, so a failed write can simply be dropped.
    pub fn seal(&self, event: LedgerEvent) -> AuditEntry {
        let digest = Digest::of(&self.digest, self.next_seq, &event);
        AuditEntry {
            seq: self.next_seq,
            event,
            prev_digest: self.digest,
            digest,
        }
    }

    /// Move the head past `entry`, which must have been sealed by this head.
    pub fn advance(&mut self, entry: &AuditEntry) {
        debug_assert_eq!(entry.seq, self.next_seq);
        self.next_seq = entry.seq + 1;
        self.digest = entry.digest;
    }
}

/// The genesis entry for a new ledger administered by `commissioner`.
pub fn genesis(commissioner: Identity) -> AuditEntry {
    ChainHead::empty().seal(LedgerEvent::LedgerCreated { commissioner })
}

/// Verify a journal and rebuild the ledger it describes.
pub fn replay(entries: &[AuditEntry]) -> Result<(Ledger, ChainHead), JournalError> {
    let mut head = ChainHead::empty();
    let mut ledger = None;

    for entry in entries {
        if entry.seq != head.next_seq {
            return Err(JournalError::SequenceGap {
                expected: head.next_seq,
                found: entry.seq,
            });
        }
        if entry.prev_digest != head.digest {
            return Err(JournalError::BrokenLink { seq: entry.seq });
        }
        if !entry.is_sealed() {
            return Err(JournalError::BadDigest { seq: entry.seq });
        }

        match ledger.as_mut() {
            None => match &entry.event {
                LedgerEvent::LedgerCreated { commissioner } => {
                    ledger = Some(Ledger::new(*commissioner));
                }
                _ => return Err(JournalError::MissingGenesis),
            },
            Some(current) => {
                let (caller, command) = entry
                    .event
                    .invocation(current.commissioner())
                    .ok_or(JournalError::UnexpectedGenesis { seq: entry.seq })?;
                let expected = current
                    .check(caller, command)
                    .map_err(|error| JournalError::Rejected {
                        seq: entry.seq,
                        error,
                    })?;
                if expected != entry.event {
                    return Err(JournalError::Forged { seq: entry.seq });
                }
                current.apply(&entry.event);
            }
        }
        head.advance(entry);
    }

    ledger
        .map(|ledger| (ledger, head))
        .ok_or(JournalError::MissingGenesis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::election::ResetPolicy;
    use crate::error::ElectionError;
    use crate::event::Command;

    /// Run the commands against a fresh ledger, journaling every accepted event.
    fn journal_of(commands: Vec<(Identity, Command)>) -> (Ledger, Vec<AuditEntry>) {
        let commissioner = Identity::commissioner();
        let mut ledger = Ledger::new(commissioner);
        let mut head = ChainHead::empty();
        let first = genesis(commissioner);
        head.advance(&first);
        let mut entries = vec![first];
        for (caller, command) in commands {
            if let Ok(event) = ledger.execute(caller, command) {
                let entry = head.seal(event);
                head.advance(&entry);
                entries.push(entry);
            }
        }
        (ledger, entries)
    }

    fn example_journal() -> (Ledger, Vec<AuditEntry>) {
        let commissioner = Identity::commissioner();
        let voter = Identity::example(1);
        journal_of(vec![
            (commissioner, Command::AddCandidate { name: "Alice".into() }),
            (commissioner, Command::AddCandidate { name: "Bob".into() }),
            (commissioner, Command::RegisterVoter { voter }),
            (commissioner, Command::StartElection),
            (voter, Command::CastVote { candidate_id: 2 }),
            // Rejected, so not journaled.
            (voter, Command::CastVote { candidate_id: 1 }),
            (commissioner, Command::EndElection),
        ])
    }

    #[test]
    fn replay_rebuilds_ledger() {
        let (ledger, entries) = example_journal();
        assert_eq!(entries.len(), 7);

        let (replayed, head) = replay(&entries).unwrap();
        assert_eq!(replayed, ledger);
        assert_eq!(head.next_seq(), 7);
        assert_eq!(replayed.winner().map(|c| c.id), Ok(2));
    }

    #[test]
    fn replay_across_reset() {
        let commissioner = Identity::commissioner();
        let voter = Identity::example(1);
        let (ledger, entries) = journal_of(vec![
            (commissioner, Command::AddCandidate { name: "Alice".into() }),
            (commissioner, Command::RegisterVoter { voter }),
            (commissioner, Command::StartElection),
            (voter, Command::CastVote { candidate_id: 1 }),
            (commissioner, Command::EndElection),
            (
                commissioner,
                Command::ResetElection {
                    policy: ResetPolicy::default(),
                },
            ),
            (commissioner, Command::AddCandidate { name: "Bob".into() }),
        ]);
        let (replayed, _) = replay(&entries).unwrap();
        assert_eq!(replayed, ledger);
        assert_eq!(replayed.round(), 2);
        assert_eq!(replayed.candidate(1).map(|c| c.name.as_str()), Ok("Bob"));
    }

    #[test]
    fn empty_journal() {
        assert_eq!(replay(&[]), Err(JournalError::MissingGenesis));
    }

    #[test]
    fn missing_genesis() {
        let (_, entries) = example_journal();
        let mut head = ChainHead::empty();
        let entry = head.seal(entries[1].event.clone());
        head.advance(&entry);
        assert_eq!(replay(&[entry]), Err(JournalError::MissingGenesis));
    }

    #[test]
    fn tampered_event_detected() {
        let (_, mut entries) = example_journal();
        entries[4].event = LedgerEvent::VoteCast {
            voter: Identity::example(1),
            candidate_id: 1,
        };
        assert_eq!(replay(&entries), Err(JournalError::BadDigest { seq: 4 }));
    }

    #[test]
    fn dropped_entry_detected() {
        let (_, mut entries) = example_journal();
        entries.remove(3);
        assert_eq!(
            replay(&entries),
            Err(JournalError::SequenceGap {
                expected: 3,
                found: 4
            })
        );
    }

    #[test]
    fn relinked_entry_detected() {
        let (_, mut entries) = example_journal();
        // Rewrite an entry and reseal it, without fixing its successor.
        let prev = entries[1].clone();
        let mut head = ChainHead::empty();
        head.advance(&entries[0]);
        entries[1] = head.seal(LedgerEvent::CandidateAdded {
            candidate_id: 1,
            name: "Mallory".into(),
        });
        assert_ne!(entries[1], prev);
        assert_eq!(replay(&entries), Err(JournalError::BrokenLink { seq: 2 }));
    }

    #[test]
    fn illegal_history_rejected() {
        // A perfectly chained journal in which an unregistered voter votes.
        let commissioner = Identity::commissioner();
        let mut head = ChainHead::empty();
        let mut entries = Vec::new();
        for event in [
            LedgerEvent::LedgerCreated { commissioner },
            LedgerEvent::CandidateAdded {
                candidate_id: 1,
                name: "Alice".into(),
            },
            LedgerEvent::ElectionStarted,
            LedgerEvent::VoteCast {
                voter: Identity::example(5),
                candidate_id: 1,
            },
        ] {
            let entry = head.seal(event);
            head.advance(&entry);
            entries.push(entry);
        }
        assert_eq!(
            replay(&entries),
            Err(JournalError::Rejected {
                seq: 3,
                error: ElectionError::NotRegistered
            })
        );
    }

    #[test]
    fn forged_candidate_id_rejected() {
        let commissioner = Identity::commissioner();
        let mut head = ChainHead::empty();
        let mut entries = Vec::new();
        for event in [
            LedgerEvent::LedgerCreated { commissioner },
            LedgerEvent::CandidateAdded {
                candidate_id: 7,
                name: "Alice".into(),
            },
        ] {
            let entry = head.seal(event);
            head.advance(&entry);
            entries.push(entry);
        }
        assert_eq!(replay(&entries), Err(JournalError::Forged { seq: 1 }));
    }

    #[test]
    fn second_genesis_rejected() {
        let (_, mut entries) = example_journal();
        let mut head = ChainHead::empty();
        for entry in &entries {
            head.advance(entry);
        }
        entries.push(head.seal(LedgerEvent::LedgerCreated {
            commissioner: Identity::example(3),
        }));
        assert_eq!(
            replay(&entries),
            Err(JournalError::UnexpectedGenesis { seq: 7 })
        );
    }

    #[test]
    fn entry_serde() {
        let (_, entries) = example_journal();
        let json = serde_json::to_string(&entries).unwrap();
        let parsed: Vec<AuditEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entries);
        assert!(parsed.iter().all(AuditEntry::is_sealed));
    }
}
