//! The election state machine behind the ballot ledger.
//!
//! A single commissioner admits candidates and voters, opens and closes the
//! voting window, and every registered voter may cast exactly one vote while
//! it is open. Once closed, the winner is the active candidate with the most
//! votes, ties going to the lowest candidate ID.
//!
//! This crate is pure: it performs no I/O and has no notion of time. Hosting
//! the [`Ledger`] behind a lock, persisting its [`journal`], and delivering
//! its events are the caller's job.

mod candidate;
mod election;
mod error;
mod event;
mod identity;
pub mod journal;
mod ledger;
mod voter;

pub use candidate::{valid_name, Candidate, CandidateSlot};
pub use election::{
    CandidateId, CandidateReset, ElectionStatus, ResetPolicy, VoterReset, MAX_NAME_LEN,
};
pub use error::{ElectionError, JournalError};
pub use event::{Command, LedgerEvent};
pub use identity::{Identity, IdentityParseError, IDENTITY_LEN};
pub use journal::{AuditEntry, ChainHead, Digest};
pub use ledger::{Ledger, StatusSummary};
pub use voter::VoterRecord;
