pub mod candidate;
pub mod dump;
pub mod vote;
pub mod voter;

pub use candidate::{CandidateDesc, CandidateSpec};
pub use dump::{DumpError, LedgerDump};
pub use vote::{VoteReceipt, VoteSpec};
pub use voter::{VoterInfo, VoterSpec};
