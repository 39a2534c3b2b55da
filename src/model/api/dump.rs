use ledger_core::{journal, AuditEntry, JournalError, Ledger};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything needed to audit the ledger independently: the full journal and
/// the state the server claims it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDump {
    pub ledger: Ledger,
    pub journal: Vec<AuditEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DumpError {
    /// The journal itself is corrupt or describes an illegal history.
    #[error(transparent)]
    Journal(#[from] JournalError),
    /// The journal is fine but doesn't produce the claimed ledger.
    #[error("replaying the journal does not produce the published ledger")]
    Mismatch,
    /// The claimed ledger is internally inconsistent.
    #[error("ledger invariant violated: {0}")]
    Invariant(String),
}

impl LedgerDump {
    /// Replay the journal and check that it yields exactly the published ledger.
    pub fn verify(&self) -> Result<(), DumpError> {
        self.ledger.check_invariants().map_err(DumpError::Invariant)?;
        let (replayed, _) = journal::replay(&self.journal)?;
        if replayed != self.ledger {
            return Err(DumpError::Mismatch);
        }
        Ok(())
    }
}
