use ledger_core::{
    journal, AuditEntry, ChainHead, Command, Identity, Ledger, LedgerEvent, ResetPolicy,
};
use rocket::tokio::sync::{broadcast, RwLock, RwLockReadGuard};

use crate::error::{Error, Result};
use crate::model::{api::dump::LedgerDump, store::JournalStore};

/// How many unread events a slow subscriber may fall behind by.
const EVENT_BUFFER: usize = 256;

/// The ledger together with the tip of its journal.
struct Journaled {
    ledger: Ledger,
    head: ChainHead,
}

/// The single hosted ledger.
///
/// All commands are serialized through one write lock, and each accepted
/// event is durably journaled before it is applied, so the in-memory ledger
/// never gets ahead of the store. Queries share a read lock.
pub struct LedgerService {
    state: RwLock<Journaled>,
    store: Box<dyn JournalStore>,
    events: broadcast::Sender<AuditEntry>,
    reset_policy: ResetPolicy,
}

impl LedgerService {
    /// Load and verify the journal from `store`, starting a fresh one for
    /// `commissioner` if it is empty.
    pub async fn open(
        store: Box<dyn JournalStore>,
        commissioner: Identity,
        reset_policy: ResetPolicy,
    ) -> Result<Self> {
        let entries = store.load().await?;
        let (ledger, head) = if entries.is_empty() {
            info!("Journal is empty, creating a new ledger");
            let genesis = journal::genesis(commissioner);
            store.append(&genesis).await?;
            audit_log(&genesis);
            let mut head = ChainHead::empty();
            head.advance(&genesis);
            (Ledger::new(commissioner), head)
        } else {
            info!("Replaying {} journal entries...", entries.len());
            let restored = restore(&entries, commissioner)?;
            info!("...journal verified");
            (restored.ledger, restored.head)
        };
        let (events, _) = broadcast::channel(EVENT_BUFFER);

        Ok(Self {
            state: RwLock::new(Journaled { ledger, head }),
            store,
            events,
            reset_policy,
        })
    }

    /// Validate, journal and apply a command.
    ///
    /// Either the command fails and is not applied, or it is journaled,
    /// applied and announced, in that order. A failed journal write also
    /// brings the ledger up to date with the store.
    pub async fn execute(&self, caller: Identity, command: Command) -> Result<AuditEntry> {
        let mut state = self.state.write().await;

        let event = state.ledger.check(caller, command).map_err(|e| {
            warn!("Command from {caller} rejected: {e}");
            e
        })?;
        let entry = state.head.seal(event);
        if let Err(e) = self.store.append(&entry).await {
            error!("Failed to journal entry {}: {e}", entry.seq);
            // The store may now hold entries we never applied, whether another
            // writer's or our own write that reported failure after landing.
            self.resync(&mut state).await?;
            return Err(e);
        }
        state.ledger.apply(&entry.event);
        state.head.advance(&entry);
        drop(state);

        audit_log(&entry);
        // Nobody listening is fine.
        let _ = self.events.send(entry.clone());
        Ok(entry)
    }

    /// Rebuild the ledger from whatever the store now holds, announcing any
    /// entries that were missed. A journal that no longer verifies is fatal.
    async fn resync(&self, state: &mut Journaled) -> Result<()> {
        let entries = self.store.load().await.map_err(|e| {
            error!("Failed to reload journal: {e}");
            e
        })?;
        let restored = restore(&entries, state.ledger.commissioner()).map_err(|e| {
            error!("Stored journal no longer verifies: {e}");
            e
        })?;

        let known = state.head.next_seq();
        if restored.head.next_seq() != known {
            warn!(
                "Caught up with the journal from entry {known} to {}",
                restored.head.next_seq()
            );
            for entry in entries.iter().filter(|entry| entry.seq >= known) {
                audit_log(entry);
                let _ = self.events.send(entry.clone());
            }
        }
        *state = restored;
        Ok(())
    }

    pub async fn reset(&self, caller: Identity) -> Result<AuditEntry> {
        let policy = self.reset_policy;
        self.execute(caller, Command::ResetElection { policy }).await
    }

    /// A consistent read-only view of the ledger.
    pub async fn read(&self) -> RwLockReadGuard<'_, Ledger> {
        RwLockReadGuard::map(self.state.read().await, |state| &state.ledger)
    }

    /// Receive every event accepted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<AuditEntry> {
        self.events.subscribe()
    }

    /// The complete journal plus the ledger it produces.
    pub async fn dump(&self) -> Result<LedgerDump> {
        // Hold the read lock so no entry can be appended in between.
        let state = self.state.read().await;
        let journal = self.store.load().await?;
        Ok(LedgerDump {
            ledger: state.ledger.clone(),
            journal,
        })
    }
}

/// Replay `entries`, which must belong to `commissioner`.
fn restore(entries: &[AuditEntry], commissioner: Identity) -> Result<Journaled> {
    let (ledger, head) = journal::replay(entries)?;
    if ledger.commissioner() != commissioner {
        return Err(Error::Startup(format!(
            "journal belongs to commissioner {}, but {} is configured",
            ledger.commissioner(),
            commissioner
        )));
    }
    Ok(Journaled { ledger, head })
}

/// Write one audit line per accepted event.
fn audit_log(entry: &AuditEntry) {
    let seq = entry.seq;
    match &entry.event {
        LedgerEvent::LedgerCreated { commissioner } => {
            info!("#{seq} ledger created for commissioner {commissioner}")
        }
        LedgerEvent::CandidateAdded { candidate_id, name } => {
            info!("#{seq} candidate {candidate_id} added: {name:?}")
        }
        LedgerEvent::CandidateRemoved { candidate_id } => {
            info!("#{seq} candidate {candidate_id} removed")
        }
        LedgerEvent::VoterRegistered { voter } => info!("#{seq} voter {voter} registered"),
        LedgerEvent::ElectionStarted => info!("#{seq} election started"),
        LedgerEvent::ElectionEnded => info!("#{seq} election ended"),
        LedgerEvent::VoteCast {
            voter,
            candidate_id,
        } => info!("#{seq} {voter} voted for candidate {candidate_id}"),
        LedgerEvent::ElectionReset { round, policy } => {
            info!("#{seq} election reset, starting round {round} ({policy:?})")
        }
    }
}
