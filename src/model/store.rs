use ledger_core::AuditEntry;
use mongodb::{bson::doc, options::FindOptions, Database};
use rocket::{futures::TryStreamExt, tokio::sync::Mutex};

use crate::error::{Error, Result};
use crate::model::mongodb::{ensure_indexes_exist, is_duplicate_key_error, Coll};

/// Durable home of the ledger journal.
///
/// Stores are append-only: entries are never updated or deleted.
#[rocket::async_trait]
pub trait JournalStore: Send + Sync {
    /// Every stored entry, in ascending sequence order.
    async fn load(&self) -> Result<Vec<AuditEntry>>;

    /// Durably append one entry. Must fail if an entry with the same sequence
    /// number already exists.
    async fn append(&self, entry: &AuditEntry) -> Result<()>;
}

/// A journal that lives only as long as the process.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<AuditEntry>>,
}

#[rocket::async_trait]
impl JournalStore for MemoryStore {
    async fn load(&self) -> Result<Vec<AuditEntry>> {
        Ok(self.entries.lock().await.clone())
    }

    async fn append(&self, entry: &AuditEntry) -> Result<()> {
        let mut entries = self.entries.lock().await;
        if entries.iter().any(|existing| existing.seq == entry.seq) {
            return Err(Error::Conflict(format!(
                "Journal entry {} already exists",
                entry.seq
            )));
        }
        entries.push(entry.clone());
        Ok(())
    }
}

/// A journal kept in the `ledger_journal` MongoDB collection.
pub struct MongoStore {
    entries: Coll<AuditEntry>,
}

impl MongoStore {
    /// Open the journal in the given database, creating indexes if needed.
    pub async fn open(db: &Database) -> Result<Self> {
        ensure_indexes_exist(db).await?;
        Ok(Self {
            entries: Coll::from_db(db),
        })
    }
}

#[rocket::async_trait]
impl JournalStore for MongoStore {
    async fn load(&self) -> Result<Vec<AuditEntry>> {
        let options = FindOptions::builder().sort(doc! {"seq": 1}).build();
        let entries: Vec<AuditEntry> = self.entries.find(None, options).await?.try_collect().await?;
        Ok(entries)
    }

    async fn append(&self, entry: &AuditEntry) -> Result<()> {
        match self.entries.insert_one(entry, None).await {
            Ok(_) => Ok(()),
            // The unique index on `seq` means another writer got there first.
            Err(e) if is_duplicate_key_error(&e) => Err(Error::Conflict(format!(
                "Journal entry {} was written by another process",
                entry.seq
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use ledger_core::{journal, Identity, LedgerEvent};

    use super::*;

    #[rocket::async_test]
    async fn memory_store_is_append_only() {
        let store = MemoryStore::default();
        assert!(store.load().await.unwrap().is_empty());

        let genesis = journal::genesis(Identity::NULL);
        store.append(&genesis).await.unwrap();
        let err = store.append(&genesis).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, vec![genesis]);
        assert!(matches!(
            loaded[0].event,
            LedgerEvent::LedgerCreated { .. }
        ));
    }

    /// Needs a MongoDB server at `MONGO_URI`; run with `cargo test -- --ignored`.
    #[rocket::async_test]
    #[ignore]
    async fn mongo_store_round_trip() {
        let uri = std::env::var("MONGO_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let client = mongodb::Client::with_uri_str(uri).await.unwrap();
        let random: u32 = rand::random();
        let db = client.database(&format!("test{random}"));

        let store = MongoStore::open(&db).await.unwrap();
        let genesis = journal::genesis(Identity::NULL);
        store.append(&genesis).await.unwrap();
        let err = store.append(&genesis).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(store.load().await.unwrap(), vec![genesis]);

        db.drop(None).await.unwrap();
    }
}
