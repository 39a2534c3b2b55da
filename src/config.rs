use chrono::Duration;
use ledger_core::{CandidateReset, Identity, ResetPolicy, VoterReset};
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::ledger::LedgerService;
use crate::model::store::{JournalStore, MemoryStore, MongoStore};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Debug, Deserialize)]
pub struct Config {
    // non-secrets
    commissioner: Identity,
    auth_ttl: u32,
    #[serde(default)]
    reset_candidates: CandidateReset,
    #[serde(default)]
    reset_voters: VoterReset,
    // secrets
    jwt_secret: String,
}

impl Config {
    /// The one identity allowed to administer the election.
    pub fn commissioner(&self) -> Identity {
        self.commissioner
    }

    /// Valid lifetime of issued caller tokens in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// What a reset does to candidates and voters.
    pub fn reset_policy(&self) -> ResetPolicy {
        ResetPolicy {
            candidates: self.reset_candidates,
            voters: self.reset_voters,
        }
    }

    /// Secret key used to sign and verify caller JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!("Commissioner is {}", config.commissioner());

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the journal store.
#[derive(Deserialize)]
struct StoreConfig {
    // secrets
    db_uri: Option<String>,
    // non-secrets
    #[serde(default = "default_db_name")]
    db_name: String,
}

fn default_db_name() -> String {
    "ballot_ledger".to_string()
}

/// A fairing that opens the journal store, replays the journal, and places the
/// resulting [`LedgerService`] into managed state.
///
/// Must be attached after [`ConfigFairing`].
pub struct LedgerFairing;

#[rocket::async_trait]
impl Fairing for LedgerFairing {
    fn info(&self) -> Info {
        Info {
            name: "Ledger",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<StoreConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load journal store config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        let (commissioner, reset_policy) = match rocket.state::<Config>() {
            Some(app_config) => (app_config.commissioner(), app_config.reset_policy()),
            None => {
                error!("Application config must be loaded before the ledger");
                return Err(rocket);
            }
        };

        // Open the store.
        let store: Box<dyn JournalStore> = match config.db_uri {
            Some(db_uri) => {
                info!("Loaded database config, connecting...");
                let client = match MongoClient::with_uri_str(db_uri).await {
                    Ok(client) => client,
                    Err(e) => {
                        error!("Failed to connect to database: {e}");
                        return Err(rocket);
                    }
                };
                let db = client.database(&config.db_name);
                match MongoStore::open(&db).await {
                    Ok(store) => {
                        info!("...database connection online!");
                        Box::new(store)
                    }
                    Err(e) => {
                        error!("Failed to connect to database: {e}");
                        return Err(rocket);
                    }
                }
            }
            None => {
                warn!("No `db_uri` configured; the journal will only be kept in memory");
                Box::new(MemoryStore::default())
            }
        };

        // Replay the journal.
        let service = match LedgerService::open(store, commissioner, reset_policy).await {
            Ok(service) => service,
            Err(e) => {
                error!("Failed to open ledger: {e}");
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(service);
        Ok(rocket)
    }
}
