#[macro_use]
extern crate rocket;
#[macro_use]
extern crate log;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod model;

pub use config::Config;
pub use ledger::LedgerService;

use config::{ConfigFairing, LedgerFairing};
use logging::LoggerFairing;

/// Build the server: load config, open the journal store, replay the ledger,
/// and mount the API.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(LedgerFairing)
}

/// Build the server around an already-open ledger.
pub fn rocket_for_service(config: Config, service: LedgerService) -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(LoggerFairing)
        .manage(config)
        .manage(service)
}

/// A local client for a fresh in-memory ledger using `config`.
#[cfg(test)]
pub(crate) async fn client_with(config: Config) -> rocket::local::asynchronous::Client {
    log4rs_test_utils::test_logging::init_logging_once_for(["ballot_ledger", "ledger_core"], None, None);

    let service = LedgerService::open(
        Box::new(model::store::MemoryStore::default()),
        config.commissioner(),
        config.reset_policy(),
    )
    .await
    .unwrap();
    rocket::local::asynchronous::Client::tracked(rocket_for_service(config, service))
        .await
        .unwrap()
}

/// A local client for a fresh in-memory ledger using the example config.
#[cfg(test)]
pub(crate) async fn client() -> rocket::local::asynchronous::Client {
    client_with(Config::example()).await
}
