use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rocket::{
    fairing::{Fairing, Info, Kind},
    http::StatusClass,
    Data, Orbit, Request, Response, Rocket,
};

use crate::ledger::LedgerService;

/// Per-request bookkeeping: a unique ID and when the request arrived.
#[derive(Debug, Copy, Clone)]
pub struct RequestTrace {
    pub id: usize,
    pub received: Instant,
}

impl RequestTrace {
    /// Start tracing a new request. IDs wrap around back to zero if you somehow exceed a usize.
    pub fn start() -> Self {
        static REQUEST_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);
        Self {
            id: REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            received: Instant::now(),
        }
    }
}

impl Display for RequestTrace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// A rocket fairing that logs every request and response, and the state of
/// the ledger at launch.
#[derive(Debug, Copy, Clone)]
pub struct LoggerFairing;

#[rocket::async_trait]
impl Fairing for LoggerFairing {
    fn info(&self) -> Info {
        Info {
            name: "Logger",
            kind: Kind::Liftoff | Kind::Request | Kind::Response | Kind::Shutdown,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let config = rocket.config();
        let protocol = if config.tls_enabled() { "https" } else { "http" };
        info!(
            "Ledger server listening on {protocol}://{}:{}",
            config.address, config.port
        );

        if let Some(service) = rocket.state::<LedgerService>() {
            let status = service.read().await.status();
            info!(
                "Round {} is {}: {} candidates, {} votes, commissioner {}",
                status.round,
                if status.active { "open" } else { "closed" },
                status.candidate_count,
                status.total_votes,
                status.commissioner
            );
        }
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        let trace = req.local_cache(RequestTrace::start);
        info!("->req{trace} {} {}", req.method(), req.uri());
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let trace = req.local_cache(RequestTrace::start);
        let elapsed = trace.received.elapsed().as_micros();
        let route = req
            .route()
            .map(|r| match r.name {
                Some(ref name) => format!("{name} ({})", r.uri),
                None => r.uri.to_string(),
            })
            .unwrap_or_else(|| "UNKNOWN ROUTE".to_string());

        let status = res.status();
        let log_msg = format!("<-rsp{trace} {status} {route} in {elapsed}us");
        match status.class() {
            StatusClass::ServerError => error!("{log_msg}"),
            StatusClass::ClientError => warn!("{log_msg}"),
            _ => info!("{log_msg}"),
        }
    }

    async fn on_shutdown(&self, rocket: &Rocket<Orbit>) {
        warn!("Shutdown requested, stopping gracefully...");
        if let Some(service) = rocket.state::<LedgerService>() {
            let total_votes = service.read().await.total_votes();
            info!("Ledger closed with {total_votes} votes recorded");
        }
    }
}
