use ledger_core::{CandidateId, Identity, StatusSummary};
use rocket::{serde::json::Json, Route, State};

use crate::error::{Error, Result};
use crate::ledger::LedgerService;
use crate::model::api::{CandidateDesc, LedgerDump, VoterInfo};

pub fn routes() -> Vec<Route> {
    routes![
        candidates,
        candidate,
        voter_info,
        election_status,
        winner,
        ledger_dump,
    ]
}

/// All active candidates with their running tallies.
#[get("/candidates")]
async fn candidates(ledger: &State<LedgerService>) -> Json<Vec<CandidateDesc>> {
    let ledger = ledger.read().await;
    Json(ledger.candidates().map(CandidateDesc::from).collect())
}

#[get("/candidates/<candidate_id>")]
async fn candidate(
    candidate_id: CandidateId,
    ledger: &State<LedgerService>,
) -> Result<Json<CandidateDesc>> {
    let ledger = ledger.read().await;
    let candidate = ledger.candidate(candidate_id)?;
    Ok(Json(candidate.into()))
}

#[get("/voters/<identity>")]
async fn voter_info(identity: &str, ledger: &State<LedgerService>) -> Result<Json<VoterInfo>> {
    let identity: Identity = identity
        .parse()
        .map_err(|e| Error::BadRequest(format!("Bad identity {identity:?}: {e}")))?;
    let record = ledger.read().await.voter_info(identity);
    Ok(Json(VoterInfo::new(identity, record)))
}

#[get("/election")]
async fn election_status(ledger: &State<LedgerService>) -> Json<StatusSummary> {
    Json(ledger.read().await.status())
}

#[get("/election/winner")]
async fn winner(ledger: &State<LedgerService>) -> Result<Json<CandidateDesc>> {
    let ledger = ledger.read().await;
    let winner = ledger.winner()?;
    Ok(Json(winner.into()))
}

/// The full journal and current ledger, for independent audit.
#[get("/ledger/dump")]
async fn ledger_dump(ledger: &State<LedgerService>) -> Result<Json<LedgerDump>> {
    Ok(Json(ledger.dump().await?))
}
