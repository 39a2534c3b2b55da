use ledger_core::Command;
use rocket::{serde::json::Json, Route, State};

use super::{body, JsonBody};
use crate::error::Result;
use crate::ledger::LedgerService;
use crate::model::{
    api::{VoteReceipt, VoteSpec},
    auth::Caller,
};

pub fn routes() -> Vec<Route> {
    routes![cast_vote]
}

#[post("/votes", data = "<spec>", format = "json")]
async fn cast_vote(
    caller: Caller,
    spec: JsonBody<'_, VoteSpec>,
    ledger: &State<LedgerService>,
) -> Result<Json<VoteReceipt>> {
    let candidate_id = body(spec)?.candidate_id;
    let entry = ledger
        .execute(caller.identity(), Command::CastVote { candidate_id })
        .await?;
    Ok(Json(VoteReceipt::new(
        caller.identity(),
        candidate_id,
        &entry,
    )))
}
