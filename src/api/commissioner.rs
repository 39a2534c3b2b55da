use ledger_core::{AuditEntry, CandidateId, Command};
use rocket::{serde::json::Json, Route, State};

use super::{body, JsonBody};
use crate::error::Result;
use crate::ledger::LedgerService;
use crate::model::{
    api::{CandidateSpec, VoterSpec},
    auth::Caller,
};

pub fn routes() -> Vec<Route> {
    routes![
        add_candidate,
        remove_candidate,
        register_voter,
        start_election,
        end_election,
        reset_election,
    ]
}

// Every command returns the journal entry that records it. Whether the caller
// is actually the commissioner is decided by the ledger itself.

#[post("/candidates", data = "<spec>", format = "json")]
async fn add_candidate(
    caller: Caller,
    spec: JsonBody<'_, CandidateSpec>,
    ledger: &State<LedgerService>,
) -> Result<Json<AuditEntry>> {
    let command = Command::AddCandidate {
        name: body(spec)?.name,
    };
    let entry = ledger.execute(caller.identity(), command).await?;
    Ok(Json(entry))
}

#[delete("/candidates/<candidate_id>")]
async fn remove_candidate(
    caller: Caller,
    candidate_id: CandidateId,
    ledger: &State<LedgerService>,
) -> Result<Json<AuditEntry>> {
    let command = Command::RemoveCandidate { candidate_id };
    let entry = ledger.execute(caller.identity(), command).await?;
    Ok(Json(entry))
}

#[post("/voters", data = "<spec>", format = "json")]
async fn register_voter(
    caller: Caller,
    spec: JsonBody<'_, VoterSpec>,
    ledger: &State<LedgerService>,
) -> Result<Json<AuditEntry>> {
    let command = Command::RegisterVoter {
        voter: body(spec)?.identity,
    };
    let entry = ledger.execute(caller.identity(), command).await?;
    Ok(Json(entry))
}

#[post("/election/start")]
async fn start_election(caller: Caller, ledger: &State<LedgerService>) -> Result<Json<AuditEntry>> {
    let entry = ledger
        .execute(caller.identity(), Command::StartElection)
        .await?;
    Ok(Json(entry))
}

#[post("/election/end")]
async fn end_election(caller: Caller, ledger: &State<LedgerService>) -> Result<Json<AuditEntry>> {
    let entry = ledger
        .execute(caller.identity(), Command::EndElection)
        .await?;
    Ok(Json(entry))
}

#[post("/election/reset")]
async fn reset_election(caller: Caller, ledger: &State<LedgerService>) -> Result<Json<AuditEntry>> {
    let entry = ledger.reset(caller.identity()).await?;
    Ok(Json(entry))
}

#[cfg(test)]
mod tests {
    use ledger_core::{
        CandidateReset, Identity, LedgerEvent, ResetPolicy, StatusSummary, VoterReset,
    };
    use rocket::{
        figment::{providers::Serialized, Figment},
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json,
    };

    use super::*;
    use crate::model::{api::CandidateDesc, auth::testing::bearer};
    use crate::{client, client_with, Config};

    fn voter(n: u8) -> Identity {
        format!("0xab{:038x}", n).parse().unwrap()
    }

    async fn add_candidate_expect_status(client: &Client, name: &str, status: Status) {
        let config = Config::example();
        let response = client
            .post(uri!(add_candidate))
            .header(ContentType::JSON)
            .header(bearer(config.commissioner(), &config))
            .body(serde_json::to_string(&CandidateSpec::example(name)).unwrap())
            .dispatch()
            .await;
        assert_eq!(response.status(), status);
    }

    async fn commissioner_post(client: &Client, uri: &str) -> Status {
        let config = Config::example();
        client
            .post(uri.to_string())
            .header(bearer(config.commissioner(), &config))
            .dispatch()
            .await
            .status()
    }

    async fn status(client: &Client) -> StatusSummary {
        let response = client.get("/election").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        response.into_json().await.unwrap()
    }

    #[rocket::async_test]
    async fn add_and_remove_candidates() {
        let client = client().await;
        let config = Config::example();

        let response = client
            .post(uri!(add_candidate))
            .header(ContentType::JSON)
            .header(bearer(config.commissioner(), &config))
            .body(serde_json::to_string(&CandidateSpec::example("Alice")).unwrap())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let entry: AuditEntry = response.into_json().await.unwrap();
        assert_eq!(entry.seq, 1);
        assert_eq!(
            entry.event,
            LedgerEvent::CandidateAdded {
                candidate_id: 1,
                name: "Alice".to_string()
            }
        );
        add_candidate_expect_status(&client, "Bob", Status::Ok).await;

        // Bad names.
        add_candidate_expect_status(&client, "", Status::BadRequest).await;
        add_candidate_expect_status(&client, &"x".repeat(51), Status::BadRequest).await;

        // Remove Alice.
        let response = client
            .delete(uri!(remove_candidate(1)))
            .header(bearer(config.commissioner(), &config))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        // Removing again fails.
        let response = client
            .delete(uri!(remove_candidate(1)))
            .header(bearer(config.commissioner(), &config))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);

        // Only Bob is listed, but two IDs were allocated.
        let response = client.get("/candidates").dispatch().await;
        let candidates: Vec<CandidateDesc> = response.into_json().await.unwrap();
        assert_eq!(
            candidates,
            vec![CandidateDesc {
                id: 2,
                name: "Bob".to_string(),
                vote_count: 0
            }]
        );
        assert_eq!(status(&client).await.candidate_count, 2);
    }

    #[rocket::async_test]
    async fn non_commissioner_forbidden() {
        let client = client().await;
        let config = Config::example();
        let intruder = bearer(voter(1), &config);

        let response = client
            .post(uri!(add_candidate))
            .header(ContentType::JSON)
            .header(intruder.clone())
            .body(serde_json::to_string(&CandidateSpec::example("Mallory")).unwrap())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);

        for uri in ["/election/start", "/election/end", "/election/reset"] {
            let response = client.post(uri).header(intruder.clone()).dispatch().await;
            assert_eq!(response.status(), Status::Forbidden);
        }

        // No token at all.
        let response = client.post(uri!(start_election)).dispatch().await;
        assert_eq!(response.status(), Status::Unauthorized);

        // Token signed with the wrong secret.
        let response = client
            .post(uri!(start_election))
            .header(bearer(config.commissioner(), &wrong_secret_config()))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);

        assert_eq!(status(&client).await.candidate_count, 0);
    }

    #[rocket::async_test]
    async fn lifecycle() {
        let client = client().await;
        let config = Config::example();

        // Can't start with no candidates.
        assert_eq!(
            commissioner_post(&client, "/election/start").await,
            Status::UnprocessableEntity
        );
        assert!(!status(&client).await.active);
        // Can't end what hasn't started.
        assert_eq!(
            commissioner_post(&client, "/election/end").await,
            Status::UnprocessableEntity
        );

        add_candidate_expect_status(&client, "Alice", Status::Ok).await;
        assert_eq!(commissioner_post(&client, "/election/start").await, Status::Ok);
        assert!(status(&client).await.active);

        // Admission is frozen.
        add_candidate_expect_status(&client, "Bob", Status::UnprocessableEntity).await;
        assert_eq!(
            commissioner_post(&client, "/election/start").await,
            Status::UnprocessableEntity
        );
        assert_eq!(
            commissioner_post(&client, "/election/reset").await,
            Status::UnprocessableEntity
        );
        let response = client
            .delete(uri!(remove_candidate(1)))
            .header(bearer(config.commissioner(), &config))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);

        // Registration is not.
        let response = client
            .post(uri!(register_voter))
            .header(ContentType::JSON)
            .header(bearer(config.commissioner(), &config))
            .body(serde_json::to_string(&VoterSpec { identity: voter(1) }).unwrap())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        assert_eq!(commissioner_post(&client, "/election/end").await, Status::Ok);
        assert!(!status(&client).await.active);
    }

    #[rocket::async_test]
    async fn register_voters() {
        let client = client().await;
        let config = Config::example();

        let register = |identity: Identity| {
            client
                .post(uri!(register_voter))
                .header(ContentType::JSON)
                .header(bearer(config.commissioner(), &config))
                .body(serde_json::to_string(&VoterSpec { identity }).unwrap())
                .dispatch()
        };

        assert_eq!(register(voter(1)).await.status(), Status::Ok);
        assert_eq!(
            register(voter(1)).await.status(),
            Status::UnprocessableEntity
        );
        assert_eq!(register(Identity::NULL).await.status(), Status::BadRequest);
        assert_eq!(
            register(config.commissioner()).await.status(),
            Status::BadRequest
        );

        // Malformed bodies never reach the ledger.
        for malformed in [r#"{"identity":"0x1234"}"#, r#"{"identity":"not-hex"}"#, "{"] {
            let response = client
                .post(uri!(register_voter))
                .header(ContentType::JSON)
                .header(bearer(config.commissioner(), &config))
                .body(malformed)
                .dispatch()
                .await;
            assert_eq!(response.status(), Status::BadRequest);
        }
        let response = client
            .post(uri!(add_candidate))
            .header(ContentType::JSON)
            .header(bearer(config.commissioner(), &config))
            .body(r#"{"title":"Alice"}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(status(&client).await.candidate_count, 0);
    }

    #[rocket::async_test]
    async fn reset_uses_configured_policy() {
        let policy = ResetPolicy {
            candidates: CandidateReset::ZeroCounts,
            voters: VoterReset::Clear,
        };
        let client = client_with(Config::example().with_reset_policy(policy)).await;

        add_candidate_expect_status(&client, "Alice", Status::Ok).await;
        let response = client
            .post(uri!(reset_election))
            .header(bearer(Config::example().commissioner(), &Config::example()))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let entry: AuditEntry = response.into_json().await.unwrap();
        assert_eq!(entry.event, LedgerEvent::ElectionReset { round: 2, policy });

        // Candidates survive this policy.
        let summary = status(&client).await;
        assert_eq!(summary.candidate_count, 1);
        assert_eq!(summary.round, 2);
    }

    fn wrong_secret_config() -> Config {
        Figment::new()
            .merge(Serialized::default(
                "commissioner",
                Config::example().commissioner().to_string(),
            ))
            .merge(Serialized::default("auth_ttl", 300))
            .merge(Serialized::default("jwt_secret", "not-the-real-secret"))
            .extract()
            .unwrap()
    }
}
