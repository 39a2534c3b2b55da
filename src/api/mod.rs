use rocket::{
    serde::json::{Error as JsonError, Json},
    Route,
};

use crate::error::{Error, Result};

mod commissioner;
mod public;
mod voter;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(commissioner::routes());
    routes.extend(public::routes());
    routes.extend(voter::routes());
    routes
}

/// A JSON request body that may have failed to decode.
type JsonBody<'r, T> = std::result::Result<Json<T>, JsonError<'r>>;

/// Unwrap a request body, reporting undecodable input as a bad request.
fn body<T>(data: JsonBody<'_, T>) -> Result<T> {
    data.map(Json::into_inner)
        .map_err(|e| Error::BadRequest(format!("Malformed request body: {e}")))
}
