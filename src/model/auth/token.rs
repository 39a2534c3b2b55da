use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{
    errors::Error as JwtError, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use ledger_core::Identity;
use rocket::{
    http::Status,
    request::{self, FromRequest},
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::Config;

pub const AUTHORIZATION_HEADER: &str = "Authorization";
const BEARER_PREFIX: &str = "Bearer ";

/// The verified identity of whoever made the current request.
///
/// Identities are asserted by the external identity layer through a signed
/// bearer token; the ledger decides what that identity may do.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Caller(Identity);

impl Caller {
    pub fn identity(&self) -> Identity {
        self.0
    }
}

/// Bearer token claims: the caller's identity plus an expiry datetime.
#[derive(Debug, Serialize, Deserialize)]
pub struct CallerToken {
    #[serde(rename = "sub")]
    identity: Identity,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

impl CallerToken {
    /// A token for `identity`, valid for the configured lifetime.
    pub fn new(identity: Identity, config: &Config) -> Self {
        Self {
            identity,
            expire_at: Utc::now() + config.auth_ttl(),
        }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Sign this token.
    pub fn encode(&self, config: &Config) -> Result<String, JwtError> {
        jsonwebtoken::encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
    }

    /// Verify and decode a signed token.
    pub fn decode(token: &str, config: &Config) -> Result<Self, JwtError> {
        jsonwebtoken::decode(
            token,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|data: TokenData<Self>| data.claims)
    }
}

#[derive(Debug)]
pub enum CallerError {
    /// No `Authorization` header was sent.
    Missing,
    /// The header wasn't a bearer token.
    Malformed,
    /// The token failed verification.
    Invalid(JwtError),
    /// The server has no config to verify against.
    Unconfigured,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Caller {
    type Error = CallerError;

    /// Get the caller's identity from a verified bearer token.
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let config = match req.guard::<&State<Config>>().await {
            request::Outcome::Success(config) => config,
            _ => {
                return request::Outcome::Failure((
                    Status::InternalServerError,
                    CallerError::Unconfigured,
                ))
            }
        };

        let header = match req.headers().get_one(AUTHORIZATION_HEADER) {
            Some(header) => header,
            None => return request::Outcome::Failure((Status::Unauthorized, CallerError::Missing)),
        };
        let token = match header.strip_prefix(BEARER_PREFIX) {
            Some(token) => token.trim(),
            None => {
                return request::Outcome::Failure((Status::Unauthorized, CallerError::Malformed))
            }
        };

        match CallerToken::decode(token, config) {
            Ok(token) => request::Outcome::Success(Caller(token.identity())),
            Err(e) => {
                warn!("Rejected caller token: {e}");
                request::Outcome::Failure((Status::Unauthorized, CallerError::Invalid(e)))
            }
        }
    }
}
