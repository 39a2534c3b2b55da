use ledger_core::{ElectionError, JournalError};
use mongodb::error::Error as DbError;
use rocket::{
    http::{Status, StatusClass},
    response::Responder,
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Election(#[from] ElectionError),
    #[error("Journal failed verification: {0}")]
    Journal(#[from] JournalError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Cannot start ledger: {0}")]
    Startup(String),
}

impl Error {
    /// The HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::Election(err) => match err {
                ElectionError::Unauthorized => Status::Forbidden,
                ElectionError::NotFound => Status::NotFound,
                ElectionError::InvalidName | ElectionError::InvalidIdentity => {
                    Status::BadRequest
                }
                _ => Status::UnprocessableEntity,
            },
            Self::BadRequest(_) => Status::BadRequest,
            Self::Conflict(_) => Status::Conflict,
            Self::Journal(_) | Self::Db(_) | Self::Startup(_) => Status::InternalServerError,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, _: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        if status.class() == StatusClass::ServerError {
            error!("{self}");
        } else {
            warn!("Rejected: {self}");
        }
        Err(status)
    }
}
