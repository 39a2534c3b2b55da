mod token;

pub use token::{Caller, CallerError, CallerToken, AUTHORIZATION_HEADER};

#[cfg(test)]
pub use token::testing;
