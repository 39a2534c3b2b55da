pub mod api;
pub mod auth;
pub mod mongodb;
pub mod store;
