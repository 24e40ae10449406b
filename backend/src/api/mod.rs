pub mod auth;
pub mod error;
pub mod journal;
pub mod server;
pub mod validation;
