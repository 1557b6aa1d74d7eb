//! HTTP surface of the Dokku gateway.
//!
//! Tenant routes authenticate with an `api_key` query parameter plus an
//! `{email, access_token}` JSON body; admin routes with a `MASTER-KEY`
//! header. Every route answers with the `{success, result}` envelope or an
//! error body `{"detail": ...}`.

pub mod app;
pub mod extract;
pub mod rate_limit;
pub mod routes;
pub mod state;

mod error;

pub use app::{router, DokkuApi};
pub use error::DokkuAxumError;
pub use rate_limit::RateLimiter;
pub use state::AppState;
