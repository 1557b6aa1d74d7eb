//! Command services for the Dokku gateway.
//!
//! One module per resource family. Each operation takes the shared
//! [`Commands`] context and the authenticated [`Tenant`](dokku_core::Tenant),
//! checks ownership in the local store, reserves quota before creating,
//! runs the Dokku command and parses its output.
//!
//! Remote failures are returned as `CommandResult { success: false, .. }`;
//! only local validation (ownership, quota, input) produces an `Err`.

mod context;

pub mod apps;
pub mod config;
pub mod databases;
pub mod domains;
pub mod general;
pub mod letsencrypt;
pub mod networks;
pub mod plugins;
pub mod storage;

pub use context::{CommandResult, Commands};
