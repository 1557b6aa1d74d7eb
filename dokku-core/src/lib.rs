//! dokku-core: framework-agnostic core of the Dokku multi-tenant gateway.
//!
//! - [`naming`]: display name ⇄ system name translation
//! - [`parsers`]: Dokku CLI output → structured values
//! - [`store`]: tenant store and quota reservation contract
//! - [`executor`]: remote command contract

pub mod config;
pub mod errors;
pub mod executor;
pub mod naming;
pub mod parsers;
pub mod store;
pub mod tenant;

pub use config::{ApiConfig, ApiConfigSnapshot, Settings, SshSettings};
pub use errors::{DokkuError, DokkuResult, ErrorKind, QUOTA_EXCEEDED};
pub use executor::{CommandExecutor, CommandOutput, Role};
pub use naming::{Namespacing, ResourceName, ResourceNamer};
pub use store::{ResourceStore, StoreError, StoreResult};
pub use tenant::{Page, QuotaUpdate, Quotas, Resource, ResourceKind, Tenant};
