//! The tenant/resource store contract and the quota reservation protocol.
//!
//! `reserve` must perform its existence check, quota check and insert as a
//! single atomic step: concurrent reservations for the last free slot never
//! both succeed.

use async_trait::async_trait;
use thiserror::Error;

use crate::errors::DokkuError;
use crate::tenant::{Page, QuotaUpdate, Resource, ResourceKind, Tenant};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("User not found")]
    TenantNotFound,

    #[error("{} does not exist", kind_label(.0))]
    ResourceNotFound(ResourceKind),

    #[error("{} already exists", kind_label(.0))]
    AlreadyExists(ResourceKind),

    #[error("User already exists")]
    TenantAlreadyExists,

    #[error("Access token already in use")]
    AccessTokenInUse,

    #[error("Quota exceeded")]
    QuotaExceeded(ResourceKind),

    #[error("Store backend error: {0}")]
    Backend(String),
}

fn kind_label(kind: &ResourceKind) -> &'static str {
    match kind {
        ResourceKind::App => "App",
        ResourceKind::Service => "Database",
        ResourceKind::Network => "Network",
        ResourceKind::Storage => "Storage",
    }
}

impl From<StoreError> for DokkuError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::TenantNotFound | StoreError::ResourceNotFound(_) => {
                DokkuError::not_found(err.to_string())
            }
            StoreError::AlreadyExists(_) => DokkuError::already_exists(err.to_string()),
            StoreError::TenantAlreadyExists | StoreError::AccessTokenInUse => {
                DokkuError::bad_request(err.to_string())
            }
            StoreError::QuotaExceeded(_) => DokkuError::quota_exceeded(),
            StoreError::Backend(_) => DokkuError::general_error(err.to_string()),
        }
    }
}

impl StoreError {
    /// Carry this error as a structured `DokkuError` inside `anyhow`.
    pub fn into_anyhow(self) -> anyhow::Error {
        DokkuError::from(self).into_anyhow()
    }
}

#[async_trait]
pub trait ResourceStore: Send + Sync {
    // ---- tenants ----

    /// New tenants start with every quota at zero.
    async fn create_tenant(&self, email: &str, access_token: &str) -> StoreResult<Tenant>;

    async fn get_tenant(&self, email: &str) -> StoreResult<Tenant>;

    async fn get_tenant_by_access_token(&self, access_token: &str) -> StoreResult<Tenant>;

    async fn list_tenants(&self) -> StoreResult<Vec<Tenant>>;

    /// Removes the tenant and every resource record it owns.
    async fn delete_tenant(&self, email: &str) -> StoreResult<()>;

    async fn update_email(&self, email: &str, new_email: &str) -> StoreResult<Tenant>;

    async fn update_access_token(
        &self,
        email: &str,
        new_access_token: &str,
        create_if_missing: bool,
    ) -> StoreResult<Tenant>;

    async fn update_quota(&self, email: &str, update: QuotaUpdate) -> StoreResult<Tenant>;

    async fn set_admin(&self, email: &str, is_admin: bool) -> StoreResult<Tenant>;

    // ---- reservation protocol ----

    /// Check-and-insert a resource record for `email`.
    async fn reserve(&self, email: &str, name: &str, kind: ResourceKind) -> StoreResult<Resource>;

    /// Delete a resource record owned by `email`.
    async fn release(&self, email: &str, name: &str, kind: ResourceKind) -> StoreResult<()>;

    /// Move an owned record to `new_name` in one step. The quota count is
    /// unchanged; `created_at` and the deploy token are kept.
    async fn rename(
        &self,
        email: &str,
        name: &str,
        new_name: &str,
        kind: ResourceKind,
    ) -> StoreResult<Resource>;

    // ---- ownership ----

    async fn owned_resources(&self, email: &str, kind: ResourceKind) -> StoreResult<Vec<Resource>>;

    async fn owns(&self, email: &str, name: &str, kind: ResourceKind) -> StoreResult<bool> {
        Ok(self
            .owned_resources(email, kind)
            .await?
            .iter()
            .any(|r| r.name == name))
    }

    /// All resources of one kind across tenants, ordered by `created_at`.
    async fn list_resources(&self, kind: ResourceKind, page: Page) -> StoreResult<Vec<Resource>>;

    // ---- deploy tokens ----

    async fn deploy_token(&self, email: &str, app: &str) -> StoreResult<String>;
}
