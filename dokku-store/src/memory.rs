use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use dokku_core::{
    Page, QuotaUpdate, Quotas, Resource, ResourceKind, ResourceStore, StoreError, StoreResult,
    Tenant,
};

#[derive(Debug, Default)]
struct StoreState {
    next_id: u64,
    /// email -> tenant
    tenants: HashMap<String, Tenant>,
    /// Insertion ordered; `created_at` ties keep this order.
    resources: Vec<Resource>,
}

impl StoreState {
    fn tenant(&self, email: &str) -> StoreResult<&Tenant> {
        self.tenants.get(email).ok_or(StoreError::TenantNotFound)
    }

    fn token_taken(&self, token: &str, except: Option<&str>) -> bool {
        self.tenants
            .values()
            .any(|t| t.access_token == token && Some(t.email.as_str()) != except)
    }

    fn insert_tenant(&mut self, email: &str, access_token: &str) -> Tenant {
        self.next_id += 1;
        let tenant = Tenant {
            id: self.next_id,
            email: email.to_string(),
            access_token: access_token.to_string(),
            is_admin: false,
            created_at: Utc::now(),
            quotas: Quotas::default(),
        };
        self.tenants.insert(email.to_string(), tenant.clone());
        tenant
    }

    fn count(&self, email: &str, kind: ResourceKind) -> usize {
        self.resources
            .iter()
            .filter(|r| r.owner == email && r.kind == kind)
            .count()
    }
}

/// In-memory tenant/resource store.
///
/// All state sits behind one `RwLock`; every mutating operation, `reserve`
/// included, runs under a single write guard.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn create_tenant(&self, email: &str, access_token: &str) -> StoreResult<Tenant> {
        let mut state = self.state.write();

        if state.tenants.contains_key(email) {
            return Err(StoreError::TenantAlreadyExists);
        }
        if state.token_taken(access_token, None) {
            return Err(StoreError::AccessTokenInUse);
        }

        let tenant = state.insert_tenant(email, access_token);
        info!(tenant = tenant.id, email, "tenant created");
        Ok(tenant)
    }

    async fn get_tenant(&self, email: &str) -> StoreResult<Tenant> {
        self.state.read().tenant(email).cloned()
    }

    async fn get_tenant_by_access_token(&self, access_token: &str) -> StoreResult<Tenant> {
        self.state
            .read()
            .tenants
            .values()
            .find(|t| t.access_token == access_token)
            .cloned()
            .ok_or(StoreError::TenantNotFound)
    }

    async fn list_tenants(&self) -> StoreResult<Vec<Tenant>> {
        let mut tenants: Vec<Tenant> = self.state.read().tenants.values().cloned().collect();
        tenants.sort_by_key(|t| t.id);
        Ok(tenants)
    }

    async fn delete_tenant(&self, email: &str) -> StoreResult<()> {
        let mut state = self.state.write();

        state
            .tenants
            .remove(email)
            .ok_or(StoreError::TenantNotFound)?;
        state.resources.retain(|r| r.owner != email);

        info!(email, "tenant deleted");
        Ok(())
    }

    async fn update_email(&self, email: &str, new_email: &str) -> StoreResult<Tenant> {
        let mut state = self.state.write();

        if email != new_email && state.tenants.contains_key(new_email) {
            return Err(StoreError::TenantAlreadyExists);
        }
        let mut tenant = state
            .tenants
            .remove(email)
            .ok_or(StoreError::TenantNotFound)?;

        tenant.email = new_email.to_string();
        state.tenants.insert(new_email.to_string(), tenant.clone());
        for resource in state.resources.iter_mut().filter(|r| r.owner == email) {
            resource.owner = new_email.to_string();
        }

        Ok(tenant)
    }

    async fn update_access_token(
        &self,
        email: &str,
        new_access_token: &str,
        create_if_missing: bool,
    ) -> StoreResult<Tenant> {
        let mut state = self.state.write();

        if state.token_taken(new_access_token, Some(email)) {
            return Err(StoreError::AccessTokenInUse);
        }

        match state.tenants.get_mut(email) {
            Some(tenant) => {
                tenant.access_token = new_access_token.to_string();
                Ok(tenant.clone())
            }
            None if create_if_missing => Ok(state.insert_tenant(email, new_access_token)),
            None => Err(StoreError::TenantNotFound),
        }
    }

    async fn update_quota(&self, email: &str, update: QuotaUpdate) -> StoreResult<Tenant> {
        let mut state = self.state.write();
        let tenant = state
            .tenants
            .get_mut(email)
            .ok_or(StoreError::TenantNotFound)?;

        tenant.quotas.apply(&update);
        debug!(email, quotas = ?tenant.quotas, "quota updated");
        Ok(tenant.clone())
    }

    async fn set_admin(&self, email: &str, is_admin: bool) -> StoreResult<Tenant> {
        let mut state = self.state.write();
        let tenant = state
            .tenants
            .get_mut(email)
            .ok_or(StoreError::TenantNotFound)?;

        tenant.is_admin = is_admin;
        Ok(tenant.clone())
    }

    async fn reserve(&self, email: &str, name: &str, kind: ResourceKind) -> StoreResult<Resource> {
        let mut state = self.state.write();

        let quota = state.tenant(email)?.quotas.for_kind(kind) as usize;

        // System names are unique within a kind across every tenant.
        if state
            .resources
            .iter()
            .any(|r| r.kind == kind && r.name == name)
        {
            return Err(StoreError::AlreadyExists(kind));
        }

        let used = state.count(email, kind);
        if used >= quota {
            debug!(email, %kind, used, quota, "reservation rejected");
            return Err(StoreError::QuotaExceeded(kind));
        }

        let resource = Resource {
            name: name.to_string(),
            kind,
            owner: email.to_string(),
            created_at: Utc::now(),
            deploy_token: (kind == ResourceKind::App).then(|| Uuid::new_v4().to_string()),
        };
        state.resources.push(resource.clone());

        info!(email, %kind, name, used = used + 1, quota, "resource reserved");
        Ok(resource)
    }

    async fn release(&self, email: &str, name: &str, kind: ResourceKind) -> StoreResult<()> {
        let mut state = self.state.write();

        state.tenant(email)?;
        let index = state
            .resources
            .iter()
            .position(|r| r.owner == email && r.kind == kind && r.name == name)
            .ok_or(StoreError::ResourceNotFound(kind))?;
        state.resources.remove(index);

        info!(email, %kind, name, "resource released");
        Ok(())
    }

    async fn rename(
        &self,
        email: &str,
        name: &str,
        new_name: &str,
        kind: ResourceKind,
    ) -> StoreResult<Resource> {
        let mut state = self.state.write();

        state.tenant(email)?;
        let index = state
            .resources
            .iter()
            .position(|r| r.owner == email && r.kind == kind && r.name == name)
            .ok_or(StoreError::ResourceNotFound(kind))?;
        if state
            .resources
            .iter()
            .enumerate()
            .any(|(i, r)| i != index && r.kind == kind && r.name == new_name)
        {
            return Err(StoreError::AlreadyExists(kind));
        }

        let resource = &mut state.resources[index];
        resource.name = new_name.to_string();

        info!(email, %kind, name, new_name, "resource renamed");
        Ok(resource.clone())
    }

    async fn owned_resources(&self, email: &str, kind: ResourceKind) -> StoreResult<Vec<Resource>> {
        let state = self.state.read();
        state.tenant(email)?;

        Ok(state
            .resources
            .iter()
            .filter(|r| r.owner == email && r.kind == kind)
            .cloned()
            .collect())
    }

    async fn list_resources(&self, kind: ResourceKind, page: Page) -> StoreResult<Vec<Resource>> {
        let mut resources: Vec<Resource> = self
            .state
            .read()
            .resources
            .iter()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect();

        resources.sort_by_key(|r| r.created_at);
        if !page.ascending {
            resources.reverse();
        }

        Ok(resources
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect())
    }

    async fn deploy_token(&self, email: &str, app: &str) -> StoreResult<String> {
        let state = self.state.read();
        state.tenant(email)?;

        state
            .resources
            .iter()
            .find(|r| r.owner == email && r.kind == ResourceKind::App && r.name == app)
            .and_then(|r| r.deploy_token.clone())
            .ok_or(StoreError::ResourceNotFound(ResourceKind::App))
    }
}
