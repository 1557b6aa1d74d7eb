//! SQLite-backed tenant/resource store.
//!
//! Every worker process can open the same database file. `reserve` is a
//! single `INSERT ... SELECT` whose `WHERE` clause carries the quota
//! check, so the count and the insert share one write transaction and
//! `PRIMARY KEY (kind, name)` rejects duplicate names.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use dokku_core::{
    Page, QuotaUpdate, Quotas, Resource, ResourceKind, ResourceStore, StoreError, StoreResult,
    Tenant,
};

const SCHEMA: [&str; 3] = [
    r#"CREATE TABLE IF NOT EXISTS tenants (
        id             INTEGER PRIMARY KEY AUTOINCREMENT,
        email          TEXT    NOT NULL UNIQUE,
        access_token   TEXT    NOT NULL UNIQUE,
        is_admin       BOOLEAN NOT NULL DEFAULT 0,
        created_at     TEXT    NOT NULL,
        apps_quota     INTEGER NOT NULL DEFAULT 0,
        services_quota INTEGER NOT NULL DEFAULT 0,
        networks_quota INTEGER NOT NULL DEFAULT 0,
        storage_quota  INTEGER NOT NULL DEFAULT 0
    )"#,
    r#"CREATE TABLE IF NOT EXISTS resources (
        kind         TEXT    NOT NULL,
        name         TEXT    NOT NULL,
        owner_id     INTEGER NOT NULL REFERENCES tenants (id) ON DELETE CASCADE,
        created_at   TEXT    NOT NULL,
        deploy_token TEXT    UNIQUE,
        PRIMARY KEY (kind, name)
    )"#,
    "CREATE INDEX IF NOT EXISTS resources_by_owner ON resources (owner_id, kind)",
];

const TENANT_COLUMNS: &str = "id, email, access_token, is_admin, created_at, \
     apps_quota, services_quota, networks_quota, storage_quota";

const RESOURCE_SELECT: &str = "SELECT r.kind, r.name, t.email AS owner, r.created_at, r.deploy_token \
     FROM resources r JOIN tenants t ON t.id = r.owner_id";

#[derive(Debug, FromRow)]
struct TenantRow {
    id: i64,
    email: String,
    access_token: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
    apps_quota: i64,
    services_quota: i64,
    networks_quota: i64,
    storage_quota: i64,
}

impl From<TenantRow> for Tenant {
    fn from(row: TenantRow) -> Self {
        let quota = |v: i64| u32::try_from(v).unwrap_or_default();
        Tenant {
            id: u64::try_from(row.id).unwrap_or_default(),
            email: row.email,
            access_token: row.access_token,
            is_admin: row.is_admin,
            created_at: row.created_at,
            quotas: Quotas {
                apps_quota: quota(row.apps_quota),
                services_quota: quota(row.services_quota),
                networks_quota: quota(row.networks_quota),
                storage_quota: quota(row.storage_quota),
            },
        }
    }
}

#[derive(Debug, FromRow)]
struct ResourceRow {
    kind: String,
    name: String,
    owner: String,
    created_at: DateTime<Utc>,
    deploy_token: Option<String>,
}

impl TryFrom<ResourceRow> for Resource {
    type Error = StoreError;

    fn try_from(row: ResourceRow) -> StoreResult<Self> {
        let kind = ResourceKind::from_str(&row.kind)
            .map_err(|e| StoreError::Backend(e.message))?;
        Ok(Resource {
            name: row.name,
            kind,
            owner: row.owner,
            created_at: row.created_at,
            deploy_token: row.deploy_token,
        })
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|e| e.is_unique_violation())
}

fn quota_column(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::App => "apps_quota",
        ResourceKind::Service => "services_quota",
        ResourceKind::Network => "networks_quota",
        ResourceKind::Storage => "storage_quota",
    }
}

fn resources(rows: Vec<ResourceRow>) -> StoreResult<Vec<Resource>> {
    rows.into_iter().map(Resource::try_from).collect()
}

/// Tenant/resource store persisted in SQLite.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `url` and apply the schema.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(backend)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .map_err(backend)?;

        let store = Self { pool };
        store.migrate().await?;
        info!(url, "sqlite store ready");
        Ok(store)
    }

    /// A private in-memory database on a single connection.
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(backend)?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(backend)?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(backend)?;
        }
        Ok(())
    }

    async fn email_taken(&self, email: &str) -> StoreResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM tenants WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(found.is_some())
    }

    async fn name_taken(&self, name: &str, kind: ResourceKind) -> StoreResult<bool> {
        let found: Option<String> =
            sqlx::query_scalar("SELECT name FROM resources WHERE kind = ? AND name = ?")
                .bind(kind.as_str())
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;
        Ok(found.is_some())
    }

    async fn owned_resource(&self, email: &str, name: &str, kind: ResourceKind) -> StoreResult<Resource> {
        let row: ResourceRow = sqlx::query_as(&format!(
            "{RESOURCE_SELECT} WHERE t.email = ? AND r.kind = ? AND r.name = ?"
        ))
        .bind(email)
        .bind(kind.as_str())
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or(StoreError::ResourceNotFound(kind))?;
        Resource::try_from(row)
    }
}

#[async_trait]
impl ResourceStore for SqliteStore {
    async fn create_tenant(&self, email: &str, access_token: &str) -> StoreResult<Tenant> {
        let inserted = sqlx::query("INSERT INTO tenants (email, access_token, created_at) VALUES (?, ?, ?)")
            .bind(email)
            .bind(access_token)
            .bind(Utc::now())
            .execute(&self.pool)
            .await;

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(if self.email_taken(email).await? {
                    StoreError::TenantAlreadyExists
                } else {
                    StoreError::AccessTokenInUse
                });
            }
            Err(e) => return Err(backend(e)),
        }

        let tenant = self.get_tenant(email).await?;
        info!(tenant = tenant.id, email, "tenant created");
        Ok(tenant)
    }

    async fn get_tenant(&self, email: &str) -> StoreResult<Tenant> {
        let row: TenantRow = sqlx::query_as(&format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .ok_or(StoreError::TenantNotFound)?;
        Ok(row.into())
    }

    async fn get_tenant_by_access_token(&self, access_token: &str) -> StoreResult<Tenant> {
        let row: TenantRow =
            sqlx::query_as(&format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE access_token = ?"))
                .bind(access_token)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?
                .ok_or(StoreError::TenantNotFound)?;
        Ok(row.into())
    }

    async fn list_tenants(&self) -> StoreResult<Vec<Tenant>> {
        let rows: Vec<TenantRow> = sqlx::query_as(&format!("SELECT {TENANT_COLUMNS} FROM tenants ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(Tenant::from).collect())
    }

    async fn delete_tenant(&self, email: &str) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query("DELETE FROM resources WHERE owner_id IN (SELECT id FROM tenants WHERE email = ?)")
            .bind(email)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        let deleted = sqlx::query("DELETE FROM tenants WHERE email = ?")
            .bind(email)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        if deleted.rows_affected() == 0 {
            return Err(StoreError::TenantNotFound);
        }

        tx.commit().await.map_err(backend)?;
        info!(email, "tenant deleted");
        Ok(())
    }

    async fn update_email(&self, email: &str, new_email: &str) -> StoreResult<Tenant> {
        // Resources reference the tenant id, so ownership follows the row.
        let updated = sqlx::query("UPDATE tenants SET email = ? WHERE email = ?")
            .bind(new_email)
            .bind(email)
            .execute(&self.pool)
            .await;

        match updated {
            Ok(done) if done.rows_affected() == 0 => Err(StoreError::TenantNotFound),
            Ok(_) => self.get_tenant(new_email).await,
            Err(e) if is_unique_violation(&e) => Err(StoreError::TenantAlreadyExists),
            Err(e) => Err(backend(e)),
        }
    }

    async fn update_access_token(
        &self,
        email: &str,
        new_access_token: &str,
        create_if_missing: bool,
    ) -> StoreResult<Tenant> {
        let updated = sqlx::query("UPDATE tenants SET access_token = ? WHERE email = ?")
            .bind(new_access_token)
            .bind(email)
            .execute(&self.pool)
            .await;

        match updated {
            Ok(done) if done.rows_affected() == 0 => {
                if create_if_missing {
                    self.create_tenant(email, new_access_token).await
                } else {
                    Err(StoreError::TenantNotFound)
                }
            }
            Ok(_) => self.get_tenant(email).await,
            Err(e) if is_unique_violation(&e) => Err(StoreError::AccessTokenInUse),
            Err(e) => Err(backend(e)),
        }
    }

    async fn update_quota(&self, email: &str, update: QuotaUpdate) -> StoreResult<Tenant> {
        let updated = sqlx::query(
            "UPDATE tenants SET \
                 apps_quota = COALESCE(?, apps_quota), \
                 services_quota = COALESCE(?, services_quota), \
                 networks_quota = COALESCE(?, networks_quota), \
                 storage_quota = COALESCE(?, storage_quota) \
             WHERE email = ?",
        )
        .bind(update.apps_quota)
        .bind(update.services_quota)
        .bind(update.networks_quota)
        .bind(update.storage_quota)
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::TenantNotFound);
        }
        let tenant = self.get_tenant(email).await?;
        debug!(email, quotas = ?tenant.quotas, "quota updated");
        Ok(tenant)
    }

    async fn set_admin(&self, email: &str, is_admin: bool) -> StoreResult<Tenant> {
        let updated = sqlx::query("UPDATE tenants SET is_admin = ? WHERE email = ?")
            .bind(is_admin)
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::TenantNotFound);
        }
        self.get_tenant(email).await
    }

    async fn reserve(&self, email: &str, name: &str, kind: ResourceKind) -> StoreResult<Resource> {
        self.get_tenant(email).await?;
        if self.name_taken(name, kind).await? {
            return Err(StoreError::AlreadyExists(kind));
        }

        let created_at = Utc::now();
        let deploy_token = (kind == ResourceKind::App).then(|| Uuid::new_v4().to_string());

        let inserted = sqlx::query(&format!(
            "INSERT INTO resources (kind, name, owner_id, created_at, deploy_token) \
             SELECT ?1, ?2, t.id, ?3, ?4 FROM tenants t \
             WHERE t.email = ?5 \
               AND (SELECT COUNT(*) FROM resources r WHERE r.owner_id = t.id AND r.kind = ?1) \
                   < t.{}",
            quota_column(kind)
        ))
        .bind(kind.as_str())
        .bind(name)
        .bind(created_at)
        .bind(deploy_token.as_deref())
        .bind(email)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(done) if done.rows_affected() == 1 => {}
            Ok(_) => {
                // Nothing inserted: the tenant vanished or the quota is full.
                self.get_tenant(email).await?;
                debug!(email, %kind, name, "reservation rejected");
                return Err(StoreError::QuotaExceeded(kind));
            }
            Err(e) if is_unique_violation(&e) => return Err(StoreError::AlreadyExists(kind)),
            Err(e) => return Err(backend(e)),
        }

        info!(email, %kind, name, "resource reserved");
        Ok(Resource {
            name: name.to_string(),
            kind,
            owner: email.to_string(),
            created_at,
            deploy_token,
        })
    }

    async fn release(&self, email: &str, name: &str, kind: ResourceKind) -> StoreResult<()> {
        self.get_tenant(email).await?;

        let deleted = sqlx::query(
            "DELETE FROM resources WHERE kind = ? AND name = ? \
             AND owner_id = (SELECT id FROM tenants WHERE email = ?)",
        )
        .bind(kind.as_str())
        .bind(name)
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if deleted.rows_affected() == 0 {
            return Err(StoreError::ResourceNotFound(kind));
        }
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
        self.get_tenant(email).await?;

        let updated = sqlx::query(
            "UPDATE resources SET name = ? WHERE kind = ? AND name = ? \
             AND owner_id = (SELECT id FROM tenants WHERE email = ?)",
        )
        .bind(new_name)
        .bind(kind.as_str())
        .bind(name)
        .bind(email)
        .execute(&self.pool)
        .await;

        match updated {
            Ok(done) if done.rows_affected() == 0 => Err(StoreError::ResourceNotFound(kind)),
            Ok(_) => {
                info!(email, %kind, name, new_name, "resource renamed");
                self.owned_resource(email, new_name, kind).await
            }
            Err(e) if is_unique_violation(&e) => Err(StoreError::AlreadyExists(kind)),
            Err(e) => Err(backend(e)),
        }
    }

    async fn owned_resources(&self, email: &str, kind: ResourceKind) -> StoreResult<Vec<Resource>> {
        self.get_tenant(email).await?;

        let rows: Vec<ResourceRow> = sqlx::query_as(&format!(
            "{RESOURCE_SELECT} WHERE t.email = ? AND r.kind = ? ORDER BY r.created_at, r.rowid"
        ))
        .bind(email)
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        resources(rows)
    }

    async fn list_resources(&self, kind: ResourceKind, page: Page) -> StoreResult<Vec<Resource>> {
        let order = if page.ascending { "ASC" } else { "DESC" };
        let rows: Vec<ResourceRow> = sqlx::query_as(&format!(
            "{RESOURCE_SELECT} WHERE r.kind = ? \
             ORDER BY r.created_at {order}, r.rowid {order} LIMIT ? OFFSET ?"
        ))
        .bind(kind.as_str())
        .bind(i64::try_from(page.limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(page.offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        resources(rows)
    }

    async fn deploy_token(&self, email: &str, app: &str) -> StoreResult<String> {
        self.get_tenant(email).await?;
        self.owned_resource(email, app, ResourceKind::App)
            .await?
            .deploy_token
            .ok_or(StoreError::ResourceNotFound(ResourceKind::App))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_tenant(apps: u32) -> SqliteStore {
        let store = SqliteStore::in_memory().await.unwrap();
        store.create_tenant("a@x.io", "tok").await.unwrap();
        store
            .update_quota(
                "a@x.io",
                QuotaUpdate {
                    apps_quota: Some(apps),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn tenants_round_trip() {
        let store = store_with_tenant(3).await;

        let tenant = store.get_tenant("a@x.io").await.unwrap();
        assert_eq!(tenant.id, 1);
        assert_eq!(tenant.quotas.apps_quota, 3);
        assert_eq!(tenant.quotas.networks_quota, 0);
        assert_eq!(store.get_tenant_by_access_token("tok").await.unwrap(), tenant);

        assert_eq!(
            store.create_tenant("a@x.io", "other").await.unwrap_err(),
            StoreError::TenantAlreadyExists
        );
        assert_eq!(
            store.create_tenant("b@x.io", "tok").await.unwrap_err(),
            StoreError::AccessTokenInUse
        );

        let admin = store.set_admin("a@x.io", true).await.unwrap();
        assert!(admin.is_admin);
    }

    #[tokio::test]
    async fn reserve_checks_tenant_then_name_then_quota() {
        let store = store_with_tenant(1).await;

        assert_eq!(
            store.reserve("ghost@x.io", "1-web", ResourceKind::App).await.unwrap_err(),
            StoreError::TenantNotFound
        );

        let app = store.reserve("a@x.io", "1-web", ResourceKind::App).await.unwrap();
        assert!(app.deploy_token.is_some());
        assert_eq!(
            store.reserve("a@x.io", "1-web", ResourceKind::App).await.unwrap_err(),
            StoreError::AlreadyExists(ResourceKind::App)
        );
        assert_eq!(
            store.reserve("a@x.io", "1-api", ResourceKind::App).await.unwrap_err(),
            StoreError::QuotaExceeded(ResourceKind::App)
        );

        store.release("a@x.io", "1-web", ResourceKind::App).await.unwrap();
        store.reserve("a@x.io", "1-api", ResourceKind::App).await.unwrap();
    }

    #[tokio::test]
    async fn rename_and_email_change_keep_ownership() {
        let store = store_with_tenant(2).await;
        let app = store.reserve("a@x.io", "1-web", ResourceKind::App).await.unwrap();

        let renamed = store
            .rename("a@x.io", "1-web", "1-site", ResourceKind::App)
            .await
            .unwrap();
        assert_eq!(renamed.deploy_token, app.deploy_token);

        store.update_email("a@x.io", "b@x.io").await.unwrap();
        assert!(store.owns("b@x.io", "1-site", ResourceKind::App).await.unwrap());
        assert_eq!(
            store.deploy_token("b@x.io", "1-site").await.unwrap(),
            app.deploy_token.unwrap()
        );
    }

    #[tokio::test]
    async fn deleting_a_tenant_drops_its_resources() {
        let store = store_with_tenant(1).await;
        store.reserve("a@x.io", "1-web", ResourceKind::App).await.unwrap();

        store.delete_tenant("a@x.io").await.unwrap();
        assert!(store
            .list_resources(ResourceKind::App, Page::default())
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            store.delete_tenant("a@x.io").await.unwrap_err(),
            StoreError::TenantNotFound
        );
    }
}
