//! Operator routes under `/api/admin`, guarded by the `MASTER-KEY` header.

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{post, put},
    Router,
};
use serde::Deserialize;

use dokku_commands::{letsencrypt, plugins, storage, CommandResult};
use dokku_core::{DokkuError, Page, QuotaUpdate, ResourceKind};

use super::{created, reply, ApiResult, CreatedResult};
use crate::extract::{ApiPath, ApiQuery, MasterKey};
use crate::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users/list", post(list_users))
        .route("/users/{email}", post(create_user).delete(delete_user))
        .route("/users/{email}/email", put(update_email))
        .route("/users/{email}/access-token", put(update_access_token))
        .route("/users/{email}/quota", put(update_quota))
        .route("/users/{email}/admin", put(set_admin))
        .route("/resources/{kind}", post(list_resources))
        .route("/plugins/list", post(list_plugins))
        .route("/plugins/{name}", post(install_plugin).delete(uninstall_plugin))
        .route("/plugins/{name}/installed", post(plugin_installed))
        .route("/letsencrypt/email/{email}", post(letsencrypt_email))
        .route("/letsencrypt/auto-renewal", post(letsencrypt_auto_renewal))
        .route("/storage/{email}/{app}", post(mount_storage).delete(unmount_storage))
        .route_layer(middleware::from_fn_with_state(state, require_master_key))
}

async fn require_master_key(_key: MasterKey, req: Request, next: Next) -> Response {
    next.run(req).await
}

// ---- users ----

#[derive(Debug, Deserialize)]
pub struct CreateUserQuery {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub new_email: String,
}

#[derive(Debug, Deserialize)]
pub struct AccessTokenQuery {
    pub new_access_token: String,
    #[serde(default)]
    pub create_if_not_exists: bool,
}

#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    pub is_admin: bool,
}

fn json_result<T: serde::Serialize>(value: T) -> ApiResult {
    let value = serde_json::to_value(value).map_err(anyhow::Error::from)?;
    reply(Ok(CommandResult::ok(value)))
}

async fn list_users(State(state): State<AppState>) -> ApiResult {
    json_result(state.store.list_tenants().await?)
}

async fn create_user(
    State(state): State<AppState>,
    ApiPath(email): ApiPath<String>,
    ApiQuery(query): ApiQuery<CreateUserQuery>,
) -> CreatedResult {
    if query.access_token.trim().is_empty() {
        return Err(DokkuError::bad_request("access_token must not be empty").into());
    }
    let tenant = state.store.create_tenant(&email, &query.access_token).await?;
    let value = serde_json::to_value(tenant).map_err(anyhow::Error::from)?;
    created(Ok(CommandResult::ok(value)))
}

async fn delete_user(State(state): State<AppState>, ApiPath(email): ApiPath<String>) -> ApiResult {
    state.store.delete_tenant(&email).await?;
    reply(Ok(CommandResult::ok(serde_json::json!({}))))
}

async fn update_email(
    State(state): State<AppState>,
    ApiPath(email): ApiPath<String>,
    ApiQuery(query): ApiQuery<EmailQuery>,
) -> ApiResult {
    json_result(state.store.update_email(&email, &query.new_email).await?)
}

async fn update_access_token(
    State(state): State<AppState>,
    ApiPath(email): ApiPath<String>,
    ApiQuery(query): ApiQuery<AccessTokenQuery>,
) -> ApiResult {
    let tenant = state
        .store
        .update_access_token(&email, &query.new_access_token, query.create_if_not_exists)
        .await?;
    json_result(tenant)
}

async fn update_quota(
    State(state): State<AppState>,
    ApiPath(email): ApiPath<String>,
    ApiQuery(update): ApiQuery<QuotaUpdate>,
) -> ApiResult {
    json_result(state.store.update_quota(&email, update).await?)
}

async fn set_admin(
    State(state): State<AppState>,
    ApiPath(email): ApiPath<String>,
    ApiQuery(query): ApiQuery<AdminQuery>,
) -> ApiResult {
    json_result(state.store.set_admin(&email, query.is_admin).await?)
}

// ---- resources ----

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    pub asc_created_at: Option<bool>,
}

impl From<PageQuery> for Page {
    fn from(query: PageQuery) -> Self {
        let default = Page::default();
        Page {
            offset: query.offset.unwrap_or(default.offset),
            limit: query.limit.unwrap_or(default.limit),
            ascending: query.asc_created_at.unwrap_or(default.ascending),
        }
    }
}

async fn list_resources(
    State(state): State<AppState>,
    ApiPath(kind): ApiPath<String>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult {
    let kind: ResourceKind = kind.parse()?;
    json_result(state.store.list_resources(kind, page.into()).await?)
}

// ---- plugins ----

#[derive(Debug, Default, Deserialize)]
pub struct InstallQuery {
    pub url: Option<String>,
}

async fn list_plugins(State(state): State<AppState>) -> ApiResult {
    reply(plugins::list(&state.commands).await)
}

async fn install_plugin(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    ApiQuery(query): ApiQuery<InstallQuery>,
) -> ApiResult {
    reply(plugins::install(&state.commands, &name, query.url.as_deref()).await)
}

async fn uninstall_plugin(State(state): State<AppState>, ApiPath(name): ApiPath<String>) -> ApiResult {
    reply(plugins::uninstall(&state.commands, &name).await)
}

async fn plugin_installed(State(state): State<AppState>, ApiPath(name): ApiPath<String>) -> ApiResult {
    reply(plugins::installed(&state.commands, &name).await)
}

// ---- letsencrypt ----

async fn letsencrypt_email(State(state): State<AppState>, ApiPath(email): ApiPath<String>) -> ApiResult {
    reply(letsencrypt::set_email(&state.commands, &email).await)
}

async fn letsencrypt_auto_renewal(State(state): State<AppState>) -> ApiResult {
    reply(letsencrypt::enable_auto_renewal(&state.commands).await)
}

// ---- storage ----

async fn mount_storage(
    State(state): State<AppState>,
    ApiPath((email, app)): ApiPath<(String, String)>,
) -> CreatedResult {
    let tenant = state.store.get_tenant(&email).await?;
    created(storage::mount(&state.commands, &tenant, &app).await)
}

async fn unmount_storage(
    State(state): State<AppState>,
    ApiPath((email, app)): ApiPath<(String, String)>,
) -> ApiResult {
    let tenant = state.store.get_tenant(&email).await?;
    reply(storage::unmount(&state.commands, &tenant, &app).await)
}
