use axum::{
    extract::State,
    routing::post,
    Router,
};
use serde::Deserialize;

use dokku_commands::databases;

use super::{created, reply, ApiResult, CreatedResult};
use crate::extract::{ApiPath, ApiQuery, AuthedTenant};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PluginQuery {
    pub plugin: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list))
        .route("/available", post(available))
        .route("/{plugin}/{name}", post(create).delete(delete))
        .route("/{plugin}/{name}/info", post(info))
        .route("/{plugin}/{name}/exists", post(exists))
        .route("/{plugin}/{name}/links", post(linked_apps))
        .route("/{plugin}/{name}/links/{app}", post(link).delete(unlink))
}

async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PluginQuery>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(databases::list(&state.commands, &tenant, query.plugin.as_deref()).await)
}

async fn available(State(state): State<AppState>, AuthedTenant(_tenant): AuthedTenant) -> ApiResult {
    reply(databases::available(&state.commands).await)
}

async fn create(
    State(state): State<AppState>,
    ApiPath((plugin, name)): ApiPath<(String, String)>,
    AuthedTenant(tenant): AuthedTenant,
) -> CreatedResult {
    created(databases::create(&state.commands, &tenant, &plugin, &name).await)
}

async fn delete(
    State(state): State<AppState>,
    ApiPath((plugin, name)): ApiPath<(String, String)>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(databases::delete(&state.commands, &tenant, &plugin, &name).await)
}

async fn info(
    State(state): State<AppState>,
    ApiPath((plugin, name)): ApiPath<(String, String)>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(databases::info(&state.commands, &tenant, &plugin, &name).await)
}

async fn exists(
    State(state): State<AppState>,
    ApiPath((plugin, name)): ApiPath<(String, String)>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(databases::exists(&state.commands, &tenant, &plugin, &name).await)
}

async fn linked_apps(
    State(state): State<AppState>,
    ApiPath((plugin, name)): ApiPath<(String, String)>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(databases::linked_apps(&state.commands, &tenant, &plugin, &name).await)
}

async fn link(
    State(state): State<AppState>,
    ApiPath((plugin, name, app)): ApiPath<(String, String, String)>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(databases::link(&state.commands, &tenant, &plugin, &name, &app).await)
}

async fn unlink(
    State(state): State<AppState>,
    ApiPath((plugin, name, app)): ApiPath<(String, String, String)>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(databases::unlink(&state.commands, &tenant, &plugin, &name, &app).await)
}
