use axum::{
    extract::State,
    routing::{post, put},
    Router,
};
use serde::Deserialize;

use dokku_commands::config;

use super::{reply, ApiResult};
use crate::extract::{ApiPath, ApiQuery, AuthedTenant};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ValueQuery {
    pub value: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{app}", post(list))
        .route("/{app}/apply", post(apply))
        .route("/{app}/{key}", put(set_from_query).delete(unset))
        .route("/{app}/{key}/{value}", post(set))
}

async fn list(
    State(state): State<AppState>,
    ApiPath(app): ApiPath<String>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(config::list(&state.commands, &tenant, &app).await)
}

async fn set(
    State(state): State<AppState>,
    ApiPath((app, key, value)): ApiPath<(String, String, String)>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(config::set(&state.commands, &tenant, &app, &key, &value).await)
}

/// Values with `/` or other path-hostile characters go in the query string.
async fn set_from_query(
    State(state): State<AppState>,
    ApiPath((app, key)): ApiPath<(String, String)>,
    ApiQuery(query): ApiQuery<ValueQuery>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(config::set(&state.commands, &tenant, &app, &key, &query.value).await)
}

async fn unset(
    State(state): State<AppState>,
    ApiPath((app, key)): ApiPath<(String, String)>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(config::unset(&state.commands, &tenant, &app, &key).await)
}

async fn apply(
    State(state): State<AppState>,
    ApiPath(app): ApiPath<String>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(config::apply(&state.commands, &tenant, &app).await)
}
