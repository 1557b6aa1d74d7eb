use axum::{
    extract::State,
    routing::post,
    Router,
};

use dokku_commands::networks;

use super::{created, reply, ApiResult, CreatedResult};
use crate::extract::{ApiPath, AuthedTenant};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list))
        .route("/{name}", post(create).delete(delete))
        .route("/{name}/links", post(linked_apps))
        .route("/{name}/attach/{app}", post(attach))
}

async fn list(State(state): State<AppState>, AuthedTenant(tenant): AuthedTenant) -> ApiResult {
    reply(networks::list(&state.commands, &tenant).await)
}

async fn create(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    AuthedTenant(tenant): AuthedTenant,
) -> CreatedResult {
    created(networks::create(&state.commands, &tenant, &name).await)
}

async fn delete(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(networks::delete(&state.commands, &tenant, &name).await)
}

async fn linked_apps(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(networks::linked_apps(&state.commands, &tenant, &name).await)
}

async fn attach(
    State(state): State<AppState>,
    ApiPath((name, app)): ApiPath<(String, String)>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(networks::attach(&state.commands, &tenant, &name, &app).await)
}
