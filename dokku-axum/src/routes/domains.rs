use axum::{
    extract::State,
    routing::post,
    Router,
};

use dokku_commands::domains;

use super::{reply, ApiResult};
use crate::extract::{ApiPath, AuthedTenant};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/{app}/{domain}", post(set).delete(remove))
}

async fn set(
    State(state): State<AppState>,
    ApiPath((app, domain)): ApiPath<(String, String)>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(domains::set(&state.commands, &tenant, &app, &domain).await)
}

async fn remove(
    State(state): State<AppState>,
    ApiPath((app, domain)): ApiPath<(String, String)>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(domains::remove(&state.commands, &tenant, &app, &domain).await)
}
