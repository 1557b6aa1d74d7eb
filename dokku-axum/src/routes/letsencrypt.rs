use axum::{
    extract::State,
    routing::post,
    Router,
};

use dokku_commands::letsencrypt;

use super::{reply, ApiResult};
use crate::extract::{ApiPath, AuthedTenant};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/{app}", post(enable).delete(disable))
}

async fn enable(
    State(state): State<AppState>,
    ApiPath(app): ApiPath<String>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(letsencrypt::enable(&state.commands, &tenant, &app).await)
}

async fn disable(
    State(state): State<AppState>,
    ApiPath(app): ApiPath<String>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(letsencrypt::disable(&state.commands, &tenant, &app).await)
}
