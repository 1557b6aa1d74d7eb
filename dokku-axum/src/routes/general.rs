use axum::{extract::State, routing::get, routing::post, Json, Router};
use serde_json::{json, Value};

use dokku_commands::general;

use super::{reply, ApiResult};
use crate::extract::AuthedTenant;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api", get(index))
        .route("/api/", get(index))
        .route("/api/health", get(health))
        .route("/api/version", post(version))
        .route("/api/quota", post(quota))
}

async fn index(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "name": state.api_name, "version": state.api_version }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn version(State(state): State<AppState>, AuthedTenant(_tenant): AuthedTenant) -> ApiResult {
    reply(general::version(&state.commands).await)
}

async fn quota(State(state): State<AppState>, AuthedTenant(tenant): AuthedTenant) -> ApiResult {
    reply(general::quota(&state.commands, &tenant).await)
}
