use axum::{
    extract::State,
    routing::post,
    Router,
};
use serde::Deserialize;

use dokku_commands::apps;
use dokku_core::DokkuError;

use super::{created, reply, ApiResult, CreatedResult};
use crate::extract::{ApiPath, ApiQuery, AuthedTenant};
use crate::{AppState, DokkuAxumError};

#[derive(Debug, Default, Deserialize)]
pub struct ProxyQuery {
    #[serde(default)]
    pub use_proxy: bool,
}

/// Ports are checked once the tenant is authenticated.
fn port(segment: &str) -> Result<u16, DokkuAxumError> {
    segment
        .parse()
        .map_err(|_| DokkuError::bad_request(format!("Invalid port: {segment}")).into())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list))
        .route("/{name}", post(create).delete(delete))
        .route("/{name}/exists", post(exists))
        .route("/{name}/clone/{existing}", post(clone))
        .route("/{name}/rename/{new_name}", post(rename))
        .route("/{name}/info", post(info))
        .route("/{name}/url", post(url))
        .route("/{name}/logs", post(logs))
        .route("/{name}/start", post(start))
        .route("/{name}/stop", post(stop))
        .route("/{name}/restart", post(restart))
        .route("/{name}/rebuild", post(rebuild))
        .route("/{name}/builder", post(builder))
        .route("/{name}/builder/{builder}", post(set_builder))
        .route("/{name}/network", post(network))
        .route("/{name}/ports", post(ports))
        .route(
            "/{name}/ports/{protocol}/{origin}/{dest}",
            post(add_port).delete(remove_port),
        )
        .route("/{name}/databases", post(linked_databases))
        .route("/{name}/deployment-token", post(deployment_token))
}

async fn list(State(state): State<AppState>, AuthedTenant(tenant): AuthedTenant) -> ApiResult {
    reply(apps::list(&state.commands, &tenant).await)
}

async fn create(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    AuthedTenant(tenant): AuthedTenant,
) -> CreatedResult {
    created(apps::create(&state.commands, &tenant, &name).await)
}

async fn delete(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(apps::delete(&state.commands, &tenant, &name).await)
}

async fn exists(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(apps::exists(&state.commands, &tenant, &name).await)
}

async fn clone(
    State(state): State<AppState>,
    ApiPath((name, existing)): ApiPath<(String, String)>,
    AuthedTenant(tenant): AuthedTenant,
) -> CreatedResult {
    created(apps::clone(&state.commands, &tenant, &name, &existing).await)
}

async fn rename(
    State(state): State<AppState>,
    ApiPath((name, new_name)): ApiPath<(String, String)>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(apps::rename(&state.commands, &tenant, &name, &new_name).await)
}

async fn info(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(apps::info(&state.commands, &tenant, &name).await)
}

async fn url(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(apps::url(&state.commands, &tenant, &name).await)
}

async fn logs(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(apps::logs(&state.commands, &tenant, &name).await)
}

async fn start(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(apps::start(&state.commands, &tenant, &name).await)
}

async fn stop(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(apps::stop(&state.commands, &tenant, &name).await)
}

async fn restart(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(apps::restart(&state.commands, &tenant, &name).await)
}

async fn rebuild(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(apps::rebuild(&state.commands, &tenant, &name).await)
}

async fn builder(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(apps::builder(&state.commands, &tenant, &name).await)
}

async fn set_builder(
    State(state): State<AppState>,
    ApiPath((name, builder)): ApiPath<(String, String)>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(apps::set_builder(&state.commands, &tenant, &name, &builder).await)
}

async fn network(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(apps::network(&state.commands, &tenant, &name).await)
}

async fn ports(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    ApiQuery(query): ApiQuery<ProxyQuery>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(apps::ports(&state.commands, &tenant, &name, query.use_proxy).await)
}

async fn add_port(
    State(state): State<AppState>,
    ApiPath((name, protocol, origin, dest)): ApiPath<(String, String, String, String)>,
    ApiQuery(query): ApiQuery<ProxyQuery>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    let (origin, dest) = (port(&origin)?, port(&dest)?);
    reply(
        apps::add_port(&state.commands, &tenant, &name, &protocol, origin, dest, query.use_proxy)
            .await,
    )
}

async fn remove_port(
    State(state): State<AppState>,
    ApiPath((name, protocol, origin, dest)): ApiPath<(String, String, String, String)>,
    ApiQuery(query): ApiQuery<ProxyQuery>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    let (origin, dest) = (port(&origin)?, port(&dest)?);
    reply(
        apps::remove_port(&state.commands, &tenant, &name, &protocol, origin, dest, query.use_proxy)
            .await,
    )
}

async fn linked_databases(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(apps::linked_databases(&state.commands, &tenant, &name).await)
}

async fn deployment_token(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    AuthedTenant(tenant): AuthedTenant,
) -> ApiResult {
    reply(apps::deployment_token(&state.commands, &tenant, &name).await)
}
