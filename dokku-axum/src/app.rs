use std::net::SocketAddr;

use axum::{middleware, Router};
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::rate_limit::rate_limit;
use crate::routes;
use crate::AppState;

/// The assembled HTTP surface of the gateway.
#[derive(Clone)]
pub struct DokkuApi {
    pub state: AppState,
    pub router: Router<()>,
}

impl DokkuApi {
    pub fn new(state: AppState) -> Self {
        Self {
            router: router(state.clone()),
            state,
        }
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, api = %self.state.api_name, "listening");
        axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }
}

/// Every route with the request-id, tracing, CORS and rate limit layers.
pub fn router(state: AppState) -> Router<()> {
    let api = Router::new()
        .merge(routes::general::router())
        .nest("/api/apps", routes::apps::router())
        .nest("/api/config", routes::config::router())
        .nest("/api/databases", routes::databases::router())
        .nest("/api/domains", routes::domains::router())
        .nest("/api/networks", routes::networks::router())
        .nest("/api/letsencrypt", routes::letsencrypt::router())
        .nest("/api/admin", routes::admin::router(state.clone()));

    api.layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
