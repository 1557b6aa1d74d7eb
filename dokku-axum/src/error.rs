use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dokku_core::{DokkuError, StoreError};
use tracing::error;

#[derive(Debug)]
pub struct DokkuAxumError(pub anyhow::Error);

impl From<anyhow::Error> for DokkuAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<DokkuError> for DokkuAxumError {
    fn from(e: DokkuError) -> Self {
        Self(e.into_anyhow())
    }
}

fn respond(err: &DokkuError) -> Response {
    let safe = err.sanitize_for_client();
    let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(safe.to_json())).into_response()
}

impl IntoResponse for DokkuAxumError {
    fn into_response(self) -> Response {
        // A DokkuError anywhere in the chain keeps its kind and message.
        if let Some(dokku) = DokkuError::from_anyhow(&self.0) {
            return respond(dokku);
        }

        let dokku = DokkuError::normalize(self.0);
        if dokku.code() >= 500 {
            error!(error = %dokku.message, "unhandled error");
        }
        respond(&dokku)
    }
}

impl From<StoreError> for DokkuAxumError {
    fn from(e: StoreError) -> Self {
        Self(e.into_anyhow())
    }
}
