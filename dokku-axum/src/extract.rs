//! Request extractors: tenant and admin authentication, plus path and
//! query wrappers whose rejections use the `{"detail"}` error body.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};

use dokku_auth::{
    validate_api_key, validate_master_key, validate_user_credentials, AuthPayload,
    MASTER_KEY_HEADER,
};
use dokku_core::{DokkuError, Tenant};

use crate::{AppState, DokkuAxumError};

#[derive(Debug, Default, Deserialize)]
struct ApiKeyQuery {
    api_key: Option<String>,
}

fn map_json_rejection(rejection: JsonRejection) -> DokkuAxumError {
    DokkuError::bad_request(format!(
        "Failed to parse the request body as JSON: {}",
        rejection.body_text()
    ))
    .into()
}

/// The tenant behind a request's `api_key` query parameter and
/// `{email, access_token}` body. Consumes the body.
#[derive(Debug, Clone)]
pub struct AuthedTenant(pub Tenant);

impl FromRequest<AppState> for AuthedTenant {
    type Rejection = DokkuAxumError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<ApiKeyQuery>::try_from_uri(req.uri()).unwrap_or_default();
        validate_api_key(&state.keys, query.api_key.as_deref())?;

        let Json(payload) = Json::<AuthPayload>::from_request(req, state)
            .await
            .map_err(map_json_rejection)?;

        let tenant = validate_user_credentials(state.store.as_ref(), &payload).await?;
        Ok(Self(tenant))
    }
}

/// Guard for admin routes: a valid `MASTER-KEY` header.
#[derive(Debug, Clone, Copy)]
pub struct MasterKey;

impl FromRequestParts<AppState> for MasterKey {
    type Rejection = DokkuAxumError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(MASTER_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        validate_master_key(&state.keys, header)?;
        Ok(Self)
    }
}

/// [`Path`] answering a malformed segment with 400 `{"detail"}`.
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = DokkuAxumError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| DokkuError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// [`Query`] answering a malformed query string with 400 `{"detail"}`.
#[derive(Debug, Clone)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = DokkuAxumError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| DokkuError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}
