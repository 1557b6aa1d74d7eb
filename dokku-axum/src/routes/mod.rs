//! Route tables, one module per resource family.

use axum::{http::StatusCode, Json};
use dokku_commands::CommandResult;

use crate::DokkuAxumError;

pub mod admin;
pub mod apps;
pub mod config;
pub mod databases;
pub mod domains;
pub mod general;
pub mod letsencrypt;
pub mod networks;

pub type ApiResult = Result<Json<CommandResult>, DokkuAxumError>;
pub type CreatedResult = Result<(StatusCode, Json<CommandResult>), DokkuAxumError>;

pub(crate) fn reply(result: anyhow::Result<CommandResult>) -> ApiResult {
    Ok(Json(result?))
}

/// 201 when the remote command succeeded, 200 with `success=false` otherwise.
pub(crate) fn created(result: anyhow::Result<CommandResult>) -> CreatedResult {
    let result = result?;
    let status = if result.success {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(result)))
}
