//! # Errors
//!
//! The gateway carries one structured error type through every layer.
//! Core goals:
//! - a fixed taxonomy with stable status codes
//! - can be carried through `anyhow::Error` (services return `anyhow::Result`)
//! - transport-agnostic (the HTTP crate decides how to serialize)
//!
//! Remote command failures are NOT errors. They are returned as data
//! (`success: false`) by the command services.

use std::fmt;

use anyhow::Error as AnyError;

use crate::store::StoreError;

/// A convenience result type for gateway APIs.
pub type DokkuResult<T> = std::result::Result<T, AnyError>;

/// Detail string used for every quota rejection.
pub const QUOTA_EXCEEDED: &str = "Quota exceeded";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,      // 400
    Forbidden,       // 403
    NotFound,        // 404
    AlreadyExists,   // 403
    QuotaExceeded,   // 403
    TooManyRequests, // 429
    GeneralError,    // 500
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::AlreadyExists => 403,
            ErrorKind::QuotaExceeded => 403,
            ErrorKind::TooManyRequests => 429,
            ErrorKind::GeneralError => 500,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::AlreadyExists => "AlreadyExists",
            ErrorKind::QuotaExceeded => "QuotaExceeded",
            ErrorKind::TooManyRequests => "TooManyRequests",
            ErrorKind::GeneralError => "GeneralError",
        }
    }
}

/// A structured gateway error that can live inside `anyhow::Error`.
#[derive(Debug)]
pub struct DokkuError {
    pub kind: ErrorKind,
    pub message: String,
    pub source: Option<AnyError>,
}

impl DokkuError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Convert into `anyhow::Error`.
    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Find a `DokkuError` anywhere in an `anyhow` chain.
    pub fn from_anyhow(err: &AnyError) -> Option<&DokkuError> {
        err.chain().find_map(|e| e.downcast_ref::<DokkuError>())
    }

    /// Turn any error into a DokkuError:
    /// - if it's already a DokkuError, keep it
    /// - a bare `StoreError` maps to its kind
    /// - otherwise wrap as GeneralError
    pub fn normalize(err: AnyError) -> DokkuError {
        let err = match err.downcast::<DokkuError>() {
            Ok(dokku) => return dokku,
            Err(other) => other,
        };
        match err.downcast::<StoreError>() {
            Ok(store) => DokkuError::from(store),
            Err(other) => {
                DokkuError::new(ErrorKind::GeneralError, other.to_string()).with_source(other)
            }
        }
    }

    /// Client-safe copy: drops the inner `source`.
    pub fn sanitize_for_client(&self) -> DokkuError {
        DokkuError {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }

    /// Client payload: `{"detail": "..."}`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "detail": self.message })
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyExists, msg)
    }
    pub fn quota_exceeded() -> Self {
        Self::new(ErrorKind::QuotaExceeded, QUOTA_EXCEEDED)
    }
    pub fn too_many_requests(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::TooManyRequests, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
}

impl fmt::Display for DokkuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for DokkuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Convenience helper for "bail with DokkuError".
#[macro_export]
macro_rules! bail_dokku {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::DokkuError::$ctor($msg).into_anyhow());
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::DokkuError::$ctor(format!($fmt, $($arg)*)).into_anyhow());
    };
}
