//! Error taxonomy for the game core and the HTTP layer built on top of it.
//!
//! `GameError` covers configuration and domain failures; `ApiError` is the thin,
//! HTTP-facing wrapper the handlers return (status code + machine-readable code).
//! The core itself never formats user-visible strings -- that's `ApiError`'s job.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Domain and configuration errors raised by the game core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    #[error("duplicate map id: {0}")]
    DuplicateMap(String),

    #[error("duplicate office id: {0}")]
    DuplicateOffice(String),

    #[error("map has no roads to spawn on")]
    NoRoads,

    #[error("map has no loot types")]
    NoLootTypes,

    #[error("map not found: {0}")]
    MapNotFound(String),

    #[error("bad action: {0:?}")]
    BadAction(String),

    #[error("malformed request body: {0}")]
    ParseError(String),

    #[error("missing authorization header")]
    MissingAuth,

    #[error("invalid authorization token")]
    InvalidToken,

    #[error("unknown authorization token")]
    UnknownToken,

    #[error("manual tick is forbidden while auto-tick is enabled")]
    TickForbidden,
}

/// HTTP-facing error: every handler returns `Result<T, ApiError>` and this type
/// knows how to render itself as a `(StatusCode, Json)` response.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ApiErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "methodNotAllowed", "method not allowed")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            code: self.code,
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::MapNotFound(_) => {
                ApiError::new(StatusCode::NOT_FOUND, "mapNotFound", err.to_string())
            }
            GameError::BadAction(_) | GameError::ParseError(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, "invalidArgument", err.to_string())
            }
            GameError::MissingAuth => ApiError::new(
                StatusCode::UNAUTHORIZED,
                "invalidToken",
                "authorization header is required",
            ),
            GameError::InvalidToken => {
                ApiError::new(StatusCode::UNAUTHORIZED, "invalidToken", err.to_string())
            }
            GameError::UnknownToken => {
                ApiError::new(StatusCode::UNAUTHORIZED, "unknownToken", err.to_string())
            }
            GameError::TickForbidden => {
                ApiError::new(StatusCode::BAD_REQUEST, "badRequest", err.to_string())
            }
            GameError::DuplicateMap(_)
            | GameError::DuplicateOffice(_)
            | GameError::NoRoads
            | GameError::NoLootTypes => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internalError",
                err.to_string(),
            ),
        }
    }
}

pub type GameResult<T> = Result<T, GameError>;
pub type ApiResult<T> = Result<T, ApiError>;
