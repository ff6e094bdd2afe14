use crate::session::SessionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to encode list column: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bad timestamp in row: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("failed to create database directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored session is malformed: {0}")]
    Malformed(#[from] SessionError),
}

/// Config problems that fall back to defaults; reported once logging is up.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("ignoring malformed config at {path}: {source}")]
    Malformed {
        path: String,
        source: serde_json::Error,
    },

    #[error("unknown log level {0:?}, using warn")]
    UnknownLogLevel(String),
}

/// Failures surfaced to a caller of the session handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Session not found")]
    NotFound,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Invalid(#[from] SessionError),

    #[error("malformed session payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::NotFound => 404,
            ApiError::Forbidden(_) => 403,
            ApiError::Invalid(_) | ApiError::Payload(_) | ApiError::Store(_) => 500,
        }
    }
}
