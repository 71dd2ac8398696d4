//! Error taxonomy for the roster engine.
//!
//! Four families, matching how callers must react:
//! - whole-file import errors — abort before any store write
//! - authorization errors — abort before any store read
//! - invalid request parameters — abort, caller's mistake
//! - store errors — surface as a generic 500; detail goes to the log
//!
//! Row-level parse errors are NOT here: they are collected as
//! `types::RowError` values and returned structurally in the import report.

use serde::Serialize;
use thiserror::Error;

use crate::db::DbError;

/// Fatal errors from the import / backfill / date-shift operations.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("empty spreadsheet payload")]
    EmptyFile,

    #[error("spreadsheet is {got} bytes, limit is {max}")]
    FileTooLarge { got: usize, max: usize },

    #[error("workbook contains no sheets")]
    NoSheets,

    #[error("failed to decode workbook: {0}")]
    Workbook(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("store error: {0}")]
    Store(#[from] DbError),
}

impl RosterError {
    /// HTTP status the transport layer should map this error to.
    pub fn status_code(&self) -> u16 {
        match self {
            RosterError::EmptyFile
            | RosterError::FileTooLarge { .. }
            | RosterError::NoSheets
            | RosterError::Workbook(_)
            | RosterError::InvalidRequest(_) => 400,
            RosterError::Forbidden(_) => 403,
            RosterError::Store(_) => 500,
        }
    }

    /// Message safe to send to the caller. Store failures get a generic
    /// line; the detailed message is logged server-side instead.
    pub fn client_message(&self) -> String {
        match self {
            RosterError::Store(_) => "internal storage error".to_string(),
            other => other.to_string(),
        }
    }
}

/// Serializable error representation for the endpoint response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub message: String,
    pub status: u16,
}

impl From<&RosterError> for ApiError {
    fn from(err: &RosterError) -> Self {
        if let RosterError::Store(inner) = err {
            log::error!("store error surfaced to caller: {}", inner);
        }
        ApiError {
            message: err.client_message(),
            status: err.status_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(RosterError::EmptyFile.status_code(), 400);
        assert_eq!(
            RosterError::Forbidden("not an admin".to_string()).status_code(),
            403
        );
        assert_eq!(
            RosterError::Store(DbError::HomeDirNotFound).status_code(),
            500
        );
    }

    #[test]
    fn test_store_detail_hidden_from_caller() {
        let err = RosterError::Store(DbError::HomeDirNotFound);
        let api = ApiError::from(&err);
        assert_eq!(api.message, "internal storage error");
        assert_eq!(api.status, 500);

        let err = RosterError::InvalidRequest("bad month".to_string());
        let api = ApiError::from(&err);
        assert!(api.message.contains("bad month"));
    }
}
