use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Validation,
    Conflict,
    Internal,
}

/// Rejection body for create/update/status calls. Clients only rely on `message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Rejection body for deletes blocked by dependent records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteConflictBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detalhes: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiException {
    #[error("{code:?}: {message}")]
    Rejected { code: ErrorCode, message: String },
    #[error("{error}")]
    DeleteConflict {
        error: String,
        detail: Option<String>,
    },
}

impl ApiException {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Rejected {
            code,
            message: message.into(),
        }
    }

    pub fn conflict(error: impl Into<String>, detail: Option<String>) -> Self {
        Self::DeleteConflict {
            error: error.into(),
            detail,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Rejected { code, .. } => *code,
            Self::DeleteConflict { .. } => ErrorCode::Conflict,
        }
    }
}
