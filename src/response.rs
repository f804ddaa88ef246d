//! Structured response envelope handed back to callers.

use crate::command::CommandOutcome;
use crate::error::{EngineError, ErrorKind};
use serde::{Deserialize, Serialize};

/// `{status_code, success, message, data?}` envelope.
///
/// Failures carry the error kind so callers can branch without parsing text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = serde_json::Value> {
    pub status_code: u16,
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status_code: 200,
            success: true,
            message: message.into(),
            error_kind: None,
            data: Some(data),
        }
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            status_code: 201,
            ..Self::ok(message, data)
        }
    }

    pub fn failure(err: &EngineError) -> Self {
        let kind = err.kind();
        Self {
            status_code: kind.status_code(),
            success: false,
            message: err.to_string(),
            error_kind: Some(kind),
            data: None,
        }
    }
}

impl ApiResponse<CommandOutcome> {
    pub fn from_result(result: &Result<CommandOutcome, EngineError>) -> Self {
        match result {
            Ok(outcome) if outcome.is_creation() => Self::created(outcome.summary(), outcome.clone()),
            Ok(outcome) => Self::ok(outcome.summary(), outcome.clone()),
            Err(err) => Self::failure(err),
        }
    }
}
