//! Error types for the Roster contact directory.

use crate::types::{ContactId, GroupId};
use serde::{Deserialize, Serialize};
use sled::transaction::TransactionError;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(#[from] sled::Error),

    #[error("Failed to encode {what}: {message}")]
    Encode { what: &'static str, message: String },

    #[error("Failed to decode {what}: {message}")]
    Decode { what: &'static str, message: String },

    #[error("Transaction '{operation}' gave up after {attempts} conflicting attempts")]
    RetriesExhausted {
        operation: &'static str,
        attempts: u32,
    },

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Field carrying a uniqueness constraint on contacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniqueField {
    Email,
    Phone,
}

impl UniqueField {
    pub fn as_str(&self) -> &'static str {
        match self {
            UniqueField::Email => "email",
            UniqueField::Phone => "phone",
        }
    }
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable failure categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    StorageFailure,
    Cancelled,
    Configuration,
}

impl ErrorKind {
    /// Whether a caller may safely resubmit the same command.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::StorageFailure | ErrorKind::Cancelled)
    }

    /// Status code used by the response envelope.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict | ErrorKind::Cancelled => 409,
            ErrorKind::Configuration => 500,
            ErrorKind::StorageFailure => 503,
        }
    }
}

/// Errors returned across the engine boundary.
///
/// Any variant produced inside a transaction has already caused a rollback by
/// the time the caller sees it.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Contact {field} '{value}' is already used by contact {existing}")]
    Conflict {
        field: UniqueField,
        value: String,
        existing: ContactId,
    },

    #[error("Contact not found: {0}")]
    ContactNotFound(ContactId),

    #[error("Group not found: {0}")]
    GroupNotFound(GroupId),

    #[error("Command cancelled before commit")]
    Cancelled,

    #[error("Storage failure: {0}")]
    StorageFailure(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Validation(_) => ErrorKind::Validation,
            EngineError::Conflict { .. } => ErrorKind::Conflict,
            EngineError::ContactNotFound(_) | EngineError::GroupNotFound(_) => ErrorKind::NotFound,
            EngineError::Cancelled => ErrorKind::Cancelled,
            EngineError::StorageFailure(_) => ErrorKind::StorageFailure,
            EngineError::ConfigError(_) => ErrorKind::Configuration,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }
}

impl From<sled::Error> for EngineError {
    fn from(err: sled::Error) -> Self {
        EngineError::StorageFailure(StorageError::Backend(err))
    }
}

impl From<TransactionError<EngineError>> for EngineError {
    fn from(err: TransactionError<EngineError>) -> Self {
        match err {
            TransactionError::Abort(inner) => inner,
            TransactionError::Storage(storage) => storage.into(),
        }
    }
}

impl From<config::ConfigError> for EngineError {
    fn from(err: config::ConfigError) -> Self {
        EngineError::ConfigError(err.to_string())
    }
}
