// SPDX-License-Identifier: Apache-2.0

//! Normalized error types for permission propagation
//!
//! Loader, store and schema failures are all mapped to these variants so a
//! walk surfaces one error type regardless of which collaborator failed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all copilot operations
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum CopilotError {
    #[error("Failed to load document {path}: {message}")]
    Load { path: String, message: String },

    #[error("Invalid GraphQL document: {message}")]
    InvalidDocument { message: String },

    #[error("Metadata I/O error on {key}: {message}")]
    StoreIo { key: String, message: String },

    #[error("Malformed metadata in {key}: {message}")]
    StoreFormat { key: String, message: String },

    #[error("Schema introspection unavailable: {message}")]
    SchemaUnavailable { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CopilotError {
    pub fn load(path: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn invalid_document(msg: impl Into<String>) -> Self {
        Self::InvalidDocument { message: msg.into() }
    }

    pub fn store_io(key: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::StoreIo {
            key: key.into(),
            message: msg.into(),
        }
    }

    pub fn store_format(key: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::StoreFormat {
            key: key.into(),
            message: msg.into(),
        }
    }

    pub fn schema_unavailable(msg: impl Into<String>) -> Self {
        Self::SchemaUnavailable { message: msg.into() }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config { message: msg.into() }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal { message: msg.into() }
    }
}

/// Result type alias for copilot operations
pub type CopilotResult<T> = Result<T, CopilotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_key() {
        let err = CopilotError::store_format("inbound_inbound", "missing field `table`");
        assert_eq!(
            err.to_string(),
            "Malformed metadata in inbound_inbound: missing field `table`"
        );
    }

    #[test]
    fn test_error_serializes_tagged() {
        let err = CopilotError::schema_unavailable("connection refused");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["SchemaUnavailable"]["message"], "connection refused");
    }
}
