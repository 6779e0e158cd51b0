// ABOUTME: Error types for the persistent store capability
// ABOUTME: Optional conversion from sqlx errors behind the database-errors feature
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#[cfg(feature = "database-errors")]
use sqlx::Error as SqlxError;
use thiserror::Error;

/// Errors raised by a `SyncStore` implementation
#[derive(Debug, Error)]
pub enum StoreError {
    /// Query or statement failed
    #[error("store query failed: {0}")]
    Query(String),

    /// Update targeted a record that does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Record set name
        entity: &'static str,
        /// Record identifier
        id: String,
    },

    /// A stored value could not be decoded into its model type
    #[error("stored value could not be decoded: {0}")]
    Decode(String),
}

#[cfg(feature = "database-errors")]
impl From<SqlxError> for StoreError {
    fn from(error: SqlxError) -> Self {
        match error {
            SqlxError::ColumnDecode { index, source } => {
                Self::Decode(format!("column {index}: {source}"))
            }
            SqlxError::Decode(source) => Self::Decode(source.to_string()),
            other => Self::Query(other.to_string()),
        }
    }
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
