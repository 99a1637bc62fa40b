//! Error handling for quotedesk
//!
//! Defines the pipeline's error taxonomy and establishes a unified Result type
//! using anyhow for context chaining and error propagation.
//!
//! Per-record problems (validation failures, duplicate keys) are not errors:
//! they are collected into `ImportOutcome` so the rest of a batch proceeds.

use thiserror::Error;

use crate::importers::ImportMode;

/// Core error types for import and edit operations
#[derive(Error, Debug)]
pub enum QuoteError {
    /// The grid is too short for the selected header convention
    #[error("malformed sheet: {mode} mode needs at least {required} rows, found {found}")]
    MalformedSheet {
        mode: ImportMode,
        required: usize,
        found: usize,
    },

    /// The record store rejected a read or write
    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("field '{0}' is derived and cannot be set directly")]
    DerivedField(String),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("cannot {action} while import session is {from}")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },

    #[error("record not found: {0}")]
    RecordNotFound(i64),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

impl QuoteError {
    pub fn persistence(err: impl std::fmt::Display) -> Self {
        QuoteError::Persistence(err.to_string())
    }
}

/// Result type alias for quotedesk operations
pub type Result<T> = anyhow::Result<T>;
