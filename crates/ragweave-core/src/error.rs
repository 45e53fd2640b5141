//! Typed errors raised by the pure core.
//!
//! Everything else in the workspace propagates `anyhow::Error`; these
//! variants exist so callers can match on the two failure modes that are
//! part of the contract.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Chunking parameters that would produce no progress (or no words).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A search service reference that is not `database.schema.service`.
    #[error("invalid service path '{0}': expected database.schema.service_name")]
    InvalidServicePath(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
