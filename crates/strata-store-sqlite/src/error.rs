//! Error type for `strata-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(#[from] strata_core::ValidationError),

  #[error("write rejected: {0}")]
  Write(#[from] strata_core::WriteError),

  #[error("redaction conflict: {0}")]
  Redaction(#[from] strata_core::RedactionError),

  /// Redact/unredact targeted a `(way_id, version)` that was never
  /// committed.
  #[error("way {way_id} version {version} not found")]
  VersionNotFound { way_id: i64, version: i64 },

  /// Transaction abort, connection loss, or any other storage-level
  /// failure. The enclosing transaction rolls back, so no partial rows
  /// remain; retrying is the caller's decision.
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
