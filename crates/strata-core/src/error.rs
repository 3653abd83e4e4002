//! Error taxonomy for `strata-core`.
//!
//! Three families, so an API layer can map them to distinct client-facing
//! messages: validation failures (nothing was written), write rejections
//! (the transaction rolled back), and redaction-state conflicts.

use thiserror::Error;

/// A snapshot failed consistency validation; no durable write occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
  /// The changeset reference is absent, or the changeset directory does not
  /// know it.
  #[error("changeset is missing or unknown")]
  MissingChangeset,

  #[error("timestamp is missing")]
  MissingTimestamp,

  /// The visibility flag is absent. Guards against null/undefined leaking in
  /// from loosely-typed transports.
  #[error("visibility flag is missing")]
  InvalidVisibility,
}

/// A commit was rejected at the storage layer. The enclosing transaction is
/// rolled back, so no partial record is ever observable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
  /// The `(way_id, version)` key already exists. Version numbers are never
  /// reused; the caller must not retry with the same version.
  #[error("way {way_id} version {version} already exists")]
  DuplicateVersion { way_id: i64, version: i64 },

  /// A tag key repeated within one snapshot.
  #[error("duplicate tag key {key:?} in snapshot")]
  DuplicateTagKey { key: String },
}

/// A redact/unredact call conflicted with the record's current redaction
/// state. Redaction is deliberately not idempotent: callers must unredact
/// explicitly before redacting again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RedactionError {
  #[error("way {way_id} version {version} is already redacted")]
  AlreadyRedacted { way_id: i64, version: i64 },

  #[error("way {way_id} version {version} is not redacted")]
  NotRedacted { way_id: i64, version: i64 },
}
