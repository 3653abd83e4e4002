//! The `HistoryStore` trait — the storage-backend abstraction.
//!
//! Implemented by backends (e.g. `strata-store-sqlite`). All writes to the
//! history are append-only: a committed version is never updated (except its
//! redaction reference) and never deleted.
//!
//! All methods return `Send` futures so the trait can be used in
//! multi-threaded async runtimes.

use std::{collections::BTreeMap, future::Future};

use crate::{
  redaction::{Redaction, ReaderPrivilege},
  way::{WaySnapshot, WayVersion},
};

/// Abstraction over a way-history storage backend.
pub trait HistoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Validate `snapshot` and durably write it — the version row, all tag
  /// rows, and all node-reference rows — as one atomic unit. Either every
  /// row is visible afterwards or none is; a concurrent reader never sees a
  /// partial record.
  ///
  /// The call may block on the underlying storage transaction; there is no
  /// internal timeout. Version numbers are assigned by the caller and must
  /// never be reused — a key collision fails the whole commit.
  fn commit(
    &self,
    snapshot: WaySnapshot,
  ) -> impl Future<Output = Result<WayVersion, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Load one version with its tags and node references. Returns `None` if
  /// the version does not exist. For an [`ReaderPrivilege::Ordinary`]
  /// reader, a redacted version is returned with empty tags and node
  /// references — the row itself stays visible so the chain is intact.
  fn get_version(
    &self,
    way_id: i64,
    version: i64,
    privilege: ReaderPrivilege,
  ) -> impl Future<Output = Result<Option<WayVersion>, Self::Error>> + Send + '_;

  /// The full history of one way, versions ascending, children loaded.
  /// Redacted versions are content-stripped for ordinary readers, as in
  /// [`HistoryStore::get_version`].
  fn versions_of(
    &self,
    way_id: i64,
    privilege: ReaderPrivilege,
  ) -> impl Future<Output = Result<Vec<WayVersion>, Self::Error>> + Send + '_;

  /// Load the tag mapping for one version directly by composite key.
  /// Returns the stored content regardless of redaction state; privilege
  /// gating belongs to the record-level reads.
  fn load_tags(
    &self,
    way_id: i64,
    version: i64,
  ) -> impl Future<Output = Result<BTreeMap<String, String>, Self::Error>> + Send + '_;

  /// Load the node references for one version, in original write order.
  fn load_node_refs(
    &self,
    way_id: i64,
    version: i64,
  ) -> impl Future<Output = Result<Vec<i64>, Self::Error>> + Send + '_;

  // ── Redaction ─────────────────────────────────────────────────────────

  /// Attach a redaction to a committed version. Fails if the version is
  /// already redacted (callers must unredact first) or does not exist.
  /// Content is untouched; only the redaction reference is set.
  fn redact<'a>(
    &'a self,
    way_id: i64,
    version: i64,
    redaction: &'a Redaction,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Clear the redaction reference. Fails if the version is not redacted or
  /// does not exist.
  fn unredact(
    &self,
    way_id: i64,
    version: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
