//! Consistency validation, run before every durable write.

use std::collections::BTreeSet;

use crate::{error::ValidationError, way::WaySnapshot};

/// Lookup surface of the external edit-session component.
///
/// This crate validates only that a changeset exists; ownership and
/// open/closed semantics belong to the changeset component itself.
pub trait ChangesetDirectory: Send + Sync {
  fn exists(&self, changeset_id: i64) -> bool;
}

/// Handy for tests and simple embedders: a fixed set of known changeset ids.
impl ChangesetDirectory for BTreeSet<i64> {
  fn exists(&self, changeset_id: i64) -> bool { self.contains(&changeset_id) }
}

impl WaySnapshot {
  /// Check the invariants a snapshot must satisfy before it may be
  /// committed. Pure; no side effects.
  pub fn validate(
    &self,
    changesets: &impl ChangesetDirectory,
  ) -> Result<(), ValidationError> {
    let changeset_id = self
      .changeset_id
      .ok_or(ValidationError::MissingChangeset)?;
    if !changesets.exists(changeset_id) {
      return Err(ValidationError::MissingChangeset);
    }
    if self.timestamp.is_none() {
      return Err(ValidationError::MissingTimestamp);
    }
    if self.visible.is_none() {
      return Err(ValidationError::InvalidVisibility);
    }
    Ok(())
  }
}
