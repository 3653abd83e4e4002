//! Way history types — immutable snapshots of a live way.
//!
//! A way version is never updated after commit; editing the live way produces
//! a new version, and deleting it produces a new version with
//! `visible = false`. The only post-commit mutation permitted anywhere in the
//! history is assignment or removal of a redaction reference.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::redaction::ReaderPrivilege;

// ─── Live entity shape ───────────────────────────────────────────────────────

/// The shape of a live way as consumed by snapshotting.
///
/// The live entity store itself is external to this crate; this struct is the
/// exact surface [`WaySnapshot::from_way`] reads. The transport-nullable
/// fields (`changeset_id`, `timestamp`, `visible`) are optional here and
/// rejected by validation before anything is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Way {
  pub id:           i64,
  pub version:      i64,
  pub changeset_id: Option<i64>,
  pub timestamp:    Option<DateTime<Utc>>,
  pub visible:      Option<bool>,
  pub tags:         BTreeMap<String, String>,
  /// Ordered node references; position is significant.
  pub nds:          Vec<i64>,
}

// ─── WaySnapshot ─────────────────────────────────────────────────────────────

/// Input to [`crate::store::HistoryStore::commit`] — an in-memory, not yet
/// persisted capture of a live way at one version.
///
/// Tags are carried as raw `(k, v)` pairs rather than a map so the write path
/// can reject a repeated key instead of silently collapsing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaySnapshot {
  pub way_id:       i64,
  pub version:      i64,
  pub changeset_id: Option<i64>,
  pub timestamp:    Option<DateTime<Utc>>,
  pub visible:      Option<bool>,
  pub tags:         Vec<(String, String)>,
  pub nds:          Vec<i64>,
}

impl WaySnapshot {
  /// Capture a live way by value. Later mutation of the live way cannot
  /// affect the snapshot; the tag map and node list are copied here.
  pub fn from_way(way: &Way) -> Self {
    Self {
      way_id:       way.id,
      version:      way.version,
      changeset_id: way.changeset_id,
      timestamp:    way.timestamp,
      visible:      way.visible,
      tags:         way
        .tags
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect(),
      nds:          way.nds.clone(),
    }
  }
}

// ─── WayVersion ──────────────────────────────────────────────────────────────

/// One committed historical version of a way.
///
/// Carries immutable by-value copies of its tags and node references — loaded
/// once, alongside the row. There is no lazy re-query behind an accessor;
/// a record instance is never shared across a write/reload boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WayVersion {
  pub way_id:       i64,
  pub version:      i64,
  pub changeset_id: i64,
  pub timestamp:    DateTime<Utc>,
  /// `false` means this version records the deletion of the way.
  pub visible:      bool,
  /// Reference into the external redaction registry; the only field that may
  /// change after commit.
  pub redaction_id: Option<i64>,
  pub tags:         BTreeMap<String, String>,
  /// Node references in original write order (`sequence_id` ascending).
  pub nds:          Vec<i64>,
}

impl WayVersion {
  pub fn is_redacted(&self) -> bool { self.redaction_id.is_some() }

  /// Whether this version's content may be shown to a reader. Redaction
  /// hides content from ordinary readers; it does not erase it.
  pub fn visible_to(&self, privilege: ReaderPrivilege) -> bool {
    self.redaction_id.is_none() || privilege.can_see_redacted()
  }

  /// Whether this is the same version as the live way's current version.
  /// The caller supplies the live way; the history store does not track
  /// "latest" itself.
  pub fn is_latest_version(&self, current: &Way) -> bool {
    current.version == self.version
  }
}
