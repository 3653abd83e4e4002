//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings; identifiers map directly to
//! SQLite INTEGER columns.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use strata_core::way::WayVersion;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw columns read directly from a `ways` row, before child rows are
/// attached.
pub struct RawWayVersion {
  pub way_id:       i64,
  pub version:      i64,
  pub changeset_id: i64,
  pub timestamp:    String,
  pub visible:      bool,
  pub redaction_id: Option<i64>,
}

impl RawWayVersion {
  /// Combine the parent row with its loaded children into a domain record.
  pub fn into_version(
    self,
    tags: BTreeMap<String, String>,
    nds: Vec<i64>,
  ) -> Result<WayVersion> {
    Ok(WayVersion {
      way_id: self.way_id,
      version: self.version,
      changeset_id: self.changeset_id,
      timestamp: decode_dt(&self.timestamp)?,
      visible: self.visible,
      redaction_id: self.redaction_id,
      tags,
      nds,
    })
  }
}
