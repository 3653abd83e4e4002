//! Integration tests for `SqliteHistoryStore` against an in-memory database.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use strata_core::{
  error::{RedactionError, ValidationError, WriteError},
  redaction::{Redaction, ReaderPrivilege},
  store::HistoryStore,
  way::{Way, WaySnapshot},
};

use crate::{Error, SqliteHistoryStore};

fn known_changesets() -> BTreeSet<i64> { BTreeSet::from([7, 8, 9]) }

async fn store() -> SqliteHistoryStore<BTreeSet<i64>> {
  SqliteHistoryStore::open_in_memory(known_changesets())
    .await
    .expect("in-memory store")
}

fn residential_way(id: i64, version: i64) -> Way {
  Way {
    id,
    version,
    changeset_id: Some(7),
    timestamp: Some(Utc::now()),
    visible: Some(true),
    tags: BTreeMap::from([("highway".to_owned(), "residential".to_owned())]),
    nds: vec![10, 20, 30],
  }
}

fn privacy_redaction() -> Redaction {
  Redaction {
    id:          1,
    title:       "privacy".to_owned(),
    description: "hides personally identifying tags".to_owned(),
  }
}

// ─── Commit and round trip ───────────────────────────────────────────────────

#[tokio::test]
async fn commit_and_reload_round_trip() {
  let s = store().await;
  let way = residential_way(12, 1);

  let committed = s.commit(WaySnapshot::from_way(&way)).await.unwrap();
  assert_eq!(committed.way_id, 12);
  assert_eq!(committed.version, 1);
  assert_eq!(committed.changeset_id, 7);
  assert!(committed.visible);
  assert!(committed.redaction_id.is_none());

  let reloaded = s
    .get_version(12, 1, ReaderPrivilege::Ordinary)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(reloaded, committed);
  assert_eq!(reloaded.tags, way.tags);
  assert_eq!(reloaded.nds, way.nds);
}

#[tokio::test]
async fn node_order_preserved_exactly() {
  let s = store().await;
  let mut way = residential_way(12, 1);
  // Repeats are legal in a way (closed loops); order must survive verbatim.
  way.nds = vec![30, 10, 20, 10];

  s.commit(WaySnapshot::from_way(&way)).await.unwrap();

  let nds = s.load_node_refs(12, 1).await.unwrap();
  assert_eq!(nds, vec![30, 10, 20, 10]);
}

#[tokio::test]
async fn load_tags_matches_written_mapping() {
  let s = store().await;
  let mut way = residential_way(12, 1);
  way
    .tags
    .insert("name".to_owned(), "High Street".to_owned());

  s.commit(WaySnapshot::from_way(&way)).await.unwrap();

  let tags = s.load_tags(12, 1).await.unwrap();
  assert_eq!(tags, way.tags);
}

#[tokio::test]
async fn get_version_missing_returns_none() {
  let s = store().await;
  let found = s
    .get_version(12, 1, ReaderPrivilege::Moderator)
    .await
    .unwrap();
  assert!(found.is_none());
}

#[tokio::test]
async fn deletion_is_a_new_invisible_version() {
  let s = store().await;
  s.commit(WaySnapshot::from_way(&residential_way(12, 1)))
    .await
    .unwrap();

  let mut deleted = residential_way(12, 2);
  deleted.visible = Some(false);
  s.commit(WaySnapshot::from_way(&deleted)).await.unwrap();

  // Both versions remain readable; deletion never removes rows.
  let v1 = s
    .get_version(12, 1, ReaderPrivilege::Ordinary)
    .await
    .unwrap()
    .unwrap();
  let v2 = s
    .get_version(12, 2, ReaderPrivilege::Ordinary)
    .await
    .unwrap()
    .unwrap();
  assert!(v1.visible);
  assert!(!v2.visible);
}

// ─── Write rejections and atomicity ──────────────────────────────────────────

#[tokio::test]
async fn duplicate_version_rejected() {
  let s = store().await;
  let way = residential_way(12, 1);

  s.commit(WaySnapshot::from_way(&way)).await.unwrap();
  let err = s.commit(WaySnapshot::from_way(&way)).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Write(WriteError::DuplicateVersion { way_id: 12, version: 1 })
  ));

  // The original record is untouched.
  let tags = s.load_tags(12, 1).await.unwrap();
  assert_eq!(tags.get("highway").map(String::as_str), Some("residential"));
}

#[tokio::test]
async fn duplicate_tag_key_rolls_back_whole_record() {
  let s = store().await;
  let snapshot = WaySnapshot {
    way_id:       12,
    version:      1,
    changeset_id: Some(7),
    timestamp:    Some(Utc::now()),
    visible:      Some(true),
    tags:         vec![
      ("highway".to_owned(), "residential".to_owned()),
      ("highway".to_owned(), "service".to_owned()),
    ],
    nds:          vec![10, 20, 30],
  };

  let err = s.commit(snapshot).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Write(WriteError::DuplicateTagKey { ref key }) if key.as_str() == "highway"
  ));

  // All-or-nothing: no row in any of the three relations survives.
  let found = s
    .get_version(12, 1, ReaderPrivilege::Moderator)
    .await
    .unwrap();
  assert!(found.is_none());
  assert!(s.load_tags(12, 1).await.unwrap().is_empty());
  assert!(s.load_node_refs(12, 1).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_changeset_rejected_before_write() {
  let s = store().await;
  let mut way = residential_way(12, 1);
  way.changeset_id = Some(999);

  let err = s.commit(WaySnapshot::from_way(&way)).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Validation(ValidationError::MissingChangeset)
  ));

  let found = s
    .get_version(12, 1, ReaderPrivilege::Moderator)
    .await
    .unwrap();
  assert!(found.is_none());
}

#[tokio::test]
async fn missing_timestamp_rejected_before_write() {
  let s = store().await;
  let mut way = residential_way(12, 1);
  way.timestamp = None;

  let err = s.commit(WaySnapshot::from_way(&way)).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Validation(ValidationError::MissingTimestamp)
  ));
}

#[tokio::test]
async fn missing_visibility_rejected_before_write() {
  let s = store().await;
  let mut way = residential_way(12, 1);
  way.visible = None;

  let err = s.commit(WaySnapshot::from_way(&way)).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Validation(ValidationError::InvalidVisibility)
  ));
}

// ─── History queries ─────────────────────────────────────────────────────────

#[tokio::test]
async fn versions_of_returns_full_ascending_history() {
  let s = store().await;
  // Commit out of order; the read side must still come back sorted.
  for version in [2, 1, 3] {
    s.commit(WaySnapshot::from_way(&residential_way(12, version)))
      .await
      .unwrap();
  }
  // A different way must not leak into the history.
  s.commit(WaySnapshot::from_way(&residential_way(77, 1)))
    .await
    .unwrap();

  let history = s.versions_of(12, ReaderPrivilege::Ordinary).await.unwrap();
  let versions: Vec<i64> = history.iter().map(|v| v.version).collect();
  assert_eq!(versions, vec![1, 2, 3]);
  assert!(history.iter().all(|v| v.way_id == 12));
  assert!(history.iter().all(|v| v.nds == vec![10, 20, 30]));
}

#[tokio::test]
async fn latest_version_matches_live_way_only() {
  let s = store().await;
  for version in 1..=5 {
    s.commit(WaySnapshot::from_way(&residential_way(12, version)))
      .await
      .unwrap();
  }

  let live = residential_way(12, 5);
  let history = s.versions_of(12, ReaderPrivilege::Ordinary).await.unwrap();
  let latest: Vec<i64> = history
    .iter()
    .filter(|v| v.is_latest_version(&live))
    .map(|v| v.version)
    .collect();
  assert_eq!(latest, vec![5]);
}

// ─── Redaction ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn redact_hides_content_from_ordinary_readers() {
  let s = store().await;
  s.commit(WaySnapshot::from_way(&residential_way(12, 1)))
    .await
    .unwrap();

  s.redact(12, 1, &privacy_redaction()).await.unwrap();

  // Ordinary reader: the row is still there (chain intact) but stripped.
  let hidden = s
    .get_version(12, 1, ReaderPrivilege::Ordinary)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(hidden.redaction_id, Some(1));
  assert!(!hidden.visible_to(ReaderPrivilege::Ordinary));
  assert!(hidden.tags.is_empty());
  assert!(hidden.nds.is_empty());

  // Moderator: full content, nothing was erased.
  let full = s
    .get_version(12, 1, ReaderPrivilege::Moderator)
    .await
    .unwrap()
    .unwrap();
  assert!(full.visible_to(ReaderPrivilege::Moderator));
  assert_eq!(
    full.tags.get("highway").map(String::as_str),
    Some("residential")
  );
  assert_eq!(full.nds, vec![10, 20, 30]);
}

#[tokio::test]
async fn redact_twice_errors() {
  let s = store().await;
  s.commit(WaySnapshot::from_way(&residential_way(12, 1)))
    .await
    .unwrap();

  s.redact(12, 1, &privacy_redaction()).await.unwrap();
  let err = s.redact(12, 1, &privacy_redaction()).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Redaction(RedactionError::AlreadyRedacted { way_id: 12, version: 1 })
  ));
}

#[tokio::test]
async fn unredact_without_redaction_errors() {
  let s = store().await;
  s.commit(WaySnapshot::from_way(&residential_way(12, 1)))
    .await
    .unwrap();

  let err = s.unredact(12, 1).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Redaction(RedactionError::NotRedacted { way_id: 12, version: 1 })
  ));
}

#[tokio::test]
async fn redact_missing_version_errors() {
  let s = store().await;
  let err = s.redact(12, 1, &privacy_redaction()).await.unwrap_err();
  assert!(matches!(
    err,
    Error::VersionNotFound { way_id: 12, version: 1 }
  ));

  let err = s.unredact(12, 1).await.unwrap_err();
  assert!(matches!(
    err,
    Error::VersionNotFound { way_id: 12, version: 1 }
  ));
}

#[tokio::test]
async fn unredact_restores_content_for_ordinary_readers() {
  let s = store().await;
  s.commit(WaySnapshot::from_way(&residential_way(12, 1)))
    .await
    .unwrap();

  s.redact(12, 1, &privacy_redaction()).await.unwrap();
  s.unredact(12, 1).await.unwrap();

  let restored = s
    .get_version(12, 1, ReaderPrivilege::Ordinary)
    .await
    .unwrap()
    .unwrap();
  assert!(restored.redaction_id.is_none());
  assert!(restored.visible_to(ReaderPrivilege::Ordinary));
  assert_eq!(
    restored.tags.get("highway").map(String::as_str),
    Some("residential")
  );
  assert_eq!(restored.nds, vec![10, 20, 30]);
}

#[tokio::test]
async fn redaction_survives_in_full_history() {
  let s = store().await;
  for version in 1..=3 {
    s.commit(WaySnapshot::from_way(&residential_way(12, version)))
      .await
      .unwrap();
  }
  s.redact(12, 2, &privacy_redaction()).await.unwrap();

  let history = s.versions_of(12, ReaderPrivilege::Ordinary).await.unwrap();
  assert_eq!(history.len(), 3);
  assert!(history[0].visible_to(ReaderPrivilege::Ordinary));
  assert!(!history[1].visible_to(ReaderPrivilege::Ordinary));
  assert!(history[1].tags.is_empty());
  assert!(history[2].visible_to(ReaderPrivilege::Ordinary));
  assert!(!history[2].tags.is_empty());
}
