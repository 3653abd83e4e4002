//! [`SqliteHistoryStore`] — the SQLite implementation of [`HistoryStore`].

use std::{collections::BTreeMap, path::Path, sync::Arc};

use rusqlite::OptionalExtension as _;
use tracing::debug;

use strata_core::{
  error::{RedactionError, ValidationError, WriteError},
  redaction::{Redaction, ReaderPrivilege},
  store::HistoryStore,
  validate::ChangesetDirectory,
  way::{WaySnapshot, WayVersion},
};

use crate::{
  encode::{RawWayVersion, encode_dt},
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A way-history store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. `D` is the
/// external changeset directory consulted before every commit.
pub struct SqliteHistoryStore<D> {
  conn:       tokio_rusqlite::Connection,
  changesets: Arc<D>,
}

impl<D> Clone for SqliteHistoryStore<D> {
  fn clone(&self) -> Self {
    Self {
      conn:       self.conn.clone(),
      changesets: Arc::clone(&self.changesets),
    }
  }
}

impl<D: ChangesetDirectory> SqliteHistoryStore<D> {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>, changesets: D) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, changesets: Arc::new(changesets) };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory(changesets: D) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, changesets: Arc::new(changesets) };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch the parent `ways` row alone, without children.
  async fn get_raw(
    &self,
    way_id: i64,
    version: i64,
  ) -> Result<Option<RawWayVersion>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT way_id, version, changeset_id, timestamp, visible, redaction_id
               FROM ways WHERE way_id = ?1 AND version = ?2",
              rusqlite::params![way_id, version],
              |row| {
                Ok(RawWayVersion {
                  way_id:       row.get(0)?,
                  version:      row.get(1)?,
                  changeset_id: row.get(2)?,
                  timestamp:    row.get(3)?,
                  visible:      row.get(4)?,
                  redaction_id: row.get(5)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    Ok(raw)
  }

  /// Attach children to a parent row, honouring the reader's privilege:
  /// redacted content is withheld from ordinary readers while the row
  /// itself stays visible, keeping the version chain intact.
  async fn hydrate(
    &self,
    raw: RawWayVersion,
    privilege: ReaderPrivilege,
  ) -> Result<WayVersion> {
    if raw.redaction_id.is_some() && !privilege.can_see_redacted() {
      return raw.into_version(BTreeMap::new(), Vec::new());
    }
    let tags = self.load_tags(raw.way_id, raw.version).await?;
    let nds = self.load_node_refs(raw.way_id, raw.version).await?;
    raw.into_version(tags, nds)
  }
}

/// Whether an insert failed on a primary-key or uniqueness constraint, as
/// opposed to a storage-level failure.
fn is_constraint_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.code == rusqlite::ErrorCode::ConstraintViolation
  )
}

/// Result of a guarded single-statement redaction-state update.
enum RedactOutcome {
  Applied,
  /// The row exists but its redaction state already matched the guard.
  Conflict,
  Missing,
}

// ─── HistoryStore impl ───────────────────────────────────────────────────────

impl<D: ChangesetDirectory> HistoryStore for SqliteHistoryStore<D> {
  type Error = Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn commit(&self, snapshot: WaySnapshot) -> Result<WayVersion> {
    snapshot.validate(self.changesets.as_ref())?;

    // Infallible after validate; ok_or keeps the no-panic discipline.
    let changeset_id = snapshot
      .changeset_id
      .ok_or(ValidationError::MissingChangeset)?;
    let timestamp = snapshot
      .timestamp
      .ok_or(ValidationError::MissingTimestamp)?;
    let visible = snapshot
      .visible
      .ok_or(ValidationError::InvalidVisibility)?;

    let way_id = snapshot.way_id;
    let version = snapshot.version;
    let timestamp_str = encode_dt(timestamp);
    let tags = snapshot.tags;
    let nds = snapshot.nds;

    let tags_for_write = tags.clone();
    let nds_for_write = nds.clone();

    // Parent row and every child row go through one transaction. Any early
    // return drops the transaction, rolling the whole record back — a
    // concurrent reader never observes a parent with partial children.
    let staged: std::result::Result<(), WriteError> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        if let Err(e) = tx.execute(
          "INSERT INTO ways (way_id, version, changeset_id, timestamp, visible, redaction_id)
           VALUES (?1, ?2, ?3, ?4, ?5, NULL)",
          rusqlite::params![way_id, version, changeset_id, timestamp_str, visible],
        ) {
          if is_constraint_violation(&e) {
            return Ok(Err(WriteError::DuplicateVersion { way_id, version }));
          }
          return Err(e.into());
        }

        for (k, v) in &tags_for_write {
          if let Err(e) = tx.execute(
            "INSERT INTO way_tags (way_id, version, k, v) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![way_id, version, k, v],
          ) {
            if is_constraint_violation(&e) {
              return Ok(Err(WriteError::DuplicateTagKey { key: k.clone() }));
            }
            return Err(e.into());
          }
        }

        let mut sequence_id: i64 = 1;
        for node_id in &nds_for_write {
          tx.execute(
            "INSERT INTO way_nodes (way_id, version, sequence_id, node_id)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![way_id, version, sequence_id, node_id],
          )?;
          sequence_id += 1;
        }

        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;
    staged?;

    debug!(way_id, version, changeset_id, "committed way version");

    Ok(WayVersion {
      way_id,
      version,
      changeset_id,
      timestamp,
      visible,
      redaction_id: None,
      tags: tags.into_iter().collect(),
      nds,
    })
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_version(
    &self,
    way_id: i64,
    version: i64,
    privilege: ReaderPrivilege,
  ) -> Result<Option<WayVersion>> {
    match self.get_raw(way_id, version).await? {
      None => Ok(None),
      Some(raw) => Ok(Some(self.hydrate(raw, privilege).await?)),
    }
  }

  async fn versions_of(
    &self,
    way_id: i64,
    privilege: ReaderPrivilege,
  ) -> Result<Vec<WayVersion>> {
    let raws: Vec<RawWayVersion> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT way_id, version, changeset_id, timestamp, visible, redaction_id
           FROM ways WHERE way_id = ?1 ORDER BY version ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![way_id], |row| {
            Ok(RawWayVersion {
              way_id:       row.get(0)?,
              version:      row.get(1)?,
              changeset_id: row.get(2)?,
              timestamp:    row.get(3)?,
              visible:      row.get(4)?,
              redaction_id: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut versions = Vec::with_capacity(raws.len());
    for raw in raws {
      versions.push(self.hydrate(raw, privilege).await?);
    }
    Ok(versions)
  }

  async fn load_tags(
    &self,
    way_id: i64,
    version: i64,
  ) -> Result<BTreeMap<String, String>> {
    let tags = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT k, v FROM way_tags WHERE way_id = ?1 AND version = ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![way_id, version], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
          })?
          .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(tags)
  }

  async fn load_node_refs(
    &self,
    way_id: i64,
    version: i64,
  ) -> Result<Vec<i64>> {
    let nds = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT node_id FROM way_nodes
           WHERE way_id = ?1 AND version = ?2
           ORDER BY sequence_id ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![way_id, version], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(nds)
  }

  // ── Redaction ─────────────────────────────────────────────────────────────

  async fn redact(
    &self,
    way_id: i64,
    version: i64,
    redaction: &Redaction,
  ) -> Result<()> {
    let redaction_id = redaction.id;

    // The `redaction_id IS NULL` guard makes racing redactors lose
    // deterministically: exactly one UPDATE can match.
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let updated = tx.execute(
          "UPDATE ways SET redaction_id = ?3
           WHERE way_id = ?1 AND version = ?2 AND redaction_id IS NULL",
          rusqlite::params![way_id, version, redaction_id],
        )?;
        if updated == 1 {
          tx.commit()?;
          return Ok(RedactOutcome::Applied);
        }
        let exists: bool = tx
          .query_row(
            "SELECT 1 FROM ways WHERE way_id = ?1 AND version = ?2",
            rusqlite::params![way_id, version],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        Ok(if exists {
          RedactOutcome::Conflict
        } else {
          RedactOutcome::Missing
        })
      })
      .await?;

    match outcome {
      RedactOutcome::Applied => {
        debug!(way_id, version, redaction_id, "redacted way version");
        Ok(())
      }
      RedactOutcome::Conflict => {
        Err(RedactionError::AlreadyRedacted { way_id, version }.into())
      }
      RedactOutcome::Missing => Err(Error::VersionNotFound { way_id, version }),
    }
  }

  async fn unredact(&self, way_id: i64, version: i64) -> Result<()> {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let updated = tx.execute(
          "UPDATE ways SET redaction_id = NULL
           WHERE way_id = ?1 AND version = ?2 AND redaction_id IS NOT NULL",
          rusqlite::params![way_id, version],
        )?;
        if updated == 1 {
          tx.commit()?;
          return Ok(RedactOutcome::Applied);
        }
        let exists: bool = tx
          .query_row(
            "SELECT 1 FROM ways WHERE way_id = ?1 AND version = ?2",
            rusqlite::params![way_id, version],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        Ok(if exists {
          RedactOutcome::Conflict
        } else {
          RedactOutcome::Missing
        })
      })
      .await?;

    match outcome {
      RedactOutcome::Applied => {
        debug!(way_id, version, "unredacted way version");
        Ok(())
      }
      RedactOutcome::Conflict => {
        Err(RedactionError::NotRedacted { way_id, version }.into())
      }
      RedactOutcome::Missing => Err(Error::VersionNotFound { way_id, version }),
    }
  }
}
