//! Redaction — hiding a version's content from ordinary readers without
//! breaking the version chain.

use serde::{Deserialize, Serialize};

/// A record in the external redaction registry. This crate persists only the
/// `id` reference on the affected version; title and description live with
/// the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redaction {
  pub id:          i64,
  /// Short classification, e.g. "privacy" or "copyright".
  pub title:       String,
  pub description: String,
}

/// Privilege level of the reader requesting historical content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReaderPrivilege {
  Ordinary,
  Moderator,
}

impl ReaderPrivilege {
  pub fn can_see_redacted(self) -> bool { matches!(self, Self::Moderator) }
}
