//! Error type for `hist-store-sqlite`.

use thiserror::Error;

/// Every variant names the source it came from so callers reading several
/// stores can tell which one failed.
#[derive(Debug, Error)]
pub enum Error {
  /// The store opened, but the `moz_meta` probe failed: this is not a places
  /// database.
  #[error("{source_id}: not a recognised history database: {reason}")]
  Schema { source_id: String, reason: String },

  /// The store could not be opened or read (missing, locked, permission
  /// denied, not a database, corrupt), or a row failed to decode.
  #[error("{source_id}: database error: {cause}")]
  StoreAccess {
    source_id: String,
    #[source]
    cause:     rusqlite::Error,
  },
}

impl Error {
  pub(crate) fn access(source_id: &str, cause: rusqlite::Error) -> Self {
    Self::StoreAccess { source_id: source_id.to_owned(), cause }
  }

  /// Identifier of the store that produced the error.
  pub fn source_id(&self) -> &str {
    match self {
      Self::Schema { source_id, .. } | Self::StoreAccess { source_id, .. } => source_id,
    }
  }

  pub fn is_schema(&self) -> bool { matches!(self, Self::Schema { .. }) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
