//! Error type for `tracer-store-sqlite`.

use thiserror::Error;
use tracer_core::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// The unique open-interval index rejected a second open interval.
  #[error("an interval is already open for scope {0}")]
  OpenIntervalExists(String),

  #[error("email address already registered: {0}")]
  EmailTaken(String),

  /// A guarded write reached the database after its deadline.
  #[error("write refused: request deadline passed")]
  DeadlineExceeded,
}

impl StoreError for Error {
  fn is_conflict(&self) -> bool {
    matches!(self, Self::OpenIntervalExists(_) | Self::EmailTaken(_))
  }

  fn is_deadline_exceeded(&self) -> bool { matches!(self, Self::DeadlineExceeded) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
