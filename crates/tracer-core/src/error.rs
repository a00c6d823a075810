//! Error types for `tracer-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::validate::ValidationErrors;

/// The coarse category of an [`Error`], used by boundary layers to pick a
/// status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  Validation,
  Conflict,
  Timeout,
  Upstream,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("interval not found: {0}")]
  IntervalNotFound(Uuid),

  #[error("place not found: {0}")]
  PlaceNotFound(Uuid),

  #[error("subject not found: {0}")]
  SubjectNotFound(Uuid),

  #[error("subject {0} has no open interval")]
  NoOpenInterval(Uuid),

  #[error("subject {subject_id} already has an open interval")]
  OpenIntervalExists {
    subject_id:  Uuid,
    /// The conflicting interval, when the caller observed it directly.
    interval_id: Option<Uuid>,
  },

  #[error("interval {0} is already closed")]
  AlreadyClosed(Uuid),

  #[error("request deadline passed before the write")]
  DeadlineExceeded,

  #[error("invalid request: {0}")]
  Validation(#[from] ValidationErrors),

  #[error("{context}: {source}")]
  Upstream {
    context: &'static str,
    #[source]
    source:  Box<dyn std::error::Error + Send + Sync>,
  },
}

impl Error {
  /// Wrap a collaborator failure with a short description of what was being
  /// attempted.
  pub fn upstream<E>(context: &'static str, source: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Upstream { context, source: Box::new(source) }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::IntervalNotFound(_)
      | Self::PlaceNotFound(_)
      | Self::SubjectNotFound(_)
      | Self::NoOpenInterval(_) => ErrorKind::NotFound,
      Self::OpenIntervalExists { .. } | Self::AlreadyClosed(_) => {
        ErrorKind::Conflict
      }
      Self::Validation(_) => ErrorKind::Validation,
      Self::DeadlineExceeded => ErrorKind::Timeout,
      Self::Upstream { .. } => ErrorKind::Upstream,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
