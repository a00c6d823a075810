//! The `IntervalStore` and `ReferenceResolver` traits and supporting query
//! types.
//!
//! Stores are implemented by storage backends (e.g. `tracer-store-sqlite`).
//! The [`Tracker`](crate::tracker::Tracker) depends on these abstractions, not
//! on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  deadline::Deadline,
  interval::{Interval, PlaceRef, SubjectRef, TimeWindow},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Error bound for store backends.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// `true` when a write was rejected because it would leave two open
  /// intervals in one presence scope.
  fn is_conflict(&self) -> bool;

  /// `true` when a write was refused because its [`Deadline`] had passed.
  fn is_deadline_exceeded(&self) -> bool { false }
}

// ─── Scope ───────────────────────────────────────────────────────────────────

/// The key under which at most one interval may be open at a time.
///
/// With place scoping disabled `place_id` is `None` and a subject can only be
/// present in one place at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PresenceScope {
  pub subject_id: Uuid,
  pub place_id:   Option<Uuid>,
}

impl PresenceScope {
  pub fn matches(&self, interval: &Interval) -> bool {
    interval.subject.subject_id == self.subject_id
      && match self.place_id {
        Some(place_id) => interval.place_id() == Some(place_id),
        None => true,
      }
  }
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`IntervalStore::list_intervals`].
#[derive(Debug, Clone, Default)]
pub struct IntervalQuery {
  pub subject_id:         Option<Uuid>,
  /// Drop every interval belonging to this subject.
  pub exclude_subject_id: Option<Uuid>,
  pub place_id:           Option<Uuid>,
  /// Coarse time filter. Backends must return every closed interval whose
  /// recorded span intersects the window, and every open interval that
  /// started at or before `window.end`, however long before `window.start`
  /// it started. They are allowed to return more. The exact test, including
  /// tentative ends, is applied by the caller.
  pub window:             Option<TimeWindow>,
  pub open_only:          bool,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Durable collection of presence intervals.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait IntervalStore: Send + Sync {
  type Error: StoreError;

  /// Retrieve an interval by id. Returns `None` if not found.
  fn get_interval(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Interval>, Self::Error>> + Send + '_;

  /// List intervals matching `query`, ordered by start time.
  fn list_intervals<'a>(
    &'a self,
    query: &'a IntervalQuery,
  ) -> impl Future<Output = Result<Vec<Interval>, Self::Error>> + Send + 'a;

  /// The most recently started open interval in `scope`, if any.
  fn find_open_interval(
    &self,
    scope: PresenceScope,
  ) -> impl Future<Output = Result<Option<Interval>, Self::Error>> + Send + '_;

  /// Persist a new open interval under `scope`.
  ///
  /// Backends that can enforce it reject the write with a conflict error if
  /// `scope` already has an open interval. The write must not happen once
  /// `deadline` has passed, checked as late as the backend can.
  fn create_interval(
    &self,
    interval: Interval,
    scope: PresenceScope,
    deadline: Deadline,
  ) -> impl Future<Output = Result<Interval, Self::Error>> + Send + '_;

  /// Set the end of an open interval and return the closed interval.
  ///
  /// Returns `None` if no open interval with this id exists; a closed
  /// interval is never modified. Like [`IntervalStore::create_interval`],
  /// nothing is written once `deadline` has passed.
  fn close_interval(
    &self,
    id: Uuid,
    end: chrono::DateTime<chrono::Utc>,
    deadline: Deadline,
  ) -> impl Future<Output = Result<Option<Interval>, Self::Error>> + Send + '_;

  /// Administrative delete. Returns `false` if the interval did not exist.
  fn delete_interval(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

/// Resolves the snapshot fields of a new interval.
pub trait ReferenceResolver: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Returns `None` if the place does not exist.
  fn resolve_place(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<PlaceRef>, Self::Error>> + Send + '_;

  /// Returns `None` if the subject does not exist.
  fn resolve_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<SubjectRef>, Self::Error>> + Send + '_;
}
