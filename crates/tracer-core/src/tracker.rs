//! The presence state machine and the history aggregator.
//!
//! Per presence scope the machine has two states: no open interval, or
//! exactly one. A toggle in the first state opens an interval; in the second
//! it closes the open one. The at-most-one-open invariant is checked here
//! before writing and, for backends that support it, guarded again by the
//! store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  clock::{Clock, SystemClock},
  deadline::Deadline,
  interval::{ContactReport, Interval, MatchedInterval, TimeWindow},
  matcher::{self, MatchPolicy},
  store::{
    IntervalQuery, IntervalStore, PresenceScope, ReferenceResolver, StoreError,
  },
  validate::{self, CheckOutTarget},
};

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
  /// Scope presence (and contacts) per place rather than per subject.
  pub place_scoping: bool,
  pub policy:        MatchPolicy,
}

impl Default for TrackerConfig {
  fn default() -> Self {
    Self { place_scoping: true, policy: MatchPolicy::default() }
  }
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// Input to [`Tracker::toggle`] and [`Tracker::check_in`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToggleRequest {
  pub subject_id: Option<Uuid>,
  pub place_id:   Option<Uuid>,
}

pub type CheckInRequest = ToggleRequest;

/// Input to [`Tracker::check_out`]. Either `interval_id`, or `subject_id`
/// (plus `place_id` under place scoping), identifies what to close.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckOutRequest {
  pub interval_id: Option<Uuid>,
  pub subject_id:  Option<Uuid>,
  pub place_id:    Option<Uuid>,
}

/// Input to [`Tracker::history`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryRequest {
  pub subject_id: Option<Uuid>,
  pub place_id:   Option<Uuid>,
  pub start:      Option<DateTime<Utc>>,
  pub end:        Option<DateTime<Utc>>,
}

/// Input to [`Tracker::list_intervals`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntervalFilter {
  pub subject_id: Option<Uuid>,
  pub place_id:   Option<Uuid>,
  pub start:      Option<DateTime<Utc>>,
  pub end:        Option<DateTime<Utc>>,
  #[serde(default)]
  pub open_only:  bool,
}

/// The transition a toggle performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "transition", content = "interval", rename_all = "snake_case")]
pub enum Toggle {
  CheckedIn(Interval),
  CheckedOut(Interval),
}

impl Toggle {
  pub fn interval(&self) -> &Interval {
    match self {
      Self::CheckedIn(i) | Self::CheckedOut(i) => i,
    }
  }

  pub fn into_interval(self) -> Interval {
    match self {
      Self::CheckedIn(i) | Self::CheckedOut(i) => i,
    }
  }
}

// ─── Tracker ─────────────────────────────────────────────────────────────────

/// Presence tracking over an [`IntervalStore`].
///
/// Holds no mutable state of its own; every request reads and writes the
/// store directly, so one `Tracker` can serve concurrent requests.
pub struct Tracker<S, R, C = SystemClock> {
  store:    S,
  resolver: R,
  clock:    C,
  config:   TrackerConfig,
}

impl<S, R> Tracker<S, R, SystemClock>
where
  S: IntervalStore,
  R: ReferenceResolver,
{
  pub fn new(store: S, resolver: R, config: TrackerConfig) -> Self {
    Self::with_clock(store, resolver, SystemClock, config)
  }
}

impl<S, R, C> Tracker<S, R, C>
where
  S: IntervalStore,
  R: ReferenceResolver,
  C: Clock,
{
  pub fn with_clock(store: S, resolver: R, clock: C, config: TrackerConfig) -> Self {
    Self { store, resolver, clock, config }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn config(&self) -> &TrackerConfig { &self.config }

  // ── Presence state machine ────────────────────────────────────────────

  /// Open an interval if the scope has none, otherwise close the open one.
  pub async fn toggle(&self, req: ToggleRequest) -> Result<Toggle> {
    self.toggle_until(req, Deadline::NONE).await
  }

  /// [`Tracker::toggle`], writing nothing once `deadline` has passed.
  #[tracing::instrument(skip_all, fields(subject_id = ?req.subject_id, place_id = ?req.place_id))]
  pub async fn toggle_until(
    &self,
    req: ToggleRequest,
    deadline: Deadline,
  ) -> Result<Toggle> {
    let scope = validate::presence_scope(&req, self.config.place_scoping)?;

    match self.find_open(scope).await? {
      Some(open) => self.close(open, deadline).await.map(Toggle::CheckedOut),
      None => self
        .open(scope, req.place_id, deadline)
        .await
        .map(Toggle::CheckedIn),
    }
  }

  /// Open an interval; fails if the scope already has one open.
  pub async fn check_in(&self, req: CheckInRequest) -> Result<Interval> {
    self.check_in_until(req, Deadline::NONE).await
  }

  #[tracing::instrument(skip_all, fields(subject_id = ?req.subject_id, place_id = ?req.place_id))]
  pub async fn check_in_until(
    &self,
    req: CheckInRequest,
    deadline: Deadline,
  ) -> Result<Interval> {
    let scope = validate::presence_scope(&req, self.config.place_scoping)?;

    if let Some(open) = self.find_open(scope).await? {
      warn!(interval_id = %open.interval_id, "check-in rejected: interval already open");
      return Err(Error::OpenIntervalExists {
        subject_id:  scope.subject_id,
        interval_id: Some(open.interval_id),
      });
    }
    self.open(scope, req.place_id, deadline).await
  }

  /// Close an interval, identified by id or by scope.
  pub async fn check_out(&self, req: CheckOutRequest) -> Result<Interval> {
    self.check_out_until(req, Deadline::NONE).await
  }

  #[tracing::instrument(skip(self))]
  pub async fn check_out_until(
    &self,
    req: CheckOutRequest,
    deadline: Deadline,
  ) -> Result<Interval> {
    match validate::check_out(&req, self.config.place_scoping)? {
      CheckOutTarget::Interval { interval_id, subject_id, place_id } => {
        let interval = self.get_interval(interval_id).await?;
        // Do not reveal an interval outside the asserted subject or place.
        if subject_id.is_some_and(|s| s != interval.subject.subject_id)
          || place_id.is_some_and(|p| Some(p) != interval.place_id())
        {
          return Err(Error::IntervalNotFound(interval_id));
        }
        if !interval.is_open() {
          return Err(Error::AlreadyClosed(interval_id));
        }
        self.close(interval, deadline).await
      }
      CheckOutTarget::Scope(scope) => {
        let open = self
          .find_open(scope)
          .await?
          .ok_or(Error::NoOpenInterval(scope.subject_id))?;
        self.close(open, deadline).await
      }
    }
  }

  async fn find_open(&self, scope: PresenceScope) -> Result<Option<Interval>> {
    self
      .store
      .find_open_interval(scope)
      .await
      .map_err(|e| Error::upstream("error finding open interval", e))
  }

  /// Resolve snapshots, then persist. Nothing is written unless every
  /// reference resolved before `deadline`.
  async fn open(
    &self,
    scope: PresenceScope,
    place_id: Option<Uuid>,
    deadline: Deadline,
  ) -> Result<Interval> {
    let subject = self
      .resolver
      .resolve_subject(scope.subject_id)
      .await
      .map_err(|e| Error::upstream("error resolving subject", e))?
      .ok_or(Error::SubjectNotFound(scope.subject_id))?;

    let place = match place_id {
      Some(id) => Some(
        self
          .resolver
          .resolve_place(id)
          .await
          .map_err(|e| Error::upstream("error resolving place", e))?
          .ok_or(Error::PlaceNotFound(id))?,
      ),
      None => None,
    };

    if deadline.has_passed() {
      warn!("check-in abandoned: deadline passed during resolution");
      return Err(Error::DeadlineExceeded);
    }

    let interval = Interval::open(subject, place, self.clock.now());
    let created = self
      .store
      .create_interval(interval, scope, deadline)
      .await
      .map_err(|e| {
        if e.is_conflict() {
          Error::OpenIntervalExists {
            subject_id:  scope.subject_id,
            interval_id: None,
          }
        } else if e.is_deadline_exceeded() {
          Error::DeadlineExceeded
        } else {
          Error::upstream("error creating interval", e)
        }
      })?;

    info!(interval_id = %created.interval_id, start = %created.start, "checked in");
    Ok(created)
  }

  async fn close(&self, open: Interval, deadline: Deadline) -> Result<Interval> {
    if deadline.has_passed() {
      return Err(Error::DeadlineExceeded);
    }
    // The clock may lag a start recorded by another node.
    let end = self.clock.now().max(open.start);
    let closed = self
      .store
      .close_interval(open.interval_id, end, deadline)
      .await
      .map_err(|e| {
        if e.is_deadline_exceeded() {
          Error::DeadlineExceeded
        } else {
          Error::upstream("error closing interval", e)
        }
      })?
      .ok_or(Error::AlreadyClosed(open.interval_id))?;

    info!(interval_id = %closed.interval_id, %end, "checked out");
    Ok(closed)
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  pub async fn get_interval(&self, id: Uuid) -> Result<Interval> {
    self
      .store
      .get_interval(id)
      .await
      .map_err(|e| Error::upstream("error fetching a single interval", e))?
      .ok_or(Error::IntervalNotFound(id))
  }

  /// Intervals matching `filter`. A time window keeps every interval whose
  /// effective span overlaps it.
  #[tracing::instrument(skip(self))]
  pub async fn list_intervals(&self, filter: IntervalFilter) -> Result<Vec<Interval>> {
    validate::interval_filter(&filter)?;

    let window = TimeWindow::new(filter.start, filter.end);
    let query = IntervalQuery {
      subject_id: filter.subject_id,
      place_id: filter.place_id,
      window: (!window.is_unbounded()).then_some(window),
      open_only: filter.open_only,
      ..Default::default()
    };
    let intervals = self
      .store
      .list_intervals(&query)
      .await
      .map_err(|e| Error::upstream("error fetching intervals", e))?;

    Ok(matcher::within(intervals, &window.span(), &self.config.policy))
  }

  /// Administrative delete.
  #[tracing::instrument(skip(self))]
  pub async fn delete_interval(&self, id: Uuid) -> Result<()> {
    let deleted = self
      .store
      .delete_interval(id)
      .await
      .map_err(|e| Error::upstream("error deleting interval", e))?;
    if !deleted {
      return Err(Error::IntervalNotFound(id));
    }
    info!(interval_id = %id, "interval deleted");
    Ok(())
  }

  // ── History aggregator ────────────────────────────────────────────────

  /// One [`ContactReport`] per interval in the requested scope and window.
  ///
  /// Any store failure aborts the whole report.
  #[tracing::instrument(skip(self))]
  pub async fn history(&self, req: HistoryRequest) -> Result<Vec<ContactReport>> {
    validate::history(&req)?;
    let policy = &self.config.policy;

    let window = TimeWindow::new(req.start, req.end);
    let query = IntervalQuery {
      subject_id: req.subject_id,
      place_id: req.place_id,
      window: (!window.is_unbounded()).then_some(window),
      ..Default::default()
    };
    let anchors = self
      .store
      .list_intervals(&query)
      .await
      .map_err(|e| Error::upstream("error fetching history", e))?;
    let anchors = matcher::within(anchors, &window.span(), policy);

    let mut reports = Vec::with_capacity(anchors.len());
    for anchor in anchors {
      let contacts = self.contacts_for(&anchor).await?;
      debug!(interval_id = %anchor.interval_id, contacts = contacts.len(), "matched anchor");
      reports.push(ContactReport {
        anchor: MatchedInterval::new(anchor, policy),
        contacts,
      });
    }
    Ok(reports)
  }

  async fn contacts_for(&self, anchor: &Interval) -> Result<Vec<MatchedInterval>> {
    let policy = &self.config.policy;
    let query = IntervalQuery {
      exclude_subject_id: Some(anchor.subject.subject_id),
      place_id: if self.config.place_scoping { anchor.place_id() } else { None },
      window: Some(TimeWindow::from(anchor.span(policy))),
      ..Default::default()
    };
    let pool = self
      .store
      .list_intervals(&query)
      .await
      .map_err(|e| Error::upstream("error fetching contacts", e))?;

    Ok(matcher::match_contacts(anchor, pool, policy))
  }
}
