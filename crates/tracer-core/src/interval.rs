//! Presence intervals, the fundamental unit of the Tracer store.
//!
//! An interval records that a subject was present (at a place, when place
//! scoping is enabled) from `start` until `end`. An interval without an `end`
//! is *open*: the subject has not checked out yet. Open intervals are matched
//! against a synthetic, tentative end (see [`crate::matcher::MatchPolicy`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::matcher::MatchPolicy;

// ─── Snapshots ───────────────────────────────────────────────────────────────

/// The subject of an interval as it looked at check-in time.
///
/// The name is a snapshot; later renames do not rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRef {
  pub subject_id: Uuid,
  pub name:       String,
}

/// The place of an interval as it looked at check-in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceRef {
  pub place_id: Uuid,
  pub name:     String,
}

// ─── Interval ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
  pub interval_id: Uuid,
  pub subject:     SubjectRef,
  pub place:       Option<PlaceRef>,
  pub start:       DateTime<Utc>,
  /// `None` while the subject is still present.
  pub end:         Option<DateTime<Utc>>,
}

impl Interval {
  /// Build a freshly opened interval starting at `start`.
  pub fn open(
    subject: SubjectRef,
    place: Option<PlaceRef>,
    start: DateTime<Utc>,
  ) -> Self {
    Self { interval_id: Uuid::new_v4(), subject, place, start, end: None }
  }

  pub fn is_open(&self) -> bool { self.end.is_none() }

  /// Whether matching has to use a synthetic end for this interval.
  pub fn tentative(&self) -> bool { self.is_open() }

  pub fn place_id(&self) -> Option<Uuid> {
    self.place.as_ref().map(|p| p.place_id)
  }

  /// The end used for overlap comparisons: the recorded end, or
  /// `start + policy.tentative_window` while the interval is open.
  pub fn effective_end(&self, policy: &MatchPolicy) -> DateTime<Utc> {
    match self.end {
      Some(end) => end,
      None => self
        .start
        .checked_add_signed(policy.tentative_window)
        .unwrap_or(DateTime::<Utc>::MAX_UTC),
    }
  }

  pub fn span(&self, policy: &MatchPolicy) -> Span {
    Span {
      start:     self.start,
      end:       self.effective_end(policy),
      tentative: self.tentative(),
    }
  }
}

// ─── Spans ───────────────────────────────────────────────────────────────────

/// A closed time span with both boundaries inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
  pub start:     DateTime<Utc>,
  pub end:       DateTime<Utc>,
  /// `end` is synthetic rather than recorded.
  pub tentative: bool,
}

impl Span {
  /// A span whose end is known.
  pub fn fixed(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
    Self { start, end, tentative: false }
  }

  /// Inclusive intersection test. Spans that merely touch overlap.
  pub fn overlaps(&self, other: &Span) -> bool {
    self.start <= other.end && other.start <= self.end
  }
}

/// An optionally bounded query window. Missing bounds are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
  pub start: Option<DateTime<Utc>>,
  pub end:   Option<DateTime<Utc>>,
}

impl TimeWindow {
  pub fn new(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
  ) -> Self {
    Self { start, end }
  }

  pub fn is_unbounded(&self) -> bool {
    self.start.is_none() && self.end.is_none()
  }

  /// The window as a fixed, non-tentative span.
  pub fn span(&self) -> Span {
    Span::fixed(
      self.start.unwrap_or(DateTime::<Utc>::MIN_UTC),
      self.end.unwrap_or(DateTime::<Utc>::MAX_UTC),
    )
  }
}

impl From<Span> for TimeWindow {
  fn from(span: Span) -> Self { Self::new(Some(span.start), Some(span.end)) }
}

// ─── Reports ─────────────────────────────────────────────────────────────────

/// An interval together with the span it was matched with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedInterval {
  #[serde(flatten)]
  pub interval:      Interval,
  pub effective_end: DateTime<Utc>,
  pub tentative:     bool,
}

impl MatchedInterval {
  pub fn new(interval: Interval, policy: &MatchPolicy) -> Self {
    let effective_end = interval.effective_end(policy);
    let tentative = interval.tentative();
    Self { interval, effective_end, tentative }
  }
}

/// One anchor interval and every other subject's interval that overlapped it.
/// Computed at query time; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactReport {
  pub anchor:   MatchedInterval,
  pub contacts: Vec<MatchedInterval>,
}
