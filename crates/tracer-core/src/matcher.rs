//! The overlap matcher.
//!
//! Open intervals have no end to compare against, so both sides of every
//! comparison substitute `start + tentative_window` for a missing end before
//! testing intersection. Boundaries are inclusive: an interval ending at
//! 10:05 overlaps one starting at 10:05.

use chrono::TimeDelta;

use crate::interval::{Interval, MatchedInterval, Span};

/// Length of the synthetic end assigned to open intervals, in seconds.
pub const TENTATIVE_WINDOW_SECS: i64 = 5 * 60;

/// Parameters of the matching algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPolicy {
  pub tentative_window: TimeDelta,
}

impl Default for MatchPolicy {
  fn default() -> Self {
    Self { tentative_window: TimeDelta::seconds(TENTATIVE_WINDOW_SECS) }
  }
}

/// Whether two intervals overlap once tentative ends are substituted.
pub fn overlaps(a: &Interval, b: &Interval, policy: &MatchPolicy) -> bool {
  a.span(policy).overlaps(&b.span(policy))
}

/// Select the candidates that overlap `anchor`.
///
/// Candidates belonging to the anchor's own subject are never contacts, even
/// if the caller's pool contains them. Candidate order is preserved.
pub fn match_contacts<I>(
  anchor: &Interval,
  candidates: I,
  policy: &MatchPolicy,
) -> Vec<MatchedInterval>
where
  I: IntoIterator<Item = Interval>,
{
  let anchor_span = anchor.span(policy);
  candidates
    .into_iter()
    .filter(|c| c.subject.subject_id != anchor.subject.subject_id)
    .filter(|c| c.span(policy).overlaps(&anchor_span))
    .map(|c| MatchedInterval::new(c, policy))
    .collect()
}

/// Keep only the intervals whose effective span overlaps `window`.
pub fn within(
  intervals: Vec<Interval>,
  window: &Span,
  policy: &MatchPolicy,
) -> Vec<Interval> {
  intervals
    .into_iter()
    .filter(|i| i.span(policy).overlaps(window))
    .collect()
}
