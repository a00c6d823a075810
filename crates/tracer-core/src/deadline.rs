//! Request deadlines carried down to the store.
//!
//! A request abandoned by its caller must not write. Dropping the request
//! future is not enough when the write has already been queued to a backend
//! worker, so backends re-check the deadline immediately before mutating.

use std::time::{Duration, Instant};

/// An optional point in monotonic time after which writes are refused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
  /// No deadline; writes always proceed.
  pub const NONE: Self = Self(None);

  pub fn at(instant: Instant) -> Self { Self(Some(instant)) }

  /// A deadline `budget` from now. A budget too large to represent means no
  /// deadline.
  pub fn after(budget: Duration) -> Self { Self(Instant::now().checked_add(budget)) }

  pub fn instant(&self) -> Option<Instant> { self.0 }

  pub fn has_passed(&self) -> bool {
    self.0.is_some_and(|at| Instant::now() >= at)
  }
}
