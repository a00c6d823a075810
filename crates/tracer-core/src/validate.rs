//! Request validation.
//!
//! Every validator is a plain function of the request value that collects all
//! problems it finds, so callers get the full list in one round-trip.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::{
  directory::{NewPerson, PersonUpdate},
  store::PresenceScope,
  tracker::{
    CheckOutRequest, HistoryRequest, IntervalFilter, ToggleRequest,
  },
};

/// Longest accepted place or person name, in characters.
pub const MAX_NAME_LEN: usize = 50;

// ─── Error list ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field:   &'static str,
  pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
  pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
    self.0.iter().map(|e| e.field)
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, e) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str("; ")?;
      }
      write!(f, "{}: {}", e.field, e.message)?;
    }
    Ok(())
  }
}

impl std::error::Error for ValidationErrors {}

#[derive(Default)]
struct Checker(Vec<FieldError>);

impl Checker {
  fn require<T>(&mut self, field: &'static str, value: Option<T>) -> Option<T> {
    if value.is_none() {
      self.fail(field, "is required");
    }
    value
  }

  fn check(&mut self, field: &'static str, ok: bool, message: &str) {
    if !ok {
      self.fail(field, message);
    }
  }

  fn fail(&mut self, field: &'static str, message: &str) {
    self.0.push(FieldError { field, message: message.to_owned() });
  }

  fn finish<T>(self, value: T) -> Result<T, ValidationErrors> {
    if self.0.is_empty() { Ok(value) } else { Err(ValidationErrors(self.0)) }
  }
}

// ─── Presence requests ───────────────────────────────────────────────────────

/// Derive the presence scope of a check-in or toggle.
///
/// With place scoping the place is part of the scope and therefore required.
/// Without it the place is only a snapshot and the scope is the subject alone.
pub fn presence_scope(
  req: &ToggleRequest,
  place_scoping: bool,
) -> Result<PresenceScope, ValidationErrors> {
  let mut c = Checker::default();
  let subject_id = c.require("subject_id", req.subject_id);
  let place_id = if place_scoping {
    c.require("place_id", req.place_id)
  } else {
    None
  };
  match subject_id {
    Some(subject_id) => c.finish(PresenceScope { subject_id, place_id }),
    None => Err(ValidationErrors(c.0)),
  }
}

/// How a check-out request identifies the interval to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutTarget {
  /// A specific interval, optionally asserted to belong to a subject and,
  /// under place scoping, to a place.
  Interval {
    interval_id: Uuid,
    subject_id:  Option<Uuid>,
    place_id:    Option<Uuid>,
  },
  /// The most recent open interval in a scope.
  Scope(PresenceScope),
}

pub fn check_out(
  req: &CheckOutRequest,
  place_scoping: bool,
) -> Result<CheckOutTarget, ValidationErrors> {
  let mut c = Checker::default();
  match (req.interval_id, req.subject_id) {
    (Some(interval_id), subject_id) => {
      let place_id = if place_scoping { req.place_id } else { None };
      c.finish(CheckOutTarget::Interval { interval_id, subject_id, place_id })
    }
    (None, Some(subject_id)) => {
      let place_id = if place_scoping {
        c.require("place_id", req.place_id)
      } else {
        None
      };
      c.finish(CheckOutTarget::Scope(PresenceScope { subject_id, place_id }))
    }
    (None, None) => {
      c.fail("interval_id", "either interval_id or subject_id is required");
      Err(ValidationErrors(c.0))
    }
  }
}

pub fn history(req: &HistoryRequest) -> Result<(), ValidationErrors> {
  let mut c = Checker::default();
  c.check(
    "scope",
    req.subject_id.is_some() || req.place_id.is_some(),
    "subject_id or place_id is required",
  );
  check_window(&mut c, req.start, req.end);
  c.finish(())
}

pub fn interval_filter(filter: &IntervalFilter) -> Result<(), ValidationErrors> {
  let mut c = Checker::default();
  check_window(&mut c, filter.start, filter.end);
  c.finish(())
}

fn check_window(
  c: &mut Checker,
  start: Option<chrono::DateTime<chrono::Utc>>,
  end: Option<chrono::DateTime<chrono::Utc>>,
) {
  if let (Some(start), Some(end)) = (start, end) {
    c.check("end", start <= end, "must not be before start");
  }
}

// ─── Directory requests ──────────────────────────────────────────────────────

pub fn place_name(name: &str) -> Result<(), ValidationErrors> {
  let mut c = Checker::default();
  check_name(&mut c, name);
  c.finish(())
}

pub fn new_person(input: &NewPerson) -> Result<(), ValidationErrors> {
  let mut c = Checker::default();
  check_name(&mut c, &input.name);
  c.check("email", looks_like_email(&input.email), "must be an email address");
  c.finish(())
}

pub fn person_update(update: &PersonUpdate) -> Result<(), ValidationErrors> {
  let mut c = Checker::default();
  if let Some(name) = &update.name {
    check_name(&mut c, name);
  }
  if let Some(email) = &update.email {
    c.check("email", looks_like_email(email), "must be an email address");
  }
  c.finish(())
}

fn check_name(c: &mut Checker, name: &str) {
  let len = name.trim().chars().count();
  c.check("name", len >= 1, "must not be empty");
  c.check(
    "name",
    len <= MAX_NAME_LEN,
    "must be at most 50 characters",
  );
}

fn looks_like_email(s: &str) -> bool {
  match s.split_once('@') {
    Some((local, domain)) => {
      !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@')
        && !s.chars().any(char::is_whitespace)
    }
    None => false,
  }
}
