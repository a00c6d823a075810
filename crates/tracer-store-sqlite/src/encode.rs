//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with nanosecond precision and a
//! `Z` suffix. The format is fixed width, so string comparison in SQL orders
//! them chronologically. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use tracer_core::{
  directory::{Person, Place},
  interval::{Interval, PlaceRef, SubjectRef},
  store::PresenceScope,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Scope ────────────────────────────────────────────────────────────────────

/// The value of the `scope_key` column, indexed uniquely over open rows.
pub fn encode_scope(scope: &PresenceScope) -> String {
  match scope.place_id {
    Some(place_id) => {
      format!("{}/{}", encode_uuid(scope.subject_id), encode_uuid(place_id))
    }
    None => encode_uuid(scope.subject_id),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawInterval::from_row`].
pub const INTERVAL_COLUMNS: &str =
  "interval_id, subject_id, subject_name, place_id, place_name, start_at, end_at";

/// Raw strings read directly from an `intervals` row.
pub struct RawInterval {
  pub interval_id:  String,
  pub subject_id:   String,
  pub subject_name: String,
  pub place_id:     Option<String>,
  pub place_name:   Option<String>,
  pub start_at:     String,
  pub end_at:       Option<String>,
}

impl RawInterval {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      interval_id:  row.get(0)?,
      subject_id:   row.get(1)?,
      subject_name: row.get(2)?,
      place_id:     row.get(3)?,
      place_name:   row.get(4)?,
      start_at:     row.get(5)?,
      end_at:       row.get(6)?,
    })
  }

  pub fn into_interval(self) -> Result<Interval> {
    let place = match (self.place_id, self.place_name) {
      (Some(id), Some(name)) => Some(PlaceRef { place_id: decode_uuid(&id)?, name }),
      _ => None,
    };

    Ok(Interval {
      interval_id: decode_uuid(&self.interval_id)?,
      subject:     SubjectRef {
        subject_id: decode_uuid(&self.subject_id)?,
        name:       self.subject_name,
      },
      place,
      start:       decode_dt(&self.start_at)?,
      end:         self.end_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read directly from a `places` row.
pub struct RawPlace {
  pub place_id:   String,
  pub name:       String,
  pub created_at: String,
}

impl RawPlace {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      place_id:   row.get(0)?,
      name:       row.get(1)?,
      created_at: row.get(2)?,
    })
  }

  pub fn into_place(self) -> Result<Place> {
    Ok(Place {
      place_id:   decode_uuid(&self.place_id)?,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `people` row.
pub struct RawPerson {
  pub subject_id: String,
  pub name:       String,
  pub email:      String,
  pub created_at: String,
}

impl RawPerson {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id: row.get(0)?,
      name:       row.get(1)?,
      email:      row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      subject_id: decode_uuid(&self.subject_id)?,
      name:       self.name,
      email:      self.email,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_as_strings() {
    let a = Utc.with_ymd_and_hms(2024, 3, 1, 9, 59, 59).unwrap();
    let b = a + chrono::TimeDelta::nanoseconds(1);
    let c = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    assert!(encode_dt(a) < encode_dt(b));
    assert!(encode_dt(b) < encode_dt(c));
    assert_eq!(encode_dt(c), "2024-03-01T10:00:00.000000000Z");
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }

  #[test]
  fn scope_key_includes_place_only_when_scoped() {
    let subject_id = Uuid::new_v4();
    let place_id = Uuid::new_v4();
    assert_eq!(
      encode_scope(&PresenceScope { subject_id, place_id: None }),
      subject_id.to_string(),
    );
    assert_eq!(
      encode_scope(&PresenceScope { subject_id, place_id: Some(place_id) }),
      format!("{subject_id}/{place_id}"),
    );
  }
}
