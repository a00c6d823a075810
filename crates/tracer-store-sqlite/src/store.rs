//! [`SqliteStore`], the SQLite implementation of the Tracer store traits.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use tracer_core::{
  deadline::Deadline,
  directory::{Directory, NewPerson, Person, PersonUpdate, Place},
  interval::{Interval, PlaceRef, SubjectRef},
  store::{IntervalQuery, IntervalStore, PresenceScope, ReferenceResolver},
};

use crate::{
  Error, Result,
  encode::{
    INTERVAL_COLUMNS, RawInterval, RawPerson, RawPlace, encode_dt, encode_scope,
    encode_uuid,
  },
  schema::SCHEMA,
};

/// Whether `err` is a violation of a `UNIQUE` constraint or index.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

/// Result of a write closure that first checks its deadline on the
/// database thread.
enum Guarded<T> {
  Ran(T),
  /// The deadline had passed by the time the closure ran; nothing written.
  Expired,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tracer store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  #[cfg(test)]
  pub(crate) fn connection(&self) -> &tokio_rusqlite::Connection { &self.conn }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── IntervalStore impl ──────────────────────────────────────────────────────

impl IntervalStore for SqliteStore {
  type Error = Error;

  async fn get_interval(&self, id: Uuid) -> Result<Option<Interval>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawInterval> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {INTERVAL_COLUMNS} FROM intervals WHERE interval_id = ?1"
              ),
              rusqlite::params![id_str],
              RawInterval::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawInterval::into_interval).transpose()
  }

  async fn list_intervals(&self, query: &IntervalQuery) -> Result<Vec<Interval>> {
    // Every bound value is TEXT, so parameters are collected as strings and
    // numbered in push order.
    let mut conds: Vec<String> = vec![];
    let mut args: Vec<String> = vec![];

    if let Some(id) = query.subject_id {
      args.push(encode_uuid(id));
      conds.push(format!("subject_id = ?{}", args.len()));
    }
    if let Some(id) = query.exclude_subject_id {
      args.push(encode_uuid(id));
      conds.push(format!("subject_id != ?{}", args.len()));
    }
    if let Some(id) = query.place_id {
      args.push(encode_uuid(id));
      conds.push(format!("place_id = ?{}", args.len()));
    }
    if query.open_only {
      conds.push("end_at IS NULL".to_owned());
    }
    if let Some(window) = query.window {
      if let Some(end) = window.end {
        args.push(encode_dt(end));
        conds.push(format!("start_at <= ?{}", args.len()));
      }
      // Open rows are kept regardless of their start; the caller applies
      // the tentative end.
      if let Some(start) = window.start {
        args.push(encode_dt(start));
        conds.push(format!("(end_at IS NULL OR end_at >= ?{})", args.len()));
      }
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };
    let sql = format!(
      "SELECT {INTERVAL_COLUMNS} FROM intervals {where_clause}
       ORDER BY start_at, interval_id"
    );

    let raws: Vec<RawInterval> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args.iter()), RawInterval::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawInterval::into_interval).collect()
  }

  async fn find_open_interval(&self, scope: PresenceScope) -> Result<Option<Interval>> {
    let subject_str = encode_uuid(scope.subject_id);
    let place_str   = scope.place_id.map(encode_uuid);

    let raw: Option<RawInterval> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {INTERVAL_COLUMNS} FROM intervals
                 WHERE subject_id = ?1
                   AND (?2 IS NULL OR place_id = ?2)
                   AND end_at IS NULL
                 ORDER BY start_at DESC
                 LIMIT 1"
              ),
              rusqlite::params![subject_str, place_str],
              RawInterval::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawInterval::into_interval).transpose()
  }

  async fn create_interval(
    &self,
    interval: Interval,
    scope: PresenceScope,
    deadline: Deadline,
  ) -> Result<Interval> {
    let id_str       = encode_uuid(interval.interval_id);
    let subject_str  = encode_uuid(interval.subject.subject_id);
    let subject_name = interval.subject.name.clone();
    let place_str    = interval.place.as_ref().map(|p| encode_uuid(p.place_id));
    let place_name   = interval.place.as_ref().map(|p| p.name.clone());
    let scope_key    = encode_scope(&scope);
    let start_str    = encode_dt(interval.start);
    let end_str      = interval.end.map(encode_dt);

    let key = scope_key.clone();
    let outcome = self
      .conn
      .call(move |conn| {
        // Queued calls can run long after the caller gave up.
        if deadline.has_passed() {
          return Ok(Guarded::Expired);
        }
        let result = conn.execute(
          "INSERT INTO intervals (
             interval_id, subject_id, subject_name, place_id, place_name,
             scope_key, start_at, end_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            subject_str,
            subject_name,
            place_str,
            place_name,
            key,
            start_str,
            end_str,
          ],
        );
        match result {
          Ok(_) => Ok(Guarded::Ran(true)),
          Err(e) if is_unique_violation(&e) => Ok(Guarded::Ran(false)),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    match outcome {
      Guarded::Ran(true) => Ok(interval),
      Guarded::Ran(false) => {
        debug!(%scope_key, "open interval index rejected insert");
        Err(Error::OpenIntervalExists(scope_key))
      }
      Guarded::Expired => {
        debug!(%scope_key, "insert skipped: deadline passed");
        Err(Error::DeadlineExceeded)
      }
    }
  }

  async fn close_interval(
    &self,
    id: Uuid,
    end: DateTime<Utc>,
    deadline: Deadline,
  ) -> Result<Option<Interval>> {
    let id_str  = encode_uuid(id);
    let end_str = encode_dt(end);

    let outcome = self
      .conn
      .call(move |conn| {
        if deadline.has_passed() {
          return Ok(Guarded::Expired);
        }
        let changed = conn.execute(
          "UPDATE intervals SET end_at = ?2
           WHERE interval_id = ?1 AND end_at IS NULL",
          rusqlite::params![id_str, end_str],
        )?;
        if changed == 0 {
          return Ok(Guarded::Ran(None));
        }
        Ok(Guarded::Ran(Some(conn.query_row(
          &format!("SELECT {INTERVAL_COLUMNS} FROM intervals WHERE interval_id = ?1"),
          rusqlite::params![id_str],
          RawInterval::from_row,
        )?)))
      })
      .await?;

    match outcome {
      Guarded::Ran(raw) => raw.map(RawInterval::into_interval).transpose(),
      Guarded::Expired => {
        debug!(interval_id = %id, "close skipped: deadline passed");
        Err(Error::DeadlineExceeded)
      }
    }
  }

  async fn delete_interval(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM intervals WHERE interval_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }
}

// ─── Directory impl ──────────────────────────────────────────────────────────

impl Directory for SqliteStore {
  type Error = Error;

  async fn add_place(&self, name: String) -> Result<Place> {
    let place = Place {
      place_id:   Uuid::new_v4(),
      name:       name.trim().to_owned(),
      created_at: Utc::now(),
    };

    let id_str   = encode_uuid(place.place_id);
    let name_str = place.name.clone();
    let at_str   = encode_dt(place.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO places (place_id, name, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(place)
  }

  async fn get_place(&self, id: Uuid) -> Result<Option<Place>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPlace> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT place_id, name, created_at FROM places WHERE place_id = ?1",
              rusqlite::params![id_str],
              RawPlace::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPlace::into_place).transpose()
  }

  async fn list_places(&self) -> Result<Vec<Place>> {
    let raws: Vec<RawPlace> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT place_id, name, created_at FROM places ORDER BY name, place_id",
        )?;
        let rows = stmt
          .query_map([], RawPlace::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPlace::into_place).collect()
  }

  async fn add_person(&self, input: NewPerson) -> Result<Person> {
    let person = Person {
      subject_id: Uuid::new_v4(),
      name:       input.name.trim().to_owned(),
      email:      input.email.trim().to_lowercase(),
      created_at: Utc::now(),
    };

    let id_str    = encode_uuid(person.subject_id);
    let name_str  = person.name.clone();
    let email_str = person.email.clone();
    let at_str    = encode_dt(person.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO people (subject_id, name, email, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name_str, email_str, at_str],
        );
        match result {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(Error::EmailTaken(person.email));
    }
    Ok(person)
  }

  async fn get_person(&self, id: Uuid) -> Result<Option<Person>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT subject_id, name, email, created_at FROM people
               WHERE subject_id = ?1",
              rusqlite::params![id_str],
              RawPerson::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  async fn list_people(&self) -> Result<Vec<Person>> {
    let raws: Vec<RawPerson> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT subject_id, name, email, created_at FROM people
           ORDER BY name, subject_id",
        )?;
        let rows = stmt
          .query_map([], RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }

  async fn update_place(&self, id: Uuid, name: String) -> Result<Option<Place>> {
    let id_str   = encode_uuid(id);
    let name_str = name.trim().to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE places SET name = ?2 WHERE place_id = ?1",
          rusqlite::params![id_str, name_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_place(id).await
  }

  async fn delete_place(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM places WHERE place_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn update_person(
    &self,
    id: Uuid,
    update: PersonUpdate,
  ) -> Result<Option<Person>> {
    let id_str    = encode_uuid(id);
    let name_str  = update.name.map(|n| n.trim().to_owned());
    let email_str = update.email.map(|e| e.trim().to_lowercase());

    let taken = email_str.clone();
    let changed = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "UPDATE people
           SET name  = COALESCE(?2, name),
               email = COALESCE(?3, email)
           WHERE subject_id = ?1",
          rusqlite::params![id_str, name_str, email_str],
        );
        match result {
          Ok(n) => Ok(Some(n)),
          Err(e) if is_unique_violation(&e) => Ok(None),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    match changed {
      None => Err(Error::EmailTaken(taken.unwrap_or_default())),
      Some(0) => Ok(None),
      Some(_) => self.get_person(id).await,
    }
  }

  async fn delete_person(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM people WHERE subject_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }
}

// ─── ReferenceResolver impl ──────────────────────────────────────────────────

/// Resolves snapshots from the store's own directory tables.
impl ReferenceResolver for SqliteStore {
  type Error = Error;

  async fn resolve_place(&self, id: Uuid) -> Result<Option<PlaceRef>> {
    Ok(self.get_place(id).await?.map(|p| p.to_ref()))
  }

  async fn resolve_subject(&self, id: Uuid) -> Result<Option<SubjectRef>> {
    Ok(self.get_person(id).await?.map(|p| p.to_ref()))
  }
}
