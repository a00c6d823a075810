//! Tracker tests against in-memory collaborators.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use uuid::Uuid;

use crate::{
  ErrorKind,
  clock::ManualClock,
  deadline::Deadline,
  interval::{ContactReport, Interval, PlaceRef, SubjectRef},
  store::{
    IntervalQuery, IntervalStore, PresenceScope, ReferenceResolver, StoreError,
  },
  tracker::{
    CheckOutRequest, HistoryRequest, IntervalFilter, Toggle, ToggleRequest,
    Tracker, TrackerConfig,
  },
};

// ─── Fakes ───────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
enum FakeError {
  #[error("open interval exists")]
  Conflict,
  #[error("store offline")]
  Offline,
  #[error("deadline passed")]
  Expired,
}

impl StoreError for FakeError {
  fn is_conflict(&self) -> bool { matches!(self, Self::Conflict) }

  fn is_deadline_exceeded(&self) -> bool { matches!(self, Self::Expired) }
}

#[derive(Default)]
struct MemoryStore {
  rows:    Mutex<Vec<(Interval, PresenceScope)>>,
  offline: Mutex<bool>,
}

impl MemoryStore {
  fn check(&self) -> Result<(), FakeError> {
    if *self.offline.lock().unwrap() { Err(FakeError::Offline) } else { Ok(()) }
  }

  fn len(&self) -> usize { self.rows.lock().unwrap().len() }
}

impl IntervalStore for MemoryStore {
  type Error = FakeError;

  async fn get_interval(&self, id: Uuid) -> Result<Option<Interval>, FakeError> {
    self.check()?;
    let rows = self.rows.lock().unwrap();
    Ok(rows.iter().find(|(i, _)| i.interval_id == id).map(|(i, _)| i.clone()))
  }

  async fn list_intervals(
    &self,
    query: &IntervalQuery,
  ) -> Result<Vec<Interval>, FakeError> {
    self.check()?;
    let rows = self.rows.lock().unwrap();
    let mut out: Vec<Interval> = rows
      .iter()
      .map(|(i, _)| i)
      .filter(|i| query.subject_id.is_none_or(|s| i.subject.subject_id == s))
      .filter(|i| query.exclude_subject_id != Some(i.subject.subject_id))
      .filter(|i| query.place_id.is_none_or(|p| i.place_id() == Some(p)))
      .filter(|i| !query.open_only || i.is_open())
      .cloned()
      .collect();
    out.sort_by_key(|i| i.start);
    Ok(out)
  }

  async fn find_open_interval(
    &self,
    scope: PresenceScope,
  ) -> Result<Option<Interval>, FakeError> {
    self.check()?;
    let rows = self.rows.lock().unwrap();
    Ok(
      rows
        .iter()
        .filter(|(i, _)| i.is_open() && scope.matches(i))
        .max_by_key(|(i, _)| i.start)
        .map(|(i, _)| i.clone()),
    )
  }

  async fn create_interval(
    &self,
    interval: Interval,
    scope: PresenceScope,
    deadline: Deadline,
  ) -> Result<Interval, FakeError> {
    self.check()?;
    if deadline.has_passed() {
      return Err(FakeError::Expired);
    }
    let mut rows = self.rows.lock().unwrap();
    if rows.iter().any(|(i, s)| i.is_open() && *s == scope) {
      return Err(FakeError::Conflict);
    }
    rows.push((interval.clone(), scope));
    Ok(interval)
  }

  async fn close_interval(
    &self,
    id: Uuid,
    end: DateTime<Utc>,
    deadline: Deadline,
  ) -> Result<Option<Interval>, FakeError> {
    self.check()?;
    if deadline.has_passed() {
      return Err(FakeError::Expired);
    }
    let mut rows = self.rows.lock().unwrap();
    Ok(
      rows
        .iter_mut()
        .find(|(i, _)| i.interval_id == id && i.is_open())
        .map(|(i, _)| {
          i.end = Some(end);
          i.clone()
        }),
    )
  }

  async fn delete_interval(&self, id: Uuid) -> Result<bool, FakeError> {
    self.check()?;
    let mut rows = self.rows.lock().unwrap();
    let before = rows.len();
    rows.retain(|(i, _)| i.interval_id != id);
    Ok(rows.len() != before)
  }
}

#[derive(Default)]
struct MemoryResolver {
  places:   Mutex<HashMap<Uuid, String>>,
  subjects: Mutex<HashMap<Uuid, String>>,
}

impl MemoryResolver {
  fn place(&self, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    self.places.lock().unwrap().insert(id, name.into());
    id
  }

  fn subject(&self, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    self.subjects.lock().unwrap().insert(id, name.into());
    id
  }

  fn rename(&self, id: Uuid, name: &str) {
    self.subjects.lock().unwrap().insert(id, name.into());
  }
}

impl ReferenceResolver for Arc<MemoryResolver> {
  type Error = FakeError;

  async fn resolve_place(&self, id: Uuid) -> Result<Option<PlaceRef>, FakeError> {
    Ok(
      self
        .places
        .lock()
        .unwrap()
        .get(&id)
        .map(|name| PlaceRef { place_id: id, name: name.clone() }),
    )
  }

  async fn resolve_subject(
    &self,
    id: Uuid,
  ) -> Result<Option<SubjectRef>, FakeError> {
    Ok(
      self
        .subjects
        .lock()
        .unwrap()
        .get(&id)
        .map(|name| SubjectRef { subject_id: id, name: name.clone() }),
    )
  }
}

impl IntervalStore for Arc<MemoryStore> {
  type Error = FakeError;

  async fn get_interval(&self, id: Uuid) -> Result<Option<Interval>, FakeError> {
    (**self).get_interval(id).await
  }

  async fn list_intervals(
    &self,
    query: &IntervalQuery,
  ) -> Result<Vec<Interval>, FakeError> {
    (**self).list_intervals(query).await
  }

  async fn find_open_interval(
    &self,
    scope: PresenceScope,
  ) -> Result<Option<Interval>, FakeError> {
    (**self).find_open_interval(scope).await
  }

  async fn create_interval(
    &self,
    interval: Interval,
    scope: PresenceScope,
    deadline: Deadline,
  ) -> Result<Interval, FakeError> {
    (**self).create_interval(interval, scope, deadline).await
  }

  async fn close_interval(
    &self,
    id: Uuid,
    end: DateTime<Utc>,
    deadline: Deadline,
  ) -> Result<Option<Interval>, FakeError> {
    (**self).close_interval(id, end, deadline).await
  }

  async fn delete_interval(&self, id: Uuid) -> Result<bool, FakeError> {
    (**self).delete_interval(id).await
  }
}

// ─── Harness ─────────────────────────────────────────────────────────────────

struct Harness {
  tracker:  Tracker<Arc<MemoryStore>, Arc<MemoryResolver>, Arc<ManualClock>>,
  store:    Arc<MemoryStore>,
  resolver: Arc<MemoryResolver>,
  clock:    Arc<ManualClock>,
}

fn at(h: u32, m: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 3, 1, h, m, 0).unwrap()
}

fn harness(place_scoping: bool) -> Harness {
  let store = Arc::new(MemoryStore::default());
  let resolver = Arc::new(MemoryResolver::default());
  let clock = Arc::new(ManualClock::new(at(10, 0)));
  let tracker = Tracker::with_clock(
    store.clone(),
    resolver.clone(),
    clock.clone(),
    TrackerConfig { place_scoping, ..Default::default() },
  );
  Harness { tracker, store, resolver, clock }
}

fn toggle(subject: Uuid, place: Option<Uuid>) -> ToggleRequest {
  ToggleRequest { subject_id: Some(subject), place_id: place }
}

fn window(place: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> HistoryRequest {
  HistoryRequest {
    place_id: Some(place),
    start: Some(start),
    end: Some(end),
    ..Default::default()
  }
}

// ─── State machine ───────────────────────────────────────────────────────────

#[tokio::test]
async fn toggle_opens_then_closes_same_interval() {
  let h = harness(false);
  let u = h.resolver.subject("U");

  let first = h.tracker.toggle(toggle(u, None)).await.unwrap();
  let Toggle::CheckedIn(opened) = first else { panic!("expected check-in") };
  assert!(opened.is_open());
  assert_eq!(opened.start, at(10, 0));
  assert_eq!(opened.place, None);

  h.clock.advance(TimeDelta::minutes(3));
  let second = h.tracker.toggle(toggle(u, None)).await.unwrap();
  let Toggle::CheckedOut(closed) = second else { panic!("expected check-out") };
  assert_eq!(closed.interval_id, opened.interval_id);
  assert_eq!(closed.end, Some(at(10, 3)));
}

#[tokio::test]
async fn toggle_sequence_pairs_up() {
  let h = harness(true);
  let u = h.resolver.subject("U");
  let p = h.resolver.place("P");

  for n in 0..7 {
    h.tracker.toggle(toggle(u, Some(p))).await.unwrap();
    h.clock.advance(TimeDelta::minutes(1));

    let all = h.tracker.list_intervals(IntervalFilter::default()).await.unwrap();
    let open = all.iter().filter(|i| i.is_open()).count();
    let closed = all.len() - open;
    let toggles = n + 1;
    assert!(open <= 1, "two open intervals after {toggles} toggles");
    assert_eq!(closed, toggles / 2);
    assert_eq!(open, toggles % 2);
  }
}

#[tokio::test]
async fn place_scoping_keeps_places_independent() {
  let h = harness(true);
  let u = h.resolver.subject("U");
  let p = h.resolver.place("P");
  let q = h.resolver.place("Q");

  h.tracker.toggle(toggle(u, Some(p))).await.unwrap();
  let at_q = h.tracker.toggle(toggle(u, Some(q))).await.unwrap();
  assert!(matches!(at_q, Toggle::CheckedIn(_)));

  let open = h
    .tracker
    .list_intervals(IntervalFilter { open_only: true, ..Default::default() })
    .await
    .unwrap();
  assert_eq!(open.len(), 2);
}

#[tokio::test]
async fn without_place_scoping_any_place_closes_the_open_interval() {
  let h = harness(false);
  let u = h.resolver.subject("U");
  let p = h.resolver.place("P");
  let q = h.resolver.place("Q");

  let opened = h.tracker.toggle(toggle(u, Some(p))).await.unwrap();
  assert_eq!(opened.interval().place.as_ref().unwrap().name, "P");

  let closed = h.tracker.toggle(toggle(u, Some(q))).await.unwrap();
  assert!(matches!(closed, Toggle::CheckedOut(_)));
  assert_eq!(closed.interval().interval_id, opened.interval().interval_id);
}

#[tokio::test]
async fn unresolved_place_aborts_without_writing() {
  let h = harness(true);
  let u = h.resolver.subject("U");

  let err = h.tracker.toggle(toggle(u, Some(Uuid::new_v4()))).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  assert_eq!(h.store.len(), 0);
}

#[tokio::test]
async fn unresolved_subject_aborts_without_writing() {
  let h = harness(false);
  let err = h.tracker.toggle(toggle(Uuid::new_v4(), None)).await.unwrap_err();
  assert!(matches!(err, crate::Error::SubjectNotFound(_)));
  assert_eq!(h.store.len(), 0);
}

#[tokio::test]
async fn explicit_check_in_rejects_second_open() {
  let h = harness(true);
  let u = h.resolver.subject("U");
  let p = h.resolver.place("P");

  let first = h.tracker.check_in(toggle(u, Some(p))).await.unwrap();
  let err = h.tracker.check_in(toggle(u, Some(p))).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
  assert!(matches!(
    err,
    crate::Error::OpenIntervalExists { interval_id: Some(id), .. } if id == first.interval_id
  ));
}

#[tokio::test]
async fn store_guard_surfaces_as_conflict() {
  let h = harness(false);
  let u = h.resolver.subject("U");
  let subject = h.resolver.resolve_subject(u).await.unwrap().unwrap();

  // Simulate a concurrent request that opened an interval behind our back.
  let scope = PresenceScope { subject_id: u, place_id: None };
  h.store
    .create_interval(
      Interval::open(subject.clone(), None, at(9, 0)),
      scope,
      Deadline::NONE,
    )
    .await
    .unwrap();
  let err = h
    .store
    .create_interval(
      Interval::open(subject, None, at(9, 1)),
      scope,
      Deadline::NONE,
    )
    .await
    .unwrap_err();
  assert!(err.is_conflict());
}

#[tokio::test]
async fn check_out_by_id_and_by_scope() {
  let h = harness(true);
  let u = h.resolver.subject("U");
  let p = h.resolver.place("P");
  let q = h.resolver.place("Q");

  let at_p = h.tracker.check_in(toggle(u, Some(p))).await.unwrap();
  h.tracker.check_in(toggle(u, Some(q))).await.unwrap();
  h.clock.advance(TimeDelta::minutes(10));

  let closed = h
    .tracker
    .check_out(CheckOutRequest {
      interval_id: Some(at_p.interval_id),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(closed.end, Some(at(10, 10)));

  let again = h
    .tracker
    .check_out(CheckOutRequest {
      interval_id: Some(at_p.interval_id),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert!(matches!(again, crate::Error::AlreadyClosed(_)));

  let by_scope = h
    .tracker
    .check_out(CheckOutRequest {
      subject_id: Some(u),
      place_id: Some(q),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(by_scope.place.unwrap().place_id, q);

  let none_left = h
    .tracker
    .check_out(CheckOutRequest {
      subject_id: Some(u),
      place_id: Some(q),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert_eq!(none_left.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn check_out_rejects_interval_of_other_subject() {
  let h = harness(false);
  let u = h.resolver.subject("U");
  let v = h.resolver.subject("V");
  let opened = h.tracker.check_in(toggle(u, None)).await.unwrap();

  let err = h
    .tracker
    .check_out(CheckOutRequest {
      interval_id: Some(opened.interval_id),
      subject_id:  Some(v),
      place_id:    None,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::IntervalNotFound(_)));
}

#[tokio::test]
async fn check_out_by_id_rejects_interval_at_other_place() {
  let h = harness(true);
  let u = h.resolver.subject("U");
  let p = h.resolver.place("P");
  let q = h.resolver.place("Q");
  let opened = h.tracker.check_in(toggle(u, Some(p))).await.unwrap();

  let err = h
    .tracker
    .check_out(CheckOutRequest {
      interval_id: Some(opened.interval_id),
      subject_id:  Some(u),
      place_id:    Some(q),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::IntervalNotFound(_)));
  assert!(h.tracker.get_interval(opened.interval_id).await.unwrap().is_open());

  let closed = h
    .tracker
    .check_out(CheckOutRequest {
      interval_id: Some(opened.interval_id),
      subject_id:  Some(u),
      place_id:    Some(p),
    })
    .await
    .unwrap();
  assert!(!closed.is_open());
}

#[tokio::test]
async fn unscoped_check_out_by_id_ignores_place() {
  let h = harness(false);
  let u = h.resolver.subject("U");
  let p = h.resolver.place("P");
  let opened = h.tracker.check_in(toggle(u, Some(p))).await.unwrap();

  let closed = h
    .tracker
    .check_out(CheckOutRequest {
      interval_id: Some(opened.interval_id),
      subject_id:  None,
      place_id:    Some(Uuid::new_v4()),
    })
    .await
    .unwrap();
  assert_eq!(closed.interval_id, opened.interval_id);
}

// ─── Deadlines ───────────────────────────────────────────────────────────────

fn expired() -> Deadline { Deadline::at(std::time::Instant::now()) }

#[tokio::test]
async fn expired_deadline_prevents_check_in() {
  let h = harness(true);
  let u = h.resolver.subject("U");
  let p = h.resolver.place("P");

  let err = h
    .tracker
    .toggle_until(toggle(u, Some(p)), expired())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Timeout);
  assert_eq!(h.store.len(), 0);
}

#[tokio::test]
async fn expired_deadline_prevents_check_out() {
  let h = harness(true);
  let u = h.resolver.subject("U");
  let p = h.resolver.place("P");
  let opened = h.tracker.check_in(toggle(u, Some(p))).await.unwrap();

  let err = h
    .tracker
    .toggle_until(toggle(u, Some(p)), expired())
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::DeadlineExceeded));
  assert!(h.tracker.get_interval(opened.interval_id).await.unwrap().is_open());

  let err = h
    .tracker
    .check_out_until(
      CheckOutRequest { interval_id: Some(opened.interval_id), ..Default::default() },
      expired(),
    )
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn store_refusal_past_deadline_is_a_timeout() {
  let h = harness(false);
  let u = h.resolver.subject("U");
  let subject = h.resolver.resolve_subject(u).await.unwrap().unwrap();
  let scope = PresenceScope { subject_id: u, place_id: None };

  let err = h
    .store
    .create_interval(Interval::open(subject, None, at(10, 0)), scope, expired())
    .await
    .unwrap_err();
  assert!(err.is_deadline_exceeded());
  assert!(!err.is_conflict());
  assert_eq!(h.store.len(), 0);
}

#[tokio::test]
async fn missing_subject_is_a_validation_error() {
  let h = harness(true);
  let err = h.tracker.toggle(ToggleRequest::default()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn store_failure_is_wrapped_as_upstream() {
  let h = harness(false);
  let u = h.resolver.subject("U");
  *h.store.offline.lock().unwrap() = true;

  let err = h.tracker.toggle(toggle(u, None)).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Upstream);
  assert_eq!(err.to_string(), "error finding open interval: store offline");
}

// ─── History ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn history_walkthrough() {
  let h = harness(true);
  let u = h.resolver.subject("U");
  let v = h.resolver.subject("V");
  let p = h.resolver.place("P");

  // U checks in at 10:00.
  h.tracker.toggle(toggle(u, Some(p))).await.unwrap();
  let reports = h.tracker.history(window(p, at(10, 0), at(10, 1))).await.unwrap();
  assert_eq!(reports.len(), 1);
  assert!(reports[0].anchor.tentative);
  assert_eq!(reports[0].anchor.effective_end, at(10, 5));
  assert!(reports[0].contacts.is_empty());

  // V checks in at 10:02; both see each other.
  h.clock.set(at(10, 2));
  h.tracker.toggle(toggle(v, Some(p))).await.unwrap();
  let reports = h.tracker.history(window(p, at(9, 0), at(11, 0))).await.unwrap();
  assert_eq!(reports.len(), 2);
  for report in &reports {
    assert_eq!(report.contacts.len(), 1);
    assert!(report.contacts[0].tentative);
    assert_ne!(
      report.contacts[0].interval.subject.subject_id,
      report.anchor.interval.subject.subject_id,
    );
  }

  // U checks out at 10:10; the contact persists.
  h.clock.set(at(10, 10));
  h.tracker.toggle(toggle(u, Some(p))).await.unwrap();
  let reports = h.tracker.history(window(p, at(9, 0), at(11, 0))).await.unwrap();
  let of_u = reports
    .iter()
    .find(|r| r.anchor.interval.subject.subject_id == u)
    .unwrap();
  assert!(!of_u.anchor.tentative);
  assert_eq!(of_u.anchor.interval.end, Some(at(10, 10)));
  assert_eq!(of_u.contacts.len(), 1);
  assert_eq!(of_u.contacts[0].effective_end, at(10, 7));

  let of_v = reports
    .iter()
    .find(|r| r.anchor.interval.subject.subject_id == v)
    .unwrap();
  assert_eq!(of_v.contacts.len(), 1);
  assert!(!of_v.contacts[0].tentative);
}

#[tokio::test]
async fn history_of_unknown_subject_is_empty() {
  let h = harness(true);
  let reports = h
    .tracker
    .history(HistoryRequest {
      subject_id: Some(Uuid::new_v4()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(reports.is_empty());
}

#[tokio::test]
async fn history_never_reports_self_overlap() {
  let h = harness(true);
  let u = h.resolver.subject("U");
  let p = h.resolver.place("P");
  let q = h.resolver.place("Q");

  // Same subject present at two places at once.
  h.tracker.toggle(toggle(u, Some(p))).await.unwrap();
  h.tracker.toggle(toggle(u, Some(q))).await.unwrap();

  let reports = h
    .tracker
    .history(HistoryRequest { subject_id: Some(u), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(reports.len(), 2);
  assert!(reports.iter().all(|r| r.contacts.is_empty()));
}

async fn contacts_across_two_places(place_scoping: bool) -> Vec<ContactReport> {
  let h = harness(place_scoping);
  let u = h.resolver.subject("U");
  let v = h.resolver.subject("V");
  let p = h.resolver.place("P");
  let q = h.resolver.place("Q");
  h.tracker.toggle(toggle(u, Some(p))).await.unwrap();
  h.tracker.toggle(toggle(v, Some(q))).await.unwrap();
  h.tracker
    .history(HistoryRequest { subject_id: Some(u), ..Default::default() })
    .await
    .unwrap()
}

#[tokio::test]
async fn place_scoping_limits_contacts_to_same_place() {
  let scoped = contacts_across_two_places(true).await;
  assert_eq!(scoped.len(), 1);
  assert!(scoped[0].contacts.is_empty());

  let unscoped = contacts_across_two_places(false).await;
  assert_eq!(unscoped.len(), 1);
  assert_eq!(unscoped[0].contacts.len(), 1);
  assert_eq!(unscoped[0].contacts[0].interval.subject.name, "V");
}

#[tokio::test]
async fn history_window_excludes_distant_intervals() {
  let h = harness(true);
  let u = h.resolver.subject("U");
  let p = h.resolver.place("P");

  h.clock.set(at(8, 0));
  h.tracker.toggle(toggle(u, Some(p))).await.unwrap();
  h.clock.set(at(8, 30));
  h.tracker.toggle(toggle(u, Some(p))).await.unwrap();

  let reports = h.tracker.history(window(p, at(9, 0), at(11, 0))).await.unwrap();
  assert!(reports.is_empty());

  let reports = h.tracker.history(window(p, at(8, 30), at(11, 0))).await.unwrap();
  assert_eq!(reports.len(), 1);
}

#[tokio::test]
async fn snapshot_names_survive_renames() {
  let h = harness(false);
  let u = h.resolver.subject("Old Name");
  h.tracker.toggle(toggle(u, None)).await.unwrap();
  h.resolver.rename(u, "New Name");

  let reports = h
    .tracker
    .history(HistoryRequest { subject_id: Some(u), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(reports[0].anchor.interval.subject.name, "Old Name");
}

#[tokio::test]
async fn history_store_failure_fails_whole_report() {
  let h = harness(false);
  let u = h.resolver.subject("U");
  h.tracker.toggle(toggle(u, None)).await.unwrap();
  *h.store.offline.lock().unwrap() = true;

  let err = h
    .tracker
    .history(HistoryRequest { subject_id: Some(u), ..Default::default() })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Upstream);
}

#[tokio::test]
async fn delete_removes_interval() {
  let h = harness(false);
  let u = h.resolver.subject("U");
  let opened = h.tracker.toggle(toggle(u, None)).await.unwrap().into_interval();

  h.tracker.delete_interval(opened.interval_id).await.unwrap();
  let err = h.tracker.get_interval(opened.interval_id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  let err = h.tracker.delete_interval(opened.interval_id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn contact_report_serialises_flat() {
  let h = harness(false);
  let u = h.resolver.subject("U");
  h.tracker.toggle(toggle(u, None)).await.unwrap();
  let reports = h
    .tracker
    .history(HistoryRequest { subject_id: Some(u), ..Default::default() })
    .await
    .unwrap();

  let json = serde_json::to_value(&reports[0]).unwrap();
  assert_eq!(json["anchor"]["subject"]["name"], "U");
  assert_eq!(json["anchor"]["tentative"], true);
  assert!(json["anchor"]["end"].is_null());
  assert!(json["contacts"].as_array().unwrap().is_empty());
}
