//! Handlers for `/check-ins` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/check-ins` | Toggle; 201 on check-in, 200 on check-out |
//! | `POST`   | `/check-ins/open` | Explicit check-in; 409 if already open |
//! | `POST`   | `/check-ins/close` | Explicit check-out by `interval_id` or scope |
//! | `GET`    | `/check-ins` | Optional `subject_id`, `place_id`, `start`, `end`, `open_only` |
//! | `GET`    | `/check-ins/{id}` | Single interval |
//! | `DELETE` | `/check-ins/{id}` | 204 on success |
//!
//! Writes honour a [`Deadline`] request extension when one is present: a
//! write that would land after it is refused with 408.

use std::sync::Arc;

use axum::{
  Extension, Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use tracer_core::{
  clock::Clock,
  deadline::Deadline,
  interval::Interval,
  store::{IntervalStore, ReferenceResolver},
  tracker::{
    CheckInRequest, CheckOutRequest, IntervalFilter, Toggle, ToggleRequest,
    Tracker,
  },
};
use uuid::Uuid;

use crate::error::ApiError;

fn deadline_of(ext: Option<Extension<Deadline>>) -> Deadline {
  ext.map(|Extension(d)| d).unwrap_or_default()
}

// ─── Toggle ───────────────────────────────────────────────────────────────────

/// `POST /check-ins`, body: `{"subject_id": ..., "place_id": ...}`
pub async fn toggle<S, R, C>(
  State(tracker): State<Arc<Tracker<S, R, C>>>,
  deadline: Option<Extension<Deadline>>,
  Json(body): Json<ToggleRequest>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IntervalStore,
  R: ReferenceResolver,
  C: Clock,
{
  let toggle = tracker.toggle_until(body, deadline_of(deadline)).await?;
  let status = match toggle {
    Toggle::CheckedIn(_) => StatusCode::CREATED,
    Toggle::CheckedOut(_) => StatusCode::OK,
  };
  Ok((status, Json(toggle)))
}

// ─── Open / close ─────────────────────────────────────────────────────────────

/// `POST /check-ins/open`
pub async fn open<S, R, C>(
  State(tracker): State<Arc<Tracker<S, R, C>>>,
  deadline: Option<Extension<Deadline>>,
  Json(body): Json<CheckInRequest>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IntervalStore,
  R: ReferenceResolver,
  C: Clock,
{
  let interval = tracker.check_in_until(body, deadline_of(deadline)).await?;
  Ok((StatusCode::CREATED, Json(interval)))
}

/// `POST /check-ins/close`, body: `{"interval_id": ...}` or
/// `{"subject_id": ..., "place_id": ...}`
pub async fn close<S, R, C>(
  State(tracker): State<Arc<Tracker<S, R, C>>>,
  deadline: Option<Extension<Deadline>>,
  Json(body): Json<CheckOutRequest>,
) -> Result<Json<Interval>, ApiError>
where
  S: IntervalStore,
  R: ReferenceResolver,
  C: Clock,
{
  let interval = tracker.check_out_until(body, deadline_of(deadline)).await?;
  Ok(Json(interval))
}

// ─── Reads ────────────────────────────────────────────────────────────────────

/// `GET /check-ins[?subject_id=..][&place_id=..][&start=..][&end=..][&open_only=true]`
pub async fn list<S, R, C>(
  State(tracker): State<Arc<Tracker<S, R, C>>>,
  Query(filter): Query<IntervalFilter>,
) -> Result<Json<Vec<Interval>>, ApiError>
where
  S: IntervalStore,
  R: ReferenceResolver,
  C: Clock,
{
  Ok(Json(tracker.list_intervals(filter).await?))
}

/// `GET /check-ins/{id}`
pub async fn get_one<S, R, C>(
  State(tracker): State<Arc<Tracker<S, R, C>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Interval>, ApiError>
where
  S: IntervalStore,
  R: ReferenceResolver,
  C: Clock,
{
  Ok(Json(tracker.get_interval(id).await?))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /check-ins/{id}`
pub async fn delete_one<S, R, C>(
  State(tracker): State<Arc<Tracker<S, R, C>>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: IntervalStore,
  R: ReferenceResolver,
  C: Clock,
{
  tracker.delete_interval(id).await?;
  Ok(StatusCode::NO_CONTENT)
}
