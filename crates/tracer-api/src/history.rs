//! Handlers for contact history.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/history` | `subject_id` and/or `place_id`; optional `start`, `end` |
//! | `GET`  | `/places/{id}/history` | Optional `start`, `end` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracer_core::{
  clock::Clock,
  interval::ContactReport,
  store::{IntervalStore, ReferenceResolver},
  tracker::{HistoryRequest, Tracker},
};
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /history?subject_id=..&place_id=..&start=..&end=..`
pub async fn handler<S, R, C>(
  State(tracker): State<Arc<Tracker<S, R, C>>>,
  Query(req): Query<HistoryRequest>,
) -> Result<Json<Vec<ContactReport>>, ApiError>
where
  S: IntervalStore,
  R: ReferenceResolver,
  C: Clock,
{
  Ok(Json(tracker.history(req).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct WindowParams {
  pub start: Option<DateTime<Utc>>,
  pub end:   Option<DateTime<Utc>>,
}

/// `GET /places/{id}/history[?start=..][&end=..]`
pub async fn for_place<S, R, C>(
  State(tracker): State<Arc<Tracker<S, R, C>>>,
  Path(place_id): Path<Uuid>,
  Query(window): Query<WindowParams>,
) -> Result<Json<Vec<ContactReport>>, ApiError>
where
  S: IntervalStore,
  R: ReferenceResolver,
  C: Clock,
{
  let req = HistoryRequest {
    place_id: Some(place_id),
    start: window.start,
    end: window.end,
    ..Default::default()
  };
  Ok(Json(tracker.history(req).await?))
}
