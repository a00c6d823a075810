//! Handlers for `/places` and `/people` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/places` | All places, by name |
//! | `POST`   | `/places` | Body: `{"name":"..."}`; returns 201 |
//! | `GET`    | `/places/{id}` | 404 if not found |
//! | `PATCH`  | `/places/{id}` | Body: `{"name":"..."}`; renames |
//! | `DELETE` | `/places/{id}` | 204 on success |
//! | `GET`    | `/people` | All people, by name |
//! | `POST`   | `/people` | Body: `{"name":"...","email":"..."}`; 409 on a taken email |
//! | `GET`    | `/people/{id}` | 404 if not found |
//! | `PATCH`  | `/people/{id}` | Body: any of `name`, `email`; 409 on a taken email |
//! | `DELETE` | `/people/{id}` | 204 on success |
//!
//! Edits never touch recorded check-ins, which keep the names they were
//! taken with.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tracer_core::{
  clock::Clock,
  directory::{Directory, NewPerson, Person, PersonUpdate, Place},
  store::{IntervalStore, ReferenceResolver},
  tracker::Tracker,
  validate,
};
use uuid::Uuid;

use crate::error::ApiError;

// ─── Places ───────────────────────────────────────────────────────────────────

/// `GET /places`
pub async fn list_places<S, R, C>(
  State(tracker): State<Arc<Tracker<S, R, C>>>,
) -> Result<Json<Vec<Place>>, ApiError>
where
  S: IntervalStore + Directory,
  R: ReferenceResolver,
  C: Clock,
{
  let places = tracker.store().list_places().await.map_err(ApiError::store)?;
  Ok(Json(places))
}

#[derive(Debug, Deserialize)]
pub struct NewPlaceBody {
  pub name: String,
}

/// `POST /places`, body: `{"name":"Corner Cafe"}`
pub async fn create_place<S, R, C>(
  State(tracker): State<Arc<Tracker<S, R, C>>>,
  Json(body): Json<NewPlaceBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IntervalStore + Directory,
  R: ReferenceResolver,
  C: Clock,
{
  validate::place_name(&body.name)?;
  let place = tracker
    .store()
    .add_place(body.name)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(place)))
}

/// `GET /places/{id}`
pub async fn get_place<S, R, C>(
  State(tracker): State<Arc<Tracker<S, R, C>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Place>, ApiError>
where
  S: IntervalStore + Directory,
  R: ReferenceResolver,
  C: Clock,
{
  let place = tracker
    .store()
    .get_place(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("place not found: {id}")))?;
  Ok(Json(place))
}

/// `PATCH /places/{id}`, body: `{"name":"Old Mill"}`
pub async fn update_place<S, R, C>(
  State(tracker): State<Arc<Tracker<S, R, C>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NewPlaceBody>,
) -> Result<Json<Place>, ApiError>
where
  S: IntervalStore + Directory,
  R: ReferenceResolver,
  C: Clock,
{
  validate::place_name(&body.name)?;
  let place = tracker
    .store()
    .update_place(id, body.name)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("place not found: {id}")))?;
  Ok(Json(place))
}

/// `DELETE /places/{id}`
pub async fn delete_place<S, R, C>(
  State(tracker): State<Arc<Tracker<S, R, C>>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: IntervalStore + Directory,
  R: ReferenceResolver,
  C: Clock,
{
  let deleted = tracker
    .store()
    .delete_place(id)
    .await
    .map_err(ApiError::store)?;
  if !deleted {
    return Err(ApiError::NotFound(format!("place not found: {id}")));
  }
  Ok(StatusCode::NO_CONTENT)
}

// ─── People ───────────────────────────────────────────────────────────────────

/// `GET /people`
pub async fn list_people<S, R, C>(
  State(tracker): State<Arc<Tracker<S, R, C>>>,
) -> Result<Json<Vec<Person>>, ApiError>
where
  S: IntervalStore + Directory,
  R: ReferenceResolver,
  C: Clock,
{
  let people = tracker.store().list_people().await.map_err(ApiError::store)?;
  Ok(Json(people))
}

/// `POST /people`, body: [`NewPerson`]
pub async fn create_person<S, R, C>(
  State(tracker): State<Arc<Tracker<S, R, C>>>,
  Json(body): Json<NewPerson>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IntervalStore + Directory,
  R: ReferenceResolver,
  C: Clock,
{
  validate::new_person(&body)?;
  let person = tracker
    .store()
    .add_person(body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(person)))
}

/// `GET /people/{id}`
pub async fn get_person<S, R, C>(
  State(tracker): State<Arc<Tracker<S, R, C>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Person>, ApiError>
where
  S: IntervalStore + Directory,
  R: ReferenceResolver,
  C: Clock,
{
  let person = tracker
    .store()
    .get_person(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject not found: {id}")))?;
  Ok(Json(person))
}

/// `PATCH /people/{id}`, body: [`PersonUpdate`]
pub async fn update_person<S, R, C>(
  State(tracker): State<Arc<Tracker<S, R, C>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<PersonUpdate>,
) -> Result<Json<Person>, ApiError>
where
  S: IntervalStore + Directory,
  R: ReferenceResolver,
  C: Clock,
{
  validate::person_update(&body)?;
  let person = tracker
    .store()
    .update_person(id, body)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject not found: {id}")))?;
  Ok(Json(person))
}

/// `DELETE /people/{id}`
pub async fn delete_person<S, R, C>(
  State(tracker): State<Arc<Tracker<S, R, C>>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: IntervalStore + Directory,
  R: ReferenceResolver,
  C: Clock,
{
  let deleted = tracker
    .store()
    .delete_person(id)
    .await
    .map_err(ApiError::store)?;
  if !deleted {
    return Err(ApiError::NotFound(format!("subject not found: {id}")));
  }
  Ok(StatusCode::NO_CONTENT)
}
