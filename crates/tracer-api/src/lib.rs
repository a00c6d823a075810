//! JSON REST API for Tracer.
//!
//! Exposes an axum [`Router`] over a [`Tracker`] whose store also serves the
//! place and people directory. Transport concerns (tracing, deadlines) are
//! layered on by the caller.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tracer_api::api_router(Arc::new(tracker)))
//! ```

pub mod checkins;
pub mod directory;
pub mod error;
pub mod history;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use tracer_core::{
  clock::Clock,
  directory::Directory,
  store::{IntervalStore, ReferenceResolver},
  tracker::Tracker,
};

pub use error::ApiError;

/// Build a fully-materialised API router for `tracker`.
pub fn api_router<S, R, C>(tracker: Arc<Tracker<S, R, C>>) -> Router<()>
where
  S: IntervalStore + Directory + 'static,
  R: ReferenceResolver + 'static,
  C: Clock + 'static,
{
  Router::new()
    // Presence
    .route(
      "/check-ins",
      get(checkins::list::<S, R, C>).post(checkins::toggle::<S, R, C>),
    )
    .route("/check-ins/open", post(checkins::open::<S, R, C>))
    .route("/check-ins/close", post(checkins::close::<S, R, C>))
    .route(
      "/check-ins/{id}",
      get(checkins::get_one::<S, R, C>).delete(checkins::delete_one::<S, R, C>),
    )
    // History
    .route("/history", get(history::handler::<S, R, C>))
    .route("/places/{id}/history", get(history::for_place::<S, R, C>))
    // Directory
    .route(
      "/places",
      get(directory::list_places::<S, R, C>)
        .post(directory::create_place::<S, R, C>),
    )
    .route(
      "/places/{id}",
      get(directory::get_place::<S, R, C>)
        .patch(directory::update_place::<S, R, C>)
        .delete(directory::delete_place::<S, R, C>),
    )
    .route(
      "/people",
      get(directory::list_people::<S, R, C>)
        .post(directory::create_person::<S, R, C>),
    )
    .route(
      "/people/{id}",
      get(directory::get_person::<S, R, C>)
        .patch(directory::update_person::<S, R, C>)
        .delete(directory::delete_person::<S, R, C>),
    )
    .with_state(tracker)
}
