//! Reference resolvers selectable from configuration.
//!
//! `local` reads the directory tables of the SQLite store. `remote` asks the
//! places and people services over HTTP, as `GET {places_url}/places/{id}`
//! and `GET {people_url}/people/{id}`.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracer_core::{
  interval::{PlaceRef, SubjectRef},
  store::ReferenceResolver,
};
use tracer_store_sqlite::SqliteStore;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ResolveError {
  #[error("local directory error: {0}")]
  Local(#[from] tracer_store_sqlite::Error),

  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("GET {url} returned {status}")]
  Status { url: String, status: StatusCode },
}

// ─── HTTP ─────────────────────────────────────────────────────────────────────

/// The body fields read from a remote place or person record.
#[derive(Debug, Deserialize)]
struct Named {
  name: String,
}

/// Resolves references against remote directory services.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct HttpResolver {
  client:     Client,
  places_url: String,
  people_url: String,
}

impl HttpResolver {
  pub fn new(
    places_url: &str,
    people_url: &str,
    timeout: Duration,
  ) -> Result<Self, ResolveError> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      places_url: places_url.trim_end_matches('/').to_string(),
      people_url: people_url.trim_end_matches('/').to_string(),
    })
  }

  /// `GET url`, mapping 404 to `None`.
  async fn fetch_name(&self, url: String) -> Result<Option<String>, ResolveError> {
    let resp = self.client.get(&url).send().await?;
    match resp.status() {
      StatusCode::NOT_FOUND => Ok(None),
      status if status.is_success() => Ok(Some(resp.json::<Named>().await?.name)),
      status => Err(ResolveError::Status { url, status }),
    }
  }
}

impl ReferenceResolver for HttpResolver {
  type Error = ResolveError;

  async fn resolve_place(&self, id: Uuid) -> Result<Option<PlaceRef>, ResolveError> {
    let url = format!("{}/places/{id}", self.places_url);
    let name = self.fetch_name(url).await?;
    Ok(name.map(|name| PlaceRef { place_id: id, name }))
  }

  async fn resolve_subject(
    &self,
    id: Uuid,
  ) -> Result<Option<SubjectRef>, ResolveError> {
    let url = format!("{}/people/{id}", self.people_url);
    let name = self.fetch_name(url).await?;
    Ok(name.map(|name| SubjectRef { subject_id: id, name }))
  }
}

// ─── Selection ────────────────────────────────────────────────────────────────

/// The resolver chosen by `resolver = "local" | "remote"`.
#[derive(Clone)]
pub enum Resolver {
  Local(SqliteStore),
  Remote(HttpResolver),
}

impl ReferenceResolver for Resolver {
  type Error = ResolveError;

  async fn resolve_place(&self, id: Uuid) -> Result<Option<PlaceRef>, ResolveError> {
    match self {
      Self::Local(store) => Ok(store.resolve_place(id).await?),
      Self::Remote(http) => http.resolve_place(id).await,
    }
  }

  async fn resolve_subject(
    &self,
    id: Uuid,
  ) -> Result<Option<SubjectRef>, ResolveError> {
    match self {
      Self::Local(store) => Ok(store.resolve_subject(id).await?),
      Self::Remote(http) => http.resolve_subject(id).await,
    }
  }
}
