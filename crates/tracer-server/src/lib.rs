//! Tracer HTTP server: configuration, resolver selection, and the layered
//! application router.

pub mod resolver;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::{Context as _, bail};
use axum::{
  Router,
  extract::{Request, State},
  middleware::{self, Next},
  response::Response,
};
use serde::Deserialize;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracer_core::{
  clock::Clock,
  deadline::Deadline,
  directory::Directory,
  store::{IntervalStore, ReferenceResolver},
  tracker::Tracker,
};
use tracer_store_sqlite::SqliteStore;

use resolver::{HttpResolver, Resolver};

// ─── Configuration ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
  /// Resolve against the store's own places and people tables.
  #[default]
  Local,
  /// Resolve against remote places and people services.
  Remote,
}

/// Runtime server configuration, deserialised from `config.toml` and
/// `TRACER_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                 String,
  #[serde(default = "default_port")]
  pub port:                 u16,
  #[serde(default = "default_store_path")]
  pub store_path:           PathBuf,
  /// Track presence per (subject, place) instead of per subject.
  #[serde(default = "default_true")]
  pub place_scoping:        bool,
  /// Deadline for each request, including reference resolution.
  #[serde(default = "default_timeout_secs")]
  pub request_timeout_secs: u64,
  #[serde(default)]
  pub resolver:             ResolverKind,
  pub places_url:           Option<String>,
  pub people_url:           Option<String>,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/tracer/tracer.db") }

fn default_true() -> bool { true }

fn default_timeout_secs() -> u64 { 5 }

impl ServerConfig {
  /// Read `path` (if it exists) layered under `TRACER_*` environment
  /// variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("TRACER").try_parsing(true))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs)
  }

  /// Build the configured reference resolver over `store`.
  pub fn resolver(&self, store: &SqliteStore) -> anyhow::Result<Resolver> {
    match self.resolver {
      ResolverKind::Local => Ok(Resolver::Local(store.clone())),
      ResolverKind::Remote => {
        let (Some(places_url), Some(people_url)) =
          (self.places_url.as_deref(), self.people_url.as_deref())
        else {
          bail!("resolver = \"remote\" requires places_url and people_url");
        };
        let http = HttpResolver::new(places_url, people_url, self.request_timeout())
          .context("failed to build HTTP client")?;
        Ok(Resolver::Remote(http))
      }
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API router with request tracing and a per-request deadline.
pub fn app<S, R, C>(tracker: Arc<Tracker<S, R, C>>, timeout: Duration) -> Router
where
  S: IntervalStore + Directory + 'static,
  R: ReferenceResolver + 'static,
  C: Clock + 'static,
{
  layered(tracer_api::api_router(tracker), timeout)
}

/// Wrap `router` in tracing and a `timeout` per request.
///
/// Each request carries a [`Deadline`] extension stamped before the timeout
/// starts, so it never falls later than the 408. Handlers pass it down to
/// the store, which refuses writes that were queued but only reached the
/// database after the caller was answered.
pub fn layered(router: Router, timeout: Duration) -> Router {
  router
    .layer(TimeoutLayer::new(timeout))
    .layer(middleware::from_fn_with_state(timeout, stamp_deadline))
    .layer(TraceLayer::new_for_http())
}

async fn stamp_deadline(
  State(timeout): State<Duration>,
  mut req: Request,
  next: Next,
) -> Response {
  req.extensions_mut().insert(Deadline::after(timeout));
  next.run(req).await
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
