//! Axum router assembly.

use std::path::Path;

use axum::Router;
use axum::routing::get;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use icemelt_app::ports::{ControlOutput, EventPublisher};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Merges API routes under `/api` and the status page at `/`. When
/// `assets_dir` is given, serves it under `/assets` and its `htmx.js` at
/// `/htmx.js`. Includes a [`TraceLayer`] that
/// logs each HTTP request/response at the `DEBUG` level.
pub fn build<O, P>(state: AppState<O, P>, assets_dir: Option<&Path>) -> Router
where
    O: ControlOutput + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let mut router = Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .merge(crate::dashboard::routes());
    if let Some(dir) = assets_dir {
        router = router
            .route_service("/htmx.js", ServeFile::new(dir.join("htmx.js")))
            .nest_service("/assets", ServeDir::new(dir));
    }
    router.layer(TraceLayer::new_for_http()).with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
