//! Server-side rendered status page.
//!
//! `/` returns the full document and `/content-only` the fragment inside
//! it. Action buttons carry htmx attributes that fetch
//! `/transition/{source}/{target}` and swap the returned fragment into the
//! page body; without htmx the page still renders and refreshes itself.

pub mod status;

use axum::Router;
use axum::routing::get;

use icemelt_app::ports::{ControlOutput, EventPublisher};

use crate::state::AppState;

/// Build the dashboard sub-router.
pub fn routes<O, P>() -> Router<AppState<O, P>>
where
    O: ControlOutput + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(status::index::<O, P>))
        .route("/content-only", get(status::content::<O, P>))
        .route(
            "/transition/{source}/{target}",
            get(status::transition::<O, P>),
        )
}
