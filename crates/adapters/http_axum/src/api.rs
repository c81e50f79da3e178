//! JSON API and event stream handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod machine;
pub mod sse;

use axum::Router;
use axum::routing::{get, post};

use icemelt_app::ports::{ControlOutput, EventPublisher};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<O, P>() -> Router<AppState<O, P>>
where
    O: ControlOutput + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    Router::new()
        .route("/status", get(machine::status::<O, P>))
        .route("/transition", post(machine::transition::<O, P>))
        .route(
            "/states/{state}/actions/{index}",
            post(machine::invoke_action::<O, P>),
        )
        .route("/events/stream", get(sse::stream::<O, P>))
}
