//! JSON handlers for machine status and operator requests.

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;

use icemelt_app::ports::{ControlOutput, EventPublisher};
use icemelt_domain::status::StatusSnapshot;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for a guarded transition.
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    /// State the caller believes is current.
    pub source: String,
    pub target: String,
}

/// `GET /api/status`
pub async fn status<O, P>(State(state): State<AppState<O, P>>) -> Json<StatusSnapshot>
where
    O: ControlOutput + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    Json(state.machine.status())
}

/// `POST /api/transition` — apply the transition if `source` is still
/// current, and return the resulting status either way.
pub async fn transition<O, P>(
    State(state): State<AppState<O, P>>,
    Json(request): Json<TransitionRequest>,
) -> Json<StatusSnapshot>
where
    O: ControlOutput + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    Json(
        state
            .machine
            .request_transition(&request.source, &request.target),
    )
}

/// `POST /api/states/{state}/actions/{index}`
pub async fn invoke_action<O, P>(
    State(state): State<AppState<O, P>>,
    Path((believed, index)): Path<(String, usize)>,
) -> Result<Json<StatusSnapshot>, ApiError>
where
    O: ControlOutput + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let definition = state
        .machine
        .config()
        .state(&believed)
        .ok_or_else(|| ApiError::UnknownState(believed.clone()))?;
    if index >= definition.actions.len() {
        return Err(ApiError::UnknownAction {
            state: believed,
            index,
        });
    }

    state.machine.invoke_action(&believed, index);
    Ok(Json(state.machine.status()))
}
