//! Status page — current state, sensor and control tables, manual actions.

use askama::Template;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Response};

use icemelt_app::ports::{ControlOutput, EventPublisher};
use icemelt_domain::status::StatusSnapshot;

use crate::state::AppState;

/// Seconds between automatic refreshes of the full page.
const REFRESH_SECONDS: u32 = 5;

/// One sensor or control row.
pub struct Row {
    name: String,
    value: String,
    as_of: String,
}

/// A manual action button.
pub struct ActionLink {
    label: String,
    /// Percent-encoded `/transition/{source}/{target}` path.
    href: String,
}

/// Status fragment template, swapped into the page body by htmx.
#[derive(Template)]
#[template(path = "content.html")]
pub struct ContentTemplate {
    state: String,
    since: String,
    sensors: Vec<Row>,
    controls: Vec<Row>,
    actions: Vec<ActionLink>,
}

impl ContentTemplate {
    #[must_use]
    pub fn new(status: &StatusSnapshot) -> Self {
        let state = status.state.clone().unwrap_or_default();
        let since = status
            .since
            .map_or_else(|| "never".to_string(), |at| at.to_rfc3339());
        let sensors = status
            .sensors
            .iter()
            .map(|sensor| Row {
                name: sensor.name.clone(),
                value: sensor.rendered.clone(),
                as_of: sensor.as_of_text(),
            })
            .collect();
        let controls = status
            .controls
            .iter()
            .map(|control| Row {
                name: control.name.clone(),
                value: control.rendered.clone(),
                as_of: control.as_of_text(),
            })
            .collect();
        let actions = status
            .actions
            .iter()
            .map(|action| ActionLink {
                label: action.label.clone(),
                href: format!(
                    "/transition/{}/{}",
                    urlencoding::encode(&state),
                    urlencoding::encode(&action.target)
                ),
            })
            .collect();

        Self {
            state,
            since,
            sensors,
            controls,
            actions,
        }
    }
}

impl IntoResponse for ContentTemplate {
    fn into_response(self) -> Response {
        Html(self.to_string()).into_response()
    }
}

/// Full status page template.
#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate {
    refresh_seconds: u32,
    content: ContentTemplate,
}

impl PageTemplate {
    #[must_use]
    pub fn new(status: &StatusSnapshot) -> Self {
        Self {
            refresh_seconds: REFRESH_SECONDS,
            content: ContentTemplate::new(status),
        }
    }
}

impl IntoResponse for PageTemplate {
    fn into_response(self) -> Response {
        Html(self.to_string()).into_response()
    }
}

/// `GET /`
pub async fn index<O, P>(State(state): State<AppState<O, P>>) -> PageTemplate
where
    O: ControlOutput + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    PageTemplate::new(&state.machine.status())
}

/// `GET /content-only`
pub async fn content<O, P>(State(state): State<AppState<O, P>>) -> ContentTemplate
where
    O: ControlOutput + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    ContentTemplate::new(&state.machine.status())
}

/// `GET /transition/{source}/{target}` — guarded transition, then the
/// refreshed fragment.
pub async fn transition<O, P>(
    State(state): State<AppState<O, P>>,
    Path((source, target)): Path<(String, String)>,
) -> ContentTemplate
where
    O: ControlOutput + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    ContentTemplate::new(&state.machine.request_transition(&source, &target))
}
