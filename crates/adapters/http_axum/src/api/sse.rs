//! Server-Sent Events (SSE) stream of machine events.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use icemelt_app::ports::{ControlOutput, EventPublisher};

use crate::state::AppState;

/// `GET /api/events/stream` — SSE stream of machine events.
///
/// Each event is sent as a JSON `data:` frame, with the event type as the
/// SSE event name. The stream continues until the client disconnects.
pub async fn stream<O, P>(
    State(state): State<AppState<O, P>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>>
where
    O: ControlOutput + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let receiver = state.event_bus.subscribe();
    let events = BroadcastStream::new(receiver).filter_map(|result| match result {
        Ok(event) => match serde_json::to_value(&event) {
            Ok(json) => {
                let name = json["type"].as_str().unwrap_or("event").to_string();
                Some(Ok(Event::default().event(name).data(json.to_string())))
            }
            Err(err) => {
                tracing::warn!(%err, "failed to serialize machine event for SSE stream");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "SSE subscriber lagged, some events were dropped");
            None
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
