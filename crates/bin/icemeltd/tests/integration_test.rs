//! End-to-end smoke tests for the full icemeltd stack.
//!
//! Each test builds a real machine from a melt-cycle configuration, wires it
//! to the real event bus and axum router, and exercises the HTTP layer via
//! `tower::ServiceExt::oneshot`, without binding a TCP port. Sensor readings go
//! through the same line feed the daemon reads from stdin.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use icemelt_adapter_http_axum::router;
use icemelt_adapter_http_axum::state::AppState;
use icemelt_app::control_output::ChannelControlOutput;
use icemelt_app::event_bus::InProcessEventBus;
use icemelt_app::sensor_feed::run_sensor_feed;
use icemelt_app::state_machine::StateMachine;
use icemelt_domain::config::MachineConfig;
use icemelt_domain::event::ControlCommand;
use icemelt_domain::scale::{ControlSpec, SensorSpec};
use icemelt_domain::state::StateDefinition;
use icemelt_domain::trigger::Trigger;
use tokio::sync::mpsc::UnboundedReceiver;
use tower::ServiceExt;

type Machine = StateMachine<ChannelControlOutput, Arc<InProcessEventBus>>;

struct Stack {
    machine: Machine,
    app: axum::Router,
    commands: UnboundedReceiver<ControlCommand>,
}

fn melt_config() -> MachineConfig {
    MachineConfig::builder()
        .sensor(SensorSpec::new("ice temp", (0, 1023), (-20.0, 20.0), Some("{:.1f}°C")).unwrap())
        .control(ControlSpec::new("heater", (0, 255), (0.0, 100.0), None).unwrap())
        .state(
            StateDefinition::new("idle")
                .control("heater", 0.0)
                .trigger(Trigger::parse("sensor ice temp below -5", "melting").unwrap())
                .action("Melt now", "melting"),
        )
        .state(
            StateDefinition::new("melting")
                .control("heater", 80.0)
                .trigger(Trigger::parse("sensor ice temp above 2", "idle").unwrap())
                .action("Stop", "idle"),
        )
        .initial_state("idle")
        .build()
        .unwrap()
}

fn stack() -> Stack {
    let bus = Arc::new(InProcessEventBus::new(256));
    let (output, commands) = ChannelControlOutput::new();
    let machine = StateMachine::new(melt_config(), output, Arc::clone(&bus)).unwrap();
    let app = router::build(AppState::new(machine.clone(), bus), None);
    Stack {
        machine,
        app,
        commands,
    }
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn status_json(app: axum::Router) -> serde_json::Value {
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    serde_json::from_str(&body_text(resp).await).unwrap()
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let resp = stack()
        .app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Sensor feed → triggers → status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_start_idle_with_heater_off() {
    let mut stack = stack();

    let command = stack.commands.recv().await.unwrap();
    assert_eq!(command.control, "heater");
    assert_eq!(command.raw, 0);

    let json = status_json(stack.app).await;
    assert_eq!(json["state"], "idle");
    assert_eq!(json["sensors"][0]["rendered"], "?");
    assert!(json["sensors"][0]["as_of"].is_null());
}

#[tokio::test]
async fn should_follow_melt_cycle_from_sensor_feed() {
    let mut stack = stack();
    stack.commands.recv().await.unwrap();

    // 256 → -10.0°C, below the melting threshold.
    let feed: &[u8] = b"ice temp 256\n";
    run_sensor_feed(feed, stack.machine.clone()).await.unwrap();

    assert_eq!(stack.machine.current_state().as_deref(), Some("melting"));
    assert_eq!(stack.commands.recv().await.unwrap().raw, 204);

    // 767 → ~10.0°C, above the stop threshold.
    let feed: &[u8] = b"ice temp 767\n";
    run_sensor_feed(feed, stack.machine.clone()).await.unwrap();

    let json = status_json(stack.app).await;
    assert_eq!(json["state"], "idle");
    assert_eq!(json["sensors"][0]["rendered"], "10.0°C");
    assert_eq!(json["actions"][0]["label"], "Melt now");
}

#[tokio::test]
async fn should_render_out_of_range_reading_with_marker() {
    let stack = stack();
    let feed: &[u8] = b"ice temp 2000\n";
    run_sensor_feed(feed, stack.machine.clone()).await.unwrap();

    let resp = stack
        .app
        .oneshot(
            Request::builder()
                .uri("/content-only")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("<td>ice temp</td><td>&gt;20.0°C</td>"));
}

// ---------------------------------------------------------------------------
// Operator requests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_apply_action_from_dashboard_link() {
    let stack = stack();

    let resp = stack
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/transition/idle/melting")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "text/html; charset=utf-8"
    );
    let body = body_text(resp).await;
    assert!(body.contains("State: melting"));

    // A second click on the now-stale link changes nothing.
    let resp = stack
        .app
        .oneshot(
            Request::builder()
                .uri("/transition/idle/melting")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_text(resp).await;
    assert!(body.contains("State: melting"));
    assert!(body.contains("/transition/melting/idle"));
}

#[tokio::test]
async fn should_ignore_stale_api_transition() {
    let stack = stack();
    stack.machine.transition("idle", "melting");

    let resp = stack
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/transition")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"source":"idle","target":"idle"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(json["state"], "melting");
}
