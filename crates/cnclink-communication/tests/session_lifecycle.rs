//! Tests for session dispatch over a shared transport

use cnclink_communication::{
    CommandOutcome, ControllerRegistry, LoopbackTransport, Session, TelemetrySink, Transport,
};
use cnclink_core::{DataSource, EventChannel, WorkflowState};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn connected_registry() -> (Arc<LoopbackTransport>, ControllerRegistry) {
    let transport = Arc::new(LoopbackTransport::new());
    let registry = ControllerRegistry::new(transport.clone());
    (transport, registry)
}

fn connect(session: &Arc<Session>) {
    session
        .connect(|| "token".to_string(), || {})
        .expect("loopback connect");
}

fn open(transport: &LoopbackTransport, port: &str) {
    transport.inject(
        "connection:open",
        json!({"port": port, "dataSource": "text-protocol", "type": "Marlin"}),
    );
}

fn close(transport: &LoopbackTransport, port: &str) {
    transport.inject(
        "connection:close",
        json!({"port": port, "dataSource": "text-protocol"}),
    );
}

#[test]
fn test_connect_installs_one_handler_per_channel() {
    let (transport, registry) = connected_registry();
    let session = registry.get(DataSource::TEXT_PROTOCOL);

    let ready = Arc::new(AtomicUsize::new(0));
    let r = ready.clone();
    session
        .connect(|| "token".to_string(), move || {
            r.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    connect(&session);

    assert_eq!(ready.load(Ordering::SeqCst), 1);
    assert!(session.is_connected());
    assert!(session.is_listening());
    assert_eq!(transport.total_handlers(), EventChannel::ALL.len());
    assert_eq!(transport.handler_count("workflow:state"), 1);

    session.disconnect();
    assert!(!session.is_listening());
    assert_eq!(transport.total_handlers(), 0);
}

#[test]
fn test_rejected_token_installs_nothing() {
    let transport = Arc::new(LoopbackTransport::with_token("right"));
    let registry = ControllerRegistry::new(transport.clone());
    let session = registry.get(DataSource::TEXT_PROTOCOL);

    let result = session.connect(|| "wrong".to_string(), || panic!("not ready"));
    assert!(result.is_err());
    assert_eq!(transport.total_handlers(), 0);
}

#[test]
fn test_failover_to_remaining_port() {
    let (transport, registry) = connected_registry();
    let session = registry.get(DataSource::TEXT_PROTOCOL);
    connect(&session);

    open(&transport, "P1");
    open(&transport, "P2");
    close(&transport, "P1");

    assert_eq!(session.ports(), vec!["P2".to_string()]);
    assert_eq!(session.port(), "P2");
    assert_eq!(session.workspace_port(), "P2");
}

#[test]
fn test_closing_last_port_resets_session() {
    let (transport, registry) = connected_registry();
    let session = registry.get(DataSource::TEXT_PROTOCOL);
    connect(&session);

    open(&transport, "P1");
    transport.inject(
        "machine:state",
        json!({"dataSource": "text-protocol", "type": "Marlin", "state": {"temp": 200}}),
    );
    transport.inject(
        "machine:settings",
        json!({"dataSource": "text-protocol", "type": "Marlin", "settings": {"size": 320}}),
    );
    transport.inject(
        "workflow:state",
        json!({"dataSource": "text-protocol", "workflowState": "running"}),
    );
    assert_eq!(session.workflow_state(), WorkflowState::Running);
    assert_eq!(session.machine_type(), "Marlin");

    close(&transport, "P1");

    let snapshot = session.snapshot();
    assert_eq!(snapshot.port, "");
    assert_eq!(snapshot.workspace_port, "");
    assert_eq!(snapshot.machine_type, "");
    assert!(snapshot.state.is_empty());
    assert!(snapshot.settings.is_empty());
    assert_eq!(snapshot.workflow_state, WorkflowState::Idle);
}

#[test]
fn test_serial_port_aliases_apply_side_effects() {
    let (transport, registry) = connected_registry();
    let session = registry.get(DataSource::TEXT_PROTOCOL);
    connect(&session);

    transport.inject("serialport:open", json!({"port": "/dev/ttyUSB0"}));
    assert_eq!(session.port(), "/dev/ttyUSB0");
    transport.inject("serialport:close", json!({"port": "/dev/ttyUSB0"}));
    assert_eq!(session.port(), "");
}

#[test]
fn test_events_for_other_data_sources_are_dropped() {
    let (transport, registry) = connected_registry();
    let text = registry.get(DataSource::TEXT_PROTOCOL);
    let screen = registry.get(DataSource::SCREEN_PROTOCOL);
    connect(&text);
    connect(&screen);

    let text_seen = Arc::new(AtomicUsize::new(0));
    let t = text_seen.clone();
    text.on(EventChannel::ConnectionOpen, move |_| {
        t.fetch_add(1, Ordering::SeqCst);
    });

    transport.inject(
        "connection:open",
        json!({"port": "S1", "dataSource": "screen-protocol"}),
    );

    assert_eq!(screen.port(), "S1");
    assert_eq!(text.port(), "");
    assert_eq!(text_seen.load(Ordering::SeqCst), 0);

    // Events without a dataSource reach every session
    transport.inject("connect", json!({}));
    transport.inject("connection:open", json!({"port": "T1"}));
    assert_eq!(text.port(), "T1");
    assert_eq!(text_seen.load(Ordering::SeqCst), 1);
}

#[test]
fn test_side_effects_run_before_fan_out() {
    let (transport, registry) = connected_registry();
    let session = registry.get(DataSource::TEXT_PROTOCOL);
    connect(&session);

    let observed = Arc::new(Mutex::new(None));
    let weak = Arc::downgrade(&session);
    let o = observed.clone();
    session.on(EventChannel::WorkflowState, move |payload| {
        let state = weak.upgrade().map(|s| s.workflow_state());
        *o.lock() = Some((state, payload.clone()));
    });

    transport.inject(
        "workflow:state",
        json!({"dataSource": "text-protocol", "workflowState": "paused"}),
    );

    let (state, payload) = observed.lock().clone().expect("subscriber ran");
    assert_eq!(state, Some(WorkflowState::Paused));
    assert_eq!(payload["workflowState"], "paused");
}

#[test]
fn test_off_keeps_other_subscribers() {
    let (transport, registry) = connected_registry();
    let session = registry.get(DataSource::TEXT_PROTOCOL);
    connect(&session);

    let log = Arc::new(Mutex::new(Vec::new()));
    let (a, b) = (log.clone(), log.clone());
    let first = session.on(EventChannel::SenderStatus, move |_| a.lock().push("first"));
    session.on(EventChannel::SenderStatus, move |_| b.lock().push("second"));

    assert!(session.off(EventChannel::SenderStatus, first));
    transport.inject("sender:status", json!({"sent": 3}));

    assert_eq!(*log.lock(), vec!["second"]);
}

#[test]
fn test_unknown_channel_names_are_non_fatal() {
    let (_transport, registry) = connected_registry();
    let session = registry.get(DataSource::TEXT_PROTOCOL);

    assert!(session.on_named("gcode:bogus", |_| {}).is_err());
    assert!(session.dispatch_raw("gcode:bogus", &json!({})).is_err());
    assert!(session.dispatch_raw("message", &json!("hello")).is_ok());
}

#[derive(Default)]
struct CountingTelemetry {
    beats: AtomicUsize,
}

impl TelemetrySink for CountingTelemetry {
    fn heartbeat(&self, _data_source: &DataSource, _payload: &Value) {
        self.beats.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_heartbeat_goes_to_telemetry_only() {
    let transport = Arc::new(LoopbackTransport::new());
    let telemetry = Arc::new(CountingTelemetry::default());
    let registry = ControllerRegistry::with_telemetry(transport.clone(), telemetry.clone());
    let session = registry.get(DataSource::TEXT_PROTOCOL);
    connect(&session);

    let fanned_out = Arc::new(AtomicUsize::new(0));
    let f = fanned_out.clone();
    session.on(EventChannel::MachineHeartbeat, move |_| {
        f.fetch_add(1, Ordering::SeqCst);
    });

    transport.inject("machine:heartbeat", json!({"dataSource": "text-protocol"}));
    transport.inject("machine:heartbeat", json!({}));

    assert_eq!(telemetry.beats.load(Ordering::SeqCst), 2);
    assert_eq!(fanned_out.load(Ordering::SeqCst), 0);
}

#[test]
fn test_command_without_port_never_emits() {
    let (transport, registry) = connected_registry();
    let session = registry.get(DataSource::TEXT_PROTOCOL);
    connect(&session);

    assert_eq!(session.command("foo", vec![]), CommandOutcome::NoActivePort);
    assert_eq!(session.writeln("M105", None), CommandOutcome::NoActivePort);
    assert!(transport.emitted().is_empty());
}

#[test]
fn test_command_and_writeln_frames() {
    let (transport, registry) = connected_registry();
    let session = registry.get(DataSource::TEXT_PROTOCOL);
    connect(&session);
    open(&transport, "P1");

    assert!(session.command("gcode", vec![json!("G28")]).is_sent());

    let mut context = serde_json::Map::new();
    context.insert("source".to_string(), json!("console"));
    session.set_context(context);
    assert!(session.writeln("M105", None).is_sent());

    let commands = transport.emitted_on("command");
    assert_eq!(
        commands,
        vec![json!({"port": "P1", "dataSource": "text-protocol", "cmd": "gcode", "args": ["G28"]})]
    );
    let lines = transport.emitted_on("writeln");
    assert_eq!(
        lines,
        vec![json!({"port": "P1", "dataSource": "text-protocol", "data": "M105", "context": {"source": "console"}})]
    );
}

#[test]
fn test_commands_follow_workspace_port() {
    let (transport, registry) = connected_registry();
    let session = registry.get(DataSource::TEXT_PROTOCOL);
    connect(&session);
    open(&transport, "P1");
    open(&transport, "P2");

    assert!(!session.set_workspace_port("P9"));
    assert!(session.set_workspace_port("P1"));
    assert_eq!(session.port(), "P2");

    session.command("gcode", vec![json!("M114")]);
    assert_eq!(transport.emitted_on("command")[0]["port"], "P1");
}

#[test]
fn test_transport_failure_is_reported() {
    let (transport, registry) = connected_registry();
    let session = registry.get(DataSource::TEXT_PROTOCOL);
    connect(&session);
    open(&transport, "P1");
    transport.disconnect();

    assert!(matches!(
        session.command("gcode", vec![]),
        CommandOutcome::TransportError(_)
    ));
}
