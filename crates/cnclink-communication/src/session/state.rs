//! Session snapshot and the built-in side effects of reserved channels
//!
//! The snapshot is owned by its session and only mutated while an inbound
//! event is being processed. Callers always receive clones.

use cnclink_core::{EventChannel, WorkflowState};
use serde::Serialize;
use serde_json::{Map, Value};

/// Opaque device status or settings map
pub type StateMap = Map<String, Value>;

/// Outcome of closing a port
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortClosure {
    /// The port was not open for this session
    NotOpen,
    /// A non-active port was removed; the active port is unchanged
    Removed,
    /// The active port closed and another open port took over
    Failover(String),
    /// The last port closed and the session returned to defaults
    Reset,
}

/// Point-in-time copy of a session's remote device state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Most recently opened port, or empty
    pub port: String,
    /// Open ports in opening order
    pub ports: Vec<String>,
    /// Port used for outbound commands, or empty
    pub workspace_port: String,
    /// Detected firmware family, or empty
    #[serde(rename = "type")]
    pub machine_type: String,
    /// Last reported device status
    pub state: StateMap,
    /// Last reported device settings
    pub settings: StateMap,
    /// Last reported run-state
    pub workflow_state: WorkflowState,
}

impl SessionSnapshot {
    /// Record a newly opened port and make it active
    pub fn open_port(&mut self, port: &str, machine_type: &str) {
        if !self.ports.iter().any(|p| p == port) {
            self.ports.push(port.to_string());
        }
        self.port = port.to_string();
        self.workspace_port = port.to_string();
        self.machine_type = machine_type.to_string();
    }

    /// Forget a closed port, failing over or resetting as needed
    ///
    /// When the active port closes, the first remaining port becomes active.
    /// The choice is positional, not a recency heuristic.
    pub fn close_port(&mut self, port: &str) -> PortClosure {
        let Some(index) = self.ports.iter().position(|p| p == port) else {
            return PortClosure::NotOpen;
        };
        self.ports.remove(index);

        if self.ports.is_empty() {
            self.reset();
            return PortClosure::Reset;
        }

        if self.port == port || self.workspace_port == port {
            let next = self.ports[0].clone();
            self.port = next.clone();
            self.workspace_port = next.clone();
            return PortClosure::Failover(next);
        }

        PortClosure::Removed
    }

    /// Return to the disconnected defaults
    pub fn reset(&mut self) {
        self.port.clear();
        self.ports.clear();
        self.workspace_port.clear();
        self.machine_type.clear();
        self.state = StateMap::new();
        self.settings = StateMap::new();
        self.workflow_state = WorkflowState::Idle;
    }

    /// Bind outbound commands to an already open port
    pub fn select_workspace_port(&mut self, port: &str) -> bool {
        if self.ports.iter().any(|p| p == port) {
            self.workspace_port = port.to_string();
            true
        } else {
            false
        }
    }

    /// Apply the built-in side effect of a reserved channel
    ///
    /// Returns true if the snapshot was touched. Channels without a built-in
    /// side effect leave the snapshot unchanged.
    pub fn apply(&mut self, channel: EventChannel, payload: &Value) -> bool {
        match channel {
            c if c.is_port_open() => {
                let Some(port) = str_field(payload, "port") else {
                    tracing::warn!("{} without a port: {}", channel, payload);
                    return false;
                };
                let machine_type = str_field(payload, "type").unwrap_or_default();
                self.open_port(port, machine_type);
                tracing::info!("Port {} opened ({})", port, machine_type);
                true
            }
            c if c.is_port_close() => {
                let Some(port) = str_field(payload, "port") else {
                    tracing::warn!("{} without a port: {}", channel, payload);
                    return false;
                };
                match self.close_port(port) {
                    PortClosure::NotOpen => false,
                    PortClosure::Removed => {
                        tracing::info!("Port {} closed", port);
                        true
                    }
                    PortClosure::Failover(next) => {
                        tracing::info!("Port {} closed, failing over to {}", port, next);
                        true
                    }
                    PortClosure::Reset => {
                        tracing::info!("Port {} closed, no ports left", port);
                        true
                    }
                }
            }
            EventChannel::WorkflowState => {
                let Some(value) = str_field(payload, "workflowState") else {
                    return false;
                };
                self.workflow_state = WorkflowState::from_wire(value);
                tracing::debug!("Workflow state is now {}", self.workflow_state);
                true
            }
            EventChannel::MachineState => {
                self.machine_type = str_field(payload, "type").unwrap_or_default().to_string();
                self.state = object_field(payload, "state");
                true
            }
            EventChannel::MachineSettings => {
                self.machine_type = str_field(payload, "type").unwrap_or_default().to_string();
                self.settings = object_field(payload, "settings");
                true
            }
            _ => false,
        }
    }
}

fn str_field<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(Value::as_str)
}

fn object_field(payload: &Value, key: &str) -> StateMap {
    payload
        .get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_open_is_idempotent_per_port() {
        let mut snapshot = SessionSnapshot::default();
        snapshot.open_port("P1", "Marlin");
        snapshot.open_port("P1", "Marlin");
        assert_eq!(snapshot.ports, vec!["P1"]);
        assert_eq!(snapshot.workspace_port, "P1");
    }

    #[test]
    fn test_close_non_active_port_keeps_active() {
        let mut snapshot = SessionSnapshot::default();
        snapshot.open_port("P1", "");
        snapshot.open_port("P2", "");
        snapshot.open_port("P3", "");
        assert_eq!(snapshot.close_port("P1"), PortClosure::Removed);
        assert_eq!(snapshot.port, "P3");
        assert_eq!(snapshot.ports, vec!["P2", "P3"]);
    }

    #[test]
    fn test_close_active_port_fails_over_to_first() {
        let mut snapshot = SessionSnapshot::default();
        snapshot.open_port("P1", "");
        snapshot.open_port("P2", "");
        snapshot.open_port("P3", "");
        assert_eq!(
            snapshot.close_port("P3"),
            PortClosure::Failover("P1".to_string())
        );
        assert_eq!(snapshot.port, "P1");
        assert_eq!(snapshot.workspace_port, "P1");
    }

    #[test]
    fn test_close_unknown_port() {
        let mut snapshot = SessionSnapshot::default();
        snapshot.open_port("P1", "");
        assert_eq!(snapshot.close_port("P9"), PortClosure::NotOpen);
        assert_eq!(snapshot.port, "P1");
    }

    #[test]
    fn test_state_replaced_wholesale() {
        let mut snapshot = SessionSnapshot::default();
        snapshot.apply(
            EventChannel::MachineState,
            &json!({"type": "Marlin", "state": {"pos": {"x": 1}, "temp": 20}}),
        );
        snapshot.apply(
            EventChannel::MachineState,
            &json!({"type": "Marlin", "state": {"pos": {"x": 2}}}),
        );
        assert_eq!(Value::Object(snapshot.state.clone()), json!({"pos": {"x": 2}}));
        assert_eq!(snapshot.machine_type, "Marlin");
    }

    #[test]
    fn test_workflow_state_update() {
        let mut snapshot = SessionSnapshot::default();
        assert!(snapshot.apply(EventChannel::WorkflowState, &json!({"workflowState": "running"})));
        assert_eq!(snapshot.workflow_state, WorkflowState::Running);
        assert!(!snapshot.apply(EventChannel::WorkflowState, &json!({})));
        assert_eq!(snapshot.workflow_state, WorkflowState::Running);
    }

    #[test]
    fn test_channels_without_side_effects() {
        let mut snapshot = SessionSnapshot::default();
        assert!(!snapshot.apply(EventChannel::SliceProgress, &json!({"progress": 0.5})));
        assert_eq!(snapshot, SessionSnapshot::default());
    }

    #[test]
    fn test_serialized_field_names() {
        let mut snapshot = SessionSnapshot::default();
        snapshot.open_port("P1", "Marlin");
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["workspacePort"], "P1");
        assert_eq!(value["type"], "Marlin");
        assert_eq!(value["workflowState"], "idle");
    }
}
