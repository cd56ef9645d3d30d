//! Machine session
//!
//! One [`Session`] exists per data source. It installs one transport handler
//! per catalog channel, drops events addressed to other data sources, applies
//! the built-in side effects of reserved channels to its snapshot, and then
//! fans the raw payload out to its own subscribers.

use super::dispatcher::{EventDispatcher, Listener};
use super::state::{SessionSnapshot, StateMap};
use super::telemetry::TelemetrySink;
use crate::transport::Transport;
use cnclink_core::{
    ConnectionError, DataSource, EventChannel, SessionError, SubscriptionId, WorkflowState,
};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::sync::Arc;

/// Logical machine session bound to one data source
pub struct Session {
    data_source: DataSource,
    pub(super) transport: Arc<dyn Transport>,
    telemetry: Arc<dyn TelemetrySink>,
    dispatcher: EventDispatcher,
    pub(super) snapshot: RwLock<SessionSnapshot>,
    pub(super) context: RwLock<StateMap>,
    installed: Mutex<Vec<(EventChannel, SubscriptionId)>>,
}

impl Session {
    /// Create a session for a data source on a shared transport
    pub fn new(
        data_source: DataSource,
        transport: Arc<dyn Transport>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Arc<Self> {
        Arc::new(Self {
            data_source,
            transport,
            telemetry,
            dispatcher: EventDispatcher::new(),
            snapshot: RwLock::new(SessionSnapshot::default()),
            context: RwLock::new(StateMap::new()),
            installed: Mutex::new(Vec::new()),
        })
    }

    /// Data source this session is bound to
    pub fn data_source(&self) -> &DataSource {
        &self.data_source
    }

    /// Subscribe to a channel
    pub fn on<F>(&self, channel: EventChannel, listener: F) -> SubscriptionId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.dispatcher.on(channel, Arc::new(listener))
    }

    /// Subscribe to a channel given by wire name
    pub fn on_named<F>(&self, name: &str, listener: F) -> Result<SubscriptionId, SessionError>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        self.dispatcher.on_named(name, listener)
    }

    /// Remove one subscription
    pub fn off(&self, channel: EventChannel, id: SubscriptionId) -> bool {
        self.dispatcher.off(channel, id)
    }

    /// Remove one subscription from a channel given by wire name
    pub fn off_named(&self, name: &str, id: SubscriptionId) -> Result<bool, SessionError> {
        self.dispatcher.off_named(name, id)
    }

    /// Number of subscribers on a channel
    pub fn listener_count(&self, channel: EventChannel) -> usize {
        self.dispatcher.listener_count(channel)
    }

    /// Open the transport and start listening on every catalog channel
    ///
    /// The token is fetched from `token_provider` at call time. Calling
    /// `connect` again reconnects the transport but keeps the handlers that
    /// are already installed. `on_ready` runs once handlers are in place.
    pub fn connect<T, R>(self: &Arc<Self>, token_provider: T, on_ready: R) -> Result<(), ConnectionError>
    where
        T: FnOnce() -> String,
        R: FnOnce(),
    {
        let token = token_provider();
        self.transport.connect(&token)?;
        self.install_handlers();
        tracing::info!("Session {} connected", self.data_source);
        on_ready();
        Ok(())
    }

    /// Stop listening on the transport
    ///
    /// The transport itself is shared and stays open; subscribers are kept so
    /// a later `connect` resumes delivery to them.
    pub fn disconnect(&self) {
        let installed = std::mem::take(&mut *self.installed.lock());
        for (channel, id) in &installed {
            self.transport.off(channel.as_str(), *id);
        }
        tracing::info!(
            "Session {} stopped listening ({} handlers removed)",
            self.data_source,
            installed.len()
        );
    }

    /// Whether the shared transport is connected
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Whether transport handlers are installed
    pub fn is_listening(&self) -> bool {
        !self.installed.lock().is_empty()
    }

    /// Route an event that arrived under an arbitrary wire name
    ///
    /// Names outside the catalog are logged and rejected.
    pub fn dispatch_raw(&self, name: &str, payload: &Value) -> Result<(), SessionError> {
        let channel = name.parse::<EventChannel>().inspect_err(|_| {
            tracing::warn!("Dropping inbound event on unknown channel '{}'", name);
        })?;
        self.handle_inbound(channel, payload);
        Ok(())
    }

    fn install_handlers(self: &Arc<Self>) {
        let mut installed = self.installed.lock();
        if !installed.is_empty() {
            return;
        }
        for channel in EventChannel::ALL.iter().copied() {
            let weak = Arc::downgrade(self);
            let id = self.transport.on(
                channel.as_str(),
                Arc::new(move |payload: &Value| {
                    if let Some(session) = weak.upgrade() {
                        session.handle_inbound(channel, payload);
                    }
                }),
            );
            installed.push((channel, id));
        }
        tracing::debug!(
            "Session {} installed {} transport handlers",
            self.data_source,
            installed.len()
        );
    }

    fn handle_inbound(&self, channel: EventChannel, payload: &Value) {
        if let Some(source) = payload.get("dataSource").and_then(Value::as_str) {
            if source != self.data_source.as_str() {
                return;
            }
        }

        if channel == EventChannel::MachineHeartbeat {
            self.telemetry.heartbeat(&self.data_source, payload);
            return;
        }

        if self.snapshot.write().apply(channel, payload) {
            tracing::debug!("Session {} applied {}", self.data_source, channel);
        }

        self.dispatcher.dispatch(channel, payload);
    }

    /// Point-in-time copy of the whole snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.read().clone()
    }

    /// Active port, or empty
    pub fn port(&self) -> String {
        self.snapshot.read().port.clone()
    }

    /// Open ports in opening order
    pub fn ports(&self) -> Vec<String> {
        self.snapshot.read().ports.clone()
    }

    /// Port used for outbound commands, or empty
    pub fn workspace_port(&self) -> String {
        self.snapshot.read().workspace_port.clone()
    }

    /// Detected firmware family, or empty
    pub fn machine_type(&self) -> String {
        self.snapshot.read().machine_type.clone()
    }

    /// Last reported device status
    pub fn state(&self) -> StateMap {
        self.snapshot.read().state.clone()
    }

    /// Last reported device settings
    pub fn settings(&self) -> StateMap {
        self.snapshot.read().settings.clone()
    }

    /// Last reported run-state
    pub fn workflow_state(&self) -> WorkflowState {
        self.snapshot.read().workflow_state
    }

    /// Bind outbound commands to one of the open ports
    ///
    /// Returns false and changes nothing if the port is not open.
    pub fn set_workspace_port(&self, port: &str) -> bool {
        let accepted = self.snapshot.write().select_workspace_port(port);
        if !accepted {
            tracing::warn!(
                "Session {} cannot bind commands to unopened port {}",
                self.data_source,
                port
            );
        }
        accepted
    }

    /// Replace the UI context attached to lines written without one
    pub fn set_context(&self, context: StateMap) {
        *self.context.write() = context;
    }

    /// Current UI context
    pub fn context(&self) -> StateMap {
        self.context.read().clone()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("data_source", &self.data_source)
            .field("snapshot", &*self.snapshot.read())
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}
