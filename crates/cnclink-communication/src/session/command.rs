//! Outbound command API
//!
//! `command` and `writeln` are fire-and-forget and silently skip sending when
//! no workspace port is bound; the returned [`CommandOutcome`] tells callers
//! what happened if they care. `emit_event` layers a correlated
//! request/response exchange over the pub/sub transport.

use super::controller::Session;
use super::state::StateMap;
use crate::transport::Transport;
use cnclink_core::{ConnectionError, SessionError, SubscriptionId};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Event name carrying machine commands
pub const COMMAND_EVENT: &str = "command";

/// Event name carrying raw lines
pub const WRITELN_EVENT: &str = "writeln";

/// Result of a fire-and-forget send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Handed to the transport
    Sent,
    /// Skipped because no workspace port is bound
    NoActivePort,
    /// The transport refused the frame
    TransportError(ConnectionError),
}

impl CommandOutcome {
    /// Whether the frame reached the transport
    pub fn is_sent(&self) -> bool {
        matches!(self, CommandOutcome::Sent)
    }
}

impl Session {
    /// Send a machine command on the workspace port
    ///
    /// Emits `{ port, dataSource, cmd, args }` on the `command` event.
    pub fn command(&self, cmd: &str, args: Vec<Value>) -> CommandOutcome {
        let port = self.workspace_port();
        if port.is_empty() {
            tracing::debug!("Skipping command '{}': no workspace port", cmd);
            return CommandOutcome::NoActivePort;
        }
        let frame = json!({
            "port": port,
            "dataSource": self.data_source(),
            "cmd": cmd,
            "args": args,
        });
        self.send(COMMAND_EVENT, frame)
    }

    /// Send G-code lines as one `gcode` command
    pub fn gcode(&self, lines: &[String]) -> CommandOutcome {
        self.command("gcode", vec![Value::String(lines.join("\n"))])
    }

    /// Write one raw line on the workspace port
    ///
    /// Emits `{ port, dataSource, data, context }` on the `writeln` event.
    /// Without an explicit context the session context is attached.
    pub fn writeln(&self, data: &str, context: Option<StateMap>) -> CommandOutcome {
        let port = self.workspace_port();
        if port.is_empty() {
            tracing::debug!("Skipping writeln: no workspace port");
            return CommandOutcome::NoActivePort;
        }
        let context = context.unwrap_or_else(|| self.context());
        let frame = json!({
            "port": port,
            "dataSource": self.data_source(),
            "data": data,
            "context": context,
        });
        self.send(WRITELN_EVENT, frame)
    }

    /// Emit an event and prepare to receive its reply on the same name
    ///
    /// The frame is `{ ...payload, eventName, requestId }`. The reply listener
    /// is registered before the frame is sent, so an immediate reply is not
    /// lost.
    pub fn emit_event(&self, event_name: &str, payload: StateMap) -> PendingReply {
        let request_id = Uuid::new_v4().to_string();
        let pending = PendingReply::register(&self.transport, event_name, &request_id);

        let mut frame = payload;
        frame.insert("eventName".to_string(), Value::from(event_name));
        frame.insert("requestId".to_string(), Value::from(request_id));

        if let Err(err) = self.transport.emit(event_name, Value::Object(frame)) {
            tracing::warn!("Failed to emit '{}': {}", event_name, err);
            pending.shared.fail(err);
        }
        pending
    }

    /// Emit an event and wait for its reply
    pub async fn request(
        &self,
        event_name: &str,
        payload: StateMap,
        timeout: Duration,
    ) -> Result<Value, SessionError> {
        self.emit_event(event_name, payload).recv(timeout).await
    }

    fn send(&self, event: &str, frame: Value) -> CommandOutcome {
        match self.transport.emit(event, frame) {
            Ok(()) => CommandOutcome::Sent,
            Err(err) => {
                tracing::warn!("Failed to emit '{}': {}", event, err);
                CommandOutcome::TransportError(err)
            }
        }
    }
}

enum ReplySlot {
    Waiting,
    Arrived(Value),
    Callback(Box<dyn FnOnce(Value) + Send>),
    Notify(oneshot::Sender<Value>),
    Failed(ConnectionError),
    Settled,
}

enum Delivery {
    Nothing,
    Callback(Box<dyn FnOnce(Value) + Send>),
    Notify(oneshot::Sender<Value>),
}

struct ReplyShared {
    event: String,
    slot: Mutex<ReplySlot>,
    listener: Mutex<Option<SubscriptionId>>,
    transport: Weak<dyn Transport>,
}

impl ReplyShared {
    fn deliver(&self, payload: &Value) {
        let delivery = {
            let mut slot = self.slot.lock();
            match std::mem::replace(&mut *slot, ReplySlot::Settled) {
                ReplySlot::Waiting => {
                    *slot = ReplySlot::Arrived(payload.clone());
                    Delivery::Nothing
                }
                ReplySlot::Callback(callback) => Delivery::Callback(callback),
                ReplySlot::Notify(tx) => Delivery::Notify(tx),
                other => {
                    *slot = other;
                    Delivery::Nothing
                }
            }
        };
        self.detach();

        match delivery {
            Delivery::Nothing => {}
            Delivery::Callback(callback) => callback(payload.clone()),
            Delivery::Notify(tx) => {
                let _ = tx.send(payload.clone());
            }
        }
    }

    fn fail(&self, err: ConnectionError) {
        *self.slot.lock() = ReplySlot::Failed(err);
        self.detach();
    }

    fn cancel(&self) {
        let previous = std::mem::replace(&mut *self.slot.lock(), ReplySlot::Settled);
        if matches!(previous, ReplySlot::Callback(_) | ReplySlot::Notify(_) | ReplySlot::Waiting) {
            tracing::debug!("Cancelled pending reply on '{}'", self.event);
        }
        self.detach();
    }

    fn detach(&self) {
        let Some(id) = self.listener.lock().take() else {
            return;
        };
        if let Some(transport) = self.transport.upgrade() {
            transport.off(&self.event, id);
        }
    }

    fn is_settled(&self) -> bool {
        matches!(*self.slot.lock(), ReplySlot::Settled | ReplySlot::Failed(_))
    }
}

fn reply_matches(payload: &Value, request_id: &str) -> bool {
    match payload.get("requestId").and_then(Value::as_str) {
        Some(id) => id == request_id,
        // Backends that do not echo the correlation id answer every waiter on the event
        None => true,
    }
}

/// A reply expected on the event name a request was emitted on
///
/// Dropping the handle without calling [`once`](Self::once) cancels the
/// wait and removes the transport listener.
pub struct PendingReply {
    shared: Arc<ReplyShared>,
    request_id: String,
    armed: bool,
}

impl PendingReply {
    fn register(transport: &Arc<dyn Transport>, event: &str, request_id: &str) -> Self {
        let shared = Arc::new(ReplyShared {
            event: event.to_string(),
            slot: Mutex::new(ReplySlot::Waiting),
            listener: Mutex::new(None),
            transport: Arc::downgrade(transport),
        });

        let handler_shared = shared.clone();
        let expected = request_id.to_string();
        let id = transport.on(
            event,
            Arc::new(move |payload: &Value| {
                if reply_matches(payload, &expected) {
                    handler_shared.deliver(payload);
                }
            }),
        );
        *shared.listener.lock() = Some(id);

        Self {
            shared,
            request_id: request_id.to_string(),
            armed: true,
        }
    }

    /// Event name the reply is expected on
    pub fn event(&self) -> &str {
        &self.shared.event
    }

    /// Correlation id attached to the request
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Run `callback` with the reply, exactly once
    ///
    /// The listener stays registered until a reply arrives or the returned
    /// handle is cancelled.
    pub fn once<F>(mut self, callback: F) -> ReplyHandle
    where
        F: FnOnce(Value) + Send + 'static,
    {
        self.armed = false;
        let shared = self.shared.clone();

        let mut slot = shared.slot.lock();
        if matches!(*slot, ReplySlot::Arrived(_)) {
            if let ReplySlot::Arrived(value) = std::mem::replace(&mut *slot, ReplySlot::Settled) {
                drop(slot);
                callback(value);
            }
        } else if matches!(*slot, ReplySlot::Waiting) {
            *slot = ReplySlot::Callback(Box::new(callback));
        } else {
            tracing::debug!("Reply on '{}' can no longer arrive", shared.event);
        }

        ReplyHandle {
            shared: self.shared.clone(),
        }
    }

    /// Wait for the reply, giving up after `timeout`
    pub async fn recv(self, timeout: Duration) -> Result<Value, SessionError> {
        let rx = {
            let mut slot = self.shared.slot.lock();
            match std::mem::replace(&mut *slot, ReplySlot::Settled) {
                ReplySlot::Arrived(value) => return Ok(value),
                ReplySlot::Waiting => {
                    let (tx, rx) = oneshot::channel();
                    *slot = ReplySlot::Notify(tx);
                    rx
                }
                ReplySlot::Failed(err) => return Err(err.into()),
                other => {
                    *slot = other;
                    return Err(SessionError::ReplyCancelled {
                        event: self.shared.event.clone(),
                    });
                }
            }
        };

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(SessionError::ReplyCancelled {
                event: self.shared.event.clone(),
            }),
            Err(_) => {
                tracing::warn!(
                    "No reply on '{}' within {}ms",
                    self.shared.event,
                    timeout.as_millis()
                );
                Err(SessionError::ReplyTimeout {
                    event: self.shared.event.clone(),
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
        }
    }

    /// Stop waiting and remove the transport listener
    pub fn cancel(self) {}
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        if self.armed {
            self.shared.cancel();
        }
    }
}

/// Handle to a callback-style reply registration
pub struct ReplyHandle {
    shared: Arc<ReplyShared>,
}

impl ReplyHandle {
    /// Drop the callback and remove the transport listener
    pub fn cancel(&self) {
        self.shared.cancel();
    }

    /// Whether the reply was delivered, cancelled, or can no longer arrive
    pub fn is_settled(&self) -> bool {
        self.shared.is_settled()
    }
}
