//! In-process transport
//!
//! Records every emitted frame and lets the embedder inject inbound events.
//! Used for headless operation, dry runs, and tests. Responders can be
//! installed to answer an emitted event on the same name, emulating a backend.

use super::{Transport, TransportHandler};
use cnclink_core::{ConnectionError, SubscriptionId};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Produces a backend reply for an emitted payload
pub type Responder = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// A frame sent through the transport
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedFrame {
    /// Event name
    pub event: String,
    /// Payload as sent
    pub payload: Value,
}

/// Loopback transport
#[derive(Default)]
pub struct LoopbackTransport {
    connected: AtomicBool,
    expected_token: Option<String>,
    handlers: RwLock<HashMap<String, Vec<(SubscriptionId, TransportHandler)>>>,
    responders: RwLock<HashMap<String, Responder>>,
    emitted: Mutex<Vec<EmittedFrame>>,
}

impl LoopbackTransport {
    /// Create a transport accepting any token
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport that only accepts the given token
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            expected_token: Some(token.into()),
            ..Self::default()
        }
    }

    /// Answer every emit on `event` with the responder's reply, on the same name
    pub fn set_responder<F>(&self, event: &str, responder: F)
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.responders
            .write()
            .insert(event.to_string(), Arc::new(responder));
    }

    /// Deliver an inbound event to every handler registered on `event`
    ///
    /// Returns the number of handlers invoked.
    pub fn inject(&self, event: &str, payload: Value) -> usize {
        let handlers: Vec<TransportHandler> = self
            .handlers
            .read()
            .get(event)
            .map(|list| list.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default();

        for handler in &handlers {
            handler(&payload);
        }
        handlers.len()
    }

    /// Every frame emitted so far
    pub fn emitted(&self) -> Vec<EmittedFrame> {
        self.emitted.lock().clone()
    }

    /// Drain the emitted frames
    pub fn take_emitted(&self) -> Vec<EmittedFrame> {
        std::mem::take(&mut *self.emitted.lock())
    }

    /// Frames emitted on one event name
    pub fn emitted_on(&self, event: &str) -> Vec<Value> {
        self.emitted
            .lock()
            .iter()
            .filter(|f| f.event == event)
            .map(|f| f.payload.clone())
            .collect()
    }

    /// Number of handlers registered on `event`
    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers.read().get(event).map_or(0, Vec::len)
    }

    /// Number of handlers registered across all events
    pub fn total_handlers(&self) -> usize {
        self.handlers.read().values().map(Vec::len).sum()
    }
}

impl Transport for LoopbackTransport {
    fn connect(&self, token: &str) -> Result<(), ConnectionError> {
        if let Some(expected) = &self.expected_token {
            if expected != token {
                return Err(ConnectionError::AuthenticationFailed {
                    reason: "token rejected".to_string(),
                });
            }
        }
        self.connected.store(true, Ordering::SeqCst);
        tracing::debug!("Loopback transport connected");
        Ok(())
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        tracing::debug!("Loopback transport disconnected");
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn emit(&self, event: &str, payload: Value) -> Result<(), ConnectionError> {
        if !self.is_connected() {
            return Err(ConnectionError::NotConnected);
        }

        self.emitted.lock().push(EmittedFrame {
            event: event.to_string(),
            payload: payload.clone(),
        });

        let responder = self.responders.read().get(event).cloned();
        if let Some(reply) = responder.and_then(|r| r(&payload)) {
            self.inject(event, reply);
        }
        Ok(())
    }

    fn on(&self, event: &str, handler: TransportHandler) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.handlers
            .write()
            .entry(event.to_string())
            .or_default()
            .push((id, handler));
        id
    }

    fn off(&self, event: &str, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write();
        let Some(list) = handlers.get_mut(event) else {
            return false;
        };
        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        let removed = list.len() != before;
        if list.is_empty() {
            handlers.remove(event);
        }
        removed
    }
}
