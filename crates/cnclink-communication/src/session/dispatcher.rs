//! Per-session event dispatcher
//!
//! Holds an ordered subscriber list for every channel in the fixed catalog.
//! Fan-out is synchronous and follows registration order.

use cnclink_core::{DataCallback, EventChannel, SessionError, SubscriptionId};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

/// Subscriber callback receiving the raw inbound payload
pub type Listener = DataCallback<Value>;

/// Ordered subscriber lists keyed by catalog channel
pub struct EventDispatcher {
    listeners: RwLock<HashMap<EventChannel, Vec<(SubscriptionId, Listener)>>>,
}

impl EventDispatcher {
    /// Create a dispatcher with an empty list for every catalog channel
    pub fn new() -> Self {
        let listeners = EventChannel::ALL
            .iter()
            .map(|channel| (*channel, Vec::new()))
            .collect();
        Self {
            listeners: RwLock::new(listeners),
        }
    }

    /// Append a subscriber to a channel
    pub fn on(&self, channel: EventChannel, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.listeners
            .write()
            .entry(channel)
            .or_default()
            .push((id, listener));
        tracing::trace!("{} subscribed to {}", id, channel);
        id
    }

    /// Append a subscriber to a channel given by wire name
    ///
    /// Unknown names are logged and rejected without touching any list.
    pub fn on_named(&self, name: &str, listener: Listener) -> Result<SubscriptionId, SessionError> {
        let channel = Self::resolve(name)?;
        Ok(self.on(channel, listener))
    }

    /// Remove exactly one subscriber
    ///
    /// Removing a subscriber that is not registered is a silent no-op.
    pub fn off(&self, channel: EventChannel, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let Some(list) = listeners.get_mut(&channel) else {
            return false;
        };
        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        list.len() != before
    }

    /// Remove one subscriber from a channel given by wire name
    pub fn off_named(&self, name: &str, id: SubscriptionId) -> Result<bool, SessionError> {
        let channel = Self::resolve(name)?;
        Ok(self.off(channel, id))
    }

    /// Invoke every subscriber of `channel` in registration order
    ///
    /// The subscriber list is copied before invocation, so subscribers may
    /// register or remove subscribers while being called. Returns the number
    /// of subscribers invoked.
    pub fn dispatch(&self, channel: EventChannel, payload: &Value) -> usize {
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .get(&channel)
            .map(|list| list.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default();

        for listener in &listeners {
            listener(payload);
        }
        listeners.len()
    }

    /// Number of subscribers on a channel
    pub fn listener_count(&self, channel: EventChannel) -> usize {
        self.listeners.read().get(&channel).map_or(0, Vec::len)
    }

    fn resolve(name: &str) -> Result<EventChannel, SessionError> {
        name.parse::<EventChannel>().inspect_err(|_| {
            tracing::warn!("Ignoring subscription change for unknown channel '{}'", name);
        })
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total: usize = self.listeners.read().values().map(Vec::len).sum();
        f.debug_struct("EventDispatcher")
            .field("subscribers", &total)
            .finish()
    }
}
