//! Key binding router
//!
//! Registers the chord table with a [`KeyCapture`] backend and re-emits
//! every match as `(command, event)` to local subscribers. Binding is
//! idempotent: a second `bind` without an `unbind` in between registers
//! nothing.

use crate::bindings::{KeyBinding, KEY_BINDINGS};
use crate::capture::{KeyCallback, KeyCapture, KeyEvent};
use crate::command::KeyCommand;
use cnclink_core::{thread_safe_rw, SubscriptionId, ThreadSafeRw};
use parking_lot::Mutex;
use std::sync::Arc;

/// Subscriber receiving matched commands
pub type KeyListener = Arc<dyn Fn(&KeyCommand, &KeyEvent) + Send + Sync>;

type Subscribers = ThreadSafeRw<Vec<(SubscriptionId, KeyListener)>>;

/// Routes key chords to semantic commands
pub struct KeyBindingRouter {
    capture: Arc<dyn KeyCapture>,
    table: &'static [KeyBinding],
    subscribers: Subscribers,
    /// Registrations made by the last `bind`; `None` while unbound
    installed: Mutex<Option<Vec<(&'static str, SubscriptionId)>>>,
}

impl KeyBindingRouter {
    /// Create a router over the default chord table
    pub fn new(capture: Arc<dyn KeyCapture>) -> Self {
        Self::with_table(capture, KEY_BINDINGS)
    }

    /// Create a router over a custom chord table
    pub fn with_table(capture: Arc<dyn KeyCapture>, table: &'static [KeyBinding]) -> Self {
        Self {
            capture,
            table,
            subscribers: thread_safe_rw(Vec::new()),
            installed: Mutex::new(None),
        }
    }

    /// Chord table this router registers
    pub fn table(&self) -> &'static [KeyBinding] {
        self.table
    }

    /// Whether the chord table is currently registered
    pub fn is_bound(&self) -> bool {
        self.installed.lock().is_some()
    }

    /// Register every chord with the capture backend
    pub fn bind(&self) {
        let mut installed = self.installed.lock();
        if installed.is_some() {
            return;
        }

        let registrations = self
            .table
            .iter()
            .map(|binding| {
                let id = self.capture.bind(binding.keys, self.callback_for(*binding));
                (binding.keys, id)
            })
            .collect::<Vec<_>>();

        tracing::debug!("Bound {} key chords", registrations.len());
        *installed = Some(registrations);
    }

    /// Remove the registrations made by `bind`
    pub fn unbind(&self) {
        let Some(registrations) = self.installed.lock().take() else {
            return;
        };
        for (keys, id) in &registrations {
            self.capture.unbind(keys, *id);
        }
        tracing::debug!("Unbound {} key chords", registrations.len());
    }

    /// Wipe the capture backend and mark the router unbound
    ///
    /// Safe to call whether or not `bind` ran before.
    pub fn reset(&self) {
        self.capture.reset();
        *self.installed.lock() = None;
    }

    /// Receive every matched command
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&KeyCommand, &KeyEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.subscribers.write().push((id, Arc::new(listener)));
        id
    }

    /// Remove a subscriber; returns false if it was not present
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }

    /// Number of local subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    fn callback_for(&self, binding: KeyBinding) -> KeyCallback {
        let subscribers = self.subscribers.clone();
        Arc::new(move |event: &KeyEvent| {
            tracing::debug!(
                "Key chord '{}' matched {}",
                binding.keys,
                binding.command.name()
            );
            if binding.prevent_default {
                event.prevent_default();
            }

            let listeners: Vec<KeyListener> = subscribers
                .read()
                .iter()
                .map(|(_, listener)| listener.clone())
                .collect();
            for listener in &listeners {
                listener(&binding.command, event);
            }
        })
    }
}

impl std::fmt::Debug for KeyBindingRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyBindingRouter")
            .field("chords", &self.table.len())
            .field("bound", &self.is_bound())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
