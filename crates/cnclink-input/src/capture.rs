//! Key capture collaborator
//!
//! The capture layer owns the chord table of the host toolkit. The router only
//! needs three things from it: register a callback for a chord, remove that
//! registration again, and wipe everything.

use cnclink_core::{DataCallback, SubscriptionId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Input event that triggered a chord
#[derive(Debug)]
pub struct KeyEvent {
    chord: String,
    default_prevented: AtomicBool,
}

impl KeyEvent {
    /// Create an event for a chord
    pub fn new(chord: impl Into<String>) -> Self {
        Self {
            chord: chord.into(),
            default_prevented: AtomicBool::new(false),
        }
    }

    /// Chord as registered
    pub fn chord(&self) -> &str {
        &self.chord
    }

    /// Stop the host toolkit from applying its own handling
    pub fn prevent_default(&self) {
        self.default_prevented.store(true, Ordering::Relaxed);
    }

    /// Whether a handler called [`prevent_default`](Self::prevent_default)
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::Relaxed)
    }
}

/// Callback invoked when a chord matches
pub type KeyCallback = DataCallback<KeyEvent>;

/// Chord registration backend
pub trait KeyCapture: Send + Sync {
    /// Register `callback` for `chord`
    fn bind(&self, chord: &str, callback: KeyCallback) -> SubscriptionId;

    /// Remove one registration; returns false if it was not present
    fn unbind(&self, chord: &str, id: SubscriptionId) -> bool;

    /// Remove every registration
    fn reset(&self);
}

/// Normalize a chord so `Ctrl+Alt+X` and `ctrl+alt+x` are the same key
pub fn normalize_chord(chord: &str) -> String {
    chord.trim().to_ascii_lowercase()
}

/// Headless capture driven by [`trigger`](InMemoryKeyCapture::trigger)
#[derive(Default)]
pub struct InMemoryKeyCapture {
    bindings: RwLock<HashMap<String, Vec<(SubscriptionId, KeyCallback)>>>,
}

impl InMemoryKeyCapture {
    /// Create an empty capture table
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a key press, invoking every callback bound to the chord
    pub fn trigger(&self, chord: &str) -> KeyEvent {
        let chord = normalize_chord(chord);
        let callbacks: Vec<KeyCallback> = self
            .bindings
            .read()
            .get(&chord)
            .map(|list| list.iter().map(|(_, cb)| cb.clone()).collect())
            .unwrap_or_default();

        let event = KeyEvent::new(chord);
        for callback in &callbacks {
            callback(&event);
        }
        event
    }

    /// Registrations on one chord
    pub fn binding_count(&self, chord: &str) -> usize {
        self.bindings
            .read()
            .get(&normalize_chord(chord))
            .map_or(0, Vec::len)
    }

    /// Registrations across all chords
    pub fn total_bindings(&self) -> usize {
        self.bindings.read().values().map(Vec::len).sum()
    }
}

impl KeyCapture for InMemoryKeyCapture {
    fn bind(&self, chord: &str, callback: KeyCallback) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.bindings
            .write()
            .entry(normalize_chord(chord))
            .or_default()
            .push((id, callback));
        id
    }

    fn unbind(&self, chord: &str, id: SubscriptionId) -> bool {
        let chord = normalize_chord(chord);
        let mut bindings = self.bindings.write();
        let Some(list) = bindings.get_mut(&chord) else {
            return false;
        };
        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        let removed = list.len() != before;
        if list.is_empty() {
            bindings.remove(&chord);
        }
        removed
    }

    fn reset(&self) {
        self.bindings.write().clear();
    }
}

impl std::fmt::Debug for InMemoryKeyCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryKeyCapture")
            .field("chords", &self.bindings.read().len())
            .field("bindings", &self.total_bindings())
            .finish()
    }
}
