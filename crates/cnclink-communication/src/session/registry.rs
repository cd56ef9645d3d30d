//! Session registry
//!
//! Constructed once at application start and passed to every consumer.
//! `get` is an idempotent get-or-create: the same data source always yields
//! the same session for the lifetime of the registry.

use super::controller::Session;
use super::telemetry::{TelemetrySink, TracingTelemetry};
use crate::transport::Transport;
use cnclink_core::{ConnectionError, DataSource};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Keyed store of one session per data source
pub struct ControllerRegistry {
    transport: Arc<dyn Transport>,
    telemetry: Arc<dyn TelemetrySink>,
    sessions: RwLock<HashMap<DataSource, Arc<Session>>>,
}

impl ControllerRegistry {
    /// Create a registry whose sessions share `transport`
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_telemetry(transport, Arc::new(TracingTelemetry::new()))
    }

    /// Create a registry with a custom heartbeat sink
    pub fn with_telemetry(transport: Arc<dyn Transport>, telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self {
            transport,
            telemetry,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Session for a data source, created on first use
    pub fn get(&self, data_source: impl Into<DataSource>) -> Arc<Session> {
        let data_source = data_source.into();
        if let Some(session) = self.sessions.read().get(&data_source) {
            return session.clone();
        }

        self.sessions
            .write()
            .entry(data_source)
            .or_insert_with_key(|key| {
                tracing::debug!("Creating session for {}", key);
                Session::new(key.clone(), self.transport.clone(), self.telemetry.clone())
            })
            .clone()
    }

    /// Whether a session exists for a data source
    pub fn contains(&self, data_source: &DataSource) -> bool {
        self.sessions.read().contains_key(data_source)
    }

    /// Data sources with a session, sorted
    pub fn data_sources(&self) -> Vec<DataSource> {
        let mut keys: Vec<DataSource> = self.sessions.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of sessions
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether no session was created yet
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// The shared transport
    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    /// Connect every existing session using one token
    pub fn connect_all(&self, token: &str) -> Result<(), ConnectionError> {
        for session in self.sessions.read().values() {
            session.connect(|| token.to_string(), || {})?;
        }
        Ok(())
    }

    /// Detach every session from the transport and close it
    pub fn disconnect_all(&self) {
        for session in self.sessions.read().values() {
            session.disconnect();
        }
        self.transport.disconnect();
    }

    /// Drop the session for a data source
    ///
    /// Its transport handlers are removed. Holders of the old `Arc` keep a
    /// detached session; the next `get` creates a fresh one.
    pub fn remove(&self, data_source: &DataSource) -> Option<Arc<Session>> {
        let removed = self.sessions.write().remove(data_source);
        if let Some(session) = &removed {
            session.disconnect();
        }
        removed
    }

    /// Drop every session
    pub fn clear(&self) {
        let sessions: Vec<Arc<Session>> = self.sessions.write().drain().map(|(_, s)| s).collect();
        for session in sessions {
            session.disconnect();
        }
    }
}

impl std::fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerRegistry")
            .field("data_sources", &self.data_sources())
            .finish()
    }
}
