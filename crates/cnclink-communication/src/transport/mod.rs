//! Transport abstraction
//!
//! The session layer sits on top of a reconnecting, token-authenticated,
//! named-event duplex channel. Reconnection and authentication are the
//! transport's business; sessions only connect, emit, and register handlers.

mod loopback;

pub use loopback::{EmittedFrame, LoopbackTransport, Responder};

use cnclink_core::{ConnectionError, DataCallback, SubscriptionId};
use serde_json::Value;

/// Handler invoked for every inbound event on a name
pub type TransportHandler = DataCallback<Value>;

/// Named-event duplex channel shared by every session
///
/// Implementations must invoke handlers without holding internal locks, so a
/// handler may register or remove handlers (including itself) while running.
pub trait Transport: Send + Sync {
    /// Open the channel, authenticating with a session token
    fn connect(&self, token: &str) -> Result<(), ConnectionError>;

    /// Close the channel
    fn disconnect(&self);

    /// Whether the channel is currently open
    fn is_connected(&self) -> bool;

    /// Send a payload on a named event
    fn emit(&self, event: &str, payload: Value) -> Result<(), ConnectionError>;

    /// Register a handler for a named event
    fn on(&self, event: &str, handler: TransportHandler) -> SubscriptionId;

    /// Remove one previously registered handler
    ///
    /// Returns true if the handler was found and removed.
    fn off(&self, event: &str, id: SubscriptionId) -> bool;
}
