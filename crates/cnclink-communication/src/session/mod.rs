//! Machine sessions over a shared transport
//!
//! - [`ControllerRegistry`]: one [`Session`] per data source
//! - [`EventDispatcher`]: ordered per-channel subscriber lists
//! - [`SessionSnapshot`]: last known remote device state
//! - Outbound commands and correlated replies ([`PendingReply`])
//! - Heartbeat telemetry ([`TelemetrySink`])

mod command;
mod controller;
mod dispatcher;
mod registry;
mod state;
mod telemetry;

pub use command::{CommandOutcome, PendingReply, ReplyHandle, COMMAND_EVENT, WRITELN_EVENT};
pub use controller::Session;
pub use dispatcher::{EventDispatcher, Listener};
pub use registry::ControllerRegistry;
pub use state::{PortClosure, SessionSnapshot, StateMap};
pub use telemetry::{HeartbeatRecord, TelemetrySink, TracingTelemetry};
