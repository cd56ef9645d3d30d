//! # CncLink Communication
//!
//! Session layer over one shared, named-event transport.
//! Multiplexes the transport into independent machine sessions keyed by
//! [`DataSource`](cnclink_core::DataSource), keeps a per-session snapshot of
//! remote device state, and exposes the outbound command API.

pub mod session;
pub mod transport;

pub use session::{
    CommandOutcome, ControllerRegistry, EventDispatcher, Listener, PendingReply, ReplyHandle,
    Session, SessionSnapshot, StateMap, TelemetrySink, TracingTelemetry,
};

pub use transport::{EmittedFrame, LoopbackTransport, Transport, TransportHandler};
