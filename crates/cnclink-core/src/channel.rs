//! Event channel catalog
//!
//! The set of named channels a session listens to is closed. Every name the
//! backend may send is enumerated here; anything else coming off the wire is
//! reported through [`SessionError::UnknownChannel`] instead of being routed.

use crate::error::SessionError;
use std::fmt;
use std::str::FromStr;

macro_rules! event_channels {
    ($($(#[$doc:meta])* $variant:ident => $wire:literal),+ $(,)?) => {
        /// A channel in the fixed event catalog.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum EventChannel {
            $($(#[$doc])* $variant,)+
        }

        impl EventChannel {
            /// Every channel in catalog order.
            pub const ALL: &'static [EventChannel] = &[$(EventChannel::$variant,)+];

            /// Wire name of the channel
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(EventChannel::$variant => $wire,)+
                }
            }

            /// Look up a channel by its wire name
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($wire => Some(EventChannel::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

event_channels! {
    /// Transport connected.
    Connect => "connect",
    /// Transport failed to connect.
    ConnectError => "connect_error",
    /// Transport connect attempt timed out.
    ConnectTimeout => "connect_timeout",
    /// Generic transport error.
    Error => "error",
    /// Transport disconnected.
    Disconnect => "disconnect",
    /// Transport reconnected.
    Reconnect => "reconnect",
    /// Transport is attempting to reconnect.
    ReconnectAttempt => "reconnect_attempt",
    /// Transport is reconnecting.
    Reconnecting => "reconnecting",
    /// A reconnect attempt failed.
    ReconnectError => "reconnect_error",
    /// Reconnect attempts were exhausted.
    ReconnectFailed => "reconnect_failed",

    /// A machine connection was opened.
    ConnectionOpen => "connection:open",
    /// A machine connection was closed.
    ConnectionClose => "connection:close",
    /// A machine connection finished its handshake.
    ConnectionReady => "connection:ready",
    /// A machine connection reported an error.
    ConnectionError => "connection:error",
    /// Raw data read from a machine connection.
    ConnectionRead => "connection:read",
    /// Raw data written to a machine connection.
    ConnectionWrite => "connection:write",

    /// Available serial ports.
    SerialPortList => "serialport:list",
    /// A serial port was opened.
    SerialPortOpen => "serialport:open",
    /// A serial port was closed.
    SerialPortClose => "serialport:close",

    /// Device status report.
    MachineState => "machine:state",
    /// Device settings report.
    MachineSettings => "machine:settings",
    /// Device heartbeat.
    MachineHeartbeat => "machine:heartbeat",
    /// Network machine discovery results.
    MachineDiscover => "machine:discover",

    /// Workflow run-state changed.
    WorkflowState => "workflow:state",
    /// Sender streaming status.
    SenderStatus => "sender:status",
    /// Feeder queue status.
    FeederStatus => "feeder:status",
    /// Free-form backend message.
    Message => "message",

    /// Toolpath generation progress.
    TaskProgressGenerateToolPath => "taskProgress:generateToolPath",
    /// Toolpath generation finished.
    TaskCompletedGenerateToolPath => "taskCompleted:generateToolPath",
    /// G-code generation progress.
    TaskProgressGenerateGcode => "taskProgress:generateGcode",
    /// G-code generation finished.
    TaskCompletedGenerateGcode => "taskCompleted:generateGcode",
    /// Image processing progress.
    TaskProgressProcessImage => "taskProgress:processImage",
    /// Image processing finished.
    TaskCompletedProcessImage => "taskCompleted:processImage",
    /// Support generation progress.
    TaskProgressGenerateSupport => "taskProgress:generateSupport",
    /// Support generation finished.
    TaskCompletedGenerateSupport => "taskCompleted:generateSupport",
    /// Model simplification progress.
    TaskProgressSimplifyModel => "taskProgress:simplifyModel",
    /// Model simplification finished.
    TaskCompletedSimplifyModel => "taskCompleted:simplifyModel",

    /// Slicing started.
    SliceStarted => "slice:started",
    /// Slicing progress.
    SliceProgress => "slice:progress",
    /// Slicing finished.
    SliceCompleted => "slice:completed",
    /// Slicing failed.
    SliceError => "slice:error",
}

impl EventChannel {
    /// Channels raised by the transport itself rather than the backend
    pub fn is_transport_lifecycle(&self) -> bool {
        matches!(
            self,
            EventChannel::Connect
                | EventChannel::ConnectError
                | EventChannel::ConnectTimeout
                | EventChannel::Error
                | EventChannel::Disconnect
                | EventChannel::Reconnect
                | EventChannel::ReconnectAttempt
                | EventChannel::Reconnecting
                | EventChannel::ReconnectError
                | EventChannel::ReconnectFailed
        )
    }

    /// Channels reporting progress or completion of a backend task
    pub fn is_task(&self) -> bool {
        let name = self.as_str();
        name.starts_with("taskProgress:")
            || name.starts_with("taskCompleted:")
            || name.starts_with("slice:")
    }

    /// Channels announcing a newly opened machine port
    pub fn is_port_open(&self) -> bool {
        matches!(self, EventChannel::ConnectionOpen | EventChannel::SerialPortOpen)
    }

    /// Channels announcing a closed machine port
    pub fn is_port_close(&self) -> bool {
        matches!(
            self,
            EventChannel::ConnectionClose | EventChannel::SerialPortClose
        )
    }
}

impl fmt::Display for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventChannel {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| SessionError::UnknownChannel {
            name: s.to_string(),
        })
    }
}
