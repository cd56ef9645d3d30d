//! # CncLink
//!
//! Connection and command session layer for CNC, laser and 3D-printer
//! control panels.
//!
//! ## Architecture
//!
//! CncLink is organized as a workspace with multiple crates:
//!
//! 1. **cnclink-core** - Channel catalog, data sources, units, errors
//! 2. **cnclink-communication** - Transport trait, sessions, registry, correlated replies
//! 3. **cnclink-motion** - Jog, move and boundary-run planning, jog panel state
//! 4. **cnclink-input** - Keyboard chord routing
//! 5. **cnclink-settings** - Configuration files
//! 6. **cnclink** - Re-exports, logging and start-up wiring

pub use cnclink_communication::{
    CommandOutcome, ControllerRegistry, EventDispatcher, LoopbackTransport, PendingReply,
    ReplyHandle, Session, SessionSnapshot, StateMap, TelemetrySink, TracingTelemetry, Transport,
};

pub use cnclink_core::{
    Axis, BoundingBox, ConnectionError, Coordinates, DataSource, Error, EventChannel, HeadType,
    JogDirection, JogFactor, MeasurementSystem, Result, SessionError, SubscriptionId,
    WorkPosition, WorkflowState,
};

pub use cnclink_input::{
    ControllerCommand, InMemoryKeyCapture, KeyBinding, KeyBindingRouter, KeyCapture, KeyCommand,
    KeyEvent, LeverDirection,
};

pub use cnclink_motion::{run_boundary, BoundaryPath, JogPanel, JogRequest, MotionPlanner};

pub use cnclink_settings::{Config, MachineSettings, SettingsError, TransportSettings};

use std::sync::Arc;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Build a registry holding a session for every configured data source
///
/// Sessions are connected with the configured token when the transport
/// accepts it.
pub fn start_sessions(
    config: &Config,
    transport: Arc<dyn Transport>,
) -> std::result::Result<ControllerRegistry, ConnectionError> {
    let registry = ControllerRegistry::new(transport);
    for data_source in &config.data_sources {
        registry.get(data_source.clone());
    }
    registry.connect_all(&config.transport.token())?;
    tracing::info!(
        "Started {} session(s) against {}",
        registry.len(),
        config.transport.url
    );
    Ok(registry)
}
