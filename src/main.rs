use anyhow::Context;
use cnclink::{init_logging, start_sessions, Config, KeyBindingRouter, LoopbackTransport};
use std::path::PathBuf;
use std::sync::Arc;

/// Validate a configuration and bring its sessions up on an in-process
/// transport, reporting what a panel would start with.
fn main() -> anyhow::Result<()> {
    init_logging()?;

    let path = match std::env::args_os().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => cnclink_settings::default_config_path()?,
    };
    let config = Config::load_or_default(&path)
        .with_context(|| format!("loading {}", path.display()))?;

    let transport = Arc::new(LoopbackTransport::new());
    let registry = start_sessions(&config, transport)?;

    let panel = config.machine.jog_panel();
    tracing::info!(
        "Jog panel: {} at {} {}/min, distance {}, head {}",
        panel.units(),
        panel.jog_speed(),
        panel.units().label(),
        panel.distance(),
        panel.head_type()
    );

    let capture = Arc::new(cnclink::InMemoryKeyCapture::new());
    let router = KeyBindingRouter::new(capture);
    router.bind();
    tracing::info!(
        "{} key chords bound for {:?}",
        router.table().len(),
        registry.data_sources()
    );

    registry.disconnect_all();
    Ok(())
}
