//! # CncLink Input
//!
//! Maps physical keyboard chords to semantic machine commands.
//!
//! The [`KeyBindingRouter`] registers a static chord table with a
//! [`KeyCapture`] collaborator and re-emits every match to local
//! subscribers as a [`KeyCommand`] together with the originating
//! [`KeyEvent`].

pub mod bindings;
pub mod capture;
pub mod command;
pub mod router;

pub use bindings::{KeyBinding, KEY_BINDINGS};
pub use capture::{InMemoryKeyCapture, KeyCallback, KeyCapture, KeyEvent};
pub use command::{ControllerCommand, KeyCommand, LeverDirection};
pub use router::{KeyBindingRouter, KeyListener};
