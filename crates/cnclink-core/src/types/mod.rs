//! Type system utilities and aliases.
//!
//! - [`aliases`]: Type aliases for shared locks and callbacks

pub mod aliases;

pub use aliases::*;
