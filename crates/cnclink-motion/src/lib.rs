//! # CncLink Motion
//!
//! Turns operator intent into G-code motion sequences.
//!
//! - [`MotionPlanner`]: relative jogs, absolute moves and boundary runs
//! - [`controls`]: jog distance and jog speed limits
//! - [`JogPanel`]: keypad state driven by key commands, workflow changes and
//!   the loaded job's bounding box

pub mod controls;
pub mod panel;
pub mod planner;

pub use controls::{
    clamp_distance, clamp_jog_speed, step_distance, DEFAULT_JOG_SPEED, DISTANCE_MAX,
    DISTANCE_MIN, DISTANCE_STEP, JOG_SPEED_MAX,
};
pub use panel::{JogOptions, JogPanel, PanelAction};
pub use planner::{
    run_boundary, BoundaryPath, JogRequest, MotionPlanner, Waypoint, Z_CLEARANCE,
    Z_CLEARANCE_SPEED,
};
