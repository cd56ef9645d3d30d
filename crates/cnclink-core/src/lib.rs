//! # CncLink Core
//!
//! Core types shared by every CncLink crate.
//! Provides the closed event channel catalog, data source keys,
//! workflow state, axes, bounding boxes, unit conversion, and the
//! error taxonomy used across the session layer.

pub mod channel;
pub mod data;
pub mod error;
pub mod subscription;
pub mod types;
pub mod units;

pub use channel::EventChannel;

pub use data::{
    Axis, BoundingBox, Coordinates, DataSource, HeadType, JogDirection, JogFactor, WorkPosition,
    WorkflowState,
};

pub use error::{ConnectionError, Error, Result, SessionError};

pub use subscription::SubscriptionId;

pub use types::{thread_safe_rw, DataCallback, ThreadSafeRw};

pub use units::{in2mm, mm2in, round_for, MeasurementSystem};
