//! Data models shared by the session and motion layers
//!
//! This module provides:
//! - Data source keys distinguishing logical machine sessions
//! - Workflow (run-state) enumeration
//! - Axis identifiers and multi-axis coordinates
//! - Jog direction and distance factor
//! - Job bounding boxes
//! - Tool head families

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical channel key distinguishing machine sessions sharing one transport
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataSource(String);

impl DataSource {
    /// Line-based text protocol (classic serial G-code stream)
    pub const TEXT_PROTOCOL: &'static str = "text-protocol";
    /// Framed protocol used by touchscreen-equipped machines
    pub const SCREEN_PROTOCOL: &'static str = "screen-protocol";

    /// Create a data source key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The text protocol data source
    pub fn text_protocol() -> Self {
        Self::new(Self::TEXT_PROTOCOL)
    }

    /// The screen protocol data source
    pub fn screen_protocol() -> Self {
        Self::new(Self::SCREEN_PROTOCOL)
    }

    /// Borrow the key
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DataSource {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for DataSource {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl PartialEq<str> for DataSource {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Machine run-state as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowState {
    /// Ready for manual control
    #[default]
    Idle,
    /// Executing a job
    Running,
    /// Job suspended
    Paused,
    /// Not yet reported or unrecognized
    Unknown,
}

impl WorkflowState {
    /// Parse a wire value, falling back to `Unknown` for anything unrecognized
    pub fn from_wire(value: &str) -> Self {
        match value {
            "idle" => Self::Idle,
            "running" => Self::Running,
            "paused" => Self::Paused,
            _ => Self::Unknown,
        }
    }

    /// Whether manual jogging is allowed in this state
    pub fn allows_manual_control(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Axis identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// X-axis (left-right)
    X,
    /// Y-axis (front-back)
    Y,
    /// Z-axis (up-down)
    Z,
    /// A-axis (rotary around X)
    A,
    /// B-axis (rotary around Y, used by four-axis machines)
    B,
}

impl Axis {
    /// All axes in word order
    pub const ALL: [Axis; 5] = [Axis::X, Axis::Y, Axis::Z, Axis::A, Axis::B];

    /// G-code word letter
    pub fn letter(&self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
            Axis::A => 'A',
            Axis::B => 'B',
        }
    }

    /// Parse an axis letter (case-insensitive)
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'X' => Some(Axis::X),
            'Y' => Some(Axis::Y),
            'Z' => Some(Axis::Z),
            'A' => Some(Axis::A),
            'B' => Some(Axis::B),
            _ => None,
        }
    }

    /// Rotary axes are expressed in degrees and never unit-converted
    pub fn is_rotary(&self) -> bool {
        matches!(self, Axis::A | Axis::B)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Direction of a jog move along an axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JogDirection {
    /// Towards lower coordinates
    Negative,
    /// Towards higher coordinates
    Positive,
}

impl JogDirection {
    /// -1.0 or +1.0
    pub fn sign(&self) -> f64 {
        match self {
            Self::Negative => -1.0,
            Self::Positive => 1.0,
        }
    }
}

/// Multiplier applied to the base jog distance
///
/// Ordered so that `Undershoot < Normal < Overshoot`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum JogFactor {
    /// Fine positioning (x0.1)
    Undershoot,
    /// Base distance (x1)
    #[default]
    Normal,
    /// Coarse positioning (x10)
    Overshoot,
}

impl JogFactor {
    /// Numeric multiplier
    pub fn value(&self) -> f64 {
        match self {
            Self::Undershoot => 0.1,
            Self::Normal => 1.0,
            Self::Overshoot => 10.0,
        }
    }
}

/// Coordinates on every supported axis
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Coordinates {
    /// X position
    pub x: f64,
    /// Y position
    pub y: f64,
    /// Z position
    pub z: f64,
    /// A position (degrees)
    pub a: f64,
    /// B position (degrees)
    pub b: f64,
}

impl Coordinates {
    /// Create XY coordinates with the remaining axes at zero
    pub fn xy(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }

    /// Value on one axis
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
            Axis::A => self.a,
            Axis::B => self.b,
        }
    }

    /// Set the value on one axis
    pub fn set(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
            Axis::A => self.a = value,
            Axis::B => self.b = value,
        }
    }
}

/// Current work position reported by the machine
pub type WorkPosition = Coordinates;

/// Axis-aligned bounding box of the loaded job
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner
    pub min: Coordinates,
    /// Maximum corner
    pub max: Coordinates,
}

impl BoundingBox {
    /// Create a bounding box from its corners
    pub fn new(min: Coordinates, max: Coordinates) -> Self {
        Self { min, max }
    }

    /// The all-zero box used when no job is loaded
    pub fn zero() -> Self {
        Self::default()
    }

    /// Whether every coordinate is zero
    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }
}

/// Tool head family mounted on the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadType {
    /// Fused filament printing head
    #[default]
    Printing,
    /// Laser engraving head
    Laser,
    /// Carving spindle
    Cnc,
}

impl HeadType {
    /// Heads carrying a cutting tool that must be lifted before travel moves
    pub fn needs_z_clearance(&self) -> bool {
        matches!(self, HeadType::Cnc)
    }
}

impl fmt::Display for HeadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Printing => write!(f, "printing"),
            Self::Laser => write!(f, "laser"),
            Self::Cnc => write!(f, "cnc"),
        }
    }
}
