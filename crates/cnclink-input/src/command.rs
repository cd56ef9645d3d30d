//! Semantic commands produced by key chords

use cnclink_core::{Axis, JogDirection, JogFactor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Commands forwarded to the controller without motion planning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerCommand {
    /// Resume a held program
    CycleStart,
    /// Hold motion
    FeedHold,
    /// Run the homing cycle
    Homing,
    /// Clear an alarm lock
    Unlock,
    /// Soft reset
    Reset,
    /// Enter sleep mode
    Sleep,
}

impl ControllerCommand {
    /// Command name understood by the backend `command` event
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CycleStart => "cyclestart",
            Self::FeedHold => "feedhold",
            Self::Homing => "homing",
            Self::Unlock => "unlock",
            Self::Reset => "reset",
            Self::Sleep => "sleep",
        }
    }
}

impl fmt::Display for ControllerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of the jog distance lever
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeverDirection {
    /// Step the jog distance down
    Backward,
    /// Step the jog distance up
    Forward,
}

/// Semantic command carried by a key binding
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyCommand {
    /// Forward a controller command
    #[serde(rename = "CONTROLLER_COMMAND")]
    Controller(ControllerCommand),
    /// Jog one axis by the panel distance
    Jog {
        /// Axis to move
        axis: Axis,
        /// Sign of the move
        direction: JogDirection,
        /// Distance multiplier
        factor: JogFactor,
    },
    /// Toggle the axis driven by the jog wheel
    SelectAxis(Axis),
    /// Step the jog distance
    JogLeverSwitch(LeverDirection),
}

impl KeyCommand {
    /// Semantic command name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Controller(_) => "CONTROLLER_COMMAND",
            Self::Jog { .. } => "JOG",
            Self::SelectAxis(_) => "SELECT_AXIS",
            Self::JogLeverSwitch(_) => "JOG_LEVER_SWITCH",
        }
    }

    /// Payload in wire form
    pub fn payload(&self) -> Value {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => map.remove("payload").unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }
}
