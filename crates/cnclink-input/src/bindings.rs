//! Static chord table

use crate::command::{ControllerCommand, KeyCommand, LeverDirection};
use cnclink_core::{Axis, JogDirection, JogFactor};
use Axis::{A, X, Y, Z};
use JogDirection::{Negative, Positive};
use JogFactor::{Normal, Overshoot, Undershoot};

/// One chord and the command it produces
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyBinding {
    /// Chord in capture syntax, e.g. `shift+up`
    pub keys: &'static str,
    /// Command emitted on match
    pub command: KeyCommand,
    /// Suppress the host toolkit's own handling of the chord
    pub prevent_default: bool,
}

const fn controller(keys: &'static str, command: ControllerCommand) -> KeyBinding {
    KeyBinding {
        keys,
        command: KeyCommand::Controller(command),
        prevent_default: true,
    }
}

const fn jog(
    keys: &'static str,
    axis: Axis,
    direction: JogDirection,
    factor: JogFactor,
) -> KeyBinding {
    KeyBinding {
        keys,
        command: KeyCommand::Jog {
            axis,
            direction,
            factor,
        },
        // Arrow keys keep scrolling disabled while jogging
        prevent_default: true,
    }
}

const fn select_axis(keys: &'static str, axis: Axis) -> KeyBinding {
    KeyBinding {
        keys,
        command: KeyCommand::SelectAxis(axis),
        prevent_default: true,
    }
}

const fn lever(keys: &'static str, direction: LeverDirection) -> KeyBinding {
    KeyBinding {
        keys,
        command: KeyCommand::JogLeverSwitch(direction),
        prevent_default: false,
    }
}

/// Every chord the router registers
///
/// Plain keys jog by the panel distance, `alt+` jogs a tenth of it and
/// `shift+` ten times it.
pub static KEY_BINDINGS: &[KeyBinding] = &[
    controller("!", ControllerCommand::CycleStart),
    controller("~", ControllerCommand::FeedHold),
    controller("ctrl+alt+h", ControllerCommand::Homing),
    controller("ctrl+alt+u", ControllerCommand::Unlock),
    controller("ctrl+alt+r", ControllerCommand::Reset),
    controller("ctrl+alt+s", ControllerCommand::Sleep),
    // X
    jog("right", X, Positive, Normal),
    jog("left", X, Negative, Normal),
    jog("alt+right", X, Positive, Undershoot),
    jog("alt+left", X, Negative, Undershoot),
    jog("shift+right", X, Positive, Overshoot),
    jog("shift+left", X, Negative, Overshoot),
    // Y
    jog("up", Y, Positive, Normal),
    jog("down", Y, Negative, Normal),
    jog("alt+up", Y, Positive, Undershoot),
    jog("alt+down", Y, Negative, Undershoot),
    jog("shift+up", Y, Positive, Overshoot),
    jog("shift+down", Y, Negative, Overshoot),
    // Z
    jog("pageup", Z, Positive, Normal),
    jog("pagedown", Z, Negative, Normal),
    jog("alt+pageup", Z, Positive, Undershoot),
    jog("alt+pagedown", Z, Negative, Undershoot),
    jog("shift+pageup", Z, Positive, Overshoot),
    jog("shift+pagedown", Z, Negative, Overshoot),
    // A
    jog("end", A, Positive, Normal),
    jog("home", A, Negative, Normal),
    jog("alt+end", A, Positive, Undershoot),
    jog("alt+home", A, Negative, Undershoot),
    jog("shift+end", A, Positive, Overshoot),
    jog("shift+home", A, Negative, Overshoot),
    select_axis("ctrl+alt+x", X),
    select_axis("ctrl+alt+y", Y),
    select_axis("ctrl+alt+z", Z),
    select_axis("ctrl+alt+a", A),
    lever("[", LeverDirection::Backward),
    lever("]", LeverDirection::Forward),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::normalize_chord;
    use std::collections::HashSet;

    #[test]
    fn test_chords_are_unique() {
        let chords: HashSet<String> = KEY_BINDINGS.iter().map(|b| normalize_chord(b.keys)).collect();
        assert_eq!(chords.len(), KEY_BINDINGS.len());
    }

    #[test]
    fn test_every_jog_axis_has_all_factors() {
        for axis in [X, Y, Z, A] {
            let count = KEY_BINDINGS
                .iter()
                .filter(|b| matches!(b.command, KeyCommand::Jog { axis: a, .. } if a == axis))
                .count();
            assert_eq!(count, 6, "axis {axis}");
        }
    }
}
