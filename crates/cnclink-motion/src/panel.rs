//! Jog panel state
//!
//! Tracks what the operator's keypad needs between key presses: units, jog
//! speed, jog distance, the selected axis, the machine's work position and
//! the bounding box of the loaded job. Manual motion is only allowed while
//! the workflow is idle.

use crate::controls::{clamp_distance, clamp_jog_speed, step_distance, DEFAULT_JOG_SPEED};
use crate::planner::{run_boundary, JogRequest, MotionPlanner};
use cnclink_communication::{CommandOutcome, Session};
use cnclink_core::units::convert_length;
use cnclink_core::{
    round_for, Axis, BoundingBox, HeadType, JogDirection, JogFactor, MeasurementSystem,
    WorkPosition, WorkflowState,
};
use cnclink_input::{ControllerCommand, KeyCommand, LeverDirection};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Initial panel configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JogOptions {
    /// Unit system
    pub units: MeasurementSystem,
    /// Jog speed in units per minute
    pub jog_speed: f64,
    /// Base jog distance
    pub custom_distance: f64,
    /// Rotary four-axis machine
    pub is_four_axis: bool,
    /// Mounted tool head
    pub head_type: HeadType,
}

impl Default for JogOptions {
    fn default() -> Self {
        Self {
            units: MeasurementSystem::Metric,
            jog_speed: DEFAULT_JOG_SPEED,
            custom_distance: 1.0,
            is_four_axis: false,
            head_type: HeadType::default(),
        }
    }
}

/// What a key command asks the caller to do
#[derive(Debug, Clone, PartialEq)]
pub enum PanelAction {
    /// Nothing to send
    None,
    /// Send these G-code lines
    Gcode(Vec<String>),
    /// Forward a controller command
    Controller(ControllerCommand),
}

/// Keypad state for one machine
#[derive(Debug, Clone, PartialEq)]
pub struct JogPanel {
    units: MeasurementSystem,
    jog_speed: f64,
    distance: f64,
    is_four_axis: bool,
    head_type: HeadType,
    selected_axis: Option<Axis>,
    keypad_enabled: bool,
    workflow_state: WorkflowState,
    work_position: WorkPosition,
    bbox: BoundingBox,
}

impl Default for JogPanel {
    fn default() -> Self {
        Self::new(JogOptions::default())
    }
}

impl JogPanel {
    /// Create a panel; speed and distance are clamped
    pub fn new(options: JogOptions) -> Self {
        Self {
            units: options.units,
            jog_speed: clamp_jog_speed(options.jog_speed),
            distance: round_for(options.units, clamp_distance(options.custom_distance)),
            is_four_axis: options.is_four_axis,
            head_type: options.head_type,
            selected_axis: None,
            keypad_enabled: true,
            workflow_state: WorkflowState::Idle,
            work_position: WorkPosition::default(),
            bbox: BoundingBox::zero(),
        }
    }

    /// Unit system
    pub fn units(&self) -> MeasurementSystem {
        self.units
    }

    /// Jog speed in units per minute
    pub fn jog_speed(&self) -> f64 {
        self.jog_speed
    }

    /// Base jog distance in the current units
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Rotary four-axis machine
    pub fn is_four_axis(&self) -> bool {
        self.is_four_axis
    }

    /// Mounted tool head
    pub fn head_type(&self) -> HeadType {
        self.head_type
    }

    /// Axis driven by `jog_selected`
    pub fn selected_axis(&self) -> Option<Axis> {
        self.selected_axis
    }

    /// Whether keypad jogging is enabled
    pub fn is_keypad_enabled(&self) -> bool {
        self.keypad_enabled
    }

    /// Last workflow state followed by the panel
    pub fn workflow_state(&self) -> WorkflowState {
        self.workflow_state
    }

    /// Last reported work position
    pub fn work_position(&self) -> WorkPosition {
        self.work_position
    }

    /// Bounding box of the loaded job
    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// Planner for the current units, speed and machine kind
    pub fn planner(&self) -> MotionPlanner {
        MotionPlanner::new(self.units, self.jog_speed, self.is_four_axis)
    }

    /// Set the jog speed, capped at the maximum
    pub fn set_jog_speed(&mut self, speed: f64) {
        self.jog_speed = clamp_jog_speed(speed);
    }

    /// Set the jog distance, clamped and rounded for the current units
    pub fn set_distance(&mut self, distance: f64) {
        self.distance = round_for(self.units, clamp_distance(distance));
    }

    /// Step the jog distance up by one lever increment
    pub fn increase_distance(&mut self) {
        self.distance = round_for(self.units, step_distance(self.distance, 1));
    }

    /// Step the jog distance down by one lever increment
    pub fn decrease_distance(&mut self) {
        self.distance = round_for(self.units, step_distance(self.distance, -1));
    }

    /// Switch units, converting the jog distance
    pub fn set_units(&mut self, units: MeasurementSystem) {
        if units == self.units {
            return;
        }
        let converted = convert_length(self.distance, self.units, units);
        self.units = units;
        self.distance = round_for(units, clamp_distance(converted));
        tracing::debug!("Jog distance now {} {}", self.distance, units.label());
    }

    /// Change the machine kind
    pub fn set_machine(&mut self, head_type: HeadType, is_four_axis: bool) {
        self.head_type = head_type;
        self.is_four_axis = is_four_axis;
    }

    /// Update the reported work position
    pub fn set_work_position(&mut self, position: WorkPosition) {
        self.work_position = position;
    }

    /// Follow a workflow transition
    ///
    /// Leaving idle disables the keypad and clears the selected axis; only a
    /// return to idle enables the keypad again.
    pub fn on_workflow_state(&mut self, state: WorkflowState) {
        self.workflow_state = state;
        if state.allows_manual_control() {
            self.keypad_enabled = true;
        } else {
            if self.keypad_enabled || self.selected_axis.is_some() {
                tracing::debug!("Keypad disabled while workflow is {}", state);
            }
            self.keypad_enabled = false;
            self.selected_axis = None;
        }
    }

    /// Toggle keypad jogging; refused unless the workflow is idle
    pub fn set_keypad_enabled(&mut self, enabled: bool) -> bool {
        if enabled && !self.workflow_state.allows_manual_control() {
            return false;
        }
        self.keypad_enabled = enabled;
        true
    }

    /// Toggle the axis driven by `jog_selected`; refused unless idle
    pub fn select_axis(&mut self, axis: Axis) -> bool {
        if !self.workflow_state.allows_manual_control() {
            return false;
        }
        self.selected_axis = if self.selected_axis == Some(axis) {
            None
        } else {
            Some(axis)
        };
        true
    }

    /// Store the bounding box published with `gcode:bbox`
    pub fn on_bbox(&mut self, payload: &Value) -> cnclink_core::Result<()> {
        self.bbox = serde_json::from_value(payload.clone())?;
        Ok(())
    }

    /// Forget the bounding box after `gcode:unload`
    pub fn on_unload(&mut self) {
        self.bbox = BoundingBox::zero();
    }

    fn can_jog(&self) -> bool {
        self.keypad_enabled && self.workflow_state.allows_manual_control()
    }

    /// Lines for one jog at the panel distance, if jogging is allowed
    pub fn jog(&self, axis: Axis, direction: JogDirection, factor: JogFactor) -> Option<Vec<String>> {
        if !self.can_jog() {
            return None;
        }
        let request = JogRequest {
            axis,
            direction,
            factor,
            distance: self.distance,
        };
        Some(self.planner().jog_requests(&[request]))
    }

    /// Jog the selected axis, if one is selected
    pub fn jog_selected(&self, direction: JogDirection, factor: JogFactor) -> Option<Vec<String>> {
        self.jog(self.selected_axis?, direction, factor)
    }

    /// Lines for a boundary run around the tracked box
    pub fn run_boundary(&self) -> Vec<String> {
        run_boundary(
            &self.bbox,
            &self.work_position,
            self.jog_speed,
            self.head_type,
            self.is_four_axis,
        )
        .to_gcode()
    }

    /// React to a routed key command
    pub fn handle_key_command(&mut self, command: &KeyCommand) -> PanelAction {
        match *command {
            KeyCommand::Controller(cmd) => PanelAction::Controller(cmd),
            KeyCommand::Jog {
                axis,
                direction,
                factor,
            } => match self.jog(axis, direction, factor) {
                Some(lines) => PanelAction::Gcode(lines),
                None => {
                    tracing::debug!("Ignoring jog on {}: keypad disabled", axis);
                    PanelAction::None
                }
            },
            KeyCommand::SelectAxis(axis) => {
                self.select_axis(axis);
                PanelAction::None
            }
            KeyCommand::JogLeverSwitch(LeverDirection::Forward) => {
                self.increase_distance();
                PanelAction::None
            }
            KeyCommand::JogLeverSwitch(LeverDirection::Backward) => {
                self.decrease_distance();
                PanelAction::None
            }
        }
    }

    /// Handle a key command and send whatever it produces on the session
    ///
    /// The panel first follows the session's workflow state, so jogs and axis
    /// selection are refused while the machine is not idle.
    pub fn apply(&mut self, session: &Session, command: &KeyCommand) -> Option<CommandOutcome> {
        let state = session.workflow_state();
        if state != self.workflow_state {
            self.on_workflow_state(state);
        }
        match self.handle_key_command(command) {
            PanelAction::None => None,
            PanelAction::Gcode(lines) => Some(session.gcode(&lines)),
            PanelAction::Controller(cmd) => Some(session.command(cmd.as_str(), Vec::new())),
        }
    }
}
