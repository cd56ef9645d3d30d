//! Motion planning
//!
//! Produces G-code line sequences for jogging, absolute moves and boundary
//! runs. Nothing here talks to a machine; callers hand the lines to
//! `Session::gcode`.

use crate::controls::clamp_jog_speed;
use cnclink_core::{
    round_for, Axis, BoundingBox, HeadType, JogDirection, JogFactor, MeasurementSystem,
    WorkPosition,
};
use serde::{Deserialize, Serialize};

/// Height of the tool lift around a boundary run
pub const Z_CLEARANCE: f64 = 5.0;

/// Feed rate of the tool lift around a boundary run
pub const Z_CLEARANCE_SPEED: f64 = 400.0;

/// Largest B sweep of a four-axis boundary run, in degrees
const MAX_B_SWEEP: f64 = 360.0;

/// One operator jog on one axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JogRequest {
    /// Axis to move
    pub axis: Axis,
    /// Sign of the move
    pub direction: JogDirection,
    /// Distance multiplier
    pub factor: JogFactor,
    /// Base distance in the current units
    pub distance: f64,
}

impl JogRequest {
    /// `direction * factor * distance`
    pub fn signed_value(&self) -> f64 {
        self.direction.sign() * self.factor.value() * self.distance
    }
}

/// Plans motion for one machine at a given unit system and jog speed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionPlanner {
    units: MeasurementSystem,
    jog_speed: f64,
    is_four_axis: bool,
}

impl MotionPlanner {
    /// Create a planner; the jog speed is capped at the maximum
    pub fn new(units: MeasurementSystem, jog_speed: f64, is_four_axis: bool) -> Self {
        Self {
            units,
            jog_speed: clamp_jog_speed(jog_speed),
            is_four_axis,
        }
    }

    /// Unit system used for rounding
    pub fn units(&self) -> MeasurementSystem {
        self.units
    }

    /// Effective jog speed
    pub fn jog_speed(&self) -> f64 {
        self.jog_speed
    }

    /// Relative move by raw per-axis deltas
    ///
    /// Emits `G91`, one `G0` with every axis word, then `G90`. On four-axis
    /// machines the Y delta is negated.
    pub fn jog(&self, deltas: &[(Axis, f64)]) -> Vec<String> {
        if deltas.is_empty() {
            return Vec::new();
        }
        let words = deltas
            .iter()
            .map(|&(axis, value)| {
                let value = if self.is_four_axis && axis == Axis::Y {
                    -value
                } else {
                    value
                };
                self.word(axis, value)
            })
            .collect::<Vec<_>>()
            .join(" ");

        vec![
            "G91".to_string(),
            format!("G0 {} F{}", words, self.jog_speed),
            "G90".to_string(),
        ]
    }

    /// Relative move built from operator jog requests
    pub fn jog_requests(&self, requests: &[JogRequest]) -> Vec<String> {
        let deltas: Vec<(Axis, f64)> = requests
            .iter()
            .map(|r| (r.axis, r.signed_value()))
            .collect();
        self.jog(&deltas)
    }

    /// Absolute rapid move to the given per-axis positions
    pub fn move_to(&self, positions: &[(Axis, f64)]) -> Vec<String> {
        if positions.is_empty() {
            return Vec::new();
        }
        let words = positions
            .iter()
            .map(|&(axis, value)| self.word(axis, value))
            .collect::<Vec<_>>()
            .join(" ");
        vec![format!("G0 {} F{}", words, self.jog_speed)]
    }

    fn word(&self, axis: Axis, value: f64) -> String {
        format!("{}{}", axis.letter(), round_for(self.units, value))
    }
}

/// A corner visited by a boundary run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Sweep axis: X for flat machines, B for four-axis machines
    pub axis: Axis,
    /// Position on the sweep axis
    pub position: f64,
    /// Y position
    pub y: f64,
}

impl Waypoint {
    fn new(axis: Axis, position: f64, y: f64) -> Self {
        Self { axis, position, y }
    }
}

/// Ordered boundary run, optionally framed by a tool lift
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryPath {
    /// Corners in visiting order, ending at the work position
    pub waypoints: Vec<Waypoint>,
    /// Feed rate for the corner moves
    pub jog_speed: f64,
    /// Lift the tool before and drop it after the run
    pub z_clearance: bool,
}

impl BoundaryPath {
    /// G-code for the whole run
    pub fn to_gcode(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.waypoints.len() + 7);
        if self.z_clearance {
            lines.push("G91".to_string());
            lines.push(format!("G0 Z{} F{}", Z_CLEARANCE, Z_CLEARANCE_SPEED));
            lines.push("G90".to_string());
        } else {
            lines.push("G90".to_string());
        }
        for point in &self.waypoints {
            lines.push(format!(
                "G0 {}{} Y{} F{}",
                point.axis.letter(),
                point.position,
                point.y,
                self.jog_speed
            ));
        }
        if self.z_clearance {
            lines.push("G91".to_string());
            lines.push(format!("G0 Z-{} F{}", Z_CLEARANCE, Z_CLEARANCE_SPEED));
            lines.push("G90".to_string());
        }
        lines
    }
}

/// Trace the job's bounding box and return to the work position
///
/// Flat machines visit the four XY corners. Four-axis machines sweep B from
/// 0 to the box's B extent (at most one turn) instead of X.
pub fn run_boundary(
    bbox: &BoundingBox,
    work_position: &WorkPosition,
    jog_speed: f64,
    head_type: HeadType,
    is_four_axis: bool,
) -> BoundaryPath {
    let (min, max) = (&bbox.min, &bbox.max);

    let waypoints = if is_four_axis {
        let min_b = 0.0;
        let max_b = (max.b - min.b).abs().min(MAX_B_SWEEP);
        vec![
            Waypoint::new(Axis::B, min_b, min.y),
            Waypoint::new(Axis::B, min_b, max.y),
            Waypoint::new(Axis::B, max_b, max.y),
            Waypoint::new(Axis::B, max_b, min.y),
            Waypoint::new(Axis::B, work_position.b, work_position.y),
        ]
    } else {
        vec![
            Waypoint::new(Axis::X, min.x, min.y),
            Waypoint::new(Axis::X, min.x, max.y),
            Waypoint::new(Axis::X, max.x, max.y),
            Waypoint::new(Axis::X, max.x, min.y),
            Waypoint::new(Axis::X, min.x, min.y),
            Waypoint::new(Axis::X, work_position.x, work_position.y),
        ]
    };

    BoundaryPath {
        waypoints,
        jog_speed: clamp_jog_speed(jog_speed),
        z_clearance: head_type.needs_z_clearance(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cnclink_core::Coordinates;

    fn planner(four_axis: bool) -> MotionPlanner {
        MotionPlanner::new(MeasurementSystem::Metric, 1500.0, four_axis)
    }

    #[test]
    fn test_jog_overshoot_negative() {
        let request = JogRequest {
            axis: Axis::X,
            direction: JogDirection::Negative,
            factor: JogFactor::Overshoot,
            distance: 5.0,
        };
        assert_eq!(request.signed_value(), -50.0);
        assert_eq!(
            planner(false).jog_requests(&[request]),
            vec!["G91", "G0 X-50 F1500", "G90"]
        );
    }

    #[test]
    fn test_four_axis_inverts_only_y() {
        let lines = planner(true).jog(&[(Axis::X, 1.0), (Axis::Y, 2.0), (Axis::B, 3.0)]);
        assert_eq!(lines[1], "G0 X1 Y-2 B3 F1500");

        let lines = planner(false).jog(&[(Axis::Y, 2.0)]);
        assert_eq!(lines[1], "G0 Y2 F1500");
    }

    #[test]
    fn test_jog_rounds_per_units() {
        let metric = planner(false).jog(&[(Axis::Z, 1.23456)]);
        assert_eq!(metric[1], "G0 Z1.235 F1500");

        let imperial = MotionPlanner::new(MeasurementSystem::Imperial, 50.0, false);
        assert_eq!(imperial.jog(&[(Axis::Z, 0.123456)])[1], "G0 Z0.1235 F50");
    }

    #[test]
    fn test_move_is_single_absolute_line() {
        let lines = planner(true).move_to(&[(Axis::X, 10.0), (Axis::Y, 20.0)]);
        assert_eq!(lines, vec!["G0 X10 Y20 F1500"]);
        assert!(planner(false).move_to(&[]).is_empty());
        assert!(planner(false).jog(&[]).is_empty());
    }

    #[test]
    fn test_planner_caps_jog_speed() {
        assert_eq!(
            MotionPlanner::new(MeasurementSystem::Metric, 10_000.0, false).jog_speed(),
            6000.0
        );
    }

    #[test]
    fn test_boundary_visits_corners_then_work_position() {
        let bbox = BoundingBox::new(Coordinates::xy(0.0, 0.0), Coordinates::xy(100.0, 50.0));
        let path = run_boundary(
            &bbox,
            &Coordinates::xy(10.0, 10.0),
            1500.0,
            HeadType::Laser,
            false,
        );

        let corners: Vec<(f64, f64)> = path.waypoints.iter().map(|w| (w.position, w.y)).collect();
        assert_eq!(
            corners,
            vec![(0.0, 0.0), (0.0, 50.0), (100.0, 50.0), (100.0, 0.0), (0.0, 0.0), (10.0, 10.0)]
        );
        assert!(!path.z_clearance);
        assert_eq!(path.to_gcode()[0], "G90");
        assert_eq!(path.to_gcode()[3], "G0 X100 Y50 F1500");
    }

    #[test]
    fn test_cnc_boundary_lifts_and_drops_tool() {
        let bbox = BoundingBox::new(Coordinates::xy(0.0, 0.0), Coordinates::xy(1.0, 1.0));
        let lines = run_boundary(&bbox, &Coordinates::default(), 800.0, HeadType::Cnc, false)
            .to_gcode();

        assert_eq!(&lines[..4], &["G91", "G0 Z5 F400", "G90", "G0 X0 Y0 F800"]);
        assert_eq!(lines.iter().filter(|l| l.as_str() == "G90").count(), 2);
        assert_eq!(&lines[lines.len() - 3..], &["G91", "G0 Z-5 F400", "G90"]);
    }

    #[test]
    fn test_four_axis_boundary_sweeps_b() {
        let mut min = Coordinates::xy(0.0, -5.0);
        min.b = 30.0;
        let mut max = Coordinates::xy(0.0, 20.0);
        max.b = 500.0;
        let mut work = Coordinates::xy(0.0, 3.0);
        work.b = 45.0;

        let path = run_boundary(&BoundingBox::new(min, max), &work, 1000.0, HeadType::Printing, true);
        let points: Vec<(Axis, f64, f64)> = path
            .waypoints
            .iter()
            .map(|w| (w.axis, w.position, w.y))
            .collect();
        assert_eq!(
            points,
            vec![
                (Axis::B, 0.0, -5.0),
                (Axis::B, 0.0, 20.0),
                (Axis::B, 360.0, 20.0),
                (Axis::B, 360.0, -5.0),
                (Axis::B, 45.0, 3.0),
            ]
        );
        assert_eq!(path.to_gcode()[1], "G0 B0 Y-5 F1000");
    }
}
