use cnclink_core::{Axis, JogDirection, JogFactor, MeasurementSystem};
use cnclink_motion::{
    clamp_distance, clamp_jog_speed, step_distance, JogPanel, JogRequest, MotionPlanner,
    DISTANCE_MAX, DISTANCE_MIN, JOG_SPEED_MAX,
};
use proptest::prelude::*;

fn direction() -> impl Strategy<Value = JogDirection> {
    prop_oneof![Just(JogDirection::Negative), Just(JogDirection::Positive)]
}

fn factor() -> impl Strategy<Value = JogFactor> {
    prop_oneof![
        Just(JogFactor::Undershoot),
        Just(JogFactor::Normal),
        Just(JogFactor::Overshoot)
    ]
}

proptest! {
    #[test]
    fn distance_always_within_bounds(distance in proptest::num::f64::ANY, steps in -50i32..50) {
        let clamped = clamp_distance(distance);
        prop_assert!((DISTANCE_MIN..=DISTANCE_MAX).contains(&clamped));

        let stepped = step_distance(clamped, steps);
        prop_assert!((DISTANCE_MIN..=DISTANCE_MAX).contains(&stepped));
    }

    #[test]
    fn jog_speed_never_exceeds_maximum(speed in proptest::num::f64::ANY) {
        prop_assert!(clamp_jog_speed(speed) <= JOG_SPEED_MAX);

        let mut panel = JogPanel::default();
        panel.set_jog_speed(speed);
        prop_assert!(panel.jog_speed() <= JOG_SPEED_MAX);
    }

    #[test]
    fn displacement_follows_sign_and_magnitude(
        distance in 0.001f64..1000.0,
        direction in direction(),
        factor in factor(),
    ) {
        let request = JogRequest { axis: Axis::X, direction, factor, distance };
        let value = request.signed_value();
        prop_assert_eq!(value.signum(), direction.sign());
        prop_assert!((value.abs() - distance * factor.value()).abs() < 1e-9);
    }

    #[test]
    fn four_axis_flips_only_y(value in -100.0f64..100.0) {
        let flat = MotionPlanner::new(MeasurementSystem::Metric, 1000.0, false);
        let rotary = MotionPlanner::new(MeasurementSystem::Metric, 1000.0, true);

        prop_assert_eq!(flat.jog(&[(Axis::X, value)]), rotary.jog(&[(Axis::X, value)]));
        prop_assert_eq!(flat.jog(&[(Axis::Y, value)]), rotary.jog(&[(Axis::Y, -value)]));
    }
}
