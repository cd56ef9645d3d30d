//! Jog distance and speed limits

/// Smallest jog distance
pub const DISTANCE_MIN: f64 = 0.001;

/// Largest jog distance
pub const DISTANCE_MAX: f64 = 1000.0;

/// Increment applied by the distance lever
pub const DISTANCE_STEP: f64 = 0.1;

/// Jog speed ceiling in units per minute
pub const JOG_SPEED_MAX: f64 = 6000.0;

/// Jog speed used when none is configured
pub const DEFAULT_JOG_SPEED: f64 = 1500.0;

/// Clamp a jog distance to `[DISTANCE_MIN, DISTANCE_MAX]`
///
/// NaN collapses to the minimum.
pub fn clamp_distance(distance: f64) -> f64 {
    if distance.is_nan() {
        return DISTANCE_MIN;
    }
    distance.clamp(DISTANCE_MIN, DISTANCE_MAX)
}

/// Move a distance by `steps` lever increments and re-clamp
pub fn step_distance(distance: f64, steps: i32) -> f64 {
    clamp_distance(distance + f64::from(steps) * DISTANCE_STEP)
}

/// Cap a jog speed at `JOG_SPEED_MAX`; negative and NaN speeds become 0
pub fn clamp_jog_speed(speed: f64) -> f64 {
    if speed.is_nan() {
        return 0.0;
    }
    speed.clamp(0.0, JOG_SPEED_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_clamp() {
        assert_eq!(clamp_distance(0.0), DISTANCE_MIN);
        assert_eq!(clamp_distance(5000.0), DISTANCE_MAX);
        assert_eq!(clamp_distance(2.5), 2.5);
        assert_eq!(clamp_distance(f64::NAN), DISTANCE_MIN);
    }

    #[test]
    fn test_step_distance_reclamps() {
        assert_eq!(step_distance(DISTANCE_MAX, 1), DISTANCE_MAX);
        assert_eq!(step_distance(DISTANCE_MIN, -1), DISTANCE_MIN);
        assert!((step_distance(1.0, 1) - 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_jog_speed_cap() {
        assert_eq!(clamp_jog_speed(9000.0), JOG_SPEED_MAX);
        assert_eq!(clamp_jog_speed(1500.0), 1500.0);
        assert_eq!(clamp_jog_speed(-5.0), 0.0);
    }
}
