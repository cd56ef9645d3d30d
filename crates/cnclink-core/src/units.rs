//! Unit conversion utilities
//!
//! Handles conversion between Metric (mm) and Imperial (inch) systems and the
//! fixed-point rounding applied to every length before it reaches G-code:
//! metric values keep 3 decimals, imperial values keep 4.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Millimeters per inch
pub const MM_PER_INCH: f64 = 25.4;

/// Decimal places kept for metric lengths
pub const METRIC_DECIMALS: i32 = 3;

/// Decimal places kept for imperial lengths
pub const IMPERIAL_DECIMALS: i32 = 4;

/// Measurement system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementSystem {
    /// Metric system (mm), selected by G21
    #[default]
    Metric,
    /// Imperial system (inches), selected by G20
    Imperial,
}

impl MeasurementSystem {
    /// Decimal places kept when rounding lengths in this system
    pub fn decimals(&self) -> i32 {
        match self {
            Self::Metric => METRIC_DECIMALS,
            Self::Imperial => IMPERIAL_DECIMALS,
        }
    }

    /// Unit label ("mm" or "in")
    pub fn label(&self) -> &'static str {
        match self {
            Self::Metric => "mm",
            Self::Imperial => "in",
        }
    }

    /// Modal G-code word selecting this system
    pub fn gcode(&self) -> &'static str {
        match self {
            Self::Metric => "G21",
            Self::Imperial => "G20",
        }
    }
}

impl fmt::Display for MeasurementSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metric => write!(f, "Metric"),
            Self::Imperial => write!(f, "Imperial"),
        }
    }
}

impl FromStr for MeasurementSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "metric" | "mm" | "g21" => Ok(Self::Metric),
            "imperial" | "inch" | "in" | "g20" => Ok(Self::Imperial),
            _ => Err(format!("Unknown measurement system: {}", s)),
        }
    }
}

/// Convert millimeters to inches
pub fn mm2in(value: f64) -> f64 {
    value / MM_PER_INCH
}

/// Convert inches to millimeters
pub fn in2mm(value: f64) -> f64 {
    value * MM_PER_INCH
}

/// Round to a fixed number of decimal places, returning a number
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    let rounded = (value * scale).round() / scale;
    // Avoid emitting "-0" in G-code words
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Round a length with the precision of its measurement system
pub fn round_for(system: MeasurementSystem, value: f64) -> f64 {
    round_to(value, system.decimals())
}

/// Convert a length between systems and round it for the target system
pub fn convert_length(value: f64, from: MeasurementSystem, to: MeasurementSystem) -> f64 {
    let converted = match (from, to) {
        (MeasurementSystem::Metric, MeasurementSystem::Imperial) => mm2in(value),
        (MeasurementSystem::Imperial, MeasurementSystem::Metric) => in2mm(value),
        _ => value,
    };
    round_for(to, converted)
}

/// Format a length for display in the given system
pub fn format_length(value: f64, system: MeasurementSystem) -> String {
    format!(
        "{:.*} {}",
        system.decimals() as usize,
        round_for(system, value),
        system.label()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mm_to_inch() {
        assert_eq!(round_for(MeasurementSystem::Imperial, mm2in(25.4)), 1.0);
        assert_eq!(round_for(MeasurementSystem::Imperial, mm2in(1.0)), 0.0394);
        assert_eq!(in2mm(1.0), 25.4);
    }

    #[test]
    fn test_metric_rounding() {
        assert_eq!(round_for(MeasurementSystem::Metric, 1.23456), 1.235);
        assert_eq!(round_for(MeasurementSystem::Metric, 0.1 * 3.0), 0.3);
        assert_eq!(round_for(MeasurementSystem::Imperial, 1.23456), 1.2346);
    }

    #[test]
    fn test_negative_zero_is_normalized() {
        let value = round_for(MeasurementSystem::Metric, -0.0001);
        assert_eq!(format!("{}", value), "0");
    }

    #[test]
    fn test_convert_length() {
        assert_eq!(
            convert_length(10.0, MeasurementSystem::Metric, MeasurementSystem::Imperial),
            0.3937
        );
        assert_eq!(
            convert_length(1.0, MeasurementSystem::Imperial, MeasurementSystem::Metric),
            25.4
        );
        assert_eq!(
            convert_length(5.0, MeasurementSystem::Metric, MeasurementSystem::Metric),
            5.0
        );
    }

    #[test]
    fn test_parse_and_format() {
        assert_eq!("mm".parse::<MeasurementSystem>(), Ok(MeasurementSystem::Metric));
        assert_eq!("G20".parse::<MeasurementSystem>(), Ok(MeasurementSystem::Imperial));
        assert!("furlong".parse::<MeasurementSystem>().is_err());
        assert_eq!(format_length(12.5, MeasurementSystem::Metric), "12.500 mm");
        assert_eq!(format_length(1.0, MeasurementSystem::Imperial), "1.0000 in");
    }
}
