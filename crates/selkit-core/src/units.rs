//! Unit conversion utilities
//!
//! Handles display of model lengths in Metric (mm) and Imperial (inch)
//! systems. Pick coordinates are stored in millimeters throughout the
//! engine; formatting converts on the way out.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Measurement system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementSystem {
    /// Metric system (mm)
    Metric,
    /// Imperial system (inches)
    Imperial,
}

impl Default for MeasurementSystem {
    fn default() -> Self {
        Self::Metric
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
            "metric" | "mm" => Ok(Self::Metric),
            "imperial" | "inch" | "in" => Ok(Self::Imperial),
            _ => Err(format!("Unknown measurement system: {}", s)),
        }
    }
}

/// Format a length value for display with three decimals
///
/// * `value_mm` - Value in millimeters
/// * `system` - Target measurement system
pub fn format_length(value_mm: f64, system: MeasurementSystem) -> String {
    match system {
        MeasurementSystem::Metric => format!("{:.3}", value_mm),
        MeasurementSystem::Imperial => format!("{:.3}", value_mm / 25.4),
    }
}

/// Format a length value at raw precision, without unit conversion
///
/// Used when the caller asks for the unrounded model coordinate (the
/// raw-precision display modifier).
pub fn format_length_raw(value_mm: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value_mm)
}

/// Get the unit label for the given system ("mm" or "in")
pub fn unit_label(system: MeasurementSystem) -> &'static str {
    match system {
        MeasurementSystem::Metric => "mm",
        MeasurementSystem::Imperial => "in",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_formatting() {
        assert_eq!(format_length(10.5, MeasurementSystem::Metric), "10.500");
        assert_eq!(format_length(0.0, MeasurementSystem::Metric), "0.000");
    }

    #[test]
    fn test_imperial_formatting() {
        // 1 inch = 25.4 mm
        assert_eq!(format_length(25.4, MeasurementSystem::Imperial), "1.000");
        assert_eq!(format_length(12.7, MeasurementSystem::Imperial), "0.500");
    }

    #[test]
    fn test_raw_precision() {
        assert_eq!(format_length_raw(1.23456789, 6), "1.234568");
        assert_eq!(format_length_raw(1.0, 2), "1.00");
    }

    #[test]
    fn test_unit_labels() {
        assert_eq!(unit_label(MeasurementSystem::Metric), "mm");
        assert_eq!(unit_label(MeasurementSystem::Imperial), "in");
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            "imperial".parse::<MeasurementSystem>().unwrap(),
            MeasurementSystem::Imperial
        );
        assert_eq!(
            "mm".parse::<MeasurementSystem>().unwrap(),
            MeasurementSystem::Metric
        );
        assert!("furlong".parse::<MeasurementSystem>().is_err());
    }
}
