//! Erosion configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid simulator parameters, reported once at engine construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Parameter '{field}' must be finite")]
    NotFinite { field: &'static str },
    #[error("Parameter '{field}' = {value} is outside {range}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        range: &'static str,
    },
}

/// How a droplet's speed responds to the height change of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VelocityModel {
    /// `v' = sqrt(v² + hDiff * gravity)` with the signed height difference.
    /// Climbing speeds the droplet up and descending slows it down; the
    /// radicand is clamped at zero.
    SignedDrop,
    /// `v' = sqrt(v² - hDiff * gravity)`: descending speeds the droplet up.
    /// The radicand is clamped at zero.
    Descent,
}

impl Default for VelocityModel {
    fn default() -> Self {
        Self::SignedDrop
    }
}

/// Physical parameters of the droplet simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErosionConfig {
    /// Direction blend factor (0-1). 0 follows the downhill gradient
    /// strictly, values near 1 keep the previous heading.
    pub inertia: f32,
    /// Sediment carrying capacity factor.
    pub capacity: f32,
    /// Fraction of excess sediment dropped per step (0-1).
    pub deposition_rate: f32,
    /// Fraction of spare capacity eroded per step (0-1).
    pub erosion_rate: f32,
    /// Fraction of water lost per step (0-1).
    pub evaporation_rate: f32,
    /// Radius of the erosion brush, in cells.
    pub radius: f32,
    /// Slope floor used when computing carrying capacity.
    pub min_slope: f32,
    pub gravity: f32,
    /// Step budget per droplet.
    pub max_steps: u32,
    pub velocity_model: VelocityModel,
}

impl Default for ErosionConfig {
    fn default() -> Self {
        Self {
            inertia: 0.5,
            capacity: 5.0,
            deposition_rate: 0.3,
            erosion_rate: 0.2,
            evaporation_rate: 0.05,
            radius: 4.0,
            min_slope: 0.01,
            gravity: 1.0,
            max_steps: 100,
            velocity_model: VelocityModel::default(),
        }
    }
}

impl ErosionConfig {
    /// Narrow, long-lived droplets that carve channels.
    pub fn channels() -> Self {
        Self {
            inertia: 0.3,
            radius: 2.0,
            max_steps: 200,
            velocity_model: VelocityModel::Descent,
            ..Default::default()
        }
    }

    /// Checks every parameter against its physical range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit("inertia", self.inertia)?;
        unit("deposition_rate", self.deposition_rate)?;
        unit("erosion_rate", self.erosion_rate)?;
        unit("evaporation_rate", self.evaporation_rate)?;
        non_negative("capacity", self.capacity)?;
        non_negative("radius", self.radius)?;
        non_negative("min_slope", self.min_slope)?;
        non_negative("gravity", self.gravity)?;
        Ok(())
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field })
    }
}

fn unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value, range: "[0, 1]" })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value, range: "[0, inf)" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ErosionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.evaporation_rate, 0.05);
        assert_eq!(config.max_steps, 100);
        assert_eq!(config.velocity_model, VelocityModel::SignedDrop);
        assert!(ErosionConfig::channels().validate().is_ok());
    }

    #[test]
    fn test_negative_radius_rejected() {
        let config = ErosionConfig {
            radius: -1.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "radius", value: -1.0, range: "[0, inf)" })
        );
    }

    #[test]
    fn test_rates_outside_unit_interval_rejected() {
        let config = ErosionConfig {
            evaporation_rate: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "evaporation_rate", .. })
        ));
    }

    #[test]
    fn test_nan_rejected() {
        let config = ErosionConfig {
            gravity: f32::NAN,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NotFinite { field: "gravity" }));
    }
}
