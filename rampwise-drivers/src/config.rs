//! Configuration loading
//!
//! Parses a [`ControlConfig`] from TOML. Every table and key is optional;
//! anything missing falls back to its default. The result is validated
//! before it is returned.
//!
//! ```toml
//! stall_guard = true
//!
//! [motor]
//! ticks_per_revolution = 1440
//! rated_rpm = 100
//!
//! [ramp]
//! power_increment_per_cycle = 0.05
//! cycle_period_ms = 50
//! ```

use rampwise_core::config::ControlConfig;
use rampwise_core::error::ControlError;

/// Configuration loading errors
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Malformed TOML or a value of the wrong type
    Parse {
        /// Byte offset of the offending input, when known
        offset: Option<usize>,
    },
    /// Parsed values failed validation
    Invalid(ControlError),
}

impl From<ControlError> for ConfigError {
    fn from(e: ControlError) -> Self {
        ConfigError::Invalid(e)
    }
}

/// Parse and validate a control configuration
pub fn parse_config(input: &str) -> Result<ControlConfig, ConfigError> {
    let config: ControlConfig = toml::from_str(input).map_err(|e| ConfigError::Parse {
        offset: e.span().map(|span| span.start),
    })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampwise_core::config::{MotorModel, RampConfig};
    use rampwise_core::error::ConfigField;

    #[test]
    fn test_empty_input_gives_defaults() {
        assert_eq!(parse_config(""), Ok(ControlConfig::default()));
    }

    #[test]
    fn test_partial_tables() {
        let config = parse_config(
            r#"
            stall_guard = true

            [motor]
            ticks_per_revolution = 1440
            rated_rpm = 100

            [ramp]
            power_increment_per_cycle = 0.1
            "#,
        )
        .unwrap();

        assert!(config.stall_guard);
        assert_eq!(config.motor, MotorModel::TETRIX_TORQUENADO);
        assert_eq!(config.ramp.power_increment_per_cycle, 0.1);
        assert_eq!(config.ramp.cycle_period_ms, RampConfig::default().cycle_period_ms);
        assert_eq!(config.stall.window_ms, 200);
    }

    #[test]
    fn test_heading_and_drive_tables() {
        let config = parse_config(
            r#"
            [heading]
            drive_gain = 0.2
            lock_threshold_deg = 2.0

            [drive]
            wheel_diameter_in = 3.0
            gear_reduction = 2.0
            "#,
        )
        .unwrap();

        assert_eq!(config.heading.drive_gain, 0.2);
        assert_eq!(config.heading.turn_gain, 0.1);
        assert_eq!(config.heading.lock_threshold_deg, 2.0);
        assert_eq!(config.drive.wheel_diameter_in, 3.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert_eq!(
            parse_config("[ramp]\ncycle_period_ms = 0\n"),
            Err(ConfigError::Invalid(ControlError::InvalidConfig(
                ConfigField::CyclePeriod
            )))
        );
        assert_eq!(
            parse_config("[stall]\ntolerance_ticks = -3\n"),
            Err(ConfigError::Invalid(ControlError::NegativeStallTolerance(-3)))
        );
        assert_eq!(
            parse_config("[motor]\nrated_rpm = 0\n"),
            Err(ConfigError::Invalid(ControlError::InvalidConfig(
                ConfigField::RatedRpm
            )))
        );
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            parse_config("[ramp\n"),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            parse_config("[ramp]\ncycle_period_ms = \"fast\"\n"),
            Err(ConfigError::Parse { .. })
        ));
    }
}
