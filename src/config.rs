use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::errors::{ConfigError, ConfigResult};

/// GPIO pin assignments (BCM numbering).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    pub trigger: u32,
    pub echo: u32,
    pub buzzer: u32,
    pub button: u32,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            trigger: 23,
            echo: 24,
            buzzer: 18,
            button: 17,
        }
    }
}

/// I2C device addresses for the attached sensors. The display backend is an
/// external collaborator and carries its own addressing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct I2cAddresses {
    pub thermal: u16,
    pub color: u16,
}

impl Default for I2cAddresses {
    fn default() -> Self {
        Self {
            thermal: 0x5A,
            color: 0x29,
        }
    }
}

/// Root configuration for the sensing rig, loaded from TOML.
///
/// Every field has a default matching the reference wiring, so an empty file
/// (or no file at all) yields a working configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// GPIO character-device chip index (`/dev/gpiochip<N>`).
    pub gpio_chip: u32,
    /// I2C bus number (`/dev/i2c-<N>`).
    pub i2c_bus: u8,
    pub pins: PinConfig,
    pub addresses: I2cAddresses,
    /// Samples per filtered distance measurement.
    pub distance_samples: usize,
    /// Exclusive plausibility envelope for distance samples, in cm.
    pub envelope_min_cm: f64,
    pub envelope_max_cm: f64,
    /// Delay before the single re-initialization attempt.
    pub retry_delay_ms: u64,
    /// Upper bound on each echo-line edge wait.
    pub echo_timeout_ms: u64,
    /// Button polling cadence.
    pub poll_interval_ms: u64,
    /// Report a fixed 25.0/25.0 thermal pair when no I2C bus is present,
    /// instead of `Unavailable`.
    pub simulate_thermal: bool,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            gpio_chip: 0,
            i2c_bus: 1,
            pins: PinConfig::default(),
            addresses: I2cAddresses::default(),
            distance_samples: 10,
            envelope_min_cm: 2.0,
            envelope_max_cm: 400.0,
            retry_delay_ms: 500,
            echo_timeout_ms: 30,
            poll_interval_ms: 50,
            simulate_thermal: false,
        }
    }
}

impl RigConfig {
    /// Loads config from a TOML file and validates it.
    pub fn load(path: &str) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::LoadError {
            path: path.to_string(),
            source: e,
        })?;
        let parsed: RigConfig = toml::from_str(&content)?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.distance_samples == 0 {
            return Err(ConfigError::InvalidValue {
                field: "distance_samples".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.envelope_min_cm >= self.envelope_max_cm {
            return Err(ConfigError::InvalidValue {
                field: "envelope_min_cm".to_string(),
                reason: format!(
                    "lower bound {} must be below upper bound {}",
                    self.envelope_min_cm, self.envelope_max_cm
                ),
            });
        }
        if self.echo_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "echo_timeout_ms".to_string(),
                reason: "a zero timeout would reject every echo".to_string(),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_ms".to_string(),
                reason: "must be at least 1ms".to_string(),
            });
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn echo_timeout(&self) -> Duration {
        Duration::from_millis(self.echo_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
