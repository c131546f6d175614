//! Configuration for the estimator and the control loop
//!
//! Both structs are immutable after construction; the binaries validate
//! them once at startup and treat failures as fatal.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

/// Calibration and filter tuning for the orientation estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Accelerometer zero-value per axis, sensor counts
    pub acc_cal: [f64; 2],
    /// Accelerometer counts per 1 g, per axis
    pub acc_g: [f64; 2],
    /// Accelerometer low-pass cutoff frequency, Hz
    pub acc_cutoff_hz: f64,
    /// Gyro zero-value per axis, sensor counts
    pub gyro_cal: [f64; 3],
    /// Mounting sign correction per gyro axis, +1 or -1
    pub gyro_signs: [f64; 3],
    /// Conversion from calibrated gyro counts to degrees per second
    pub gyro_to_dps: f64,
    /// Complementary-filter fusion cutoff, Hz. Intentionally low: the
    /// accelerometer only corrects long-term gyro drift.
    pub fusion_cutoff_hz: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            acc_cal: [4968.7, 4981.1],
            acc_g: [1240.0, 1240.0],
            acc_cutoff_hz: 10.0,
            gyro_cal: [-12.0, 15.0, 0.1],
            gyro_signs: [1.0, 1.0, -1.0],
            // full range (dps) / full range (counts)
            gyro_to_dps: 2000.0 / 32768.0,
            fusion_cutoff_hz: 1.0,
        }
    }
}

impl FusionConfig {
    /// Check that scales and cutoffs are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.acc_g.iter().any(|&g| g == 0.0) {
            return Err(ConfigError::ZeroScale { name: "acc_g" });
        }
        if self.gyro_to_dps == 0.0 {
            return Err(ConfigError::ZeroScale { name: "gyro_to_dps" });
        }
        if self.acc_cutoff_hz <= 0.0 {
            return Err(ConfigError::NonPositive {
                name: "acc_cutoff_hz",
                value: self.acc_cutoff_hz,
            });
        }
        if self.fusion_cutoff_hz <= 0.0 {
            return Err(ConfigError::NonPositive {
                name: "fusion_cutoff_hz",
                value: self.fusion_cutoff_hz,
            });
        }
        for (axis, &sign) in self.gyro_signs.iter().enumerate() {
            if sign != 1.0 && sign != -1.0 {
                return Err(ConfigError::BadSign { axis, value: sign });
            }
        }
        Ok(())
    }
}

/// Output cadence and actuation tuning for the control loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Target output rate, Hz
    pub output_freq_hz: f64,
    /// Camera move duration as a multiple of the output period. Values
    /// above 1 make successive moves overlap instead of jerking to a stop.
    pub move_duration_factor: f64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            output_freq_hz: 25.0,
            move_duration_factor: 2.0,
        }
    }
}

impl LoopConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_freq_hz <= 0.0 {
            return Err(ConfigError::NonPositive {
                name: "output_freq_hz",
                value: self.output_freq_hz,
            });
        }
        if self.move_duration_factor <= 0.0 {
            return Err(ConfigError::NonPositive {
                name: "move_duration_factor",
                value: self.move_duration_factor,
            });
        }
        Ok(())
    }

    /// Wall-clock interval between outputs.
    pub fn output_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.output_freq_hz)
    }

    /// Duration passed with each camera move command.
    pub fn move_duration(&self) -> Duration {
        Duration::from_secs_f64(self.move_duration_factor / self.output_freq_hz)
    }

    /// Diagnostic ring capacity sized so the window spans about a second.
    pub fn buffer_len(&self) -> usize {
        (self.output_freq_hz.round() as usize).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configs_validate() {
        FusionConfig::default().validate().unwrap();
        LoopConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_zero_acc_scale() {
        let config = FusionConfig {
            acc_g: [0.0, 1240.0],
            ..FusionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_gyro_sign() {
        let config = FusionConfig {
            gyro_signs: [1.0, 0.5, -1.0],
            ..FusionConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::BadSign {
                axis: 1,
                value: 0.5
            })
        );
    }

    #[test]
    fn loop_timing_derives_from_frequency() {
        let config = LoopConfig::default();
        assert_eq!(config.output_period(), Duration::from_millis(40));
        assert_eq!(config.move_duration(), Duration::from_millis(80));
        assert_eq!(config.buffer_len(), 25);
    }

    #[test]
    fn rejects_zero_output_freq() {
        let config = LoopConfig {
            output_freq_hz: 0.0,
            ..LoopConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
