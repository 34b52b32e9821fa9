use crate::error::{check_non_negative, check_positive, check_unit_range, ConfigError};

/// The immutable tuning parameters of a vehicle.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleConfig {
    /// The vehicle mass in kg. Not consumed by the current force model.
    pub mass: f64,
    /// The forward top speed in m/s.
    pub max_speed: f64,
    /// The throttle acceleration in m/s^2.
    pub acceleration: f64,
    /// The braking deceleration in m/s^2.
    pub braking: f64,
    /// Steering responsiveness in rad/s at full lock.
    pub handling: f64,
    /// Per-second linear damping applied to the whole velocity.
    pub drag: f64,
    /// Per-second damping applied to the non-forward velocity component.
    pub lateral_grip: f64,
    /// Fraction of the forward limits available when reversing.
    pub reverse_scale: f64,
    /// Multiplier applied to `lateral_grip` while the handbrake is held.
    pub handbrake_grip: f64,
    /// The resolved boost parameters.
    pub boost: BoostConfig,
}

/// The boost tuning parameters.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoostConfig {
    /// Multiplier applied to acceleration and top speed while boosting.
    pub multiplier: f64,
    /// Full charge in charge units, exposed for HUD scaling.
    pub capacity: f64,
    /// Charge drained per second while boosting.
    pub drain: f64,
    /// Charge regenerated per second while not boosting.
    pub regen: f64,
}

/// Optional per-field boost overrides, merged over [BoostConfig::DEFAULT]
/// at construction time.
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoostOverrides {
    pub multiplier: Option<f64>,
    pub capacity: Option<f64>,
    pub drain: Option<f64>,
    pub regen: Option<f64>,
}

impl BoostConfig {
    /// The stock boost parameters.
    pub const DEFAULT: BoostConfig = BoostConfig {
        multiplier: 1.8,
        capacity: 1.0,
        drain: 0.35,
        regen: 0.12,
    };

    /// Overlays the given overrides onto the stock parameters, field by field.
    pub fn merged(overrides: &BoostOverrides) -> Self {
        Self {
            multiplier: overrides.multiplier.unwrap_or(Self::DEFAULT.multiplier),
            capacity: overrides.capacity.unwrap_or(Self::DEFAULT.capacity),
            drain: overrides.drain.unwrap_or(Self::DEFAULT.drain),
            regen: overrides.regen.unwrap_or(Self::DEFAULT.regen),
        }
    }
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            mass: 1200.0,
            max_speed: 40.0,
            acceleration: 32.0,
            braking: 48.0,
            handling: 2.5,
            drag: 0.8,
            lateral_grip: 8.0,
            reverse_scale: 0.4,
            handbrake_grip: 0.2,
            boost: BoostConfig::DEFAULT,
        }
    }
}

impl VehicleConfig {
    /// Creates a configuration with the stock tuning and the given boost
    /// overrides merged in.
    pub fn with_boost(overrides: &BoostOverrides) -> Self {
        Self {
            boost: BoostConfig::merged(overrides),
            ..Default::default()
        }
    }

    /// Checks the configuration, failing fast on values that would later
    /// produce degenerate motion.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("max_speed", self.max_speed)?;
        check_positive("acceleration", self.acceleration)?;
        check_positive("braking", self.braking)?;
        check_positive("handling", self.handling)?;
        check_non_negative("mass", self.mass)?;
        check_non_negative("drag", self.drag)?;
        check_non_negative("lateral_grip", self.lateral_grip)?;
        check_unit_range("reverse_scale", self.reverse_scale)?;
        check_unit_range("handbrake_grip", self.handbrake_grip)?;
        if !(self.boost.multiplier.is_finite() && self.boost.multiplier >= 1.0) {
            return Err(ConfigError::BoostMultiplier(self.boost.multiplier));
        }
        check_positive("boost capacity", self.boost.capacity)?;
        check_non_negative("boost drain", self.boost.drain)?;
        check_non_negative("boost regen", self.boost.regen)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn boost_overlay_merges_per_field() {
        let merged = BoostConfig::merged(&BoostOverrides {
            drain: Some(0.5),
            ..Default::default()
        });
        assert_approx_eq!(merged.drain, 0.5);
        assert_approx_eq!(merged.multiplier, BoostConfig::DEFAULT.multiplier);
        assert_approx_eq!(merged.capacity, BoostConfig::DEFAULT.capacity);
        assert_approx_eq!(merged.regen, BoostConfig::DEFAULT.regen);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(VehicleConfig::default().validate().is_ok());
    }

    #[test]
    fn negative_max_speed_is_rejected() {
        let config = VehicleConfig {
            max_speed: -1.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonPositive {
                field: "max_speed",
                value: -1.0
            })
        );
    }

    #[test]
    fn out_of_range_grip_multiplier_is_rejected() {
        let config = VehicleConfig {
            handbrake_grip: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutsideUnitRange { field: "handbrake_grip", .. })
        ));
    }

    #[test]
    fn non_finite_tuning_is_rejected() {
        let config = VehicleConfig {
            drag: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn weak_boost_multiplier_is_rejected() {
        let config = VehicleConfig::with_boost(&BoostOverrides {
            multiplier: Some(0.5),
            ..Default::default()
        });
        assert_eq!(config.validate(), Err(ConfigError::BoostMultiplier(0.5)));
    }
}
