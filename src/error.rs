use crate::world::ObstacleKind;
use thiserror::Error;

/// Errors raised while validating configuration at construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A tuning value that must be strictly positive was not.
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    /// A tuning value that must not be negative was.
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    /// A tuning value that must lie in the unit interval did not.
    #[error("{field} must lie within [0, 1], got {value}")]
    OutsideUnitRange { field: &'static str, value: f64 },

    /// A boost multiplier below one would make boosting slower than driving.
    #[error("boost multiplier must be at least 1, got {0}")]
    BoostMultiplier(f64),

    /// An obstacle count range with its minimum above its maximum.
    #[error("obstacle count range for {kind:?} is inverted: {min}..={max}")]
    InvertedCountRange {
        kind: ObstacleKind,
        min: u32,
        max: u32,
    },

    /// An obstacle kind that cannot fit between the track edges.
    #[error("obstacle kind {kind:?} is wider than the track")]
    KindTooWide { kind: ObstacleKind },
}

pub(crate) fn check_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

pub(crate) fn check_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

pub(crate) fn check_unit_range(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutsideUnitRange { field, value })
    }
}

/// Errors raised by [Simulation::step](crate::Simulation::step).
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum StepError {
    /// Position or velocity stopped being finite after integration.
    /// The simulation state is unrecoverable once this is returned.
    #[error("non-finite vehicle state after tick: position {position:?}, velocity {velocity:?}")]
    NonFinite {
        position: [f64; 3],
        velocity: [f64; 3],
    },
}
