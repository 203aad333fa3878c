//! Alert threshold configuration.

use crate::CoreError;
use std::time::Duration;

/// Fixed alert thresholds for the cross-rate.
///
/// Alerts fire before the raw thresholds are reached: the upper trigger sits
/// `margin_fraction` below `upper`, the lower trigger `margin_fraction` above
/// `lower`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdConfig {
    upper: f64,
    lower: f64,
    margin_fraction: f64,
    cooldown: Duration,
}

impl ThresholdConfig {
    /// Validate and build a threshold set.
    pub fn new(
        upper: f64,
        lower: f64,
        margin_fraction: f64,
        cooldown: Duration,
    ) -> Result<Self, CoreError> {
        for value in [upper, lower] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CoreError::InvalidThreshold(value));
            }
        }
        if lower >= upper {
            return Err(CoreError::InvertedThresholds { lower, upper });
        }
        if !(0.0..1.0).contains(&margin_fraction) {
            return Err(CoreError::MarginOutOfRange(margin_fraction));
        }
        Ok(Self {
            upper,
            lower,
            margin_fraction,
            cooldown,
        })
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn margin_fraction(&self) -> f64 {
        self.margin_fraction
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Rate at or above which the upper alert fires.
    pub fn upper_trigger(&self) -> f64 {
        self.upper * (1.0 - self.margin_fraction)
    }

    /// Rate at or below which the lower alert fires.
    pub fn lower_trigger(&self) -> f64 {
        self.lower * (1.0 + self.margin_fraction)
    }
}
