//! Threshold alert engine.
//!
//! Compares the cross-rate against the two trigger lines of a
//! `ThresholdConfig` and decides whether an alert fires. Both directions
//! share one cooldown entry (`AlertKey::Threshold`): an upper alert also
//! blocks a lower alert until the cooldown has passed, and vice versa.

use chrono::{DateTime, Utc};
use ratewatch_core::ThresholdConfig;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Cooldown bucket an alert is recorded under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKey {
    Threshold,
}

/// Which edge of the target range the rate is approaching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDirection {
    Upper,
    Lower,
}

/// An alert that has fired and been recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alert {
    pub direction: AlertDirection,
    pub cross_rate: f64,
    pub fired_at: DateTime<Utc>,
}

/// Outcome of one evaluation cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    Fired(Alert),
    /// Cooldown still running; `remaining` is the time until it ends.
    Suppressed { remaining: Duration },
    WithinRange,
}

/// Alert state machine.
///
/// `evaluate` performs the cooldown check and the timestamp write under one
/// lock, so two concurrent evaluations cannot both fire inside a window.
#[derive(Debug)]
pub struct AlertEngine {
    thresholds: ThresholdConfig,
    last_alert: Mutex<HashMap<AlertKey, DateTime<Utc>>>,
}

impl AlertEngine {
    pub fn new(thresholds: ThresholdConfig) -> Self {
        Self {
            thresholds,
            last_alert: Mutex::new(HashMap::new()),
        }
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    /// When an alert was last recorded under `key`.
    pub fn last_alert(&self, key: AlertKey) -> Option<DateTime<Utc>> {
        self.last_alert
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .copied()
    }

    /// Evaluate `cross_rate` at wall-clock time `now`.
    ///
    /// Fires at most one alert per call; upper is checked before lower.
    /// A fired alert is recorded immediately, whether or not it is later
    /// delivered.
    pub fn evaluate(&self, cross_rate: f64, now: DateTime<Utc>) -> Evaluation {
        let mut last_alert = self
            .last_alert
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(last) = last_alert.get(&AlertKey::Threshold) {
            let cooldown = self.thresholds.cooldown();
            // A clock that moved backwards reads as "still cooling down".
            match (now - *last).to_std() {
                Ok(elapsed) if elapsed > cooldown => {}
                Ok(elapsed) => {
                    return Evaluation::Suppressed {
                        remaining: cooldown - elapsed,
                    }
                }
                Err(_) => return Evaluation::Suppressed { remaining: cooldown },
            }
        }

        let direction = if cross_rate >= self.thresholds.upper_trigger() {
            AlertDirection::Upper
        } else if cross_rate <= self.thresholds.lower_trigger() {
            AlertDirection::Lower
        } else {
            return Evaluation::WithinRange;
        };

        last_alert.insert(AlertKey::Threshold, now);
        Evaluation::Fired(Alert {
            direction,
            cross_rate,
            fired_at: now,
        })
    }
}
