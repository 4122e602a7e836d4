//! Hit points and the health descriptions players see instead of numbers

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Marker for "no maximum", carried on the wire as `-1`.
pub const UNBOUNDED_MAXIMUM: i32 = -1;

/// Current and maximum HP, serialized as `[current, maximum]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct HitPoints {
    current: i32,
    maximum: i32,
}

impl HitPoints {
    pub fn new(current: i32, maximum: i32) -> Result<Self, DomainError> {
        if maximum < 0 && maximum != UNBOUNDED_MAXIMUM {
            return Err(DomainError::validation(format!(
                "maximum hit points must be non-negative or {}, got {}",
                UNBOUNDED_MAXIMUM, maximum
            )));
        }
        if current < 0 {
            return Err(DomainError::validation(format!(
                "current hit points cannot be negative, got {}",
                current
            )));
        }
        if maximum != UNBOUNDED_MAXIMUM && current > maximum {
            return Err(DomainError::validation(format!(
                "current hit points {} exceed maximum {}",
                current, maximum
            )));
        }
        Ok(Self { current, maximum })
    }

    /// Full health at the given maximum.
    pub fn full(maximum: i32) -> Result<Self, DomainError> {
        Self::new(maximum.max(0), maximum)
    }

    pub fn unbounded(current: i32) -> Self {
        Self {
            current: current.max(0),
            maximum: UNBOUNDED_MAXIMUM,
        }
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn maximum(&self) -> Option<i32> {
        (self.maximum != UNBOUNDED_MAXIMUM).then_some(self.maximum)
    }

    /// Healing never exceeds the maximum.
    pub fn heal(self, amount: i32) -> Self {
        let raised = self.current.saturating_add(amount.max(0));
        let current = match self.maximum() {
            Some(max) => raised.min(max),
            None => raised,
        };
        Self { current, ..self }
    }

    /// Damage never drops below zero.
    pub fn damage(self, amount: i32) -> Self {
        let current = self.current.saturating_sub(amount.max(0)).max(0);
        Self { current, ..self }
    }

    /// Apply a signed change: positive heals, negative damages.
    pub fn adjust(self, delta: i32) -> Self {
        if delta >= 0 {
            self.heal(delta)
        } else {
            self.damage(delta.saturating_neg())
        }
    }

    pub fn is_down(&self) -> bool {
        self.current == 0
    }

    /// Percentage of maximum remaining, `None` when unbounded or zero-max.
    pub fn percent(&self) -> Option<f64> {
        match self.maximum() {
            Some(max) if max > 0 => Some(f64::from(self.current) / f64::from(max) * 100.0),
            _ => None,
        }
    }

    pub fn description(&self) -> HealthDescription {
        match self.percent() {
            Some(pct) => HealthDescription::from_percent(pct),
            None if self.is_down() => HealthDescription::KnockedOut,
            None => HealthDescription::VeryAlive,
        }
    }
}

impl From<(i32, i32)> for HitPoints {
    fn from((current, maximum): (i32, i32)) -> Self {
        // Server data is trusted as-is; only locally constructed values are validated.
        Self { current, maximum }
    }
}

impl From<HitPoints> for (i32, i32) {
    fn from(hp: HitPoints) -> Self {
        (hp.current, hp.maximum)
    }
}

impl fmt::Display for HitPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.maximum() {
            Some(max) => write!(f, "{}/{}", self.current, max),
            None => write!(f, "{}", self.current),
        }
    }
}

/// Vague health band shown to players for creatures they do not control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthDescription {
    KnockedOut,
    Weakened,
    WearingOut,
    VeryAlive,
}

impl HealthDescription {
    pub fn from_percent(pct: f64) -> Self {
        if pct <= 0.0 {
            Self::KnockedOut
        } else if pct < 10.0 {
            Self::Weakened
        } else if pct < 50.0 {
            Self::WearingOut
        } else {
            Self::VeryAlive
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::KnockedOut => "Knocked Out",
            Self::Weakened => "Looks weakened",
            Self::WearingOut => "Starting to wear out",
            Self::VeryAlive => "Seems very alive",
        }
    }
}

impl fmt::Display for HealthDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_is_a_pair() {
        let hp = HitPoints::new(7, 12).unwrap();
        assert_eq!(serde_json::to_value(hp).unwrap(), serde_json::json!([7, 12]));
        let back: HitPoints = serde_json::from_value(serde_json::json!([3, -1])).unwrap();
        assert_eq!(back.maximum(), None);
    }

    #[test]
    fn heal_clamps_at_maximum() {
        let hp = HitPoints::new(8, 10).unwrap().heal(5);
        assert_eq!(hp.current(), 10);
    }

    #[test]
    fn heal_is_unbounded_without_maximum() {
        let hp = HitPoints::unbounded(8).heal(50);
        assert_eq!(hp.current(), 58);
    }

    #[test]
    fn damage_clamps_at_zero() {
        let hp = HitPoints::new(4, 10).unwrap().adjust(-9);
        assert_eq!(hp.current(), 0);
        assert!(hp.is_down());
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(HitPoints::new(-1, 10).is_err());
        assert!(HitPoints::new(11, 10).is_err());
        assert!(HitPoints::new(5, -4).is_err());
        assert!(HitPoints::new(500, UNBOUNDED_MAXIMUM).is_ok());
    }

    #[test]
    fn description_bands() {
        let at = |current| HitPoints::new(current, 100).unwrap().description();
        assert_eq!(at(0), HealthDescription::KnockedOut);
        assert_eq!(at(9), HealthDescription::Weakened);
        assert_eq!(at(10), HealthDescription::WearingOut);
        assert_eq!(at(49), HealthDescription::WearingOut);
        assert_eq!(at(50), HealthDescription::VeryAlive);
        assert_eq!(at(100).label(), "Seems very alive");
    }

    #[test]
    fn unbounded_description_only_knows_down_or_up() {
        assert_eq!(HitPoints::unbounded(0).description(), HealthDescription::KnockedOut);
        assert_eq!(HitPoints::unbounded(1).description(), HealthDescription::VeryAlive);
    }
}
