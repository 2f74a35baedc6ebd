//! Confidence and severity policy shared by every detector.
//!
//! Confidence is a base value plus fixed additive bonuses, clamped to
//! `[0, 1]`. Severity comes from confidence through fixed bands.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.9 {
            Severity::Critical
        } else if confidence >= 0.7 {
            Severity::High
        } else if confidence >= 0.5 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// One step up, saturating at critical. Low stays low.
    pub fn escalate(self) -> Self {
        match self {
            Severity::Medium => Severity::High,
            Severity::High | Severity::Critical => Severity::Critical,
            Severity::Low => Severity::Low,
        }
    }
}

/// Additive confidence score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Confidence {
    value: f64,
}

impl Confidence {
    pub fn base(value: f64) -> Self {
        Confidence { value }
    }

    /// Add `amount` when `condition` holds.
    pub fn bonus(self, condition: bool, amount: f64) -> Self {
        if condition {
            Confidence {
                value: self.value + amount,
            }
        } else {
            self
        }
    }

    /// Rounded to six decimals so sums like 0.7 + 0.2 land on the band edge.
    pub fn value(&self) -> f64 {
        clamp_unit((self.value * 1e6).round() / 1e6)
    }

    /// Banded severity, escalated one step when `escalate` holds.
    pub fn severity(&self, escalate: bool) -> Severity {
        let severity = Severity::from_confidence(self.value());
        if escalate {
            severity.escalate()
        } else {
            severity
        }
    }
}

pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands() {
        assert_eq!(Severity::from_confidence(0.95), Severity::Critical);
        assert_eq!(Severity::from_confidence(0.9), Severity::Critical);
        assert_eq!(Severity::from_confidence(0.7), Severity::High);
        assert_eq!(Severity::from_confidence(0.5), Severity::Medium);
        assert_eq!(Severity::from_confidence(0.49), Severity::Low);
    }

    #[test]
    fn test_escalation_saturates() {
        assert_eq!(Severity::Medium.escalate(), Severity::High);
        assert_eq!(Severity::High.escalate(), Severity::Critical);
        assert_eq!(Severity::Critical.escalate(), Severity::Critical);
        assert_eq!(Severity::Low.escalate(), Severity::Low);
    }

    #[test]
    fn test_bonuses_add_and_clamp() {
        let c = Confidence::base(0.5).bonus(true, 0.2).bonus(false, 0.3);
        assert!((c.value() - 0.7).abs() < 1e-9);
        let c = Confidence::base(0.6).bonus(true, 0.3).bonus(true, 0.3);
        assert_eq!(c.value(), 1.0);
        assert_eq!(c.severity(false), Severity::Critical);
        assert_eq!(Confidence::base(0.55).severity(true), Severity::High);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        let c = Confidence::base(0.5).bonus(true, 0.2).bonus(true, 0.2);
        assert_eq!(c.severity(false), Severity::Critical);
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"critical\"");
    }
}
