//! Security status evaluation.
//!
//! Two states, one rule. Unplugged means compromised no matter the charge;
//! plugged but below the sensitivity threshold is also compromised (the
//! low-battery-while-charging alarm is intentional — keep it). A host with no
//! battery can never be compromised.

use std::fmt;

use crate::metrics::Sample;

/// Journal message emitted on the Secure → Compromised edge.
pub const MSG_COMPROMISED: &str = "ALERTE DE SÉCURITÉ: Alimentation compromise!";

/// Journal message emitted on the Compromised → Secure edge.
pub const MSG_SECURE: &str = "Système sécurisé - Retour à la normale";

/// Alert sensitivity, 1–10. Higher sensitivity trips the alarm at a higher
/// battery charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sensitivity(u8);

impl Sensitivity {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Build a sensitivity, clamping into 1–10.
    pub fn new(level: u8) -> Self {
        Self(level.clamp(Self::MIN, Self::MAX))
    }

    pub fn level(self) -> u8 {
        self.0
    }

    /// Battery-percent cutoff below which the supply counts as compromised:
    /// `(11 − level) × 10`, so level 1 → 100 … level 10 → 10.
    pub fn threshold(self) -> f32 {
        ((11 - self.0 as i32) * 10) as f32
    }

    pub fn increment(self) -> Self {
        Self::new(self.0.saturating_add(1))
    }

    pub fn decrement(self) -> Self {
        Self::new(self.0.saturating_sub(1))
    }
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self(5)
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Current security status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurityStatus {
    #[default]
    Secure,
    Compromised,
}

impl SecurityStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Secure => "secure",
            Self::Compromised => "compromised",
        }
    }
}

impl fmt::Display for SecurityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One observed edge between security states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: SecurityStatus,
    pub to: SecurityStatus,
    /// Incident count after this transition.
    pub incidents: u64,
}

/// Threshold state machine fed one sample per tick.
///
/// State survives monitoring stop/start; only process restart resets it.
#[derive(Debug, Default)]
pub struct SecurityStateMachine {
    status: SecurityStatus,
    incidents: u64,
}

impl SecurityStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SecurityStatus {
        self.status
    }

    /// Number of Secure → Compromised edges observed since start.
    pub fn incidents(&self) -> u64 {
        self.incidents
    }

    /// Evaluate one sample at the given sensitivity. Returns the transition
    /// when the status changed, `None` when it held.
    pub fn evaluate(&mut self, sample: &Sample, sensitivity: Sensitivity) -> Option<Transition> {
        let next = classify(sample, sensitivity);
        if next == self.status {
            return None;
        }

        let from = self.status;
        self.status = next;
        if next == SecurityStatus::Compromised {
            self.incidents += 1;
        }

        Some(Transition {
            from,
            to: next,
            incidents: self.incidents,
        })
    }
}

/// Apply the threshold policy to one sample.
fn classify(sample: &Sample, sensitivity: Sensitivity) -> SecurityStatus {
    let Some(battery) = sample.battery else {
        // No battery information: cannot be compromised.
        return SecurityStatus::Secure;
    };

    let mut is_secure = battery.plugged;
    if battery.percent < sensitivity.threshold() {
        is_secure = false;
    }

    if is_secure {
        SecurityStatus::Secure
    } else {
        SecurityStatus::Compromised
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::BatteryReading;
    use std::time::SystemTime;

    fn sample(battery: Option<(f32, bool)>) -> Sample {
        Sample {
            timestamp: SystemTime::now(),
            cpu_percent: 10.0,
            memory_percent: 40.0,
            battery: battery.map(|(percent, plugged)| BatteryReading { percent, plugged }),
        }
    }

    #[test]
    fn threshold_table() {
        for (level, expected) in [
            (1u8, 100.0f32),
            (2, 90.0),
            (5, 60.0),
            (9, 20.0),
            (10, 10.0),
        ] {
            assert_eq!(Sensitivity::new(level).threshold(), expected);
        }
    }

    #[test]
    fn threshold_strictly_decreasing_in_sensitivity() {
        for level in Sensitivity::MIN..Sensitivity::MAX {
            let lo = Sensitivity::new(level).threshold();
            let hi = Sensitivity::new(level + 1).threshold();
            assert!(hi < lo, "threshold must drop from level {level} to {}", level + 1);
        }
    }

    #[test]
    fn sensitivity_clamps_out_of_range() {
        assert_eq!(Sensitivity::new(0).level(), 1);
        assert_eq!(Sensitivity::new(14).level(), 10);
        assert_eq!(Sensitivity::new(10).increment().level(), 10);
        assert_eq!(Sensitivity::new(1).decrement().level(), 1);
    }

    #[test]
    fn unplugged_is_compromised_regardless_of_charge() {
        let mut m = SecurityStateMachine::new();
        let t = m
            .evaluate(&sample(Some((100.0, false))), Sensitivity::new(5))
            .unwrap();
        assert_eq!(t.to, SecurityStatus::Compromised);
    }

    #[test]
    fn plugged_above_threshold_is_secure() {
        let mut m = SecurityStateMachine::new();
        assert!(m
            .evaluate(&sample(Some((70.0, true))), Sensitivity::new(5))
            .is_none());
        assert_eq!(m.status(), SecurityStatus::Secure);
    }

    #[test]
    fn plugged_low_battery_is_compromised() {
        // Preserved from the original: plugged-in but below threshold still
        // trips the alarm.
        let mut m = SecurityStateMachine::new();
        let t = m
            .evaluate(&sample(Some((50.0, true))), Sensitivity::new(5))
            .unwrap();
        assert_eq!(t.to, SecurityStatus::Compromised);
        assert_eq!(t.incidents, 1);
    }

    #[test]
    fn no_battery_is_always_secure() {
        let mut m = SecurityStateMachine::new();
        assert!(m.evaluate(&sample(None), Sensitivity::new(10)).is_none());
        assert_eq!(m.status(), SecurityStatus::Secure);
        assert_eq!(m.incidents(), 0);
    }

    #[test]
    fn incident_counts_once_per_edge() {
        let mut m = SecurityStateMachine::new();
        let s = Sensitivity::new(5);

        assert!(m.evaluate(&sample(Some((0.0, false))), s).is_some());
        // Repeated compromised ticks do not double count.
        for _ in 0..5 {
            assert!(m.evaluate(&sample(Some((0.0, false))), s).is_none());
        }
        assert_eq!(m.incidents(), 1);

        assert!(m.evaluate(&sample(Some((90.0, true))), s).is_some());
        assert!(m.evaluate(&sample(Some((0.0, false))), s).is_some());
        assert_eq!(m.incidents(), 2);
    }

    #[test]
    fn return_to_secure_does_not_decrement() {
        let mut m = SecurityStateMachine::new();
        let s = Sensitivity::new(5);
        m.evaluate(&sample(Some((0.0, false))), s);
        let t = m.evaluate(&sample(Some((90.0, true))), s).unwrap();
        assert_eq!(t.to, SecurityStatus::Secure);
        assert_eq!(t.incidents, 1);
        assert_eq!(m.incidents(), 1);
    }

    #[test]
    fn boundary_exactly_at_threshold_is_secure() {
        // threshold for level 5 is 60; percent == 60 is not below it.
        let mut m = SecurityStateMachine::new();
        assert!(m
            .evaluate(&sample(Some((60.0, true))), Sensitivity::new(5))
            .is_none());
        assert_eq!(m.status(), SecurityStatus::Secure);
    }
}
