//! One-shot machine-readable status capture.

use std::time::{Duration, SystemTime};

use serde::Serialize;

use crate::journal;
use crate::metrics::Sample;
use crate::security::{SecurityStatus, Sensitivity};

/// Point-in-time view of the monitor, shaped for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub timestamp: String,
    pub monitoring_active: bool,
    pub status: &'static str,
    pub incidents: u64,
    pub sensitivity: u8,
    pub threshold_percent: f32,
    pub cpu_percent: Option<f32>,
    pub memory_percent: Option<f32>,
    pub battery: Option<BatterySnapshot>,
    pub elapsed_seconds: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BatterySnapshot {
    pub percent: f32,
    pub plugged: bool,
}

impl StatusSnapshot {
    pub fn capture(
        monitoring_active: bool,
        status: SecurityStatus,
        incidents: u64,
        sensitivity: Sensitivity,
        sample: Option<&Sample>,
        elapsed: Option<Duration>,
    ) -> Self {
        Self {
            timestamp: journal::format_stamp(SystemTime::now()),
            monitoring_active,
            status: status.label(),
            incidents,
            sensitivity: sensitivity.level(),
            threshold_percent: sensitivity.threshold(),
            cpu_percent: sample.map(|s| s.cpu_percent),
            memory_percent: sample.map(|s| s.memory_percent),
            battery: sample.and_then(|s| s.battery).map(|b| BatterySnapshot {
                percent: b.percent,
                plugged: b.plugged,
            }),
            elapsed_seconds: elapsed.map(|d| d.as_secs()),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::BatteryReading;

    fn sample(battery: Option<BatteryReading>) -> Sample {
        Sample {
            timestamp: SystemTime::now(),
            cpu_percent: 12.5,
            memory_percent: 40.0,
            battery,
        }
    }

    #[test]
    fn snapshot_carries_battery_and_threshold() {
        let s = sample(Some(BatteryReading {
            percent: 72.0,
            plugged: true,
        }));
        let snap = StatusSnapshot::capture(
            true,
            SecurityStatus::Secure,
            0,
            Sensitivity::new(5),
            Some(&s),
            Some(Duration::from_secs(90)),
        );
        assert_eq!(snap.threshold_percent, 60.0);
        assert_eq!(snap.battery.unwrap().percent, 72.0);
        assert_eq!(snap.elapsed_seconds, Some(90));

        let json = snap.to_json().unwrap();
        assert!(json.contains("\"monitoring_active\": true"));
        assert!(json.contains("\"incidents\": 0"));
    }

    #[test]
    fn snapshot_without_sample_serializes_nulls() {
        let snap = StatusSnapshot::capture(
            false,
            SecurityStatus::Compromised,
            3,
            Sensitivity::new(1),
            None,
            None,
        );
        let json = snap.to_json().unwrap();
        assert!(json.contains("\"cpu_percent\": null"));
        assert!(json.contains("\"battery\": null"));
        assert!(json.contains("\"incidents\": 3"));
    }
}
