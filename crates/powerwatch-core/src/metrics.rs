//! Metrics sampling — one [`Sample`] per tick, bounded history.
//!
//! [`MetricsSource`] is the seam between the monitoring loop and the host:
//! production code uses [`SystemMetricsSource`] (sysinfo + the platform
//! battery probe), tests drive the state machine with scripted sources.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::SystemTime;

use sysinfo::System;

use crate::battery;
use crate::error::CoreError;

/// Samples retained before the oldest is evicted.
pub const HISTORY_CAPACITY: usize = 100;

/// Battery charge and mains state at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryReading {
    /// Charge percentage, 0–100.
    pub percent: f32,
    /// True while running on external power.
    pub plugged: bool,
}

/// One instantaneous reading of system metrics.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub timestamp: SystemTime,
    /// Global CPU utilization, 0–100.
    pub cpu_percent: f32,
    /// Memory utilization, 0–100.
    pub memory_percent: f32,
    /// `None` on hosts without a battery.
    pub battery: Option<BatteryReading>,
}

/// Anything that can produce a [`Sample`] once per tick.
pub trait MetricsSource: Send {
    fn sample(&mut self) -> Result<Sample, CoreError>;
}

/// Host-backed metrics source: CPU and memory from sysinfo, battery from the
/// platform probe.
pub struct SystemMetricsSource {
    sys: Mutex<System>,
}

impl SystemMetricsSource {
    pub fn new() -> Self {
        Self {
            sys: Mutex::new(System::new()),
        }
    }
}

impl Default for SystemMetricsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSource for SystemMetricsSource {
    fn sample(&mut self) -> Result<Sample, CoreError> {
        let mut sys = self
            .sys
            .lock()
            .map_err(|e| CoreError::Metrics(format!("system lock poisoned: {e}")))?;
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let cpu_percent = sys.global_cpu_usage().clamp(0.0, 100.0);
        let memory_percent = if sys.total_memory() == 0 {
            0.0
        } else {
            (sys.used_memory() as f32 / sys.total_memory() as f32) * 100.0
        };

        let sample = Sample {
            timestamp: SystemTime::now(),
            cpu_percent,
            memory_percent,
            battery: battery::probe(),
        };

        log::debug!(
            "sample: cpu {:.1}%, mem {:.1}%, battery {:?}",
            sample.cpu_percent,
            sample.memory_percent,
            sample.battery
        );

        Ok(sample)
    }
}

/// Bounded, time-ordered sample history. Oldest entries are evicted first
/// once [`HISTORY_CAPACITY`] is exceeded.
#[derive(Debug)]
pub struct SampleHistory {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl SampleHistory {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.min(HISTORY_CAPACITY)),
            capacity,
        }
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Recent CPU series for chart rendering, oldest first.
    pub fn cpu_series(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.cpu_percent as f64).collect()
    }

    /// Recent memory series for chart rendering, oldest first.
    pub fn memory_series(&self) -> Vec<f64> {
        self.samples
            .iter()
            .map(|s| s.memory_percent as f64)
            .collect()
    }
}

impl Default for SampleHistory {
    fn default() -> Self {
        Self::new()
    }
}
