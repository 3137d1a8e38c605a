//! # powerwatch-core
//!
//! **Your laptop's power cord is a tripwire.**
//!
//! `powerwatch-core` is the monitoring library behind the `powerwatch` CLI.
//! It watches the machine's power state once per second and treats suspicious
//! combinations — charger pulled, battery draining below a configurable
//! threshold — as a physical-security incident: the event is journaled to a
//! per-day log file, a siren starts looping, and the UI flashes until someone
//! acknowledges it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::{Arc, Mutex};
//! use std::time::Duration;
//! use powerwatch_core::{
//!     AlertController, EventJournal, Monitor, Sensitivity, SilentAlarm,
//!     SystemMetricsSource, TICK_INTERVAL,
//! };
//!
//! let journal = Arc::new(Mutex::new(EventJournal::open_default().unwrap()));
//! let alerts = Arc::new(Mutex::new(AlertController::new(Box::new(SilentAlarm))));
//! let (mut monitor, events) =
//!     Monitor::new(journal, alerts, Sensitivity::default(), TICK_INTERVAL);
//!
//! monitor.start(Box::new(SystemMetricsSource::new())).unwrap();
//! for event in events.iter() {
//!     println!("{event:?}");
//! }
//! ```
//!
//! ## Architecture
//!
//! MetricsSource → Monitor worker → SecurityStateMachine → Journal + Alerts
//!
//! The worker thread owns the [`MetricsSource`] and pushes each reading into
//! a bounded [`SampleHistory`]. The [`SecurityStateMachine`] fires only on
//! edges, so the journal records transitions rather than one line per tick.
//! Presentation layers consume [`MonitorEvent`]s from a single-consumer
//! channel and read counters through the shared handles on [`Monitor`].

pub mod alert;
pub mod audio;
pub mod battery;
pub mod error;
pub mod journal;
pub mod metrics;
pub mod monitor;
pub mod security;
pub mod snapshot;

pub use alert::{AlarmSink, AlertController, ArmOutcome, FLASH_INTERVAL, Flasher, SilentAlarm};
pub use audio::SirenAlarm;
pub use error::CoreError;
pub use journal::{EventJournal, LogEntry, LogLevel, default_log_dir};
pub use metrics::{
    BatteryReading, HISTORY_CAPACITY, MetricsSource, Sample, SampleHistory, SystemMetricsSource,
};
pub use monitor::{
    MSG_ALERT_CLEARED, MSG_STARTED, MSG_STOPPED, Monitor, MonitorEvent, TICK_INTERVAL,
};
pub use security::{
    MSG_COMPROMISED, MSG_SECURE, SecurityStateMachine, SecurityStatus, Sensitivity, Transition,
};
pub use snapshot::{BatterySnapshot, StatusSnapshot};

/// Crate version, re-exported for the CLI banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
