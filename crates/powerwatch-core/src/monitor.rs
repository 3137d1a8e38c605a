//! Monitoring lifecycle — one background worker, one event channel.
//!
//! `start()` spawns a worker that samples, evaluates the security state
//! machine, and drives the journal and alert controller once per tick.
//! State-change events flow to the presentation layer over an mpsc channel;
//! counters and history live in shared structs behind `Arc` so the UI reads
//! them without talking to the worker.
//!
//! Every runtime error inside the loop is converted to a journal entry and a
//! backoff; nothing propagates out while monitoring is active. Stopping
//! flips a flag — in-flight reads are never interrupted, the loop just stops
//! scheduling the next iteration.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::alert::AlertController;
use crate::error::CoreError;
use crate::journal::{EventJournal, LogLevel};
use crate::metrics::{MetricsSource, Sample, SampleHistory};
use crate::security::{
    MSG_COMPROMISED, MSG_SECURE, SecurityStateMachine, SecurityStatus, Sensitivity, Transition,
};

/// Default sampling cadence.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Transient-error backoff is five ticks (5 s at the default cadence).
const BACKOFF_TICKS: u32 = 5;

/// Messages journaled on lifecycle edges.
pub const MSG_STARTED: &str = "Système de surveillance activé";
pub const MSG_STOPPED: &str = "Système de surveillance désactivé";
pub const MSG_ALERT_CLEARED: &str = "Alerte désactivée";

/// State changes forwarded to the presentation layer.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// A fresh sample was taken and recorded in history.
    Sample(Sample),
    /// Security status changed.
    Transition(Transition),
    /// A metrics read failed; the loop is backing off.
    SamplingError(String),
}

/// Everything the worker thread shares with the owning side.
struct WorkerContext {
    running: Arc<AtomicBool>,
    sensitivity: Arc<AtomicU8>,
    machine: Arc<Mutex<SecurityStateMachine>>,
    history: Arc<Mutex<SampleHistory>>,
    journal: Arc<Mutex<EventJournal>>,
    alerts: Arc<Mutex<AlertController>>,
    events: Sender<MonitorEvent>,
    tick: Duration,
}

/// Top-level monitoring state machine: `Stopped` ⇄ `Running`.
///
/// Security state is *not* reset by `stop()`; only process restart does that.
pub struct Monitor {
    running: Arc<AtomicBool>,
    sensitivity: Arc<AtomicU8>,
    machine: Arc<Mutex<SecurityStateMachine>>,
    history: Arc<Mutex<SampleHistory>>,
    journal: Arc<Mutex<EventJournal>>,
    alerts: Arc<Mutex<AlertController>>,
    events: Sender<MonitorEvent>,
    tick: Duration,
    worker: Option<JoinHandle<()>>,
    started_at: Option<Instant>,
}

impl Monitor {
    /// Build a stopped monitor. Returns the receiving end of the event
    /// channel for the presentation layer.
    pub fn new(
        journal: Arc<Mutex<EventJournal>>,
        alerts: Arc<Mutex<AlertController>>,
        sensitivity: Sensitivity,
        tick: Duration,
    ) -> (Self, Receiver<MonitorEvent>) {
        let (tx, rx) = mpsc::channel();
        let monitor = Self {
            running: Arc::new(AtomicBool::new(false)),
            sensitivity: Arc::new(AtomicU8::new(sensitivity.level())),
            machine: Arc::new(Mutex::new(SecurityStateMachine::new())),
            history: Arc::new(Mutex::new(SampleHistory::new())),
            journal,
            alerts,
            events: tx,
            tick,
            worker: None,
            started_at: None,
        };
        (monitor, rx)
    }

    /// Stopped → Running: spawn the sampling/evaluation worker.
    pub fn start(&mut self, source: Box<dyn MetricsSource>) -> Result<(), CoreError> {
        if self.running.load(Ordering::Relaxed) {
            return Err(CoreError::AlreadyRunning);
        }

        self.running.store(true, Ordering::Relaxed);
        self.started_at = Some(Instant::now());
        lock(&self.journal).append(LogLevel::Info, MSG_STARTED);

        let ctx = WorkerContext {
            running: Arc::clone(&self.running),
            sensitivity: Arc::clone(&self.sensitivity),
            machine: Arc::clone(&self.machine),
            history: Arc::clone(&self.history),
            journal: Arc::clone(&self.journal),
            alerts: Arc::clone(&self.alerts),
            events: self.events.clone(),
            tick: self.tick,
        };

        let handle = thread::Builder::new()
            .name("powerwatch-worker".into())
            .spawn(move || worker_loop(ctx, source))?;
        self.worker = Some(handle);

        Ok(())
    }

    /// Running → Stopped: stop scheduling iterations, join the worker,
    /// dismiss any active alert.
    pub fn stop(&mut self) {
        if !self.running.swap(false, Ordering::Relaxed) {
            return;
        }

        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        self.started_at = None;

        let dismissed = lock(&self.alerts).on_secure();
        let mut journal = lock(&self.journal);
        if dismissed {
            journal.append(LogLevel::Info, MSG_ALERT_CLEARED);
        }
        journal.append(LogLevel::Info, MSG_STOPPED);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Time spent in the current Running period, `None` while stopped.
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|t| t.elapsed())
    }

    pub fn status(&self) -> SecurityStatus {
        lock(&self.machine).status()
    }

    pub fn incidents(&self) -> u64 {
        lock(&self.machine).incidents()
    }

    pub fn sensitivity(&self) -> Sensitivity {
        Sensitivity::new(self.sensitivity.load(Ordering::Relaxed))
    }

    /// Owned by the UI, read by the worker on every evaluation.
    pub fn set_sensitivity(&self, sensitivity: Sensitivity) {
        self.sensitivity.store(sensitivity.level(), Ordering::Relaxed);
    }

    pub fn latest_sample(&self) -> Option<Sample> {
        lock(&self.history).latest().copied()
    }

    pub fn history(&self) -> &Arc<Mutex<SampleHistory>> {
        &self.history
    }

    pub fn journal(&self) -> &Arc<Mutex<EventJournal>> {
        &self.journal
    }

    pub fn alerts(&self) -> &Arc<Mutex<AlertController>> {
        &self.alerts
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        // Only unpark the worker; journaled shutdown belongs to the caller.
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

fn worker_loop(ctx: WorkerContext, mut source: Box<dyn MetricsSource>) {
    while ctx.running.load(Ordering::Relaxed) {
        // Panics inside a metrics source are contained at the loop boundary,
        // same as ordinary read errors.
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| source.sample()))
            .unwrap_or_else(|_| Err(CoreError::Metrics("metrics source panicked".into())));

        match result {
            Ok(sample) => {
                lock(&ctx.history).push(sample);

                let sensitivity = Sensitivity::new(ctx.sensitivity.load(Ordering::Relaxed));
                let transition = lock(&ctx.machine).evaluate(&sample, sensitivity);

                if let Some(t) = transition {
                    handle_transition(&ctx, t);
                    let _ = ctx.events.send(MonitorEvent::Transition(t));
                }
                let _ = ctx.events.send(MonitorEvent::Sample(sample));

                sleep_while_running(&ctx.running, ctx.tick);
            }
            Err(e) => {
                log::warn!("sampling failed, backing off: {e}");
                lock(&ctx.journal)
                    .append(LogLevel::Warning, &format!("Erreur de surveillance: {e}"));
                let _ = ctx.events.send(MonitorEvent::SamplingError(e.to_string()));

                sleep_while_running(&ctx.running, ctx.tick * BACKOFF_TICKS);
            }
        }
    }
}

fn handle_transition(ctx: &WorkerContext, t: Transition) {
    match t.to {
        SecurityStatus::Compromised => {
            lock(&ctx.journal).append(LogLevel::Alert, MSG_COMPROMISED);
            let outcome = lock(&ctx.alerts).on_compromised();
            if let Some(e) = outcome.audio_error {
                lock(&ctx.journal).append(LogLevel::Warning, &format!("Erreur audio: {e}"));
            }
        }
        SecurityStatus::Secure => {
            let dismissed = lock(&ctx.alerts).on_secure();
            let mut journal = lock(&ctx.journal);
            journal.append(LogLevel::Info, MSG_SECURE);
            if dismissed {
                journal.append(LogLevel::Info, MSG_ALERT_CLEARED);
            }
        }
    }
}

/// Sleep in short slices so `stop()` is honored within ~100 ms.
fn sleep_while_running(running: &AtomicBool, total: Duration) {
    const SLICE: Duration = Duration::from_millis(100);
    let deadline = Instant::now() + total;
    while running.load(Ordering::Relaxed) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        thread::sleep(remaining.min(SLICE));
    }
}

/// Lock that survives a poisoned mutex — a panicked holder must not wedge
/// the monitor.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
