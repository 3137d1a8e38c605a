//! Alert lifecycle — siren, visual flash, dismissal.
//!
//! The controller reacts to security transitions and to the user's dismiss
//! command. Audio goes through the [`AlarmSink`] seam so tests (and muted or
//! headless runs) never touch a device. Every operation here is idempotent:
//! arming an armed alert and dismissing a dismissed one are both no-ops.

use std::time::{Duration, Instant};

use crate::error::CoreError;

/// Visual flash half-period — the indicator flips every 500 ms while armed.
pub const FLASH_INTERVAL: Duration = Duration::from_millis(500);

/// Something that can ring until told to stop.
pub trait AlarmSink: Send {
    /// Start the looping alarm. Failure means silent mode, not no alert.
    fn start(&mut self) -> Result<(), CoreError>;

    /// Stop the alarm. Must be safe to call when not ringing.
    fn stop(&mut self);
}

/// No-op sink for tests, `--mute`-style headless runs, and hosts without
/// audio.
#[derive(Debug, Default)]
pub struct SilentAlarm;

impl AlarmSink for SilentAlarm {
    fn start(&mut self) -> Result<(), CoreError> {
        Ok(())
    }

    fn stop(&mut self) {}
}

/// Timed-step flash state machine.
///
/// One recurring UI timer calls [`tick`](Self::tick); the phase flips every
/// [`FLASH_INTERVAL`] while armed. No self-rescheduling callbacks.
#[derive(Debug)]
pub struct Flasher {
    armed: bool,
    phase: bool,
    last_toggle: Instant,
}

impl Flasher {
    pub fn new() -> Self {
        Self {
            armed: false,
            phase: false,
            last_toggle: Instant::now(),
        }
    }

    pub fn arm(&mut self) {
        if !self.armed {
            self.armed = true;
            self.phase = true;
            self.last_toggle = Instant::now();
        }
    }

    pub fn disarm(&mut self) {
        self.armed = false;
        self.phase = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Advance the flash clock. Returns the phase after the step: `true` is
    /// the highlighted half-period, always `false` when disarmed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.armed && now.duration_since(self.last_toggle) >= FLASH_INTERVAL {
            self.phase = !self.phase;
            self.last_toggle = now;
        }
        self.phase
    }

    pub fn phase(&self) -> bool {
        self.phase
    }
}

impl Default for Flasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of arming the alert, for the caller to journal.
#[derive(Debug)]
pub struct ArmOutcome {
    /// False when the alert was already active (nothing happened).
    pub armed: bool,
    /// Set when the siren could not start; the alert continues silently.
    pub audio_error: Option<CoreError>,
}

/// Owns alert state: active flag, siren sink, flasher, sound toggle.
pub struct AlertController {
    active: bool,
    sound_enabled: bool,
    sink: Box<dyn AlarmSink>,
    flasher: Flasher,
}

impl AlertController {
    pub fn new(sink: Box<dyn AlarmSink>) -> Self {
        Self {
            active: false,
            sound_enabled: true,
            sink,
            flasher: Flasher::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn flasher_mut(&mut self) -> &mut Flasher {
        &mut self.flasher
    }

    pub fn flash_phase(&self) -> bool {
        self.flasher.phase()
    }

    /// Entering Compromised: arm the alert, start siren and flash.
    pub fn on_compromised(&mut self) -> ArmOutcome {
        if self.active {
            return ArmOutcome {
                armed: false,
                audio_error: None,
            };
        }

        self.active = true;
        self.flasher.arm();

        let audio_error = if self.sound_enabled {
            match self.sink.start() {
                Ok(()) => None,
                Err(e) => {
                    log::warn!("alarm audio unavailable: {e}");
                    Some(e)
                }
            }
        } else {
            None
        };

        ArmOutcome {
            armed: true,
            audio_error,
        }
    }

    /// Returning to Secure clears the alert exactly like a manual dismissal.
    pub fn on_secure(&mut self) -> bool {
        self.dismiss()
    }

    /// User-initiated dismissal: stop siren and flash, reset state. Does not
    /// touch SecurityStatus. Returns whether an alert was actually cleared.
    pub fn dismiss(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        self.sink.stop();
        self.flasher.disarm();
        true
    }

    /// Toggle the sound setting, returning the new value. Muting while the
    /// siren rings silences it; unmuting mid-alert starts it again.
    pub fn toggle_sound(&mut self) -> bool {
        self.sound_enabled = !self.sound_enabled;
        if self.active {
            if self.sound_enabled {
                if let Err(e) = self.sink.start() {
                    log::warn!("alarm audio unavailable: {e}");
                }
            } else {
                self.sink.stop();
            }
        }
        self.sound_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Sink that records start/stop calls and optionally fails to start.
    struct ProbeSink {
        calls: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    }

    impl AlarmSink for ProbeSink {
        fn start(&mut self) -> Result<(), CoreError> {
            self.calls.lock().unwrap().push("start");
            if self.fail {
                Err(CoreError::Audio("no output device".into()))
            } else {
                Ok(())
            }
        }

        fn stop(&mut self) {
            self.calls.lock().unwrap().push("stop");
        }
    }

    fn controller(fail: bool) -> (AlertController, Arc<Mutex<Vec<&'static str>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = ProbeSink {
            calls: Arc::clone(&calls),
            fail,
        };
        (AlertController::new(Box::new(sink)), calls)
    }

    #[test]
    fn arm_starts_siren_once() {
        let (mut c, calls) = controller(false);

        let first = c.on_compromised();
        assert!(first.armed);
        assert!(first.audio_error.is_none());
        assert!(c.is_active());

        // Second arm while active is a no-op.
        let second = c.on_compromised();
        assert!(!second.armed);
        assert_eq!(calls.lock().unwrap().as_slice(), ["start"]);
    }

    #[test]
    fn audio_failure_still_arms() {
        let (mut c, _calls) = controller(true);
        let outcome = c.on_compromised();
        assert!(outcome.armed);
        assert!(outcome.audio_error.is_some());
        assert!(c.is_active());
        assert!(c.flasher_mut().is_armed());
    }

    #[test]
    fn dismiss_is_idempotent() {
        let (mut c, calls) = controller(false);
        c.on_compromised();

        assert!(c.dismiss());
        assert!(!c.is_active());
        assert!(!c.dismiss());

        // One start, one stop — the second dismiss touched nothing.
        assert_eq!(calls.lock().unwrap().as_slice(), ["start", "stop"]);
    }

    #[test]
    fn on_secure_equals_dismiss() {
        let (mut c, _) = controller(false);
        c.on_compromised();
        assert!(c.on_secure());
        assert!(!c.is_active());
        assert!(!c.flasher_mut().is_armed());
    }

    #[test]
    fn mute_silences_ringing_siren() {
        let (mut c, calls) = controller(false);
        c.on_compromised();

        assert!(!c.toggle_sound());
        assert_eq!(calls.lock().unwrap().as_slice(), ["start", "stop"]);

        // Unmute mid-alert rings again.
        assert!(c.toggle_sound());
        assert_eq!(calls.lock().unwrap().as_slice(), ["start", "stop", "start"]);
    }

    #[test]
    fn muted_arm_skips_audio() {
        let (mut c, calls) = controller(false);
        c.toggle_sound(); // off
        c.on_compromised();
        assert!(c.is_active());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn flasher_flips_every_interval() {
        let mut f = Flasher::new();
        f.arm();
        assert!(f.phase(), "armed flasher starts in the highlighted phase");

        let t0 = Instant::now();
        assert!(f.tick(t0 + Duration::from_millis(100)), "too early to flip");
        assert!(!f.tick(t0 + FLASH_INTERVAL + Duration::from_millis(600)));
    }

    #[test]
    fn disarmed_flasher_stays_dark() {
        let mut f = Flasher::new();
        assert!(!f.tick(Instant::now() + Duration::from_secs(10)));
        f.arm();
        f.disarm();
        assert!(!f.phase());
    }
}
