//! Siren audio through the default output device.
//!
//! `cpal::Stream` is not `Send`, so a dedicated control thread owns the
//! stream and takes start/stop commands over a channel. The tone itself is a
//! synthesized two-tone siren; it loops until stopped. Any failure to open
//! the device is reported back as [`CoreError::Audio`] and the alert carries
//! on without sound.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::alert::AlarmSink;
use crate::error::CoreError;

/// Siren amplitude, kept well below clipping.
const AMPLITUDE: f32 = 0.3;

/// The two siren tones, alternating.
const TONE_LOW_HZ: f32 = 620.0;
const TONE_HIGH_HZ: f32 = 880.0;

/// Half a siren cycle — how long each tone holds.
const TONE_HOLD: Duration = Duration::from_millis(450);

/// How long `start()` waits for the control thread to answer.
const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

enum Command {
    Start(Sender<Result<(), String>>),
    Stop,
}

/// Looping two-tone siren implementing [`AlarmSink`].
pub struct SirenAlarm {
    tx: Sender<Command>,
}

impl SirenAlarm {
    /// Spawn the control thread. Cheap; no device is touched until the first
    /// `start()`.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("siren-audio".into())
            .spawn(move || control_loop(rx))
            .map_err(|e| log::warn!("siren control thread failed to spawn: {e}"))
            .ok();
        Self { tx }
    }
}

impl Default for SirenAlarm {
    fn default() -> Self {
        Self::new()
    }
}

impl AlarmSink for SirenAlarm {
    fn start(&mut self) -> Result<(), CoreError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(Command::Start(reply_tx))
            .map_err(|_| CoreError::Audio("siren control thread is gone".into()))?;

        match reply_rx.recv_timeout(REPLY_TIMEOUT) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(msg)) => Err(CoreError::Audio(msg)),
            Err(_) => Err(CoreError::Audio("siren control thread did not answer".into())),
        }
    }

    fn stop(&mut self) {
        let _ = self.tx.send(Command::Stop);
    }
}

/// Owns the stream for its whole lifetime; exits when the sink is dropped.
fn control_loop(rx: Receiver<Command>) {
    let mut stream: Option<cpal::Stream> = None;

    while let Ok(cmd) = rx.recv() {
        match cmd {
            Command::Start(reply) => {
                if stream.is_none() {
                    match build_siren_stream() {
                        Ok(s) => {
                            stream = Some(s);
                            let _ = reply.send(Ok(()));
                        }
                        Err(e) => {
                            let _ = reply.send(Err(e.to_string()));
                        }
                    }
                } else {
                    // Already ringing.
                    let _ = reply.send(Ok(()));
                }
            }
            Command::Stop => {
                // Dropping the stream stops playback.
                stream = None;
            }
        }
    }

    drop(stream);
}

/// Open the default output device and start a playing siren stream.
fn build_siren_stream() -> Result<cpal::Stream, CoreError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| CoreError::Audio("no default output device".into()))?;
    let config = device
        .default_output_config()
        .map_err(|e| CoreError::Audio(e.to_string()))?;

    let channels = config.channels() as usize;
    let sample_rate = config.sample_rate() as f32;

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let mut osc = SirenOscillator::new(sample_rate);
            let stream = device
                .build_output_stream(
                    &config.into(),
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        for frame in data.chunks_mut(channels) {
                            let value = osc.next_sample();
                            for out in frame {
                                *out = value;
                            }
                        }
                    },
                    |err| log::warn!("siren stream error: {err}"),
                    None,
                )
                .map_err(|e| CoreError::Audio(e.to_string()))?;
            stream.play().map_err(|e| CoreError::Audio(e.to_string()))?;
            Ok(stream)
        }
        format => Err(CoreError::Audio(format!("unsupported sample format: {format}"))),
    }
}

/// Phase-accumulator sine oscillator alternating between the two siren tones.
struct SirenOscillator {
    sample_rate: f32,
    phase: f32,
    frame: u64,
    hold_frames: u64,
}

impl SirenOscillator {
    fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            phase: 0.0,
            frame: 0,
            hold_frames: (TONE_HOLD.as_secs_f32() * sample_rate).max(1.0) as u64,
        }
    }

    fn frequency(&self) -> f32 {
        if (self.frame / self.hold_frames) % 2 == 0 {
            TONE_LOW_HZ
        } else {
            TONE_HIGH_HZ
        }
    }

    fn next_sample(&mut self) -> f32 {
        let value = (self.phase * std::f32::consts::TAU).sin() * AMPLITUDE;
        self.phase += self.frequency() / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        self.frame += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oscillator_output_stays_in_amplitude_bounds() {
        let mut osc = SirenOscillator::new(44_100.0);
        for _ in 0..100_000 {
            let v = osc.next_sample();
            assert!(v.abs() <= AMPLITUDE + f32::EPSILON, "sample out of range: {v}");
        }
    }

    #[test]
    fn oscillator_alternates_tones() {
        let mut osc = SirenOscillator::new(48_000.0);
        assert_eq!(osc.frequency(), TONE_LOW_HZ);

        // Advance past one hold period.
        for _ in 0..=osc.hold_frames {
            osc.next_sample();
        }
        assert_eq!(osc.frequency(), TONE_HIGH_HZ);

        for _ in 0..=osc.hold_frames {
            osc.next_sample();
        }
        assert_eq!(osc.frequency(), TONE_LOW_HZ);
    }

    #[test]
    fn oscillator_phase_wraps() {
        let mut osc = SirenOscillator::new(8_000.0);
        for _ in 0..50_000 {
            osc.next_sample();
            assert!((0.0..1.0).contains(&osc.phase));
        }
    }

    #[test]
    fn stop_without_start_is_harmless() {
        let mut siren = SirenAlarm::new();
        siren.stop();
        siren.stop();
    }
}
