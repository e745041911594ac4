//! Audio: ambient hum and looping static
//!
//! The session is created lazily on the first user gesture (hosts block
//! autoplay until then) and lives until teardown. The backend only has to
//! play what it is given; the noise buffer is generated here so every
//! backend hears the same static.

use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info};

use crate::core::catalog::audio;
use crate::core::chance::Chance;
use crate::core::noise::white_noise;
use crate::error::{ThemeError, ThemeResult};

/// Everything a backend needs to start the ambient bed.
#[derive(Debug, Clone)]
pub struct Ambient {
    pub tone_hz: f32,
    pub tone_gain: f32,
    pub noise_gain: f32,
    pub sample_rate: u32,
    /// One channel, looped
    pub noise: Vec<f32>,
}

impl Ambient {
    pub fn new(sample_rate: u32, chance: &mut dyn Chance) -> Self {
        let len = (sample_rate * audio::NOISE_SECONDS) as usize;
        Self {
            tone_hz: audio::TONE_HZ,
            tone_gain: audio::TONE_GAIN,
            noise_gain: audio::NOISE_GAIN,
            sample_rate,
            noise: white_noise(len, chance),
        }
    }
}

/// Host audio output.
pub trait AudioBackend {
    fn sample_rate(&self) -> u32;
    /// Start the tone and the looping noise
    fn start(&mut self, ambient: &Ambient) -> ThemeResult<()>;
    fn set_tone_frequency(&mut self, hz: f32);
    /// Stop every source and release the output
    fn close(&mut self);
}

/// A running ambient bed.
pub struct AudioSession {
    backend: Box<dyn AudioBackend>,
    base_hz: f32,
    tone_hz: f32,
}

impl AudioSession {
    /// Open a session on `backend`. On failure the backend is dropped.
    pub fn open(mut backend: Box<dyn AudioBackend>, chance: &mut dyn Chance) -> ThemeResult<Self> {
        let ambient = Ambient::new(backend.sample_rate(), chance);
        backend.start(&ambient)?;
        info!(
            tone_hz = ambient.tone_hz,
            noise_samples = ambient.noise.len(),
            "Audio session started"
        );
        Ok(Self { backend, base_hz: ambient.tone_hz, tone_hz: ambient.tone_hz })
    }

    pub fn tone_hz(&self) -> f32 {
        self.tone_hz
    }

    pub fn base_hz(&self) -> f32 {
        self.base_hz
    }

    /// Raise the tone to `factor` times its base pitch
    pub fn intensify(&mut self, factor: f32) {
        self.set_tone(self.base_hz * factor);
    }

    pub fn restore(&mut self) {
        self.set_tone(self.base_hz);
    }

    fn set_tone(&mut self, hz: f32) {
        debug!(hz, "Tone frequency");
        self.tone_hz = hz;
        self.backend.set_tone_frequency(hz);
    }

    /// Stop playback and hand the backend back for a later session
    pub fn close(mut self) -> Box<dyn AudioBackend> {
        self.backend.close();
        info!("Audio session closed");
        self.backend
    }
}

/// What a [`RecordingAudio`] backend was asked to do.
#[derive(Debug, Default, Clone)]
pub struct AudioLog {
    pub started: bool,
    pub closed: bool,
    pub frequencies: Vec<f32>,
    pub noise_len: usize,
}

/// Backend that plays nothing and records every call. Used headless.
#[derive(Debug, Clone)]
pub struct RecordingAudio {
    sample_rate: u32,
    fail_start: bool,
    log: Rc<RefCell<AudioLog>>,
}

impl RecordingAudio {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate, fail_start: false, log: Rc::default() }
    }

    /// Backend whose output never opens
    pub fn failing() -> Self {
        Self { fail_start: true, ..Self::new(8000) }
    }

    /// Shared view of the calls, still readable after the backend is boxed
    pub fn log(&self) -> Rc<RefCell<AudioLog>> {
        self.log.clone()
    }
}

impl AudioBackend for RecordingAudio {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn start(&mut self, ambient: &Ambient) -> ThemeResult<()> {
        if self.fail_start {
            return Err(ThemeError::AudioUnavailable("no audio output".into()));
        }
        let mut log = self.log.borrow_mut();
        log.started = true;
        log.noise_len = ambient.noise.len();
        log.frequencies.push(ambient.tone_hz);
        Ok(())
    }

    fn set_tone_frequency(&mut self, hz: f32) {
        self.log.borrow_mut().frequencies.push(hz);
    }

    fn close(&mut self) {
        self.log.borrow_mut().closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chance::RandChance;

    #[test]
    fn ambient_has_two_seconds_of_noise() {
        let mut chance = RandChance::seeded(1);
        let ambient = Ambient::new(8000, &mut chance);
        assert_eq!(ambient.noise.len(), 16_000);
        assert_eq!(ambient.tone_hz, 40.0);
        assert_eq!(ambient.tone_gain, 0.02);
        assert_eq!(ambient.noise_gain, 0.005);
    }

    #[test]
    fn session_intensifies_and_restores() {
        let mut chance = RandChance::seeded(2);
        let backend = RecordingAudio::new(100);
        let log = backend.log();
        let mut session = AudioSession::open(Box::new(backend), &mut chance).unwrap();
        session.intensify(2.0);
        assert_eq!(session.tone_hz(), 80.0);
        session.restore();
        assert_eq!(session.tone_hz(), 40.0);
        session.close();

        let log = log.borrow();
        assert!(log.started && log.closed);
        assert_eq!(log.noise_len, 200);
        assert_eq!(log.frequencies, vec![40.0, 80.0, 40.0]);
    }

    #[test]
    fn failing_backend_surfaces_error() {
        let mut chance = RandChance::seeded(3);
        assert!(AudioSession::open(Box::new(RecordingAudio::failing()), &mut chance).is_err());
    }
}
