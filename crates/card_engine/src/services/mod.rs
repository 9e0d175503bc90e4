mod atomic_io;
mod certificate;
mod flag_store;

use thiserror::Error;
use tracing::{debug, info};

use crate::app::{HapticPattern, SoundEffect};

pub use certificate::{
    certificate_serial, render_certificate, CertificateError, CertificateService, NoCertificate,
    PngCertificateWriter, CERTIFICATE_FILE_NAME, CERTIFICATE_HEIGHT, CERTIFICATE_WIDTH,
};
pub use flag_store::{FlagStore, FlagStoreError, JsonFlagStore, MemoryFlagStore};

/// Failure of an optional enhancement. Never blocks a stage transition.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} is not supported on this device")]
    Unsupported(&'static str),
    #[error("{service} failed: {message}")]
    Failed {
        service: &'static str,
        message: String,
    },
}

pub trait SoundPlayer {
    fn play(&mut self, effect: SoundEffect) -> Result<(), ServiceError>;
}

pub trait Haptics {
    fn vibrate(&mut self, pattern: &HapticPattern) -> Result<(), ServiceError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoSound;

impl SoundPlayer for NoSound {
    fn play(&mut self, _effect: SoundEffect) -> Result<(), ServiceError> {
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoHaptics;

impl Haptics for NoHaptics {
    fn vibrate(&mut self, _pattern: &HapticPattern) -> Result<(), ServiceError> {
        Err(ServiceError::Unsupported("vibration"))
    }
}

/// Reports each tone through tracing in place of an audio device.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSoundPlayer;

impl SoundPlayer for LoggingSoundPlayer {
    fn play(&mut self, effect: SoundEffect) -> Result<(), ServiceError> {
        let tone = effect.tone();
        info!(
            effect = effect.name(),
            frequency_hz = tone.frequency_hz,
            duration_ms = (tone.duration_secs * 1000.0).round() as u64,
            "sound_played"
        );
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHaptics;

impl Haptics for LoggingHaptics {
    fn vibrate(&mut self, pattern: &HapticPattern) -> Result<(), ServiceError> {
        debug!(
            pattern_ms = ?pattern.durations_ms(),
            total_ms = pattern.total_ms(),
            "haptic_triggered"
        );
        Ok(())
    }
}

/// Collaborators the runtime calls into. All of them are best-effort.
pub struct Services {
    pub sound: Box<dyn SoundPlayer>,
    pub haptics: Box<dyn Haptics>,
    pub certificate: Box<dyn CertificateService>,
    pub flags: Box<dyn FlagStore>,
}

impl Services {
    pub fn silent() -> Self {
        Self {
            sound: Box::new(NoSound),
            haptics: Box::new(NoHaptics),
            certificate: Box::new(NoCertificate),
            flags: Box::new(MemoryFlagStore::default()),
        }
    }

    pub fn with_sound(mut self, sound: impl SoundPlayer + 'static) -> Self {
        self.sound = Box::new(sound);
        self
    }

    pub fn with_haptics(mut self, haptics: impl Haptics + 'static) -> Self {
        self.haptics = Box::new(haptics);
        self
    }

    pub fn with_certificate(mut self, certificate: impl CertificateService + 'static) -> Self {
        self.certificate = Box::new(certificate);
        self
    }

    pub fn with_flags(mut self, flags: impl FlagStore + 'static) -> Self {
        self.flags = Box::new(flags);
        self
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::silent()
    }
}
