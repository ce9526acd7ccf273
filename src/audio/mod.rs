// Audio playback for notifications
// Native playback first (rodio), then whatever player the OS ships with

pub mod external;
#[cfg(feature = "native-audio")]
pub mod native;

pub use external::{Candidate, CandidateChain, Exit, Launcher, OnFailure, Platform, SystemLauncher};

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("sound file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The backend can't run here at all (no output device, ...). The player
    /// treats this as "try the next mechanism", never as a final answer.
    #[error("playback backend unavailable: {0}")]
    Unavailable(String),

    #[error("failed to play sound: {0}")]
    Native(String),

    #[error("{program} failed: {cause}")]
    PlayerFailed { program: &'static str, cause: String },

    #[error("no audio player found on system{}", describe_attempts(.0))]
    NoPlayerFound(Vec<String>),

    #[error("playback interrupted")]
    Interrupted,

    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("failed to launch {program}: {source}")]
    Launch {
        program: &'static str,
        #[source]
        source: io::Error,
    },
}

fn describe_attempts(attempts: &[String]) -> String {
    if attempts.is_empty() {
        String::new()
    } else {
        format!(" ({})", attempts.join("; "))
    }
}

/// Anything that can turn a sound file into noise.
pub trait SoundPlayer {
    fn play(&self, path: &Path) -> Result<(), PlaybackError>;
}

impl<T: SoundPlayer + ?Sized> SoundPlayer for &T {
    fn play(&self, path: &Path) -> Result<(), PlaybackError> {
        (**self).play(path)
    }
}

/// The player the runner uses. Tries the native backend when one is compiled
/// in, and falls back to the platform's external players when native playback
/// is unavailable.
pub struct AudioPlayer {
    native: Option<Box<dyn SoundPlayer>>,
    fallback: Box<dyn SoundPlayer>,
}

impl AudioPlayer {
    pub fn new() -> Self {
        Self::for_platform(&Platform::current())
    }

    pub fn for_platform(platform: &Platform) -> Self {
        debug!(?platform, "selecting playback backends");
        Self {
            native: native_backend(),
            fallback: external::backend_for(platform, SystemLauncher),
        }
    }

    pub fn with_backends(native: Option<Box<dyn SoundPlayer>>, fallback: Box<dyn SoundPlayer>) -> Self {
        Self { native, fallback }
    }
}

impl Default for AudioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundPlayer for AudioPlayer {
    fn play(&self, path: &Path) -> Result<(), PlaybackError> {
        if !path.exists() {
            return Err(PlaybackError::FileNotFound(path.to_path_buf()));
        }

        if let Some(native) = &self.native {
            match native.play(path) {
                Err(PlaybackError::Unavailable(reason)) => {
                    debug!(%reason, "native playback unavailable, using system player");
                }
                other => return other,
            }
        }

        self.fallback.play(path)
    }
}

#[cfg(feature = "native-audio")]
fn native_backend() -> Option<Box<dyn SoundPlayer>> {
    Some(Box::new(native::NativePlayer))
}

#[cfg(not(feature = "native-audio"))]
fn native_backend() -> Option<Box<dyn SoundPlayer>> {
    None
}
