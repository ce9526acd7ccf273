// Native playback through rodio
// Blocks until the sound has finished so the process doesn't exit mid-clip

use super::{PlaybackError, SoundPlayer};
use rodio::{Decoder, OutputStream, Sink};
use signal_hook::consts::SIGINT;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

// How often we look at the sink while a clip plays
const CLIP_POLL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Copy, Default)]
pub struct NativePlayer;

impl SoundPlayer for NativePlayer {
    fn play(&self, path: &Path) -> Result<(), PlaybackError> {
        // No output device means there's nothing native to play through
        let (_stream, stream_handle) =
            OutputStream::try_default().map_err(|e| PlaybackError::Unavailable(e.to_string()))?;

        let sink = Sink::try_new(&stream_handle).map_err(|e| PlaybackError::Native(e.to_string()))?;

        let file = File::open(path)
            .map_err(|e| PlaybackError::Native(format!("failed to open {}: {}", path.display(), e)))?;

        let source = Decoder::new(BufReader::new(file)).map_err(|e| {
            PlaybackError::Native(format!("failed to decode '{}': {}", path.display(), e))
        })?;

        // Ctrl-C mid-clip cuts the sound instead of waiting it out
        let interrupted = Arc::new(AtomicBool::new(false));
        let registration = signal_hook::flag::register(SIGINT, Arc::clone(&interrupted))
            .map_err(|e| warn!(error = %e, "clip can't be cut short by Ctrl-C"))
            .ok();

        debug!(path = %path.display(), "playing through default output device");
        sink.append(source);

        while !sink.empty() && !interrupted.load(Ordering::SeqCst) {
            thread::sleep(CLIP_POLL);
        }

        if let Some(id) = registration {
            signal_hook::low_level::unregister(id);
        }

        if interrupted.load(Ordering::SeqCst) {
            sink.stop();
            return Err(PlaybackError::Interrupted);
        }

        Ok(())
    }
}
