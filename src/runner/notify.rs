// Notification decision - should we make a sound, and which one

use super::{ExecutionResult, RunOptions};
use crate::audio::{PlaybackError, SoundPlayer};
use crate::config::{EffectiveConfig, SoundKind};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Play { status: SoundKind, sound: PathBuf },
    Skip { duration: Duration, threshold: u64 },
}

/// Pure part of the decision: threshold gate, then exit code picks the sound.
pub fn decide(result: &ExecutionResult, config: &EffectiveConfig) -> Notification {
    if result.duration < Duration::from_secs(config.min_duration) {
        return Notification::Skip {
            duration: result.duration,
            threshold: config.min_duration,
        };
    }

    let status = if result.exit_code == 0 {
        SoundKind::Success
    } else {
        SoundKind::Failure
    };

    Notification::Play {
        status,
        sound: config.sound_for(status).to_path_buf(),
    }
}

/// Decide, announce (verbose), and play unless this is a dry run.
/// Playback problems are reported at most as a warning; they never fail the run.
pub fn notify(
    result: &ExecutionResult,
    config: &EffectiveConfig,
    options: RunOptions,
    player: &dyn SoundPlayer,
) -> Notification {
    let decision = decide(result, config);

    match &decision {
        Notification::Play { status, sound } => {
            if options.verbose {
                println!("Playing {} notification: {}", status, sound.display());
            }

            if options.dry_run {
                debug!("dry run, not playing");
            } else {
                match player.play(sound) {
                    Ok(()) => {}
                    // the runner turns this into exit 130
                    Err(PlaybackError::Interrupted) => debug!("notification sound cut short"),
                    Err(e) => {
                        debug!(error = %e, "notification sound failed");
                        if options.verbose {
                            eprintln!("Warning: Failed to play sound: {}", e);
                        }
                    }
                }
            }
        }
        Notification::Skip { duration, threshold } => {
            if options.verbose {
                println!(
                    "Duration {:.2}s below threshold {}s, skipping notification",
                    duration.as_secs_f64(),
                    threshold
                );
            }
        }
    }

    decision
}
