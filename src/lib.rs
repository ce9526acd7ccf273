// sound-notify library - the pieces behind the binary
// Split out so the runner and players can be driven from tests

pub mod audio;   // native + system player fallbacks
pub mod cli;     // argument parsing
pub mod config;  // defaults, config file, CLI overrides
pub mod runner;  // spawn, time, notify

// Export the stuff the binary and tests actually use
pub use audio::{AudioPlayer, PlaybackError, SoundPlayer};
pub use config::{ConfigError, EffectiveConfig};
pub use runner::{run, ExecutionResult, Notification, RunError, RunOptions};
