// Command-line surface
// Everything after the first positional belongs to the wrapped command

use crate::config::CliOverrides;
use crate::runner::RunOptions;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "sound-notify", version)]
#[command(about = "Wrap CLI commands with sound notifications on completion")]
#[command(after_help = "Example: sound-notify -t 10 -- cargo build --release")]
pub struct Cli {
    /// Custom success sound file
    #[arg(short, long, value_name = "PATH")]
    pub success_sound: Option<PathBuf>,

    /// Custom failure sound file
    #[arg(short, long, value_name = "PATH")]
    pub failure_sound: Option<PathBuf>,

    /// Minimum duration (seconds) to trigger notification
    #[arg(short, long, value_name = "SECONDS")]
    pub threshold: Option<u64>,

    /// Show timing and notification details
    #[arg(short, long)]
    pub verbose: bool,

    /// Test without playing sounds
    #[arg(short, long)]
    pub dry_run: bool,

    /// Custom config file path
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write a starter config file (to --config or ~/.sound-notify.toml) and exit
    #[arg(long)]
    pub init_config: bool,

    /// The command to run, with its own arguments
    #[arg(
        value_name = "COMMAND",
        required_unless_present = "init_config",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<OsString>,
}

impl Cli {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            success_sound: self.success_sound.clone(),
            failure_sound: self.failure_sound.clone(),
            min_duration: self.threshold,
        }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            dry_run: self.dry_run,
            verbose: self.verbose,
        }
    }
}
