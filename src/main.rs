// sound-notify - run a command, hear how it went
// Plays a success/failure sound once the command outlives the threshold

use anyhow::Result;
use clap::Parser;
use sound_notify::cli::Cli;
use sound_notify::config::{self, ConfigError};
use sound_notify::{AudioPlayer, EffectiveConfig, RunError};
use tracing::debug;
use tracing_subscriber::EnvFilter;

// Usage and configuration problems, same code clap uses for bad arguments
const EXIT_CONFIG: i32 = 2;

fn init_logging() -> Result<()> {
    // Quiet by default; SOUND_NOTIFY_LOG=debug shows what the player is doing
    let filter = EnvFilter::try_from_env("SOUND_NOTIFY_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // stderr only - stdout is shared with the wrapped command
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(filter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let code = if cli.init_config {
        init_config(&cli)
    } else {
        match load_config(&cli) {
            Ok(config) => wrap(&cli, &config),
            Err(e) => {
                eprintln!("Error: {}", e);
                EXIT_CONFIG
            }
        }
    };

    std::process::exit(code);
}

fn load_config(cli: &Cli) -> Result<EffectiveConfig, ConfigError> {
    config::resolve(cli.config.as_deref(), &cli.overrides())
}

fn wrap(cli: &Cli, config: &EffectiveConfig) -> i32 {
    let player = AudioPlayer::new();

    match sound_notify::run(&cli.command, config, cli.run_options(), &player) {
        Ok(code) => code,
        Err(e) => {
            debug!(error = ?e, "command did not complete");
            match e {
                RunError::Interrupted => eprintln!("\n{}", e),
                _ => eprintln!("Error: {}", e),
            }
            e.exit_code()
        }
    }
}

fn init_config(cli: &Cli) -> i32 {
    let path = match cli.config.clone().or_else(config::default_config_path) {
        Some(path) => path,
        None => {
            eprintln!("Error: {}", ConfigError::NoHomeDir);
            return EXIT_CONFIG;
        }
    };

    match config::write_default_config(&path) {
        Ok(()) => {
            println!("Wrote default config to {}", path.display());
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_CONFIG
        }
    }
}
