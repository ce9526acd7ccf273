// End-to-end runs of real commands through the library, with a recording player
#![cfg(unix)]

use sound_notify::config::{self, CliOverrides, EffectiveConfig};
use sound_notify::runner::{run_with, Interrupt};
use sound_notify::{PlaybackError, RunError, RunOptions, SoundPlayer};
use std::cell::RefCell;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Default)]
struct RecordingPlayer {
    played: RefCell<Vec<PathBuf>>,
}

impl SoundPlayer for RecordingPlayer {
    fn play(&self, path: &Path) -> Result<(), PlaybackError> {
        self.played.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}

struct BrokenPlayer;

impl SoundPlayer for BrokenPlayer {
    fn play(&self, _path: &Path) -> Result<(), PlaybackError> {
        Err(PlaybackError::NoPlayerFound(vec!["paplay: not installed".to_string()]))
    }
}

fn argv(parts: &[&str]) -> Vec<OsString> {
    parts.iter().map(OsString::from).collect()
}

fn config(threshold: u64) -> EffectiveConfig {
    EffectiveConfig {
        success_sound: PathBuf::from("/sounds/success.wav"),
        failure_sound: PathBuf::from("/sounds/failure.wav"),
        min_duration: threshold,
    }
}

fn wrap(parts: &[&str], config: &EffectiveConfig, options: RunOptions, player: &dyn SoundPlayer) -> Result<i32, RunError> {
    run_with(&argv(parts), config, options, player, &Interrupt::detached())
}

#[test]
fn successful_command_plays_success_sound() {
    let player = RecordingPlayer::default();
    let code = wrap(&["echo", "test"], &config(0), RunOptions::default(), &player).unwrap();

    assert_eq!(code, 0);
    assert_eq!(*player.played.borrow(), vec![PathBuf::from("/sounds/success.wav")]);
}

#[test]
fn failed_command_plays_failure_sound() {
    let player = RecordingPlayer::default();
    let code = wrap(&["false"], &config(0), RunOptions::default(), &player).unwrap();

    assert_eq!(code, 1);
    assert_eq!(*player.played.borrow(), vec![PathBuf::from("/sounds/failure.wav")]);
}

#[test]
fn exit_code_is_mirrored() {
    let player = RecordingPlayer::default();
    let code = wrap(&["sh", "-c", "exit 42"], &config(0), RunOptions::default(), &player).unwrap();
    assert_eq!(code, 42);
}

#[test]
fn quick_command_under_threshold_is_silent() {
    let player = RecordingPlayer::default();
    for cmd in [&["true"][..], &["false"][..]] {
        wrap(cmd, &config(3600), RunOptions::default(), &player).unwrap();
    }
    assert!(player.played.borrow().is_empty());
}

#[test]
fn dry_run_is_silent() {
    let player = RecordingPlayer::default();
    let options = RunOptions {
        dry_run: true,
        verbose: true,
    };
    let code = wrap(&["echo", "test"], &config(0), options, &player).unwrap();

    assert_eq!(code, 0);
    assert!(player.played.borrow().is_empty());
}

#[test]
fn missing_command_is_127_without_playback() {
    let player = RecordingPlayer::default();
    let err = wrap(&["nonexistent_command_xyz"], &config(0), RunOptions::default(), &player).unwrap_err();

    assert_eq!(err.exit_code(), 127);
    assert!(err.to_string().contains("Command not found"));
    assert!(player.played.borrow().is_empty());
}

#[test]
fn playback_failure_keeps_exit_code() {
    let options = RunOptions {
        dry_run: false,
        verbose: true,
    };
    let code = wrap(&["sh", "-c", "exit 7"], &config(0), options, &BrokenPlayer).unwrap();
    assert_eq!(code, 7);
}

#[test]
fn wrapped_command_keeps_its_flags() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("marker");

    let player = RecordingPlayer::default();
    let code = wrap(
        &["sh", "-c", "touch \"$1\"", "sh", marker.to_str().unwrap()],
        &config(3600),
        RunOptions::default(),
        &player,
    )
    .unwrap();

    assert_eq!(code, 0);
    assert!(marker.exists());
}

#[test]
fn malformed_config_fails_before_anything_runs() {
    let dir = tempfile::tempdir().unwrap();
    let config_file = dir.path().join("bad.toml");
    fs::write(&config_file, "min_duration = [").unwrap();

    let err = config::resolve(Some(&config_file), &CliOverrides::default()).unwrap_err();
    assert!(err.to_string().contains("failed to load config"));
}

#[test]
fn config_file_threshold_drives_the_decision() {
    let dir = tempfile::tempdir().unwrap();
    let config_file = dir.path().join("config.toml");
    fs::write(&config_file, "min_duration = 3600\n").unwrap();

    let player = RecordingPlayer::default();
    let from_file = config::resolve(Some(&config_file), &CliOverrides::default()).unwrap();
    wrap(&["true"], &from_file, RunOptions::default(), &player).unwrap();
    assert!(player.played.borrow().is_empty());

    let cli = CliOverrides {
        min_duration: Some(0),
        ..Default::default()
    };
    let from_cli = config::resolve(Some(&config_file), &cli).unwrap();
    wrap(&["true"], &from_cli, RunOptions::default(), &player).unwrap();
    assert_eq!(*player.played.borrow(), vec![from_cli.success_sound.clone()]);
}
