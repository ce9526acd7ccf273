// System audio players - the fallback when native playback isn't available
// Each platform gets an ordered candidate list, tried first-match-wins

use super::{PlaybackError, SoundPlayer};
use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
    Windows,
    Other(String),
}

impl Platform {
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an OS identifier (`std::env::consts::OS` style) to a player family.
    pub fn from_os(os: &str) -> Self {
        match os {
            "macos" => Platform::MacOs,
            "linux" | "freebsd" | "openbsd" | "netbsd" | "dragonfly" => Platform::Linux,
            "windows" => Platform::Windows,
            other => Platform::Other(other.to_string()),
        }
    }
}

/// One external player we know how to drive.
#[derive(Clone, Copy)]
pub struct Candidate {
    pub program: &'static str,
    pub args: fn(&Path) -> Vec<OsString>,
    pub quiet: bool, // send the player's own stdout/stderr to /dev/null
}

/// What a chain does when a candidate doesn't work out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    Abort,
    TryNext,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exit {
    Success,
    Failed(String),
    /// Killed by the same Ctrl-C that hit us; the user wants out, not another player.
    Interrupted,
}

/// Runs a player process to completion. Split out so the chain logic can be
/// driven without real players installed.
pub trait Launcher {
    fn launch(&self, program: &str, args: &[OsString], quiet: bool) -> io::Result<Exit>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&self, program: &str, args: &[OsString], quiet: bool) -> io::Result<Exit> {
        let mut command = Command::new(program);
        command.args(args).stdin(Stdio::null());

        if quiet {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let status = command.status()?;
        if status.success() {
            return Ok(Exit::Success);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if status.signal() == Some(signal_hook::consts::SIGINT) {
                return Ok(Exit::Interrupted);
            }
        }

        Ok(Exit::Failed(status.to_string()))
    }
}

pub const MACOS_PLAYERS: &[Candidate] = &[Candidate {
    program: "afplay",
    args: path_only,
    quiet: false,
}];

pub const LINUX_PLAYERS: &[Candidate] = &[
    Candidate {
        program: "paplay",
        args: path_only,
        quiet: true,
    },
    Candidate {
        program: "aplay",
        args: path_only,
        quiet: true,
    },
    Candidate {
        program: "ffplay",
        args: ffplay_args,
        quiet: true,
    },
];

pub const WINDOWS_PLAYERS: &[Candidate] = &[Candidate {
    program: "powershell",
    args: sound_player_args,
    quiet: true,
}];

fn path_only(path: &Path) -> Vec<OsString> {
    vec![path.as_os_str().to_owned()]
}

fn ffplay_args(path: &Path) -> Vec<OsString> {
    // without -nodisp/-autoexit ffplay opens a window and never returns
    let mut args: Vec<OsString> = ["-nodisp", "-autoexit", "-loglevel", "quiet"]
        .iter()
        .map(OsString::from)
        .collect();
    args.push(path.as_os_str().to_owned());
    args
}

fn sound_player_args(path: &Path) -> Vec<OsString> {
    let quoted = path.display().to_string().replace('\'', "''");
    vec![
        "-NoProfile".into(),
        "-NonInteractive".into(),
        "-Command".into(),
        format!("(New-Object Media.SoundPlayer '{}').PlaySync()", quoted).into(),
    ]
}

pub struct CandidateChain<L> {
    candidates: &'static [Candidate],
    on_failure: OnFailure,
    launcher: L,
}

impl<L: Launcher> CandidateChain<L> {
    pub fn new(candidates: &'static [Candidate], on_failure: OnFailure, launcher: L) -> Self {
        Self {
            candidates,
            on_failure,
            launcher,
        }
    }
}

impl<L: Launcher> SoundPlayer for CandidateChain<L> {
    fn play(&self, path: &Path) -> Result<(), PlaybackError> {
        let mut attempts = Vec::new();

        for candidate in self.candidates {
            let args = (candidate.args)(path);
            debug!(program = candidate.program, "trying audio player");

            let cause = match self.launcher.launch(candidate.program, &args, candidate.quiet) {
                Ok(Exit::Success) => return Ok(()),
                Ok(Exit::Interrupted) => {
                    debug!(program = candidate.program, "audio player interrupted");
                    return Err(PlaybackError::Interrupted);
                }
                Ok(Exit::Failed(status)) => format!("exited with {}", status),
                Err(e) if e.kind() == io::ErrorKind::NotFound => "not installed".to_string(),
                Err(source) => {
                    return Err(PlaybackError::Launch {
                        program: candidate.program,
                        source,
                    })
                }
            };

            debug!(program = candidate.program, %cause, "audio player failed");
            if self.on_failure == OnFailure::Abort {
                return Err(PlaybackError::PlayerFailed {
                    program: candidate.program,
                    cause,
                });
            }
            attempts.push(format!("{}: {}", candidate.program, cause));
        }

        Err(PlaybackError::NoPlayerFound(attempts))
    }
}

struct Unsupported(String);

impl SoundPlayer for Unsupported {
    fn play(&self, _path: &Path) -> Result<(), PlaybackError> {
        Err(PlaybackError::UnsupportedPlatform(self.0.clone()))
    }
}

/// The external fallback for a platform family.
pub fn backend_for<L: Launcher + 'static>(platform: &Platform, launcher: L) -> Box<dyn SoundPlayer> {
    match platform {
        Platform::MacOs => Box::new(CandidateChain::new(MACOS_PLAYERS, OnFailure::Abort, launcher)),
        Platform::Linux => Box::new(CandidateChain::new(LINUX_PLAYERS, OnFailure::TryNext, launcher)),
        Platform::Windows => Box::new(CandidateChain::new(WINDOWS_PLAYERS, OnFailure::Abort, launcher)),
        Platform::Other(os) => Box::new(Unsupported(os.clone())),
    }
}
