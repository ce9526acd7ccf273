// Command runner - spawn the wrapped command, time it, then maybe notify
// Streams are inherited, so the child talks straight to the terminal

pub mod notify;

pub use notify::{decide, notify, Notification};

use crate::audio::SoundPlayer;
use crate::config::EffectiveConfig;
use signal_hook::consts::SIGINT;
#[cfg(unix)]
use signal_hook::consts::SIGCHLD;
#[cfg(unix)]
use signal_hook::iterator::Signals;
use signal_hook::SigId;
use std::ffi::OsString;
use std::io;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

pub const EXIT_NOT_EXECUTABLE: i32 = 126;
pub const EXIT_NOT_FOUND: i32 = 127;
pub const EXIT_INTERRUPTED: i32 = 130;

// Only used where we can't sleep on SIGCHLD
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum RunError {
    #[error("No command given")]
    NoCommand,

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Interrupted by user")]
    Interrupted,

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Lost track of the command: {0}")]
    Wait(#[source] io::Error),
}

impl RunError {
    /// Exit code the whole invocation terminates with.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::NoCommand => 2,
            RunError::CommandNotFound(_) => EXIT_NOT_FOUND,
            RunError::Interrupted => EXIT_INTERRUPTED,
            RunError::Spawn { .. } => EXIT_NOT_EXECUTABLE,
            RunError::Wait(_) => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub dry_run: bool,
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub duration: Duration,
}

impl ExecutionResult {
    pub fn duration_secs(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

/// Ctrl-C watcher for the duration of a run. While it's alive SIGINT only
/// flips a flag instead of killing us, so we can reap the child and exit 130.
pub struct Interrupt {
    flag: Arc<AtomicBool>,
    registration: Option<SigId>,
}

impl Interrupt {
    pub fn install() -> io::Result<Self> {
        let flag = Arc::new(AtomicBool::new(false));
        let registration = signal_hook::flag::register(SIGINT, Arc::clone(&flag))?;
        Ok(Self {
            flag,
            registration: Some(registration),
        })
    }

    /// A watcher that never fires.
    pub fn detached() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            registration: None,
        }
    }

    pub fn triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

impl Drop for Interrupt {
    fn drop(&mut self) {
        if let Some(id) = self.registration.take() {
            signal_hook::low_level::unregister(id);
        }
    }
}

/// Run the wrapped command and decide on a notification.
///
/// Returns the exit code to terminate with. The error path covers the cases
/// that skip notification entirely (not found, interrupted, unspawnable).
pub fn run(
    argv: &[OsString],
    config: &EffectiveConfig,
    options: RunOptions,
    player: &dyn SoundPlayer,
) -> Result<i32, RunError> {
    let interrupt = Interrupt::install().unwrap_or_else(|e| {
        warn!(error = %e, "could not watch for Ctrl-C");
        Interrupt::detached()
    });

    run_with(argv, config, options, player, &interrupt)
}

pub fn run_with(
    argv: &[OsString],
    config: &EffectiveConfig,
    options: RunOptions,
    player: &dyn SoundPlayer,
    interrupt: &Interrupt,
) -> Result<i32, RunError> {
    if options.verbose {
        println!("Running: {}", command_line(argv));
    }

    let result = execute(argv, interrupt)?;

    if options.verbose {
        println!(
            "\nCommand completed in {:.2}s with exit code {}",
            result.duration_secs(),
            result.exit_code
        );
    }

    notify(&result, config, options, player);

    // Ctrl-C while the sound played
    if interrupt.triggered() {
        return Err(RunError::Interrupted);
    }

    Ok(result.exit_code)
}

/// Spawn with inherited stdio and wait it out, timing the whole thing.
pub fn execute(argv: &[OsString], interrupt: &Interrupt) -> Result<ExecutionResult, RunError> {
    let (program, args) = argv.split_first().ok_or(RunError::NoCommand)?;
    let program_name = program.to_string_lossy().into_owned();

    let start = Instant::now();

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => RunError::CommandNotFound(program_name.clone()),
            _ => RunError::Spawn {
                program: program_name.clone(),
                source,
            },
        })?;

    debug!(pid = child.id(), command = %program_name, "spawned");

    let status = wait(&mut child, interrupt)?;
    let duration = start.elapsed();
    let exit_code = exit_code(status);

    debug!(exit_code, secs = duration.as_secs_f64(), "command finished");
    Ok(ExecutionResult { exit_code, duration })
}

/// Sleeps until something worth re-checking the child for happens: SIGCHLD or
/// SIGINT on unix, a short timer elsewhere or if the signals can't be hooked.
struct Wakeups {
    #[cfg(unix)]
    signals: Option<Signals>,
}

impl Wakeups {
    fn new() -> Self {
        #[cfg(unix)]
        {
            let signals = Signals::new([SIGCHLD, SIGINT])
                .map_err(|e| debug!(error = %e, "falling back to polling the child"))
                .ok();
            Self { signals }
        }

        #[cfg(not(unix))]
        {
            Self {}
        }
    }

    fn sleep(&mut self) {
        #[cfg(unix)]
        if let Some(signals) = self.signals.as_mut() {
            // returns right away if a signal landed since the last call
            let _ = signals.wait();
            return;
        }

        thread::sleep(POLL_INTERVAL);
    }
}

fn wait(child: &mut Child, interrupt: &Interrupt) -> Result<ExitStatus, RunError> {
    // registered before the first try_wait, so an exit can't slip between the two
    let mut wakeups = Wakeups::new();

    loop {
        if interrupt.triggered() {
            abandon(child);
            return Err(RunError::Interrupted);
        }

        match child.try_wait() {
            // Ctrl-C hits the whole process group, the child may have beaten us to it
            Ok(Some(_)) if interrupt.triggered() => return Err(RunError::Interrupted),
            Ok(Some(status)) => return Ok(status),
            Ok(None) => wakeups.sleep(),
            Err(e) => {
                abandon(child);
                return Err(RunError::Wait(e));
            }
        }
    }
}

fn abandon(child: &mut Child) {
    // kill fails if it already exited, which is fine
    let _ = child.kill();
    let _ = child.wait();
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

pub fn command_line(argv: &[OsString]) -> String {
    argv.iter()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}
