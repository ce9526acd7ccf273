// Configuration management for sound-notify
// Layers: bundled defaults -> ~/.sound-notify.toml (or -c path) -> CLI flags

use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_MIN_DURATION: u64 = 5;
pub const CONFIG_FILE_NAME: &str = ".sound-notify.toml";
const FALLBACK_ASSET: &str = "default.wav";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read config from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to load config from {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("{kind} sound not found: {}", path.display())]
    SoundNotFound { kind: SoundKind, path: PathBuf },

    #[error("config file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("failed to write config to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("could not find home directory")]
    NoHomeDir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundKind {
    Success,
    Failure,
}

impl SoundKind {
    pub fn asset_name(self) -> &'static str {
        match self {
            SoundKind::Success => "success.wav",
            SoundKind::Failure => "failure.wav",
        }
    }
}

impl fmt::Display for SoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoundKind::Success => write!(f, "success"),
            SoundKind::Failure => write!(f, "failure"),
        }
    }
}

/// The configuration a single invocation runs with. Built once, never mutated
/// after `resolve` hands it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub success_sound: PathBuf,
    pub failure_sound: PathBuf,
    pub min_duration: u64, // seconds
}

/// What the user may put in the config file. Every key is optional and
/// unknown keys are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_sound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_sound: Option<String>,
    // signed so a negative value is reported as out of range, not as a type error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_duration: Option<i64>,
}

/// Values given on the command line. These always win.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub success_sound: Option<PathBuf>,
    pub failure_sound: Option<PathBuf>,
    pub min_duration: Option<u64>,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        let sounds_dir = bundled_sounds_dir();

        Self {
            success_sound: default_sound(SoundKind::Success, &sounds_dir),
            failure_sound: default_sound(SoundKind::Failure, &sounds_dir),
            min_duration: DEFAULT_MIN_DURATION,
        }
    }
}

impl EffectiveConfig {
    /// Overwrite only the keys the file defines.
    pub fn merge_file(&mut self, file: FileConfig) -> Result<(), ConfigError> {
        if let Some(sound) = file.success_sound {
            self.success_sound = expand_home(&sound);
        }
        if let Some(sound) = file.failure_sound {
            self.failure_sound = expand_home(&sound);
        }
        if let Some(secs) = file.min_duration {
            self.min_duration = u64::try_from(secs).map_err(|_| ConfigError::Invalid {
                key: "min_duration",
                reason: format!("must be >= 0, got {}", secs),
            })?;
        }
        Ok(())
    }

    /// CLI sound paths have to exist right now, unlike file paths which are
    /// only checked when we try to play them.
    pub fn apply_cli(&mut self, cli: &CliOverrides) -> Result<(), ConfigError> {
        if let Some(path) = &cli.success_sound {
            self.success_sound = checked_sound(SoundKind::Success, path)?;
        }
        if let Some(path) = &cli.failure_sound {
            self.failure_sound = checked_sound(SoundKind::Failure, path)?;
        }
        if let Some(secs) = cli.min_duration {
            self.min_duration = secs;
        }
        Ok(())
    }

    pub fn sound_for(&self, kind: SoundKind) -> &Path {
        match kind {
            SoundKind::Success => &self.success_sound,
            SoundKind::Failure => &self.failure_sound,
        }
    }
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl From<&EffectiveConfig> for FileConfig {
    fn from(config: &EffectiveConfig) -> Self {
        Self {
            success_sound: Some(config.success_sound.display().to_string()),
            failure_sound: Some(config.failure_sound.display().to_string()),
            min_duration: i64::try_from(config.min_duration).ok(),
        }
    }
}

/// Build the effective configuration for this invocation.
///
/// An explicit `config_file` must exist. Without one, the home-directory file
/// is read when present and skipped silently otherwise.
pub fn resolve(config_file: Option<&Path>, cli: &CliOverrides) -> Result<EffectiveConfig, ConfigError> {
    let mut config = EffectiveConfig::default();

    let source = match config_file {
        Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path().filter(|path| path.exists()),
    };

    if let Some(path) = source {
        debug!(path = %path.display(), "loading config file");
        config.merge_file(FileConfig::load(&path)?)?;
    }

    config.apply_cli(cli)?;
    debug!(?config, "effective config");
    Ok(config)
}

pub fn default_config_path() -> Option<PathBuf> {
    home_dir().map(|home| home.join(CONFIG_FILE_NAME))
}

/// Write the built-in defaults out as a starter config file.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(&FileConfig::from(&EffectiveConfig::default()))?;
    fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// The named bundled asset, or the generic one when it has gone missing.
pub fn default_sound(kind: SoundKind, sounds_dir: &Path) -> PathBuf {
    let named = sounds_dir.join(kind.asset_name());
    if named.exists() {
        named
    } else {
        sounds_dir.join(FALLBACK_ASSET)
    }
}

/// Where the bundled sounds live: next to the binary for packaged installs,
/// the source tree for `cargo run`.
pub fn bundled_sounds_dir() -> PathBuf {
    let source_tree = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets").join("sounds");

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    let mut candidates = Vec::new();
    if let Some(dir) = exe_dir {
        candidates.push(dir.join("sounds"));
        candidates.push(dir.join("..").join("share").join("sound-notify").join("sounds"));
    }

    candidates
        .into_iter()
        .find(|dir| dir.is_dir())
        .unwrap_or(source_tree)
}

/// Expand a leading `~` or `~/` to the current user's home directory.
/// `~otheruser/...` is left as written; looking up other users' homes isn't supported.
pub fn expand_home(path: &str) -> PathBuf {
    expand_home_with(path, home_dir().as_deref())
}

fn expand_home_with(path: &str, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return PathBuf::from(path);
    };

    if path == "~" {
        return home.to_path_buf();
    }

    match path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        Some(rest) => home.join(rest),
        None => PathBuf::from(path),
    }
}

fn checked_sound(kind: SoundKind, path: &Path) -> Result<PathBuf, ConfigError> {
    let expanded = match path.to_str() {
        Some(s) => expand_home(s),
        None => path.to_path_buf(),
    };

    if expanded.exists() {
        Ok(expanded)
    } else {
        Err(ConfigError::SoundNotFound { kind, path: expanded })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = EffectiveConfig::default();
        assert_eq!(config.min_duration, 5);
        assert!(config.success_sound.exists());
        assert!(config.failure_sound.exists());
    }

    #[test]
    fn test_missing_named_asset_falls_back_to_default() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("success.wav"), b"").unwrap();

        let success = default_sound(SoundKind::Success, dir.path());
        assert_eq!(success.file_name().unwrap(), "success.wav");

        let failure = default_sound(SoundKind::Failure, dir.path());
        assert_eq!(failure.file_name().unwrap(), "default.wav");
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let err = resolve(Some(Path::new("/nonexistent/path.toml")), &CliOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_valid_file() {
        let dir = tempdir().unwrap();
        let sound = dir.path().join("test.wav");
        fs::write(&sound, b"").unwrap();

        let config_file = dir.path().join("config.toml");
        fs::write(
            &config_file,
            format!(
                "success_sound = {:?}\nfailure_sound = {:?}\nmin_duration = 15\nvolume = 11\n",
                sound.display().to_string(),
                sound.display().to_string()
            ),
        )
        .unwrap();

        let config = resolve(Some(&config_file), &CliOverrides::default()).unwrap();
        assert_eq!(config.min_duration, 15);
        assert_eq!(config.success_sound, sound);
        assert_eq!(config.failure_sound, sound);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let config_file = dir.path().join("config.toml");
        fs::write(&config_file, "min_duration = 0\n").unwrap();

        let defaults = EffectiveConfig::default();
        let config = resolve(Some(&config_file), &CliOverrides::default()).unwrap();
        assert_eq!(config.min_duration, 0);
        assert_eq!(config.success_sound, defaults.success_sound);
        assert_eq!(config.failure_sound, defaults.failure_sound);
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let config_file = dir.path().join("bad.toml");
        fs::write(&config_file, "invalid = toml = [").unwrap();

        let err = resolve(Some(&config_file), &CliOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("failed to load config"));
    }

    #[test]
    fn test_wrong_type_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let config_file = dir.path().join("bad.toml");
        fs::write(&config_file, "min_duration = \"soon\"\n").unwrap();

        let err = resolve(Some(&config_file), &CliOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_negative_duration_is_rejected() {
        let mut config = EffectiveConfig::default();
        let err = config
            .merge_file(FileConfig {
                min_duration: Some(-1),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "min_duration", .. }));
        assert_eq!(config.min_duration, DEFAULT_MIN_DURATION);
    }

    #[test]
    fn test_threshold_layering() {
        let dir = tempdir().unwrap();
        let config_file = dir.path().join("config.toml");
        fs::write(&config_file, "min_duration = 30\n").unwrap();

        let from_file = resolve(Some(&config_file), &CliOverrides::default()).unwrap();
        assert_eq!(from_file.min_duration, 30);

        let cli = CliOverrides {
            min_duration: Some(2),
            ..Default::default()
        };
        let from_cli = resolve(Some(&config_file), &cli).unwrap();
        assert_eq!(from_cli.min_duration, 2);
    }

    #[test]
    fn test_cli_sound_must_exist() {
        let cli = CliOverrides {
            failure_sound: Some(PathBuf::from("/nonexistent/boom.wav")),
            ..Default::default()
        };
        let err = EffectiveConfig::default().apply_cli(&cli).unwrap_err();
        assert!(matches!(err, ConfigError::SoundNotFound { kind: SoundKind::Failure, .. }));
    }

    #[test]
    fn test_file_sound_is_not_checked() {
        let mut config = EffectiveConfig::default();
        config
            .merge_file(FileConfig {
                success_sound: Some("/nonexistent/ding.wav".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(config.success_sound, PathBuf::from("/nonexistent/ding.wav"));
    }

    #[test]
    fn test_home_expansion() {
        let home = Path::new("/home/tester");
        assert_eq!(expand_home_with("~/sound.wav", Some(home)), home.join("sound.wav"));
        assert_eq!(expand_home_with("~", Some(home)), home.to_path_buf());
        assert_eq!(expand_home_with("/abs/sound.wav", Some(home)), PathBuf::from("/abs/sound.wav"));
        // only a leading tilde means home
        assert_eq!(expand_home_with("a/~/b", Some(home)), PathBuf::from("a/~/b"));
        assert_eq!(expand_home_with("~alice/sound.wav", Some(home)), PathBuf::from("~alice/sound.wav"));
        assert_eq!(expand_home_with("~/x", None), PathBuf::from("~/x"));
    }

    #[test]
    fn test_write_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        write_default_config(&path).unwrap();
        let written = FileConfig::load(&path).unwrap();
        assert_eq!(written.min_duration, Some(5));
        assert!(written.success_sound.is_some());

        let err = write_default_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyExists(_)));
    }
}
