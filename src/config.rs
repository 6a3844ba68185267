use std::{
    fmt,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "./gitdeploy.yaml";
pub const DEFAULT_SSH_PORT: u16 = 22;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid settings: {0}")]
    Invalid(String),
}

pub fn read_config(path: &Path) -> Result<Configuration, ConfigError> {
    let file = File::open(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let config: Configuration =
        serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    config.validate()?;
    Ok(config)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub local: LocalSettings,
    pub remote: RemoteSettings,
    pub ssh_key: SshKey,

    #[serde(default)]
    pub on_step_failure: StepFailurePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSettings {
    pub project_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(alias = "username")]
    pub user: String,

    pub project_path: PathBuf,
}

fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

/// Exactly one of `path` and `key` must be set.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SshKey {
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub passphrase: Option<String>,
}

pub enum KeySource<'a> {
    File(PathBuf),
    Inline(&'a str),
}

impl SshKey {
    pub fn source(&self) -> Result<KeySource<'_>, ConfigError> {
        match (&self.path, &self.key) {
            (Some(path), None) => Ok(KeySource::File(expand_home(path))),
            (None, Some(key)) if !key.trim().is_empty() => Ok(KeySource::Inline(key)),
            (None, Some(_)) => Err(ConfigError::Invalid("ssh_key.key is empty".to_string())),
            (Some(_), Some(_)) => Err(ConfigError::Invalid(
                "set either ssh_key.path or ssh_key.key, not both".to_string(),
            )),
            (None, None) => Err(ConfigError::Invalid(
                "ssh_key needs a path or an inline key".to_string(),
            )),
        }
    }
}

// Key material must never end up in logs.
impl fmt::Debug for SshKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshKey")
            .field("path", &self.path)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// What the sync flow does after a remote step exits non-zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepFailurePolicy {
    /// Run the remaining steps and report success
    #[default]
    Continue,
    /// Run the remaining steps, then report failure
    ContinueThenFail,
    /// Stop at the first failed step
    Abort,
}

impl Configuration {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("local.project_path", self.local.project_path.as_os_str().is_empty()),
            ("remote.host", self.remote.host.trim().is_empty()),
            ("remote.user", self.remote.user.trim().is_empty()),
            ("remote.project_path", self.remote.project_path.as_os_str().is_empty()),
        ];

        if let Some((field, _)) = required.iter().find(|(_, empty)| *empty) {
            return Err(ConfigError::Invalid(format!("{field} must not be empty")));
        }

        self.ssh_key.source().map(|_| ())
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
