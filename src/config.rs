//! Configuration for codeshare.
//!
//! Layers, lowest priority first:
//! 1. Built-in defaults
//! 2. User config (`<config dir>/codeshare/config.toml`) or `--config FILE`
//! 3. Environment variables (`CODESHARE_BACKEND`, `CODESHARE_SCRATCH_DIR`)
//! 4. CLI flags, applied by the binary
//!
//! Tokens are deliberately not part of the file format; see [`TOKEN_ENV`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::traits::TransferError;
use crate::transfer::BackendKind;

/// Environment variable consulted for a bearer token.
pub const TOKEN_ENV: &str = "CODESHARE_TOKEN";

pub const BACKEND_ENV: &str = "CODESHARE_BACKEND";

pub const SCRATCH_DIR_ENV: &str = "CODESHARE_SCRATCH_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// File host used for both directions
    pub backend: BackendKind,

    /// Where archives, downloads and extracted workspaces go.
    /// Defaults to the system temp directory.
    pub scratch_dir: Option<PathBuf>,

    /// Deadline for each pipeline stage
    pub stage_timeout_secs: u64,

    pub connect_timeout_secs: u64,

    /// Pause between opening a workspace and installing its dependencies
    pub bootstrap_delay_ms: u64,

    /// File or directory names left out of archives, at any depth
    pub exclude: Vec<String>,

    /// Program and arguments used to open a received workspace; the path is
    /// appended. Empty means "print the path".
    pub editor_command: Vec<String>,

    pub endpoints: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            scratch_dir: None,
            stage_timeout_secs: 300,
            connect_timeout_secs: 30,
            bootstrap_delay_ms: 3000,
            exclude: Vec::new(),
            editor_command: Vec::new(),
            endpoints: Endpoints::default(),
        }
    }
}

/// Base URLs of the file hosts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Endpoints {
    pub gofile_upload: Url,
    pub gofile_api: Url,
    pub fileio: Url,
    pub gist_api: Url,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            gofile_upload: default_url("https://upload.gofile.io/"),
            gofile_api: default_url("https://api.gofile.io/"),
            fileio: default_url("https://file.io/"),
            gist_api: default_url("https://api.github.com/"),
        }
    }
}

fn default_url(url: &str) -> Url {
    Url::parse(url).unwrap_or_else(|e| panic!("built-in URL '{url}' is invalid: {e}"))
}

impl Config {
    /// `<config dir>/codeshare/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("codeshare").join("config.toml"))
    }

    /// Loads defaults, then the config file, then the environment.
    ///
    /// An explicit `path` must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, TransferError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, TransferError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            TransferError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
            .map_err(|e| TransferError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(text: &str) -> Result<Self, TransferError> {
        toml::from_str(text).map_err(|e| TransferError::Config(e.to_string()))
    }

    /// Applies `CODESHARE_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), TransferError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup(BACKEND_ENV).filter(|v| !v.trim().is_empty()) {
            self.backend = backend
                .parse()
                .map_err(|e| TransferError::Config(format!("{BACKEND_ENV}: {e}")))?;
        }
        if let Some(dir) = lookup(SCRATCH_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.scratch_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    pub fn scratch_root(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }

    pub fn bootstrap_delay(&self) -> Duration {
        Duration::from_millis(self.bootstrap_delay_ms)
    }

    /// HTTP client shared by every backend of a run.
    pub fn http_client(&self) -> Result<reqwest::Client, TransferError> {
        reqwest::Client::builder()
            .user_agent(concat!("codeshare/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .build()
            .map_err(|e| TransferError::Config(format!("cannot build HTTP client: {e}")))
    }
}
