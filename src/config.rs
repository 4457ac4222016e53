//! Layered application settings.
//!
//! Settings are merged with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config PATH`, or `config.toml` in the platform config dir)
//! 3. Environment variables prefixed with `DUPEMOVER_` (e.g. `DUPEMOVER_ALGORITHM=blake3`)
//! 4. Command-line flags
//!
//! ```toml
//! algorithm = "blake3"
//! csv_log = "/var/log/dupemover.csv"
//! dry_run = false
//! progress = true
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::scanner::HashAlgorithm;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "DUPEMOVER_";

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fingerprint algorithm.
    pub algorithm: HashAlgorithm,
    /// CSV audit log to write, if any.
    pub csv_log: Option<PathBuf>,
    /// Plan moves without performing them.
    pub dry_run: bool,
    /// Show progress bars.
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            csv_log: None,
            dry_run: false,
            progress: true,
        }
    }
}

impl Config {
    /// Platform-specific default location of `config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupemover", "dupemover")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Build the figment for defaults, the given TOML file and the environment.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load settings.
    ///
    /// With an explicit path the file must exist. Without one, the default
    /// location is used if present.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing or any layer fails to parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let file = match explicit {
            Some(path) => {
                if !path.is_file() {
                    bail!("config file not found: {}", path.display());
                }
                Some(path.to_path_buf())
            }
            None => Self::default_path().filter(|p| p.is_file()),
        };

        if let Some(ref path) = file {
            log::debug!("Loading config from {}", path.display());
        }

        Self::figment(file.as_deref())
            .extract()
            .context("invalid configuration")
    }

    /// Apply command-line overrides.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(algorithm) = cli.algorithm {
            self.algorithm = algorithm;
        }
        if let Some(ref path) = cli.csv_log {
            self.csv_log = Some(path.clone());
        }
        if cli.dry_run {
            self.dry_run = true;
        }
        if cli.no_progress || cli.quiet {
            self.progress = false;
        }
    }
}
