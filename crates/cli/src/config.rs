//! `leadbook.toml` loading with environment overrides.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::CliError;

/// Config file read from the working directory when `--config` is absent.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "leadbook.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    /// JSON file holding leads, activity, notes and users.
    pub(crate) data_file: PathBuf,
    pub(crate) port: u16,
    /// Requests per minute per client IP.
    pub(crate) rate_limit: u64,
    pub(crate) page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("leadbook.json"),
            port: 8080,
            rate_limit: 60,
            page_size: leadbook_engine::query::DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Load `path`, or `leadbook.toml` if present, then apply `LEADBOOK_*`
    /// environment overrides.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file just means defaults.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    fn from_file(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("cannot read '{}': {}", path.display(), e)))?;
        Self::parse(&text)
            .map_err(|e| CliError::Config(format!("invalid '{}': {}", path.display(), e)))
    }

    pub(crate) fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Apply `LEADBOOK_DATA`, `LEADBOOK_PORT` and `LEADBOOK_RATE_LIMIT`
    /// read through `lookup`. Empty values are ignored.
    pub(crate) fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, CliError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(data) = get("LEADBOOK_DATA") {
            self.data_file = PathBuf::from(data);
        }
        if let Some(port) = get("LEADBOOK_PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| CliError::Config(format!("LEADBOOK_PORT '{}' is not a port", port)))?;
        }
        if let Some(limit) = get("LEADBOOK_RATE_LIMIT") {
            self.rate_limit = limit.trim().parse().map_err(|_| {
                CliError::Config(format!("LEADBOOK_RATE_LIMIT '{}' is not a number", limit))
            })?;
        }
        Ok(self)
    }
}
