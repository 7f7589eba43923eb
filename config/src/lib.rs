//! `~/.seedling/config.toml` loading.
//!
//! ```toml
//! [account]
//! email = "admin@admin.com"
//! password = "${FARMBOT_PASSWORD}"
//! server = "https://my.farm.bot"
//!
//! [log]
//! level = "seedling_auth=debug"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SeedlingConfig {
    pub account: Option<AccountConfig>,
    pub log: Option<LogConfig>,
}

/// Account defaults. Values go through [`expand_env_vars`] when read.
#[derive(Default, Deserialize)]
pub struct AccountConfig {
    pub email: Option<String>,
    pub password: Option<String>,
    pub server: Option<String>,
}

impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountConfig")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("server", &self.server)
            .finish()
    }
}

impl AccountConfig {
    #[must_use]
    pub fn email(&self) -> Option<String> {
        expanded(self.email.as_deref())
    }

    #[must_use]
    pub fn password(&self) -> Option<String> {
        expanded(self.password.as_deref())
    }

    #[must_use]
    pub fn server(&self) -> Option<String> {
        expanded(self.server.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `info` or `seedling_auth=debug`.
    pub level: Option<String>,
}

// An entry that expands to nothing counts as unset.
fn expanded(raw: Option<&str>) -> Option<String> {
    raw.map(expand_env_vars).filter(|value| !value.is_empty())
}

/// Replace every `${NAME}` with the value of that environment variable.
///
/// Unset variables expand to an empty string. An unterminated `${` is kept as-is.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(open) = rest.find("${") {
        let Some(close) = rest[open + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..open]);
        let name = &rest[open + 2..open + 2 + close];
        if !name.is_empty() {
            out.push_str(&env::var(name).unwrap_or_default());
        }
        rest = &rest[open + 2 + close + 1..];
    }

    out.push_str(rest);
    out
}

impl SeedlingConfig {
    /// Load from `explicit` if given, otherwise from [`config_path`].
    ///
    /// A missing default file is `Ok(None)`. A missing explicit file is a
    /// [`ConfigError::Read`].
    pub fn load(explicit: Option<&Path>) -> Result<Option<Self>, ConfigError> {
        if let Some(path) = explicit {
            return Self::read(path).map(Some);
        }
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    /// Load from `path`, treating a missing file as "no config".
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file");
            return Ok(None);
        }
        Self::read(path).map(Some)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!(path = %path.display(), error = %source, "Failed to read config");
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        toml::from_str(&content).map_err(|source| {
            tracing::warn!(path = %path.display(), error = %source, "Failed to parse config");
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    #[must_use]
    pub fn log_level(&self) -> Option<&str> {
        self.log.as_ref()?.level.as_deref()
    }
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".seedling").join("config.toml"))
}
