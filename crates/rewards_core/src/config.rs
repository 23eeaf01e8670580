//! Application configuration.
//!
//! # Responsibility
//! - Load `RewardsConfig` from an optional TOML file with per-field defaults.
//! - Resolve the database location (env override, file value, data dir).
//!
//! # Invariants
//! - A missing config file yields defaults, never an error.
//! - `user_id` is never blank after validation.
//! - `points_view` is empty (disabled) or a plain SQL identifier.
//! - Goals are not validated here; an invalid goal fails on its own at
//!   progress time.

use crate::model::goal::{default_goals, Goal};
use crate::repo::points_view_repo::DEFAULT_POINTS_VIEW;
use crate::repo::schema::is_plain_identifier;
use crate::service::board::BoardConfig;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Environment variable overriding the database path.
pub const DATABASE_ENV_VAR: &str = "REWARDS_DB";

const DEFAULT_USER_ID: &str = "Ben";
const DATA_DIR_NAME: &str = "rewards";
const DATABASE_FILE_NAME: &str = "rewards.sqlite3";
const CONFIG_FILE_NAME: &str = "config.toml";

pub type ConfigResult<T> = Result<T, ConfigError>;

/// `<config_dir>/rewards/config.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(DATA_DIR_NAME).join(CONFIG_FILE_NAME))
}

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        message: String,
    },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, message } => {
                write!(f, "failed to parse config `{}`: {message}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardsConfig {
    pub user_id: String,
    pub database_path: Option<PathBuf>,
    pub log_level: Option<String>,
    /// Absolute log directory; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    /// Aggregate view name; empty disables view reconciliation.
    pub points_view: String,
    pub goals: Vec<Goal>,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            user_id: DEFAULT_USER_ID.to_string(),
            database_path: None,
            log_level: None,
            log_dir: None,
            points_view: DEFAULT_POINTS_VIEW.to_string(),
            goals: default_goals(),
        }
    }
}

impl RewardsConfig {
    /// Loads and validates a TOML config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when it exists, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.user_id.trim().is_empty() {
            return Err(ConfigError::Invalid("user_id must not be blank".to_string()));
        }
        let view = self.points_view.trim();
        if !view.is_empty() && !is_plain_identifier(view) {
            return Err(ConfigError::Invalid(format!(
                "points_view `{view}` must be a plain identifier"
            )));
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be absolute, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    /// Database path, honoring `REWARDS_DB` first.
    pub fn database_path(&self) -> PathBuf {
        self.database_path_with(std::env::var_os(DATABASE_ENV_VAR).map(PathBuf::from))
    }

    /// Resolution order: `env_override`, `database_path`, then
    /// `<data_local_dir>/rewards/rewards.sqlite3`, then `./rewards.sqlite3`.
    pub fn database_path_with(&self, env_override: Option<PathBuf>) -> PathBuf {
        if let Some(path) = env_override.filter(|p| !p.as_os_str().is_empty()) {
            return path;
        }
        if let Some(path) = &self.database_path {
            return path.clone();
        }
        match dirs::data_local_dir() {
            Some(dir) => dir.join(DATA_DIR_NAME).join(DATABASE_FILE_NAME),
            None => PathBuf::from(DATABASE_FILE_NAME),
        }
    }

    pub fn points_view_name(&self) -> Option<&str> {
        Some(self.points_view.trim()).filter(|name| !name.is_empty())
    }

    pub fn board_config(&self) -> BoardConfig {
        BoardConfig {
            user_id: self.user_id.trim().to_string(),
            goals: self.goals.clone(),
            points_view: self.points_view_name().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, RewardsConfig};
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn defaults_cover_user_view_and_goals() {
        let config = RewardsConfig::default();
        assert_eq!(config.user_id, "Ben");
        assert_eq!(config.points_view_name(), Some("v_total_points"));
        let targets: Vec<_> = config.goals.iter().map(|g| g.target).collect();
        assert_eq!(targets, vec![2500, 7500]);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r##"
user_id = "Ana"
points_view = ""

[[goals]]
label = "Bike"
target = 4000
color = "#ff9800"
"##
        )
        .unwrap();

        let config = RewardsConfig::load(file.path()).unwrap();
        assert_eq!(config.user_id, "Ana");
        assert_eq!(config.points_view_name(), None);
        assert_eq!(config.goals.len(), 1);
        assert_eq!(config.goals[0].color.as_deref(), Some("#ff9800"));
        assert!(config.database_path.is_none());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            RewardsConfig::load_or_default(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, RewardsConfig::default());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "user_id = [").unwrap();
        let err = RewardsConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn validation_rejects_blank_user_and_unsafe_view() {
        let blank_user = RewardsConfig {
            user_id: "  ".to_string(),
            ..RewardsConfig::default()
        };
        assert!(matches!(blank_user.validate(), Err(ConfigError::Invalid(_))));

        let unsafe_view = RewardsConfig {
            points_view: "v; DROP TABLE tasks".to_string(),
            ..RewardsConfig::default()
        };
        assert!(matches!(unsafe_view.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn database_path_resolution_order() {
        let config = RewardsConfig {
            database_path: Some(PathBuf::from("/data/from-file.sqlite3")),
            ..RewardsConfig::default()
        };
        assert_eq!(
            config.database_path_with(Some(PathBuf::from("/data/from-env.sqlite3"))),
            PathBuf::from("/data/from-env.sqlite3")
        );
        assert_eq!(
            config.database_path_with(None),
            PathBuf::from("/data/from-file.sqlite3")
        );

        let fallback = RewardsConfig::default().database_path_with(None);
        assert!(fallback.ends_with("rewards.sqlite3"));
    }
}
