//! Configuration loading and management

use crate::core::error::{ConfigError, ForumResult};
use crate::core::include::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pagination defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Page size when the client does not ask for one; also the row limit
    /// of embedded reply lists
    #[serde(default = "default_per_page")]
    pub per_page: usize,

    /// Upper bound for client-requested page sizes
    #[serde(default = "default_max_per_page")]
    pub max_per_page: usize,
}

fn default_per_page() -> usize {
    20
}

fn default_max_per_page() -> usize {
    100
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            per_page: default_per_page(),
            max_per_page: default_max_per_page(),
        }
    }
}

/// Include resolution limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeConfig {
    /// Deepest include path honoured (`replies.user` is depth 2)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for IncludeConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

/// Vote ledger settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteConfig {
    /// How long a cast waits for a concurrent cast on the same
    /// (voter, subject) before giving up with a conflict
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_lock_timeout_ms() -> u64 {
    2_000
}

impl Default for VoteConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl VoteConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumConfig {
    #[serde(default)]
    pub pagination: PaginationConfig,

    #[serde(default)]
    pub includes: IncludeConfig,

    #[serde(default)]
    pub votes: VoteConfig,
}

impl ForumConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> ForumResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.to_string()),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> ForumResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pagination.per_page == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pagination.per_page".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.pagination.max_per_page < self.pagination.per_page {
            return Err(ConfigError::InvalidValue {
                field: "pagination.max_per_page".to_string(),
                message: format!(
                    "must not be smaller than per_page ({})",
                    self.pagination.per_page
                ),
            });
        }

        if self.includes.max_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "includes.max_depth".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}
