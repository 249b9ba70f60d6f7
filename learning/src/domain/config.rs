// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Learning Configuration
//
// YAML-backed settings for the learning subsystem:
// - storage root and atomic-write retry budget
// - selection confidence threshold
// - sharing threshold and subscriber timeout
// - stale tracking sweep

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "AEGIS_LEARNING_CONFIG";
pub const DATA_DIR_ENV: &str = "AEGIS_LEARNING_DIR";
pub const DEFAULT_CONFIG_FILE: &str = "./aegis-learning.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub selection: SelectionConfig,

    #[serde(default)]
    pub sharing: SharingConfig,

    #[serde(default)]
    pub tracking: TrackingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root learning directory; one subdirectory per agent
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// Suffix of the sibling file written before the atomic rename
    #[serde(default = "default_temp_suffix")]
    pub temp_suffix: String,

    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Learned strategies below this confidence lose to the default
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharingConfig {
    /// Minimum confidence for anything crossing agent boundaries
    #[serde(default = "default_sharing_threshold")]
    pub threshold: f64,

    #[serde(default = "default_subscriber_timeout_ms")]
    pub subscriber_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Open records older than this are considered orphaned
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    #[serde(default = "default_true")]
    pub sweep_enabled: bool,
}

fn default_root_dir() -> PathBuf {
    PathBuf::from(".aegis/learning")
}

fn default_temp_suffix() -> String {
    ".tmp".to_string()
}

fn default_max_attempts() -> u32 {
    10
}

fn default_base_delay_ms() -> u64 {
    50
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    2000
}

fn default_confidence_threshold() -> f64 {
    0.7
}

fn default_sharing_threshold() -> f64 {
    0.8
}

fn default_subscriber_timeout_ms() -> u64 {
    5000
}

fn default_stale_after_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            temp_suffix: default_temp_suffix(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            multiplier: default_multiplier(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            threshold: default_sharing_threshold(),
            subscriber_timeout_ms: default_subscriber_timeout_ms(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: default_stale_after_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            sweep_enabled: true,
        }
    }
}

impl SharingConfig {
    pub fn subscriber_timeout(&self) -> Duration {
        Duration::from_millis(self.subscriber_timeout_ms)
    }
}

impl TrackingConfig {
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl LearningConfig {
    /// Root directory pointed at `root_dir`, everything else default
    pub fn with_root_dir(root_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.storage.root_dir = root_dir.into();
        config
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Discover configuration file using precedence order
    /// 1. AEGIS_LEARNING_CONFIG environment variable
    /// 2. ./aegis-learning.yaml (working directory)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from(DEFAULT_CONFIG_FILE);
        if cwd.exists() {
            return Some(cwd);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        let mut config = if let Some(path) = cli_path {
            tracing::info!("Loading learning configuration from explicit path: {:?}", path);
            Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load learning config at {:?}: {}", path, e)
            })?
        } else if let Some(path) = Self::discover_config() {
            tracing::info!("Loading learning configuration from discovered path: {:?}", path);
            Self::from_yaml_file(path)?
        } else {
            tracing::debug!("No learning configuration file found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if dir.trim().is_empty() {
                tracing::warn!("Ignoring empty {} override", DATA_DIR_ENV);
            } else {
                tracing::info!("Environment override: {}={}", DATA_DIR_ENV, dir);
                self.storage.root_dir = PathBuf::from(dir);
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let threshold = self.selection.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            anyhow::bail!("selection.confidence_threshold must be within [0, 1], got {}", threshold);
        }

        let threshold = self.sharing.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            anyhow::bail!("sharing.threshold must be within [0, 1], got {}", threshold);
        }

        if self.storage.retry.max_attempts == 0 {
            anyhow::bail!("storage.retry.max_attempts must be at least 1");
        }

        if self.storage.retry.multiplier < 1.0 {
            anyhow::bail!(
                "storage.retry.multiplier must be >= 1.0, got {}",
                self.storage.retry.multiplier
            );
        }

        if self.storage.temp_suffix.is_empty() {
            anyhow::bail!("storage.temp_suffix cannot be empty");
        }

        Ok(())
    }
}
