/// Configuration module for structscope.
///
/// Handles loading, validating, and providing default configuration values.
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "structscope.json";

// ── Default value functions ──────────────────────────────────────────

fn default_db_path() -> String {
    "structs.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_structs_limit() -> u64 {
    100
}

fn default_members_limit() -> u64 {
    200
}

fn default_uses_limit() -> u64 {
    500
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// How long a query waits on a store locked by the extractor.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    #[serde(default)]
    pub listing: ListingLimits,
}

/// Page size of each listing. Not settable per request.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ListingLimits {
    #[serde(default = "default_structs_limit")]
    pub structs: u64,

    #[serde(default = "default_members_limit")]
    pub members: u64,

    #[serde(default = "default_uses_limit")]
    pub uses: u64,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            listing: ListingLimits::default(),
        }
    }
}

impl Default for ListingLimits {
    fn default() -> Self {
        Self {
            structs: default_structs_limit(),
            members: default_members_limit(),
            uses: default_uses_limit(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    #[must_use]
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to [`DEFAULT_CONFIG_PATH`].
    /// A missing file yields the default config; nothing is written.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = resolve_path(config_path);

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");
        Ok(cfg)
    }

    /// Write the default config to `config_path` unless a file is already
    /// there. Returns whether a template was written.
    pub fn write_template(config_path: &str) -> Result<bool> {
        let path = resolve_path(config_path);
        if Path::new(path).exists() {
            return Ok(false);
        }

        Self::default().save(path)?;
        info!("Generated config template: {path}");
        Ok(true)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.db_path.is_empty(), "db_path must not be empty");
        anyhow::ensure!(self.listing.structs > 0, "listing.structs must be positive");
        anyhow::ensure!(self.listing.members > 0, "listing.members must be positive");
        anyhow::ensure!(self.listing.uses > 0, "listing.uses must be positive");
        Ok(())
    }
}

fn resolve_path(config_path: &str) -> &str {
    if config_path.is_empty() {
        DEFAULT_CONFIG_PATH
    } else {
        config_path
    }
}

// ── Tests ────────────────────────────────────────────────────────────
