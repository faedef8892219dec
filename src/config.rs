//! Engine configuration loaded from TOML with environment overrides.

use crate::error::Result;
use crate::experiment::Experiments;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

/// Environment variable holding a comma-separated list of extra experiments.
pub const EXPERIMENTS_ENV: &str = "MODSEARCH_EXPERIMENTS";

/// Environment variable overriding [`EngineConfig::default_limit`].
pub const DEFAULT_LIMIT_ENV: &str = "MODSEARCH_DEFAULT_LIMIT";

/// Tunables for search and redirect handling.
///
/// ```toml
/// default_limit = 20
/// max_limit = 100
/// experiments = ["use-path-table"]
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Page size used when the request does not name one.
    pub default_limit: usize,
    /// Largest page size a request may ask for.
    pub max_limit: usize,
    /// Queries longer than this many characters are rejected.
    pub max_query_length: usize,
    /// Enabled experiment names.
    pub experiments: Vec<String>,
    /// When set, the in-memory store reports counts above this as estimates.
    pub approximate_above: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
            max_query_length: 500,
            experiments: Vec::new(),
            approximate_above: None,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse engine config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config at {}", path.display()))
    }

    /// Apply `MODSEARCH_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(list) = var(EXPERIMENTS_ENV) {
            let extra = Experiments::parse_list(&list);
            for name in extra.names() {
                if !self.experiments.iter().any(|e| e == name) {
                    self.experiments.push(name.to_string());
                }
            }
        }

        if let Some(limit) = var(DEFAULT_LIMIT_ENV) {
            self.default_limit = limit
                .trim()
                .parse()
                .with_context(|| format!("{} must be a positive integer", DEFAULT_LIMIT_ENV))?;
        }

        self.validate()?;
        Ok(self)
    }

    /// The configured experiments as a lookup set.
    pub fn experiments(&self) -> Experiments {
        Experiments::new(&self.experiments)
    }

    fn validate(&self) -> Result<()> {
        if self.max_limit == 0 {
            anyhow::bail!("max_limit must be at least 1");
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            anyhow::bail!(
                "default_limit must be between 1 and max_limit ({}), got {}",
                self.max_limit,
                self.default_limit
            );
        }
        if self.max_query_length == 0 {
            anyhow::bail!("max_query_length must be at least 1");
        }
        Ok(())
    }
}
