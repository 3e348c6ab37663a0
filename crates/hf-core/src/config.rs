//! Registry and holder configuration.
//!
//! [`RegistryConfig`] selects how a managed singleton is created and what a
//! recreated instance starts from. [`HolderConfig`] shapes the concurrent
//! holder scenario. [`Config`] bundles both and is what a TOML file
//! deserialises into:
//!
//! ```toml
//! [registry]
//! init = "eager"
//! recreate = "carry-over"
//!
//! [holders]
//! workers = 6
//! control_holder = true
//! jitter = 16
//! ```
//!
//! Every field has a default, so an empty document is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ensure;
use crate::errors::Result;

/// When the managed instance is first constructed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InitMode {
    /// Construct on the first `acquire()`.
    #[default]
    Lazy,
    /// Construct together with the registry, before any holder runs.
    Eager,
}

/// What a recreated instance starts from after the previous one was retired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecreatePolicy {
    /// Start from the default state every time.
    #[default]
    Reset,
    /// Seed the new instance with the state of the retired one.
    CarryOver,
}

/// Lifecycle configuration of a single managed-singleton registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Lazy or eager construction.
    pub init: InitMode,
    /// State policy for recreated instances.
    pub recreate: RecreatePolicy,
}

impl RegistryConfig {
    /// Lazy construction, reset on recreate.
    pub const fn lazy() -> Self {
        Self {
            init: InitMode::Lazy,
            recreate: RecreatePolicy::Reset,
        }
    }

    /// Eager construction, reset on recreate.
    pub const fn eager() -> Self {
        Self {
            init: InitMode::Eager,
            recreate: RecreatePolicy::Reset,
        }
    }

    /// Return a copy with the given recreate policy.
    pub const fn with_recreate(mut self, recreate: RecreatePolicy) -> Self {
        self.recreate = recreate;
        self
    }
}

fn default_workers() -> usize {
    6
}

fn default_true() -> bool {
    true
}

fn default_jitter() -> u32 {
    16
}

/// Shape of the concurrent holder scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HolderConfig {
    /// Number of worker holders, each running one full business cycle.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Whether a control holder keeps the instance alive for the whole run.
    #[serde(default = "default_true")]
    pub control_holder: bool,

    /// Upper bound on the random number of scheduler yields a worker inserts
    /// between steps. Zero disables jitter.
    #[serde(default = "default_jitter")]
    pub jitter: u32,
}

impl Default for HolderConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            control_holder: true,
            jitter: default_jitter(),
        }
    }
}

impl HolderConfig {
    /// Check that the scenario can run.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.workers > 0,
            "at least one worker holder is required, got {}",
            self.workers
        );
        Ok(())
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Registry lifecycle settings.
    pub registry: RegistryConfig,
    /// Holder scenario settings.
    pub holders: HolderConfig,
}

impl Config {
    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Render the configuration as pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.holders.validate()
    }
}
