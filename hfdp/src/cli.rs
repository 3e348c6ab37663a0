//! Command-line surface of the `boiler-demo` binary.
//!
//! Flags override values loaded from `--config`; anything set in neither
//! place falls back to the [`Config`] defaults.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hf_core::{Config, Error, InitMode, RecreatePolicy, Result};
use tracing_subscriber::EnvFilter;

/// Managed chocolate boiler demonstration
#[derive(Parser, Debug)]
#[command(name = "boiler-demo")]
#[command(about = "Concurrent holders sharing one reference-counted chocolate boiler")]
#[command(version)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of worker holders
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Build the boiler together with the registry
    #[arg(long)]
    pub eager: bool,

    /// Seed a recreated boiler with the state of the retired one
    #[arg(long)]
    pub carry_over: bool,

    /// Run without the control holder that pins the boiler for the whole run
    #[arg(long)]
    pub no_control: bool,

    /// Maximum random scheduler yields between worker steps
    #[arg(long)]
    pub jitter: Option<u32>,

    /// Log level or filter directive (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Auxiliary subcommand; runs the demo when absent
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Auxiliary subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the default configuration to a file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "boiler.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,
    },
}

impl Args {
    /// Build the effective configuration: file (if any), then flags.
    pub fn resolve(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if self.eager {
            config.registry.init = InitMode::Eager;
        }
        if self.carry_over {
            config.registry.recreate = RecreatePolicy::CarryOver;
        }
        if self.no_control {
            config.holders.control_holder = false;
        }
        if let Some(workers) = self.workers {
            config.holders.workers = workers;
        }
        if let Some(jitter) = self.jitter {
            config.holders.jitter = jitter;
        }
        config.validate()?;
        Ok(config)
    }

    /// Tracing filter for `--log-level`.
    pub fn log_filter(&self) -> Result<EnvFilter> {
        EnvFilter::try_new(&self.log_level)
            .map_err(|e| Error::InvalidArgument(format!("log level {:?}: {e}", self.log_level)))
    }
}
