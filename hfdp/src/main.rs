//! Managed chocolate boiler demo
//!
//! Spins up concurrent holders that share one reference-counted boiler. Each
//! worker leases it, runs `fill → process → drain`, and releases; a control
//! holder (unless `--no-control`) keeps the boiler alive for the whole run.
//!
//! # Usage
//!
//! ```bash
//! # Six workers, lazy boiler pinned by a control holder
//! boiler-demo
//!
//! # Eager boiler, no control holder: watch it being rebuilt
//! boiler-demo --eager --no-control --log-level debug
//!
//! # Using a configuration file
//! boiler-demo --config boiler.toml
//! ```

use std::path::Path;

use clap::Parser;
use hfdp::cli::{Args, Commands};
use hfdp::core::{Config, Result};
use hfdp::singleton::{run_holders, ChocolateBoiler, LifecycleCounter, SingletonRegistry};

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(args.log_filter()?)
        .with_target(false)
        .with_thread_names(true)
        .init();

    if let Some(cmd) = &args.command {
        return match cmd {
            Commands::GenConfig { output } => cmd_gen_config(output),
            Commands::Validate { config } => cmd_validate(config),
        }
        .map_err(Into::into);
    }

    let config = args.resolve()?;
    run(&config);
    Ok(())
}

fn run(config: &Config) {
    let counter = LifecycleCounter::shared();
    let registry = SingletonRegistry::<ChocolateBoiler>::new(config.registry);
    registry.observe(&counter);

    println!("Managed chocolate boiler v{}", env!("CARGO_PKG_VERSION"));
    println!("  init mode:      {:?}", config.registry.init);
    println!("  recreate:       {:?}", config.registry.recreate);
    println!("  workers:        {}", config.holders.workers);
    println!("  control holder: {}", config.holders.control_holder);
    println!();

    let report = run_holders(&registry, &config.holders);

    for worker in &report.workers {
        println!(
            "  worker {:>2}: boiler {} ({} transitions, {:?})",
            worker.worker, worker.instance, worker.transitions, worker.release
        );
    }
    if let (Some(id), Some(outcome)) = (report.control, report.control_release) {
        println!("  control:   boiler {id} ({outcome:?})");
    }

    let stats = registry.stats();
    println!();
    println!("Distinct boilers seen: {}", report.distinct_instances());
    println!("Peak usage count:      {}", report.peak_usage);
    println!(
        "Instances created:     {} (observed {})",
        stats.created,
        counter.created()
    );
    println!(
        "Instances destroyed:   {} (observed {})",
        stats.destroyed,
        counter.destroyed()
    );
    tracing::info!(
        created = stats.created,
        destroyed = stats.destroyed,
        live = stats.live(),
        "demo finished"
    );
}

fn cmd_gen_config(output: &Path) -> Result<()> {
    let text = Config::default().to_toml_string()?;
    std::fs::write(output, text)?;
    println!("Wrote default configuration to {}", output.display());
    Ok(())
}

fn cmd_validate(path: &Path) -> Result<()> {
    let config = Config::from_file(path)?;
    println!("Configuration is valid: {}", path.display());
    println!("  registry: {:?}", config.registry);
    println!("  holders:  {:?}", config.holders);
    Ok(())
}
