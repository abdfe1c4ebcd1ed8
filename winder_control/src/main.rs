//! # Winder Control
//!
//! Two-motor coil winding control loop.
//!
//! Loads and validates the winder TOML configuration, derives the winding
//! plan (layer count + step ratio), resolves the output-line backend
//! through the bus registry, performs RT setup, and winds the schedule to
//! completion. Ctrl-C requests a stop; the layer in flight always
//! completes before the drive is disabled.

use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;
use winder_common::config::{ConfigLoader, LogLevel, WinderConfig};
use winder_common::consts::DEFAULT_CONFIG_PATH;
use winder_common::hal::StepBus;
use winder_common::state::ControllerState;
use winder_control::controller::WindingController;
use winder_control::pace::MonotonicClock;
use winder_control::plan::WindingPlan;
use winder_control::rt::rt_setup;
use winder_hal::BusRegistry;

/// Winder Control — two-motor coil winding loop
#[derive(Parser, Debug)]
#[command(name = "winder_control")]
#[command(version)]
#[command(about = "Step-synchronized control loop for a coil-winding machine")]
struct Args {
    /// Path to the winder configuration TOML.
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Output-line backend override (default: taken from [hal] backend).
    #[arg(long, value_name = "NAME")]
    backend: Option<String>,

    /// CPU core to pin the control thread to (rt builds only).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (rt builds only).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level, overrides the config level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    // The config decides the default log level, so it is loaded and
    // validated before the subscriber exists; failures here go to stderr.
    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {e}");
            process::exit(1);
        }
    };

    setup_tracing(&args, config.shared.log_level);
    info!(
        "Winder Control v{} starting (service: {})...",
        env!("CARGO_PKG_VERSION"),
        config.shared.service_name
    );

    if let Err(e) = run(&args, &config) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Winder Control shutdown complete");
}

fn load_config(path: &std::path::Path) -> Result<WinderConfig, Box<dyn std::error::Error>> {
    let config = WinderConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

fn run(args: &Args, config: &WinderConfig) -> Result<(), Box<dyn std::error::Error>> {
    let plan = WindingPlan::from_config(config)?;
    info!(
        "Config OK: {} layers, step ratio {}, {} steps/rev, {} turns/layer",
        plan.number_of_layers, plan.step_ratio, plan.steps_per_rev, plan.turns_per_layer
    );

    // RT setup (mlockall, affinity, scheduler) — no-ops without `rt`.
    rt_setup(args.cpu_core, args.rt_priority)?;

    let registry = BusRegistry::default();
    let backend = args.backend.as_deref().unwrap_or(&config.hal.backend);
    let bus = registry.create_bus(backend)?;
    info!("Output backend '{}' ready", bus.name());

    let mut controller = WindingController::new(plan, bus, MonotonicClock::new());

    // Setup signal handler for a clean stop between layer pairs.
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let started = Instant::now();
    controller.run_to_completion(&running)?;

    let elapsed = started.elapsed();
    match controller.state() {
        ControllerState::Halted => info!(
            "Schedule complete: {} layers in {:.1?}",
            controller.current_layer(),
            elapsed
        ),
        ControllerState::Active => info!(
            "Stopped early: {}/{} layers in {:.1?}",
            controller.current_layer(),
            controller.plan().number_of_layers,
            elapsed
        ),
    }

    controller.bus_mut().shutdown()?;
    Ok(())
}

/// Setup tracing subscriber from CLI arguments and the configured level.
fn setup_tracing(args: &Args, config_level: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        match config_level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
