//! dualtof main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SysfsLine ×2     Vl53l1xDriver   MqttBroker    CommandRestart │
//! │  (OutputPin)      (TofDriver)     (BrokerPort)  (RestartPort)  │
//! │  SystemClock      LogEventSink                                 │
//! │  (Clock)          (EventSink)                                  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  CycleFsm · EnableController · Publisher · Supervisor  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::fs::OpenOptions;

use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};
use log::{info, warn};

use dualtof::adapters::gpio::SysfsLine;
use dualtof::adapters::log_sink::LogEventSink;
use dualtof::adapters::mqtt::MqttBroker;
use dualtof::adapters::restart::CommandRestart;
use dualtof::adapters::time::SystemClock;
use dualtof::adapters::vl53l1x::Vl53l1xDriver;
use dualtof::app::service::AppService;
use dualtof::config::{CONFIG_PATH_ENV, SystemConfig};
use dualtof::drivers::enable::EnableController;
use dualtof::publisher::Publisher;

/// Config path from the first CLI argument, else the environment.
fn config_path() -> Option<String> {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
}

fn load_config() -> Result<(SystemConfig, Option<String>)> {
    match config_path() {
        Some(path) => {
            let config = SystemConfig::load(&path).with_context(|| format!("loading {}", path))?;
            Ok((config, Some(path)))
        }
        None => {
            let config = SystemConfig::default();
            config.validate().context("default config")?;
            Ok((config, None))
        }
    }
}

/// Install `env_logger`: millisecond timestamps, `RUST_LOG` over the
/// configured level, appending to the log file when one is set.
fn init_logger(config: &SystemConfig) -> Result<()> {
    let mut builder = Builder::from_env(Env::default().default_filter_or(config.log_level.as_str()));
    builder.format_timestamp_millis();
    if let Some(path) = &config.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path))?;
        builder.target(Target::Pipe(Box::new(file)));
    }
    builder.try_init().context("installing logger")?;
    Ok(())
}

fn main() -> Result<()> {
    // ── 1. Config + logging ───────────────────────────────────
    let (config, source) = load_config()?;
    init_logger(&config)?;

    info!("╔══════════════════════════════════════╗");
    info!("║  dualtof v{}                         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");
    match &source {
        Some(path) => info!("Config loaded from {}", path),
        None => warn!("No config file given, using built-in defaults"),
    }

    // ── 2. Hardware ───────────────────────────────────────────
    let line_1 = SysfsLine::open(config.sensor_1_enable_line)
        .with_context(|| format!("enable line gpio{}", config.sensor_1_enable_line))?;
    let line_2 = SysfsLine::open(config.sensor_2_enable_line)
        .with_context(|| format!("enable line gpio{}", config.sensor_2_enable_line))?;
    let enable = EnableController::new(line_1, line_2);
    let tof = Vl53l1xDriver::new();

    // ── 3. Broker + supervisor collaborators ──────────────────
    let publisher = Publisher::new(MqttBroker::from_config(&config));
    let restart = CommandRestart::new(config.restart_command.clone());
    let clock = SystemClock::new();

    // ── 4. Application service ────────────────────────────────
    let mut app = AppService::new(config.slots(), enable, tof, publisher, restart, clock);
    let mut sink = LogEventSink::new();

    let attempts = app.start(&mut sink).context("startup")?;
    info!(
        "System ready after {} connection attempt(s). Entering cycle loop.",
        attempts
    );

    app.run_forever(&mut sink)
}
