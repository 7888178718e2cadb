//! upcheck: active health checking daemon for upstream peer pools.
//!
//! # Architecture Overview
//!
//! ```text
//!   config file (TOML)
//!        │ load + validate            SIGHUP / file change
//!        ▼                                     │
//!   ┌──────────┐    build    ┌────────────────▼────────────────┐
//!   │ registry │────────────▶│             monitor             │
//!   │ (peers)  │             │ (engine generations, reload     │
//!   └──────────┘             │  with health carry-over)        │
//!                            └────────────────┬────────────────┘
//!                                             │ one task per peer
//!                                             ▼
//!                            ┌─────────────────────────────────┐
//!                            │            scheduler            │
//!                            │  jittered ticks, skip on miss   │
//!                            └────────────────┬────────────────┘
//!                                             │ tcp / http / smtp probe
//!                                             ▼
//!                            ┌─────────────────────────────────┐
//!                            │           health store          │
//!                            │   rise/fall hysteresis per peer │
//!                            └────────┬───────────────┬────────┘
//!                     is_alive()      │               │ status endpoint
//!                  (traffic path) ◀───┘               └──▶ html / json / csv
//! ```

use std::path::PathBuf;

use clap::Parser;

use upcheck::config::ConfigWatcher;
use upcheck::lifecycle::{SignalEvent, Signals};
use upcheck::observability;
use upcheck::status;
use upcheck::{load_config, Engine, Monitor, Shutdown};

#[derive(Parser)]
#[command(name = "upcheck")]
#[command(about = "Active health checker for upstream peer pools", long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "upcheck.toml")]
    config: PathBuf,

    /// Load and resolve the configuration, then exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.check {
        match load_config(&cli.config).and_then(|config| Engine::build(&config)) {
            Ok(_) => {
                println!(
                    "upcheck: configuration file {} test is successful",
                    cli.config.display()
                );
                return Ok(());
            }
            Err(e) => {
                eprintln!(
                    "upcheck: configuration file {} test failed: {e}",
                    cli.config.display()
                );
                std::process::exit(1);
            }
        }
    }

    let config = load_config(&cli.config)?;

    observability::logging::init_logging(&config.observability.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        upstreams = config.upstreams.len(),
        "upcheck starting"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "failed to parse metrics address"
            );
        }
    }

    let engine = Engine::build(&config)?;
    tracing::info!(
        peers = engine.registry.len(),
        state_capacity = engine.store.capacity(),
        "engine built"
    );

    let monitor = Monitor::new(engine);
    let shared = monitor.shared();
    let shutdown = Shutdown::new();

    let status_task = if config.status.enabled {
        let state = status::AppState {
            engine: shared.clone(),
        };
        let status_config = config.status.clone();
        let rx = shutdown.subscribe();
        Some(tokio::spawn(async move {
            if let Err(e) = status::serve(&status_config, state, rx).await {
                tracing::error!(error = %e, "status endpoint failed");
            }
        }))
    } else {
        None
    };

    // File watcher and SIGHUP feed the same update channel.
    let (watcher, update_rx) = ConfigWatcher::new(&cli.config);
    let reload_tx = watcher.sender();
    let _watcher = watcher.run()?;

    let monitor_task = tokio::spawn(monitor.run(update_rx, shutdown.subscribe()));

    let mut signals = Signals::new()?;
    loop {
        match signals.recv().await {
            SignalEvent::Shutdown => {
                tracing::info!("shutdown signal received");
                break;
            }
            SignalEvent::Reload => {
                tracing::info!("reload signal received");
                match load_config(&cli.config) {
                    Ok(new_config) => {
                        let _ = reload_tx.send(new_config);
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            "reload failed, keeping current configuration"
                        );
                    }
                }
            }
        }
    }

    shutdown.trigger();
    let _ = monitor_task.await;
    if let Some(task) = status_task {
        let _ = task.await;
    }

    tracing::info!("shutdown complete");
    Ok(())
}
