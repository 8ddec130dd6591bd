//! # Telemetry Relay Entry Point
//!
//! Starts the spacecraft simulator, the tick scheduler, the history
//! server and the realtime server. Pressing Enter toggles the thrusters.

use log::{error, info, warn};
use relay::service::{self, build_history_router, build_realtime_router};
use relay::source::Spacecraft;
use relay::{Relay, RelayConfig, Stimulus, TelemetrySource, TickScheduler};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=================================================");
    println!("  Telemetry Relay - History & Realtime Service   ");
    println!("=================================================");
    println!();

    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    let relay = Arc::new(Relay::from_config(&config));
    let spacecraft = match config.seed {
        Some(seed) => Spacecraft::seeded(seed),
        None => Spacecraft::new(),
    };
    let channels = spacecraft.channels();

    let scheduler = Arc::new(TickScheduler::new(
        Arc::clone(&relay),
        Box::new(spacecraft),
        config.scheduler.clone(),
    ));
    println!("✓ Relay initialized");
    println!("  - Channels: {}", channels.len());
    for id in &channels {
        println!("      {}", id);
    }
    println!(
        "  - Tick interval: {}ms",
        config.scheduler.tick_interval.as_millis()
    );
    match config.history.retention {
        Some(cap) => println!("  - Retention: {} samples per channel", cap),
        None => println!("  - Retention: unbounded"),
    }
    println!();

    let history_listener = service::bind(&config.history_addr).await?;
    let realtime_listener = service::bind(&config.realtime_addr).await?;
    println!("  - History server:  http://{}", config.history_addr);
    println!("  - Realtime server: ws://{}", config.realtime_addr);
    println!();

    let ticker = scheduler.spawn();
    let mut history_task = tokio::spawn(service::serve(
        "History",
        history_listener,
        build_history_router(Arc::clone(&relay)),
    ));
    let mut realtime_task = tokio::spawn(service::serve(
        "Realtime",
        realtime_listener,
        build_realtime_router(Arc::clone(&relay)),
    ));

    if config.stdin_toggle {
        println!("Press Enter to toggle thrusters.");
        tokio::spawn(read_toggles(Arc::clone(&scheduler)));
    }

    tokio::select! {
        result = &mut history_task => report("History", result),
        result = &mut realtime_task => report("Realtime", result),
        _ = tokio::signal::ctrl_c() => info!("Ctrl-C received, shutting down"),
    }

    ticker.abort();
    history_task.abort();
    realtime_task.abort();

    let stats = scheduler.stats();
    println!();
    println!("=================================================");
    println!("  Relay Shut Down ({} ticks, {} bursts)", stats.ticks, stats.bursts);
    println!("=================================================");

    Ok(())
}

/// Toggle thrusters on every line read from stdin until EOF.
async fn read_toggles(scheduler: Arc<TickScheduler>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(_)) => {
                scheduler.stimulate(Stimulus::ToggleThrusters);
            }
            Ok(None) => {
                info!("stdin closed, thruster toggle disabled");
                break;
            }
            Err(e) => {
                warn!("Failed to read stdin: {}", e);
                break;
            }
        }
    }
}

fn report(name: &str, result: Result<relay::Result<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => info!("{} server stopped", name),
        Ok(Err(e)) => error!("{} server failed: {}", name, e),
        Err(e) => error!("{} server task panicked: {}", name, e),
    }
}
