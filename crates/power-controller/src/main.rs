//! Power Controller - Main Entry Point
//!
//! Usage: `power-controller [CONFIG_FILE]`

use anyhow::Context;
use power_controller::{init_logging, uart, App, ControllerConfig};
use soft_timer::Timebase;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1).map(PathBuf::from);
    let config = ControllerConfig::load(path.as_deref()).context("loading configuration")?;
    init_logging(&config.log_level).context("installing log subscriber")?;

    info!("=== Power Controller v{} ===", env!("CARGO_PKG_VERSION"));

    let timebase = Timebase::new();
    let mut app = App::init(&config, timebase.clone()).context("initialising board")?;
    let mut scheduler =
        App::scheduler(&config, timebase.clone()).context("building task table")?;
    let stop = scheduler.stop_handle();

    app.install_critical_hook(stop.clone(), config.shutdown_on_critical);

    // SysTick
    let clock = timebase.clone();
    let ticker = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(1));
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
        loop {
            interval.tick().await;
            clock.tick();
        }
    });

    let port = app.board.serial.channel(0).context("serial channel 0")?.uart();
    let flush = Duration::from_millis(config.uart.flush_interval_ms.max(1));
    let bridge = match config.uart.device.as_deref() {
        Some(device) => {
            let stream = uart::open_serial(device, &config.uart).context("opening UART")?;
            let (reader, writer) = tokio::io::split(stream);
            tokio::spawn(uart::serve(reader, writer, port, flush, stop.clone()))
        }
        None => {
            info!("No UART device configured, serving stdin/stdout");
            tokio::spawn(uart::serve(
                tokio::io::stdin(),
                tokio::io::stdout(),
                port,
                flush,
                stop.clone(),
            ))
        }
    };

    let on_signal = stop.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested");
                on_signal.stop();
            }
            Err(e) => warn!("Could not listen for Ctrl-C: {}", e),
        }
    });

    tokio::task::spawn_blocking(move || scheduler.execute(&mut app))
        .await
        .context("main loop terminated abnormally")?;

    ticker.abort();
    bridge.abort();
    info!("Power controller stopped");
    Ok(())
}
