//! UART Adapter
//!
//! Stands in for the UART interrupt on a host: bytes read from the port go
//! into the channel's receive ring, and the transmit ring is drained to the
//! port on a short interval.

use crate::config::UartConfig;
use crate::error::ControllerError;
use serial_protocol::consts::{RX_BUFFER_SIZE, TX_BUFFER_SIZE};
use scheduler::StopHandle;
use serial_protocol::UartHandle;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::MissedTickBehavior;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, error, info};

/// Open the configured serial device
pub fn open_serial(device: &str, config: &UartConfig) -> Result<SerialStream, ControllerError> {
    let port = tokio_serial::new(device, config.baud_rate).open_native_async()?;
    info!("Opened {} at {} baud", device, config.baud_rate);
    Ok(port)
}

/// Move bytes between a port and a channel until the port closes.
///
/// When the protocol loop falls behind, the receive ring drops its oldest
/// bytes. Pending transmit bytes are flushed before returning.
pub async fn bridge<R, W>(
    mut reader: R,
    mut writer: W,
    uart: UartHandle,
    flush_interval: Duration,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut rx = [0u8; RX_BUFFER_SIZE];
    let mut flush = tokio::time::interval(flush_interval);
    flush.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!("UART bridge started on channel {}", uart.channel());

    loop {
        tokio::select! {
            read = reader.read(&mut rx) => {
                let n = read?;
                if n == 0 {
                    break;
                }
                uart.receive(&rx[..n]);
            }
            _ = flush.tick() => {
                drain(&uart, &mut writer).await?;
            }
        }
    }

    drain(&uart, &mut writer).await?;
    debug!("UART bridge on channel {} closed", uart.channel());
    Ok(())
}

/// Run [`bridge`] and report how it ended.
///
/// A port failure is logged and stops the main loop through `stop`, since a
/// controller without its UART cannot be reached. A closed port only ends
/// the bridge.
pub async fn serve<R, W>(
    reader: R,
    writer: W,
    uart: UartHandle,
    flush_interval: Duration,
    stop: StopHandle,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let channel = uart.channel();
    match bridge(reader, writer, uart, flush_interval).await {
        Ok(()) => info!("UART on channel {} closed", channel),
        Err(e) => {
            error!("UART bridge on channel {} failed: {}", channel, e);
            stop.stop();
        }
    }
}

async fn drain<W: AsyncWrite + Unpin>(uart: &UartHandle, writer: &mut W) -> std::io::Result<()> {
    let mut tx = [0u8; TX_BUFFER_SIZE];
    let mut wrote = false;
    loop {
        let n = uart.transmit(&mut tx);
        if n == 0 {
            break;
        }
        writer.write_all(&tx[..n]).await?;
        wrote = true;
    }
    if wrote {
        writer.flush().await?;
    }
    Ok(())
}
