//! Live Volcano Hybrid monitor
//!
//! Run with: cargo run --example volcano_monitor
//!
//! Set `RUST_LOG=volcano_hybrid_ble=debug` to see reconciliation decisions.

use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use std::io::Write;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use volcano_hybrid_ble::{
    matches_properties, BtleplugTransport, DeviceSession, Error, GattTransport, Result, SensorKey,
};

const SCAN_TIME: Duration = Duration::from_secs(5);
const RECONNECT_INTERVAL: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    println!("Volcano Monitor");
    println!("===============\n");
    println!("Looking for a Volcano Hybrid...\n");

    let manager = Manager::new().await?;
    let adapter = manager
        .adapters()
        .await?
        .into_iter()
        .next()
        .ok_or(Error::BluetoothUnavailable)?;

    let peripheral = find_volcano(&adapter).await?;
    let transport = BtleplugTransport::from_peripheral(peripheral).await?;
    println!("Found Volcano at {}", transport.address());

    let mut session = DeviceSession::new(|| {}, || println!("Device details refreshed"));
    session.bind(transport).await;

    println!("Press Ctrl+C to exit.\n");

    loop {
        if !session.is_connected() && !session.ensure_connected().await {
            println!("Volcano unreachable, retrying in {:?}", RECONNECT_INTERVAL);
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                _ = tokio::time::sleep(RECONNECT_INTERVAL) => continue,
            }
        }

        display_state(&session);

        // Redraw on every device event
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\n\nExiting...");
                break;
            }
            received = session.next_event() => {
                if !received {
                    println!("\nLink lost");
                }
            }
        }
    }

    session.disconnect().await;
    adapter.stop_scan().await?;

    Ok(())
}

async fn find_volcano(adapter: &Adapter) -> Result<Peripheral> {
    adapter.start_scan(ScanFilter::default()).await?;
    tokio::time::sleep(SCAN_TIME).await;

    for peripheral in adapter.peripherals().await? {
        if let Some(properties) = peripheral.properties().await? {
            if matches_properties(&properties) {
                return Ok(peripheral);
            }
        }
    }

    Err(Error::ConnectionFailed {
        reason: "no Volcano Hybrid found".to_string(),
    })
}

fn display_state(session: &DeviceSession<BtleplugTransport>) {
    // Clear screen and move cursor to top
    print!("\x1B[2J\x1B[1;1H");

    println!("=== Volcano Monitor ===");
    println!(
        "Device: {} ({})",
        session.address().unwrap_or_default(),
        session.phase()
    );

    let identity = session.identity();
    println!(
        "Serial: {}  Firmware: {}  BLE: {}\n",
        identity.serial_number.as_deref().unwrap_or("--"),
        identity.firmware_version.as_deref().unwrap_or("--"),
        identity.firmware_ble_version.as_deref().unwrap_or("--"),
    );

    for key in SensorKey::ALL {
        println!("  {:<22} {}", key.as_str(), session.get(key));
    }

    if session.state().is_assumed() {
        println!("\nPending writes awaiting confirmation");
    }

    println!("\nPress Ctrl+C to exit");
    let _ = std::io::stdout().flush();
}
