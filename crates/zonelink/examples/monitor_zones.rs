//! Monitor real-time zone events.
//!
//! Demonstrates subscribing to the receiver event stream and printing all
//! zone state changes as they arrive. Useful for checking cabling and
//! zone numbering on a new installation, or for watching what the wall
//! keypads are doing.
//!
//! # Requirements
//!
//! - A ZR receiver connected via serial
//! - Serial port path adjusted for your system
//!
//! # Usage
//!
//! ```sh
//! cargo run -p zonelink --example monitor_zones
//! ```

use std::time::Duration;

use zonelink::niles::models::zr_6;
use zonelink::niles::NilesBuilder;
use zonelink::ZoneEvent;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let serial_port = "/dev/ttyUSB0";
    println!("Connecting to ZR-6 on {serial_port}...");

    let receiver = NilesBuilder::new(zr_6())
        .serial_port(serial_port)
        .poll_interval(Duration::from_secs(30))
        .source_label(1, "Streamer")
        .source_label(2, "Turntable")
        .build()?;

    for zone in 1..=6 {
        receiver.register_zone(zone, Default::default())?;
    }

    let mut events = receiver.subscribe();
    receiver.start().await?;
    println!("Connected: {}\n", receiver.info());
    println!("Monitoring zone events for 60 seconds...");
    println!("(Adjust a wall keypad to generate events)\n");

    let deadline = tokio::time::Instant::now() + Duration::from_secs(60);
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }
        match tokio::time::timeout(remaining, events.recv()).await {
            Ok(Ok(event)) => match event {
                ZoneEvent::PowerChanged { zone, on, display } => {
                    println!("zone {zone}: power {} ({display})", if on { "on" } else { "off" });
                }
                ZoneEvent::SourceChanged { zone, source, label } => {
                    println!("zone {zone}: source {source} ({label})");
                }
                ZoneEvent::VolumeChanged { zone, volume } => {
                    println!("zone {zone}: volume {volume}");
                }
                ZoneEvent::MuteChanged { zone, muted } => {
                    println!("zone {zone}: muted {muted}");
                }
                other => println!("{other:?}"),
            },
            Ok(Err(_)) => break,
            Err(_) => break,
        }
    }

    receiver.stop().await;
    println!("\nDone.");
    Ok(())
}
