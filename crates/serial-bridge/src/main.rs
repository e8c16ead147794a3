use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use application::{BridgeService, DeliveryGate, LineProcessor};
use domain::BusPublisher;
use infrastructure::MqttClient;
use infrastructure::config::BridgeConfig;
use infrastructure::drivers::{self, SerialLineReader};
use serial_bridge::run_bridge;

/// Capacity of the reader -> bridge line channel
const LINE_BUFFER: usize = 256;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to config directory
    #[arg(long, default_value = "config")]
    config_dir: String,

    /// Serial port of the reader (auto-detected if omitted)
    #[arg(long)]
    port: Option<String>,

    /// Override baud rate
    #[arg(long)]
    baud_rate: Option<u32>,

    /// Override default room
    #[arg(long)]
    room: Option<String>,

    /// Override MQTT broker URL (mqtt://host:port)
    #[arg(long)]
    broker_url: Option<String>,
}

async fn run() -> Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,serial_bridge=debug,application=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("📡 RFID Serial Bridge Starting...");

    let args = Args::parse();

    // 1. Load Configuration
    let mut config = BridgeConfig::load(&args.config_dir)?;
    if let Some(port) = args.port {
        config.serial.port = Some(port);
    }
    if let Some(baud_rate) = args.baud_rate {
        config.serial.baud_rate = baud_rate;
    }
    if let Some(room) = args.room {
        config.attendance.default_room = room;
    }
    if let Some(url) = args.broker_url {
        config.mqtt.broker_url = url;
    }
    config.validate()?;
    info!(
        broker = %config.mqtt.broker_url,
        room = %config.attendance.default_room,
        "✅ Configuration loaded"
    );

    // 2. Initialize MQTT
    info!("Connecting to MQTT broker...");
    let (mqtt_client, mqtt_handle) = MqttClient::from_config(&config.mqtt)?;
    let status_rx = mqtt_client.subscribe_status();

    // 3. Acquire the serial port; the bridge cannot run without one
    let selection = drivers::select_port(&config.serial)?;
    let reader = SerialLineReader::new(selection.path, config.serial.clone());
    let stream = reader.open()?;

    let (line_tx, line_rx) = mpsc::channel(LINE_BUFFER);
    let port_name = reader.port_name().to_string();
    let reader_handle = tokio::spawn(async move {
        let result = drivers::forward_lines(stream, line_tx).await;
        match &result {
            Ok(count) => info!(port = %port_name, lines = count, "Serial reader stopped"),
            Err(e) => error!(port = %port_name, error = %e, "Serial error"),
        }
        result
    });

    // 4. Bridge loop
    let publisher: Arc<dyn BusPublisher> = Arc::new(mqtt_client.clone());
    let mut service = BridgeService::new(
        LineProcessor::new(config.attendance.default_room.clone()),
        DeliveryGate::new(publisher),
    );
    service.apply_status(mqtt_client.status());

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("🛑 Shutting down..."),
            Err(err) => warn!(error = %err, "Unable to listen for shutdown signal"),
        }
        signal_token.cancel();
    });

    info!("✅ Bridge ready. Waiting for reader identification and tag reads...");
    let outcome = run_bridge(service, reader_handle, line_rx, status_rx, shutdown).await;
    if let Ok(stats) = &outcome {
        info!(
            lines = stats.lines,
            identities = stats.identities,
            attempted = stats.attempted,
            skipped = stats.skipped,
            suppressed = stats.suppressed,
            ignored = stats.ignored,
            "Bridge stopped"
        );
    }

    if let Err(e) = mqtt_client.disconnect().await {
        warn!(error = %e, "MQTT disconnect failed");
    }
    let _ = tokio::time::timeout(std::time::Duration::from_secs(2), mqtt_handle).await;

    outcome?;
    info!("👋 Good bye!");
    Ok(())
}

fn main() {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("❌ Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = rt.block_on(run()) {
        eprintln!("\n❌ CRITICAL ERROR: {:?}", e);
        std::process::exit(1);
    }
}
