use async_trait::async_trait;
use domain::{BusPublisher, BusStatus, DeliveryAssurance, DomainError};
use rumqttc::{AsyncClient, Event, MqttOptions, Outgoing, Packet, QoS};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::{self, JoinHandle};
use tracing::{debug, error, info, warn};

use crate::config::MqttConfig;

/// Map the bus-level delivery guarantee onto MQTT QoS
pub fn qos_for(assurance: DeliveryAssurance) -> QoS {
    match assurance {
        DeliveryAssurance::AtLeastOnce => QoS::AtLeastOnce,
    }
}

/// Tracks the last reported status and only emits real changes
#[derive(Debug, Default)]
struct StatusTracker {
    current: BusStatus,
}

impl StatusTracker {
    fn update(&mut self, next: BusStatus) -> Option<BusStatus> {
        if next == self.current {
            return None;
        }
        self.current = next;
        Some(next)
    }
}

/// MQTT client whose event loop runs on a background task.
///
/// Connection changes are broadcast as [`BusStatus`]; rumqttc reconnects on
/// the next poll after an error.
#[derive(Clone)]
pub struct MqttClient {
    client: AsyncClient,
    status_tx: broadcast::Sender<BusStatus>,
    connected: Arc<AtomicBool>,
}

impl MqttClient {
    pub fn new(host: &str, port: u16, config: &MqttConfig) -> (Self, JoinHandle<()>) {
        let mut mqttoptions = MqttOptions::new(&config.client_id, host, port);
        mqttoptions.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
        mqttoptions.set_clean_session(true);

        let (client, mut eventloop) = AsyncClient::new(mqttoptions, 100);
        let (status_tx, _) = broadcast::channel(16);
        let tx = status_tx.clone();
        let connected = Arc::new(AtomicBool::new(false));
        let connected_clone = connected.clone();
        let broker = format!("{}:{}", host, port);

        // Spawn a task to handle the event loop
        let handle = task::spawn(async move {
            let mut tracker = StatusTracker::default();
            let mut notify = |status: BusStatus| {
                connected_clone.store(status.is_connected(), Ordering::Relaxed);
                if let Some(changed) = tracker.update(status) {
                    // No receivers yet is fine; the bridge subscribes before reading lines
                    let _ = tx.send(changed);
                }
            };

            loop {
                match eventloop.poll().await {
                    Ok(notification) => match notification {
                        Event::Incoming(Packet::ConnAck(_)) => {
                            info!(broker = %broker, "MQTT connected");
                            notify(BusStatus::Connected);
                        }
                        Event::Incoming(Packet::PubAck(ack)) => {
                            debug!(pkid = ack.pkid, "Publish acknowledged by broker");
                        }
                        Event::Incoming(Packet::Disconnect) => {
                            warn!("MQTT connection closed by broker");
                            notify(BusStatus::Disconnected);
                        }
                        Event::Outgoing(Outgoing::Disconnect) => {
                            info!("MQTT disconnecting");
                            notify(BusStatus::Disconnected);
                            break;
                        }
                        _ => {}
                    },
                    Err(e) => {
                        error!(error = %e, "MQTT connection error");
                        notify(BusStatus::Disconnected);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        info!(broker = %broker, "Reconnecting to MQTT...");
                    }
                }
            }
        });

        (
            Self {
                client,
                status_tx,
                connected,
            },
            handle,
        )
    }

    pub fn from_config(config: &MqttConfig) -> Result<(Self, JoinHandle<()>), DomainError> {
        let address = config.broker_address()?;
        Ok(Self::new(&address.host, address.port, config))
    }

    /// Stream of connection changes, starting from the next change.
    /// Subscribe before reading [`MqttClient::status`] so no change is missed.
    pub fn subscribe_status(&self) -> broadcast::Receiver<BusStatus> {
        self.status_tx.subscribe()
    }

    pub fn status(&self) -> BusStatus {
        if self.connected.load(Ordering::Relaxed) {
            BusStatus::Connected
        } else {
            BusStatus::Disconnected
        }
    }

    pub async fn disconnect(&self) -> Result<(), DomainError> {
        self.client
            .disconnect()
            .await
            .map_err(|e| DomainError::PublishError(format!("Failed to disconnect: {}", e)))
    }
}

#[async_trait]
impl BusPublisher for MqttClient {
    async fn publish_bytes(
        &self,
        topic: &str,
        payload: &[u8],
        assurance: DeliveryAssurance,
    ) -> Result<(), DomainError> {
        self.client
            .publish(topic, qos_for(assurance), false, payload.to_vec())
            .await
            .map_err(|e| DomainError::PublishError(format!("Failed to publish MQTT message: {}", e)))
    }
}
