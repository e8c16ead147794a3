use std::sync::Arc;

use domain::{AttendanceEvent, BusPublisher, BusStatus, DeliveryAssurance};
use tracing::{debug, error, info, warn};

/// What happened to an event handed to the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// One publish request was issued (it may still have failed)
    Attempted,
    /// The bus was disconnected; the event is dropped
    Skipped,
}

/// Decides whether an event is published now or dropped.
///
/// There is no queue: an event arriving while the bus is down is lost, and
/// a failed publish is logged but never retried here.
pub struct DeliveryGate {
    publisher: Arc<dyn BusPublisher>,
    assurance: DeliveryAssurance,
}

impl DeliveryGate {
    pub fn new(publisher: Arc<dyn BusPublisher>) -> Self {
        Self {
            publisher,
            assurance: DeliveryAssurance::AtLeastOnce,
        }
    }

    pub async fn publish(
        &self,
        status: BusStatus,
        topic: &str,
        event: &AttendanceEvent,
    ) -> DeliveryOutcome {
        if !status.is_connected() {
            warn!(
                tag_id = %event.tag_id(),
                topic = %topic,
                "Bus disconnected, tag read not sent"
            );
            return DeliveryOutcome::Skipped;
        }

        let payload = match event.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                error!(tag_id = %event.tag_id(), error = %e, "Failed to encode payload");
                return DeliveryOutcome::Attempted;
            }
        };

        debug!(
            topic = %topic,
            payload = %String::from_utf8_lossy(&payload),
            "Publishing tag read"
        );

        match self
            .publisher
            .publish_bytes(topic, &payload, self.assurance)
            .await
        {
            Ok(()) => info!(
                tag_id = %event.tag_id(),
                room = %event.room(),
                esp32_id = %event.device_id(),
                "Tag read published"
            ),
            Err(e) => error!(topic = %topic, error = %e, "Failed to publish tag read"),
        }

        DeliveryOutcome::Attempted
    }
}
