use async_trait::async_trait;

use crate::DomainError;

/// Broker delivery guarantee requested for a publish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryAssurance {
    /// Broker acknowledges receipt (QoS 1)
    AtLeastOnce,
}

/// Outbound side of the message bus
#[async_trait]
pub trait BusPublisher: Send + Sync {
    /// Hand one message to the bus client. Returns once the client accepted
    /// the request; broker acknowledgement is the client's concern.
    async fn publish_bytes(
        &self,
        topic: &str,
        payload: &[u8],
        assurance: DeliveryAssurance,
    ) -> Result<(), DomainError>;
}
