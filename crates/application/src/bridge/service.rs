use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::processor::{LineOutcome, LineProcessor};
use crate::delivery::{DeliveryGate, DeliveryOutcome};
use domain::BusStatus;

/// Counters reported when the bridge stops
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub lines: u64,
    pub identities: u64,
    pub attempted: u64,
    pub skipped: u64,
    pub suppressed: u64,
    pub ignored: u64,
}

/// Serialized processing loop for reader lines and bus status changes.
///
/// Owns the session (through the processor) and the last known bus status,
/// so no locking is needed around either.
pub struct BridgeService {
    processor: LineProcessor,
    gate: DeliveryGate,
    status: BusStatus,
    stats: BridgeStats,
}

impl BridgeService {
    pub fn new(processor: LineProcessor, gate: DeliveryGate) -> Self {
        Self {
            processor,
            gate,
            status: BusStatus::default(),
            stats: BridgeStats::default(),
        }
    }

    pub fn status(&self) -> BusStatus {
        self.status
    }

    pub fn stats(&self) -> &BridgeStats {
        &self.stats
    }

    pub fn apply_status(&mut self, status: BusStatus) {
        let next = match status {
            BusStatus::Connected => self.status.to_connected(),
            BusStatus::Disconnected => self.status.to_disconnected(),
        };
        if next != self.status {
            info!(from = %self.status, to = %next, "Bus status changed");
        }
        self.status = next;
    }

    /// Process one raw line. Returns the delivery outcome when the line
    /// produced a publishable event.
    pub async fn handle_line(&mut self, line: &str) -> Option<DeliveryOutcome> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        self.stats.lines += 1;
        debug!(line = %line, "Reader line");

        match self.processor.handle_line(line) {
            LineOutcome::IdentityBound { .. } => {
                self.stats.identities += 1;
                None
            }
            LineOutcome::IdentityRejected | LineOutcome::Suppressed => {
                self.stats.suppressed += 1;
                None
            }
            LineOutcome::Ignored => {
                self.stats.ignored += 1;
                None
            }
            LineOutcome::Publish { topic, event } => {
                debug!(
                    topic = %topic,
                    connected = self.status.is_connected(),
                    "Tag read ready"
                );
                let outcome = self.gate.publish(self.status, &topic, &event).await;
                match outcome {
                    DeliveryOutcome::Attempted => self.stats.attempted += 1,
                    DeliveryOutcome::Skipped => self.stats.skipped += 1,
                }
                Some(outcome)
            }
        }
    }

    /// Run until cancelled or until the line stream ends.
    ///
    /// Status changes are drained before lines when both are ready, so a
    /// line is always gated on the latest status the client reported.
    pub async fn run(
        mut self,
        mut lines: mpsc::Receiver<String>,
        mut status_rx: broadcast::Receiver<BusStatus>,
        shutdown: CancellationToken,
    ) -> BridgeStats {
        let mut status_open = true;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Bridge shutdown requested");
                    break;
                }
                status = status_rx.recv(), if status_open => match status {
                    Ok(status) => self.apply_status(status),
                    Err(broadcast::error::RecvError::Lagged(count)) => {
                        warn!(skipped = count, "Bus status listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        warn!("Bus status channel closed");
                        status_open = false;
                    }
                },
                line = lines.recv() => match line {
                    Some(line) => {
                        self.handle_line(&line).await;
                    }
                    None => {
                        info!("Reader line stream ended");
                        break;
                    }
                },
            }
        }

        self.stats
    }
}
