//! Runtime wiring for the serial bridge binary.

use application::{BridgeService, BridgeStats};
use domain::{BusStatus, DomainError};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Drive the bridge loop and report how the serial side ended.
///
/// A requested shutdown is a clean stop. If the line stream ends on its own,
/// the reader lost the device: its error is returned, or a transport error
/// when it hit end of input, so the process can exit non-zero.
pub async fn run_bridge(
    service: BridgeService,
    reader: JoinHandle<Result<u64, DomainError>>,
    lines: mpsc::Receiver<String>,
    status_rx: broadcast::Receiver<BusStatus>,
    shutdown: CancellationToken,
) -> Result<BridgeStats, DomainError> {
    let stats = service.run(lines, status_rx, shutdown.clone()).await;

    if shutdown.is_cancelled() {
        reader.abort();
        return Ok(stats);
    }

    match reader.await {
        Ok(Ok(count)) => {
            warn!(lines = count, "Serial port closed unexpectedly");
            Err(DomainError::TransportError(
                "Serial port closed unexpectedly".to_string(),
            ))
        }
        Ok(Err(e)) => Err(e),
        Err(e) => Err(DomainError::TransportError(format!(
            "Serial reader task failed: {}",
            e
        ))),
    }
}
