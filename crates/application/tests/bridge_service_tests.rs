use application::{BridgeService, BridgeStats, DeliveryGate, DeliveryOutcome, LineProcessor};
use async_trait::async_trait;
use domain::{BusPublisher, BusStatus, DeliveryAssurance, DomainError};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

// --- Capturing bus mock ---

#[derive(Clone, Default)]
struct RecordingBus {
    published: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
    should_fail: Arc<AtomicBool>,
}

impl RecordingBus {
    fn published(&self) -> Vec<(String, serde_json::Value)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl BusPublisher for RecordingBus {
    async fn publish_bytes(
        &self,
        topic: &str,
        payload: &[u8],
        assurance: DeliveryAssurance,
    ) -> Result<(), DomainError> {
        assert_eq!(assurance, DeliveryAssurance::AtLeastOnce);
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(DomainError::PublishError("Simulated failure".to_string()));
        }
        let payload: serde_json::Value = serde_json::from_slice(payload).unwrap();
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload));
        Ok(())
    }
}

fn service(bus: &RecordingBus) -> BridgeService {
    BridgeService::new(
        LineProcessor::new("Sala 101"),
        DeliveryGate::new(Arc::new(bus.clone())),
    )
}

#[tokio::test]
async fn test_initial_status_drops_reads() {
    let bus = RecordingBus::default();
    let mut service = service(&bus);

    assert_eq!(service.status(), BusStatus::Disconnected);
    let outcome = service.handle_line("TAG:Z1").await;

    assert_eq!(outcome, Some(DeliveryOutcome::Skipped));
    assert!(bus.published().is_empty());
    assert_eq!(service.stats().skipped, 1);
}

#[tokio::test]
async fn test_status_transitions_gate_delivery() {
    let bus = RecordingBus::default();
    let mut service = service(&bus);

    service.apply_status(BusStatus::Connected);
    assert_eq!(
        service.handle_line("TAG:A1").await,
        Some(DeliveryOutcome::Attempted)
    );

    service.apply_status(BusStatus::Disconnected);
    assert_eq!(
        service.handle_line("TAG:A2").await,
        Some(DeliveryOutcome::Skipped)
    );

    // Reconnect: nothing buffered comes back
    service.apply_status(BusStatus::Connected);
    assert_eq!(
        service.handle_line("TAG:A3").await,
        Some(DeliveryOutcome::Attempted)
    );

    let tags: Vec<String> = bus
        .published()
        .iter()
        .map(|(_, payload)| payload["tagId"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(tags, vec!["A1", "A3"]);
}

#[tokio::test]
async fn test_identity_sequence_and_defaults() {
    let bus = RecordingBus::default();
    let mut service = service(&bus);
    service.apply_status(BusStatus::Connected);

    assert_eq!(service.handle_line("ESP32_ID:esp32-1").await, None);
    assert_eq!(service.handle_line("ESP32_ID: esp32-9 ").await, None);
    service.handle_line("TAG:Z1").await;

    let published = bus.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "presenca/attendance/Sala_101/esp32-9/tag-read");
    assert_eq!(
        published[0].1,
        serde_json::json!({"tagId": "Z1", "room": "Sala 101", "esp32Id": "esp32-9"})
    );
    assert_eq!(service.stats().identities, 2);
}

#[tokio::test]
async fn test_failed_publish_is_counted_as_attempt() {
    let bus = RecordingBus::default();
    bus.should_fail.store(true, Ordering::Relaxed);
    let mut service = service(&bus);
    service.apply_status(BusStatus::Connected);

    assert_eq!(
        service.handle_line("TAG:Z1").await,
        Some(DeliveryOutcome::Attempted)
    );
    assert!(bus.published().is_empty());
}

#[tokio::test]
async fn test_run_processes_stream_in_order() {
    let bus = RecordingBus::default();
    let (line_tx, line_rx) = mpsc::channel(16);
    let (status_tx, status_rx) = broadcast::channel(8);

    status_tx.send(BusStatus::Connected).unwrap();
    for line in [
        "boot: rc522 ready",
        "",
        "ESP32_ID:esp32-42",
        "TAG:AA|ROOM:Lab   2",
        "TAG:|ROOM:Lab 2",
        "TAG:BB|ESP32:esp32-7",
    ] {
        line_tx.send(line.to_string()).await.unwrap();
    }
    drop(line_tx);

    let stats = service(&bus)
        .run(line_rx, status_rx, CancellationToken::new())
        .await;

    assert_eq!(
        stats,
        BridgeStats {
            lines: 5,
            identities: 1,
            attempted: 2,
            skipped: 0,
            suppressed: 1,
            ignored: 1,
        }
    );

    let topics: Vec<String> = bus.published().into_iter().map(|(t, _)| t).collect();
    assert_eq!(
        topics,
        vec![
            "presenca/attendance/Lab_2/esp32-42/tag-read",
            "presenca/attendance/Sala_101/esp32-7/tag-read",
        ]
    );
}

#[tokio::test]
async fn test_run_stops_on_cancellation() {
    let bus = RecordingBus::default();
    let (_line_tx, line_rx) = mpsc::channel::<String>(4);
    let (_status_tx, status_rx) = broadcast::channel(4);
    let shutdown = CancellationToken::new();

    let handle = tokio::spawn(service(&bus).run(line_rx, status_rx, shutdown.clone()));
    shutdown.cancel();

    let stats = tokio::time::timeout(std::time::Duration::from_secs(1), handle)
        .await
        .expect("bridge did not stop")
        .unwrap();
    assert_eq!(stats, BridgeStats::default());
}

#[tokio::test]
async fn test_run_survives_closed_status_channel() {
    let bus = RecordingBus::default();
    let (line_tx, line_rx) = mpsc::channel(4);
    let (status_tx, status_rx) = broadcast::channel::<BusStatus>(4);
    drop(status_tx);

    line_tx.send("TAG:Z1".to_string()).await.unwrap();
    drop(line_tx);

    let stats = service(&bus)
        .run(line_rx, status_rx, CancellationToken::new())
        .await;
    assert_eq!(stats.skipped, 1);
}
