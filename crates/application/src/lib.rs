//! Application layer - The bridge driver loop and delivery policy

pub mod bridge;
pub mod delivery;

pub use bridge::{BridgeService, BridgeStats, LineOutcome, LineProcessor};
pub use delivery::{DeliveryGate, DeliveryOutcome};
