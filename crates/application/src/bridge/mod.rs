mod processor;
mod service;

pub use processor::{LineOutcome, LineProcessor};
pub use service::{BridgeService, BridgeStats};
