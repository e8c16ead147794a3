mod gate;

pub use gate::{DeliveryGate, DeliveryOutcome};
