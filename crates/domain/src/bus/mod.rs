mod publisher;
mod status;

pub use publisher::{BusPublisher, DeliveryAssurance};
pub use status::BusStatus;
