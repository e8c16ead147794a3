//! Domain layer - Pure bridge logic with no I/O
//!
//! This crate contains:
//! - The reader line protocol decoder
//! - Session state (bound reader identity)
//! - Attendance events and their bus topics
//! - Bus status and the publisher interface
//!
//! Nothing here blocks or spawns; everything is testable in isolation.

pub mod attendance;
pub mod bus;
pub mod error;

// Re-export commonly used types
pub use attendance::{AttendanceEvent, DecodedMessage, SessionState, TagRead};
pub use bus::{BusPublisher, BusStatus, DeliveryAssurance};
pub use error::DomainError;
