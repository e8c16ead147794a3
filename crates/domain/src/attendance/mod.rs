//! RFID reader line protocol and attendance events

mod decoder;
mod event;
mod session;
mod topic;

pub use decoder::{
    DEVICE_FIELD, DecodedMessage, FIELD_SEPARATOR, IDENTITY_PREFIX, ROOM_FIELD, TAG_MARKER,
    TagRead, decode,
};
pub use event::{AttendanceEvent, UNKNOWN_DEVICE};
pub use session::SessionState;
pub use topic::{TOPIC_ROOT, TOPIC_SUFFIX, sanitize_room, topic_for};
