use serde::Serialize;

use super::decoder::TagRead;
use super::session::SessionState;
use crate::DomainError;

/// Device id used when neither the line nor the session provide one
pub const UNKNOWN_DEVICE: &str = "esp32-unknown";

/// Publish-ready attendance record.
///
/// The serialized field names are consumed by the attendance backend and
/// must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceEvent {
    #[serde(rename = "tagId")]
    tag_id: String,
    room: String,
    #[serde(rename = "esp32Id")]
    device_id: String,
}

impl AttendanceEvent {
    /// Resolve a decoded tag read into an event.
    ///
    /// Field resolution: value embedded in the line, then the fallback
    /// (`default_room` for the room, the bound session identity and then
    /// [`UNKNOWN_DEVICE`] for the device). Returns `None` when the read carries
    /// no tag id; such reads are never published.
    pub fn build(read: &TagRead, session: &SessionState, default_room: &str) -> Option<Self> {
        if !read.has_tag() {
            return None;
        }

        let room = non_empty(read.room.as_deref()).unwrap_or(default_room);
        let device_id = non_empty(read.device_id.as_deref())
            .or_else(|| non_empty(session.current()))
            .unwrap_or(UNKNOWN_DEVICE);

        Some(Self {
            tag_id: read.tag_id.clone(),
            room: room.to_string(),
            device_id: device_id.to_string(),
        })
    }

    pub fn tag_id(&self) -> &str {
        &self.tag_id
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// JSON payload as sent on the bus
    pub fn to_payload(&self) -> Result<Vec<u8>, DomainError> {
        serde_json::to_vec(self).map_err(|e| DomainError::Serialization(e.to_string()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::decoder::{DecodedMessage, decode};
    use serde_json::json;

    fn read(tag: &str, room: Option<&str>, device: Option<&str>) -> TagRead {
        TagRead {
            tag_id: tag.to_string(),
            room: room.map(str::to_string),
            device_id: device.map(str::to_string),
        }
    }

    #[test]
    fn test_defaults_come_from_session_and_config() {
        let mut session = SessionState::new();
        session.bind("esp32-9");

        let event = AttendanceEvent::build(&read("Z1", None, None), &session, "Sala 101").unwrap();
        assert_eq!(event.tag_id(), "Z1");
        assert_eq!(event.room(), "Sala 101");
        assert_eq!(event.device_id(), "esp32-9");
    }

    #[test]
    fn test_embedded_values_win() {
        let mut session = SessionState::new();
        session.bind("esp32-9");

        let event = AttendanceEvent::build(
            &read("Z1", Some("Lab 2"), Some("esp32-7")),
            &session,
            "Sala 101",
        )
        .unwrap();
        assert_eq!(event.room(), "Lab 2");
        assert_eq!(event.device_id(), "esp32-7");
    }

    #[test]
    fn test_blank_embedded_values_fall_back() {
        let event = AttendanceEvent::build(
            &read("Z1", Some(""), Some("")),
            &SessionState::new(),
            "Sala 101",
        )
        .unwrap();
        assert_eq!(event.room(), "Sala 101");
        assert_eq!(event.device_id(), UNKNOWN_DEVICE);
    }

    #[test]
    fn test_unbound_session_uses_unknown_device() {
        let event =
            AttendanceEvent::build(&read("Z1", None, None), &SessionState::new(), "Sala 101")
                .unwrap();
        assert_eq!(event.device_id(), "esp32-unknown");
    }

    #[test]
    fn test_empty_bound_identity_counts_as_unbound() {
        let mut session = SessionState::new();
        session.bind("");
        let event = AttendanceEvent::build(&read("Z1", None, None), &session, "Sala 101").unwrap();
        assert_eq!(event.device_id(), UNKNOWN_DEVICE);
    }

    #[test]
    fn test_missing_tag_builds_nothing() {
        assert!(
            AttendanceEvent::build(&read("", Some("Lab"), None), &SessionState::new(), "Sala 101")
                .is_none()
        );
    }

    #[test]
    fn test_payload_has_exactly_three_fields() {
        let DecodedMessage::TagRead(tag_read) = decode("TAG:ABC123|ROOM:Lab 2|ESP32:esp32-7")
        else {
            panic!("Expected a tag read");
        };
        let event = AttendanceEvent::build(&tag_read, &SessionState::new(), "Sala 101").unwrap();

        let payload: serde_json::Value =
            serde_json::from_slice(&event.to_payload().unwrap()).unwrap();
        assert_eq!(
            payload,
            json!({"tagId": "ABC123", "room": "Lab 2", "esp32Id": "esp32-7"})
        );
        assert_eq!(payload.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_payload_field_order_is_stable() {
        let event =
            AttendanceEvent::build(&read("A", Some("B"), Some("C")), &SessionState::new(), "D")
                .unwrap();
        let text = String::from_utf8(event.to_payload().unwrap()).unwrap();
        assert_eq!(text, r#"{"tagId":"A","room":"B","esp32Id":"C"}"#);
    }
}
