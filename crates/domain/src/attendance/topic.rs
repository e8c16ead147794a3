use super::event::AttendanceEvent;
use crate::DomainError;

pub const TOPIC_ROOT: &str = "presenca/attendance";
pub const TOPIC_SUFFIX: &str = "tag-read";

/// Characters with addressing meaning on the broker
const RESERVED: [char; 4] = ['+', '#', '/', '\0'];

/// Collapse every whitespace run into a single underscore
pub fn sanitize_room(room: &str) -> String {
    let mut out = String::with_capacity(room.len());
    let mut in_whitespace = false;
    for c in room.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
        } else {
            out.push(c);
            in_whitespace = false;
        }
    }
    out
}

/// Topic an event is published on:
/// `presenca/attendance/<room>/<device>/tag-read`.
///
/// Rejects room or device values that would change the topic structure.
pub fn topic_for(event: &AttendanceEvent) -> Result<String, DomainError> {
    let room = sanitize_room(event.room());
    check_segment("room", &room)?;
    check_segment("esp32Id", event.device_id())?;

    Ok(format!(
        "{}/{}/{}/{}",
        TOPIC_ROOT,
        room,
        event.device_id(),
        TOPIC_SUFFIX
    ))
}

fn check_segment(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.is_empty() || value.contains(RESERVED) {
        return Err(DomainError::InvalidTopicSegment {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
