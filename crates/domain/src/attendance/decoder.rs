/// Prefix of the line the reader prints on boot to announce its identity
pub const IDENTITY_PREFIX: &str = "ESP32_ID:";
/// Marker that identifies a tag-read line
pub const TAG_MARKER: &str = "TAG:";
pub const ROOM_FIELD: &str = "ROOM:";
pub const DEVICE_FIELD: &str = "ESP32:";
pub const FIELD_SEPARATOR: char = '|';

/// Fields extracted from a tag-read line.
///
/// `room` and `device_id` are `None` when the segment is missing entirely and
/// `Some("")` when the segment is present but blank. Resolution treats both
/// as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagRead {
    pub tag_id: String,
    pub room: Option<String>,
    pub device_id: Option<String>,
}

impl TagRead {
    pub fn has_tag(&self) -> bool {
        !self.tag_id.is_empty()
    }
}

/// Result of interpreting one raw line from the reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedMessage {
    IdentityAnnouncement { identity: String },
    TagRead(TagRead),
    Ignored,
}

/// Decode a raw line. Pure; never fails.
pub fn decode(line: &str) -> DecodedMessage {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix(IDENTITY_PREFIX) {
        return DecodedMessage::IdentityAnnouncement {
            identity: rest.trim().to_string(),
        };
    }

    if !line.contains(TAG_MARKER) {
        return DecodedMessage::Ignored;
    }

    let mut read = TagRead::default();
    for segment in line.split(FIELD_SEPARATOR) {
        if let Some(value) = segment.strip_prefix(TAG_MARKER) {
            read.tag_id = value.trim().to_string();
        } else if let Some(value) = segment.strip_prefix(ROOM_FIELD) {
            read.room = Some(value.trim().to_string());
        } else if let Some(value) = segment.strip_prefix(DEVICE_FIELD) {
            read.device_id = Some(value.trim().to_string());
        }
    }

    DecodedMessage::TagRead(read)
}
