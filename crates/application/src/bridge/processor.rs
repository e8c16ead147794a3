use domain::attendance::{self, AttendanceEvent, DecodedMessage, SessionState};
use tracing::{debug, info, warn};

/// What a single raw line turned into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    IdentityBound {
        identity: String,
        previous: Option<String>,
    },
    /// Announcement with a blank identity; the previous binding is kept
    IdentityRejected,
    Publish {
        topic: String,
        event: AttendanceEvent,
    },
    /// Tag read that must not be published
    Suppressed,
    Ignored,
}

/// Turns raw reader lines into session updates and publishable events.
///
/// Owns the session state so updates and reads happen in line order.
pub struct LineProcessor {
    session: SessionState,
    default_room: String,
}

impl LineProcessor {
    pub fn new(default_room: impl Into<String>) -> Self {
        Self {
            session: SessionState::new(),
            default_room: default_room.into(),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn handle_line(&mut self, line: &str) -> LineOutcome {
        match attendance::decode(line) {
            DecodedMessage::IdentityAnnouncement { identity } => {
                if identity.is_empty() {
                    warn!("Reader announced an empty identity, keeping previous binding");
                    return LineOutcome::IdentityRejected;
                }
                let previous = self.session.bind(identity.clone());
                info!(esp32_id = %identity, previous = ?previous, "Reader identified");
                LineOutcome::IdentityBound { identity, previous }
            }
            DecodedMessage::TagRead(read) => {
                let Some(event) = AttendanceEvent::build(&read, &self.session, &self.default_room)
                else {
                    debug!("Tag read without tag id, skipping");
                    return LineOutcome::Suppressed;
                };

                match attendance::topic_for(&event) {
                    Ok(topic) => LineOutcome::Publish { topic, event },
                    Err(e) => {
                        warn!(tag_id = %event.tag_id(), error = %e, "Tag read has no valid topic, skipping");
                        LineOutcome::Suppressed
                    }
                }
            }
            DecodedMessage::Ignored => LineOutcome::Ignored,
        }
    }
}
