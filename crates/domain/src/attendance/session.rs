/// Identity of the reader currently attached to the bridge.
///
/// Starts unbound. Every identity announcement replaces the previous value
/// (the reader re-announces after a reset).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    identity: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a new identity, returning the one it replaced
    pub fn bind(&mut self, identity: impl Into<String>) -> Option<String> {
        self.identity.replace(identity.into())
    }

    pub fn current(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn is_bound(&self) -> bool {
        self.identity.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_unbound() {
        let session = SessionState::new();
        assert!(!session.is_bound());
        assert_eq!(session.current(), None);
    }

    #[test]
    fn test_last_bind_wins() {
        let mut session = SessionState::new();
        assert_eq!(session.bind("esp32-1"), None);
        assert_eq!(session.bind("esp32-2"), Some("esp32-1".to_string()));
        assert_eq!(session.current(), Some("esp32-2"));
    }
}
