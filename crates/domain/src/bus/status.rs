/// Connection state of the message bus as last reported by the client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BusStatus {
    /// No broker session; publishes are skipped
    #[default]
    Disconnected,
    /// Broker acknowledged the session
    Connected,
}

impl BusStatus {
    /// Check if currently connected
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Transition on connect or reconnect
    pub fn to_connected(&self) -> Self {
        Self::Connected
    }

    /// Transition on close or connection error
    pub fn to_disconnected(&self) -> Self {
        Self::Disconnected
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
        }
    }
}

impl std::fmt::Display for BusStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
