//! The serial connection state value.

use serde::{Deserialize, Serialize};

use super::framing::frame_lines;

/// Connection state of the single allowed device session.
///
/// The port name exists exactly when the session is connected, so it lives
/// inside the `Connected` variant rather than as a separate field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connected {
        port: String,
    },
}

/// The state of the one allowed device connection.
///
/// Invariants:
/// - `auto_read` is true only while connected; disconnecting forces it off;
/// - the receive buffer is append-only and never truncated automatically;
/// - line mode takes effect on the next appended chunk and never re-frames
///   already-buffered data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SerialSession {
    status: ConnectionStatus,
    auto_read: bool,
    line_mode: bool,
    receive_buffer: String,
    pending_outbound: String,
}

impl SerialSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.status, ConnectionStatus::Connected { .. })
    }

    /// The connected port name, defined iff the session is connected.
    pub fn port_name(&self) -> Option<&str> {
        match &self.status {
            ConnectionStatus::Connected { port } => Some(port),
            ConnectionStatus::Disconnected => None,
        }
    }

    pub fn auto_read(&self) -> bool {
        self.auto_read
    }

    pub fn line_mode(&self) -> bool {
        self.line_mode
    }

    pub fn receive_buffer(&self) -> &str {
        &self.receive_buffer
    }

    pub fn pending_outbound(&self) -> &str {
        &self.pending_outbound
    }

    /// Transition to `Connected`.
    pub(crate) fn mark_connected(&mut self, port: impl Into<String>) {
        self.status = ConnectionStatus::Connected { port: port.into() };
    }

    /// Transition to `Disconnected`, forcing `auto_read` off.
    ///
    /// Always leaves local state consistent even when the remote close call
    /// failed; the session must never stay "connected" to a device the user
    /// believes is closed.
    pub(crate) fn mark_disconnected(&mut self) {
        self.status = ConnectionStatus::Disconnected;
        self.auto_read = false;
    }

    pub(crate) fn set_auto_read(&mut self, enabled: bool) {
        // The manager rejects enabling without a connection; this keeps the
        // invariant even for direct callers.
        self.auto_read = enabled && self.is_connected();
    }

    /// Flips line mode, returning the new value.
    pub(crate) fn toggle_line_mode(&mut self) -> bool {
        self.line_mode = !self.line_mode;
        self.line_mode
    }

    /// Appends an inbound chunk under the current framing policy.
    pub(crate) fn append_chunk(&mut self, raw: &str) {
        if self.line_mode {
            self.receive_buffer.push_str(&frame_lines(raw));
        } else {
            self.receive_buffer.push_str(raw);
        }
    }

    pub(crate) fn set_pending(&mut self, data: impl Into<String>) {
        self.pending_outbound = data.into();
    }

    pub(crate) fn clear_pending(&mut self) {
        self.pending_outbound.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_disconnected() {
        let session = SerialSession::new();
        assert_eq!(*session.status(), ConnectionStatus::Disconnected);
        assert!(session.port_name().is_none());
        assert!(!session.auto_read());
    }

    #[test]
    fn test_port_name_defined_iff_connected() {
        let mut session = SerialSession::new();
        session.mark_connected("/dev/ttyUSB0");
        assert_eq!(session.port_name(), Some("/dev/ttyUSB0"));
        session.mark_disconnected();
        assert!(session.port_name().is_none());
    }

    #[test]
    fn test_disconnect_forces_auto_read_off() {
        let mut session = SerialSession::new();
        session.mark_connected("COM3");
        session.set_auto_read(true);
        assert!(session.auto_read());
        session.mark_disconnected();
        assert!(!session.auto_read());
    }

    #[test]
    fn test_auto_read_rejected_while_disconnected() {
        let mut session = SerialSession::new();
        session.set_auto_read(true);
        assert!(!session.auto_read());
    }

    #[test]
    fn test_append_verbatim_without_line_mode() {
        let mut session = SerialSession::new();
        session.append_chunk("  abc\n\ndef  \n");
        assert_eq!(session.receive_buffer(), "  abc\n\ndef  \n");
    }

    #[test]
    fn test_append_framed_with_line_mode() {
        let mut session = SerialSession::new();
        session.toggle_line_mode();
        session.append_chunk("  abc\n\ndef  \n");
        assert_eq!(session.receive_buffer(), "abc\ndef");
    }

    #[test]
    fn test_line_mode_does_not_reframe_buffered_data() {
        let mut session = SerialSession::new();
        session.append_chunk("  raw  \n");
        session.toggle_line_mode();
        session.append_chunk("  framed  \n");
        assert_eq!(session.receive_buffer(), "  raw  \nframed");
    }
}
