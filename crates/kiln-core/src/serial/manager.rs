//! Serial session management.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::session::SerialSession;
use crate::config::KilnConfig;
use crate::error::{KilnError, Result};
use crate::gateway::DeviceGateway;
use crate::notice::{Notice, NoticeSender};

/// Handle to the running auto-read poll task.
struct PollHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owns the one logical device connection and its lifecycle.
///
/// `SerialManager` is responsible for:
/// - The connect/disconnect state machine
/// - Manual and auto-polled reads with line-mode framing
/// - Write submission with retry-friendly pending-outbound handling
/// - Scheduling and cancelling the recurring poll
///
/// At most one read call is in flight at any time: a poll tick or manual
/// read that arrives while a read is awaiting the gateway is skipped rather
/// than issued, so buffer appends can never interleave out of temporal
/// order.
pub struct SerialManager {
    session: Arc<RwLock<SerialSession>>,
    gateway: Arc<dyn DeviceGateway>,
    notices: NoticeSender,
    poll_interval: Duration,
    poll: Mutex<Option<PollHandle>>,
    read_in_flight: Arc<AtomicBool>,
}

impl SerialManager {
    pub fn new(
        gateway: Arc<dyn DeviceGateway>,
        notices: NoticeSender,
        config: &KilnConfig,
    ) -> Self {
        Self {
            session: Arc::new(RwLock::new(SerialSession::new())),
            gateway,
            notices,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            poll: Mutex::new(None),
            read_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns a point-in-time copy of the session state for rendering.
    pub async fn snapshot(&self) -> SerialSession {
        self.session.read().await.clone()
    }

    /// Enumerates attached ports. Independent of connection state.
    ///
    /// An empty result is surfaced as a non-error notice.
    pub async fn refresh_ports(&self) -> Result<Vec<String>> {
        match self.gateway.list_ports().await {
            Ok(ports) => {
                if ports.is_empty() {
                    self.notices.send(Notice::warning(
                        "No Ports Found",
                        "No serial ports are available.",
                    ));
                }
                Ok(ports)
            }
            Err(err) => {
                self.notices.send(Notice::error(
                    "Port Enumeration Failed",
                    format!("Failed to fetch serial ports: {err}"),
                ));
                Err(err)
            }
        }
    }

    /// Opens `port`. Valid only while disconnected.
    ///
    /// # Errors
    ///
    /// Returns a validation error when already connected, or the gateway's
    /// device error when the port cannot be opened (status then remains
    /// `Disconnected`).
    pub async fn connect(&self, port: &str) -> Result<()> {
        {
            let session = self.session.read().await;
            if session.is_connected() {
                return Err(KilnError::validation("a port is already connected"));
            }
        }
        match self.gateway.open_port(port).await {
            Ok(()) => {
                self.session.write().await.mark_connected(port);
                self.notices
                    .send(Notice::info("Connected", format!("Connected to {port}.")));
                tracing::info!(port, "serial port connected");
                Ok(())
            }
            Err(err) => {
                self.notices.send(Notice::error(
                    "Connection Failed",
                    format!("Failed to connect to {port}: {err}"),
                ));
                Err(err)
            }
        }
    }

    /// Closes the connection. Valid only while connected.
    ///
    /// The poll is cancelled and local state is forced to `Disconnected`
    /// regardless of the remote close outcome; a close failure is reported
    /// but does not block the transition.
    pub async fn disconnect(&self) -> Result<()> {
        {
            let session = self.session.read().await;
            if !session.is_connected() {
                return Err(KilnError::validation("no port is connected"));
            }
        }
        self.stop_poll().await;

        let close_result = self.gateway.close_port().await;
        let port = {
            let mut session = self.session.write().await;
            let port = session.port_name().unwrap_or_default().to_string();
            session.mark_disconnected();
            port
        };

        match close_result {
            Ok(()) => {
                self.notices.send(Notice::info(
                    "Disconnected",
                    format!("Disconnected from {port}."),
                ));
            }
            Err(err) => {
                self.notices.send(Notice::error(
                    "Disconnect Failed",
                    format!("Failed to disconnect from {port}: {err}"),
                ));
            }
        }
        tracing::info!(port, "serial port disconnected");
        Ok(())
    }

    /// Performs a single read and appends the framed result to the receive
    /// buffer. Valid only while connected.
    pub async fn manual_read(&self) -> Result<()> {
        if !self.session.read().await.is_connected() {
            return Err(KilnError::validation("no port is connected"));
        }
        read_and_append(
            &self.gateway,
            &self.session,
            &self.read_in_flight,
            &self.notices,
        )
        .await
    }

    /// Queues `data` as the pending outbound text and flushes it.
    ///
    /// On failure the pending text is left in place so the user can retry.
    pub async fn write(&self, data: &str) -> Result<()> {
        if data.is_empty() {
            return Err(KilnError::validation("nothing to send"));
        }
        self.session.write().await.set_pending(data);
        self.flush_pending().await
    }

    /// Sends the current pending outbound text, clearing it on success.
    pub async fn flush_pending(&self) -> Result<()> {
        let (connected, data) = {
            let session = self.session.read().await;
            (
                session.is_connected(),
                session.pending_outbound().to_string(),
            )
        };
        if !connected {
            return Err(KilnError::validation("no port is connected"));
        }
        if data.is_empty() {
            return Err(KilnError::validation("nothing to send"));
        }
        match self.gateway.write_chunk(&data).await {
            Ok(()) => {
                self.session.write().await.clear_pending();
                Ok(())
            }
            Err(err) => {
                self.notices.send(Notice::error(
                    "Write Failed",
                    format!("Failed to write to the port: {err}"),
                ));
                Err(err)
            }
        }
    }

    /// Flips auto-read, returning the new value.
    ///
    /// Enabling requires a connection; disabling always cancels the poll.
    pub async fn toggle_auto_read(&self) -> Result<bool> {
        let enable = {
            let mut session = self.session.write().await;
            if session.auto_read() {
                session.set_auto_read(false);
                false
            } else {
                if !session.is_connected() {
                    self.notices.send(Notice::warning(
                        "Auto Read",
                        "Connect to a port before enabling auto read.",
                    ));
                    return Err(KilnError::validation(
                        "auto read requires an active connection",
                    ));
                }
                session.set_auto_read(true);
                true
            }
        };
        if enable {
            self.start_poll().await;
        } else {
            self.stop_poll().await;
        }
        Ok(enable)
    }

    /// Flips line-mode framing, returning the new value.
    ///
    /// Takes effect on the next read; already-buffered data is not reframed.
    pub async fn toggle_line_mode(&self) -> bool {
        self.session.write().await.toggle_line_mode()
    }

    /// Returns descriptive text about the attached board.
    pub async fn board_info(&self) -> Result<String> {
        match self.gateway.board_info().await {
            Ok(info) => Ok(info),
            Err(err) => {
                self.notices.send(Notice::error(
                    "Board Info",
                    format!("Error fetching board info: {err}"),
                ));
                Err(err)
            }
        }
    }

    /// Whether the recurring poll task is currently scheduled.
    pub async fn poll_active(&self) -> bool {
        self.poll.lock().await.is_some()
    }

    /// Cancels the poll unconditionally. Called on application exit.
    pub async fn shutdown(&self) {
        self.stop_poll().await;
    }

    async fn start_poll(&self) {
        let mut slot = self.poll.lock().await;
        if let Some(previous) = slot.take() {
            previous.cancel.cancel();
            let _ = previous.task.await;
        }

        let cancel = CancellationToken::new();
        let child = cancel.clone();
        let gateway = self.gateway.clone();
        let session = self.session.clone();
        let in_flight = self.read_in_flight.clone();
        let notices = self.notices.clone();
        let interval = self.poll_interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick of a tokio interval fires immediately; consume
            // it so polling starts one full interval after enabling.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => {
                        let _ = read_and_append(&gateway, &session, &in_flight, &notices).await;
                    }
                }
            }
            tracing::debug!("auto-read poll stopped");
        });

        *slot = Some(PollHandle { cancel, task });
    }

    async fn stop_poll(&self) {
        let handle = self.poll.lock().await.take();
        if let Some(handle) = handle {
            handle.cancel.cancel();
            let _ = handle.task.await;
        }
    }
}

/// The shared read path for manual reads and poll ticks.
///
/// The in-flight flag guarantees at most one outstanding gateway read; a
/// caller that finds a read pending returns without issuing another. A
/// chunk that resolves after disconnection is dropped rather than appended.
async fn read_and_append(
    gateway: &Arc<dyn DeviceGateway>,
    session: &Arc<RwLock<SerialSession>>,
    in_flight: &AtomicBool,
    notices: &NoticeSender,
) -> Result<()> {
    if in_flight
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        tracing::debug!("serial read already in flight, skipping");
        return Ok(());
    }
    let result = gateway.read_chunk().await;
    in_flight.store(false, Ordering::SeqCst);

    match result {
        Ok(raw) => {
            let mut session = session.write().await;
            if session.is_connected() {
                session.append_chunk(&raw);
            }
            Ok(())
        }
        Err(err) => {
            notices.send(Notice::error(
                "Read Failed",
                format!("Failed to read from the port: {err}"),
            ));
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::session::ConnectionStatus;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;
    use tokio::sync::mpsc::UnboundedReceiver;

    #[derive(Default)]
    struct MockDevice {
        fail_open: bool,
        fail_close: bool,
        fail_read: bool,
        fail_write: bool,
        ports: Vec<String>,
        read_chunks: Mutex<Vec<String>>,
        reads_issued: AtomicUsize,
        writes: Mutex<Vec<String>>,
        /// When set, `read_chunk` blocks until notified.
        read_gate: Option<Arc<Notify>>,
    }

    impl MockDevice {
        fn with_chunks(chunks: &[&str]) -> Self {
            Self {
                read_chunks: Mutex::new(chunks.iter().rev().map(|c| c.to_string()).collect()),
                ..Self::default()
            }
        }

        fn reads(&self) -> usize {
            self.reads_issued.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DeviceGateway for MockDevice {
        async fn list_ports(&self) -> Result<Vec<String>> {
            Ok(self.ports.clone())
        }

        async fn open_port(&self, port: &str) -> Result<()> {
            if self.fail_open {
                Err(KilnError::device(format!("{port} is busy")))
            } else {
                Ok(())
            }
        }

        async fn close_port(&self) -> Result<()> {
            if self.fail_close {
                Err(KilnError::device("device already gone"))
            } else {
                Ok(())
            }
        }

        async fn read_chunk(&self) -> Result<String> {
            self.reads_issued.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.read_gate {
                gate.notified().await;
            }
            if self.fail_read {
                return Err(KilnError::device("read timed out"));
            }
            Ok(self
                .read_chunks
                .lock()
                .await
                .pop()
                .unwrap_or_else(|| "tick\n".to_string()))
        }

        async fn write_chunk(&self, data: &str) -> Result<()> {
            if self.fail_write {
                return Err(KilnError::device("write failed"));
            }
            self.writes.lock().await.push(data.to_string());
            Ok(())
        }

        async fn board_info(&self) -> Result<String> {
            Ok("Device Name: mock".to_string())
        }
    }

    fn manager_with(
        device: MockDevice,
    ) -> (
        Arc<SerialManager>,
        Arc<MockDevice>,
        UnboundedReceiver<Notice>,
    ) {
        let device = Arc::new(device);
        let (notices, rx) = NoticeSender::channel();
        let manager = Arc::new(SerialManager::new(
            device.clone(),
            notices,
            &KilnConfig::default(),
        ));
        (manager, device, rx)
    }

    #[tokio::test]
    async fn test_connect_failure_stays_disconnected() {
        let (manager, _, mut rx) = manager_with(MockDevice {
            fail_open: true,
            ..MockDevice::default()
        });

        assert!(manager.connect("COM7").await.unwrap_err().is_device());
        let session = manager.snapshot().await;
        assert_eq!(*session.status(), ConnectionStatus::Disconnected);
        assert!(session.port_name().is_none());

        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.title, "Connection Failed");
        assert!(notice.message.contains("COM7"));
    }

    #[tokio::test]
    async fn test_connect_then_reconnect_is_validation() {
        let (manager, _, _rx) = manager_with(MockDevice::default());
        manager.connect("/dev/ttyACM0").await.unwrap();
        assert_eq!(
            manager.snapshot().await.port_name(),
            Some("/dev/ttyACM0")
        );
        assert!(
            manager
                .connect("/dev/ttyACM1")
                .await
                .unwrap_err()
                .is_validation()
        );
    }

    #[tokio::test]
    async fn test_disconnect_forces_local_state_even_on_close_failure() {
        let (manager, _, mut rx) = manager_with(MockDevice {
            fail_close: true,
            ..MockDevice::default()
        });
        manager.connect("COM3").await.unwrap();
        manager.toggle_auto_read().await.unwrap();

        manager.disconnect().await.unwrap();

        let session = manager.snapshot().await;
        assert_eq!(*session.status(), ConnectionStatus::Disconnected);
        assert!(!session.auto_read());
        assert!(session.port_name().is_none());
        assert!(!manager.poll_active().await);

        // The close failure is still reported.
        let titles: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|n| n.title)
            .collect();
        assert!(titles.contains(&"Disconnect Failed".to_string()));
    }

    #[tokio::test]
    async fn test_manual_read_appends_and_frames() {
        let (manager, _, _rx) = manager_with(MockDevice::with_chunks(&["  abc\n\ndef  \n"]));
        manager.connect("COM3").await.unwrap();
        manager.toggle_line_mode().await;
        manager.manual_read().await.unwrap();
        assert_eq!(manager.snapshot().await.receive_buffer(), "abc\ndef");
    }

    #[tokio::test]
    async fn test_manual_read_requires_connection() {
        let (manager, device, _rx) = manager_with(MockDevice::default());
        assert!(manager.manual_read().await.unwrap_err().is_validation());
        assert_eq!(device.reads(), 0);
    }

    #[tokio::test]
    async fn test_read_failure_leaves_buffer_unchanged() {
        let (manager, _, mut rx) = manager_with(MockDevice {
            fail_read: true,
            ..MockDevice::default()
        });
        manager.connect("COM3").await.unwrap();
        assert!(manager.manual_read().await.is_err());
        assert_eq!(manager.snapshot().await.receive_buffer(), "");

        // Connected notice first, then the read failure.
        let _ = rx.try_recv().unwrap();
        assert_eq!(rx.try_recv().unwrap().title, "Read Failed");
    }

    #[tokio::test]
    async fn test_write_clears_pending_on_success() {
        let (manager, device, _rx) = manager_with(MockDevice::default());
        manager.connect("COM3").await.unwrap();
        manager.write("led on\n").await.unwrap();
        assert_eq!(manager.snapshot().await.pending_outbound(), "");
        assert_eq!(device.writes.lock().await.as_slice(), ["led on\n"]);
    }

    #[tokio::test]
    async fn test_write_failure_keeps_pending_for_retry() {
        let (manager, _, _rx) = manager_with(MockDevice {
            fail_write: true,
            ..MockDevice::default()
        });
        manager.connect("COM3").await.unwrap();
        assert!(manager.write("led on\n").await.is_err());
        assert_eq!(manager.snapshot().await.pending_outbound(), "led on\n");
    }

    #[tokio::test]
    async fn test_write_empty_is_rejected_before_gateway() {
        let (manager, device, _rx) = manager_with(MockDevice::default());
        manager.connect("COM3").await.unwrap();
        assert!(manager.write("").await.unwrap_err().is_validation());
        assert!(device.writes.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_auto_read_rejected_while_disconnected() {
        let (manager, _, _rx) = manager_with(MockDevice::default());
        assert!(
            manager
                .toggle_auto_read()
                .await
                .unwrap_err()
                .is_validation()
        );
        assert!(!manager.poll_active().await);
        assert!(!manager.snapshot().await.auto_read());
    }

    #[tokio::test]
    async fn test_toggle_auto_read_starts_and_stops_poll() {
        let (manager, _, _rx) = manager_with(MockDevice::default());
        manager.connect("COM3").await.unwrap();

        assert!(manager.toggle_auto_read().await.unwrap());
        assert!(manager.poll_active().await);

        assert!(!manager.toggle_auto_read().await.unwrap());
        assert!(!manager.poll_active().await);
        assert!(!manager.snapshot().await.auto_read());
    }

    #[tokio::test]
    async fn test_only_one_read_in_flight() {
        let gate = Arc::new(Notify::new());
        let (manager, device, _rx) = manager_with(MockDevice {
            read_gate: Some(gate.clone()),
            ..MockDevice::default()
        });
        manager.connect("COM3").await.unwrap();

        // First read parks inside the gateway.
        let first = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.manual_read().await })
        };
        tokio::task::yield_now().await;
        assert_eq!(device.reads(), 1);

        // A second trigger while the first is pending is skipped entirely.
        manager.manual_read().await.unwrap();
        assert_eq!(device.reads(), 1);

        gate.notify_one();
        first.await.unwrap().unwrap();
        assert_eq!(device.reads(), 1);
        assert_eq!(manager.snapshot().await.receive_buffer(), "tick\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_reads_on_interval_and_dies_with_disconnect() {
        let (manager, device, _rx) = manager_with(MockDevice::default());
        manager.connect("COM3").await.unwrap();
        manager.toggle_auto_read().await.unwrap();

        // No immediate read on enable.
        tokio::task::yield_now().await;
        assert_eq!(device.reads(), 0);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(device.reads(), 2);

        manager.disconnect().await.unwrap();
        let after_disconnect = device.reads();
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(device.reads(), after_disconnect);
    }
}
