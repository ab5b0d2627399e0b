//! Device access over the `serialport` crate.
//!
//! `serialport` exposes a blocking API, so every call runs inside
//! `tokio::task::spawn_blocking` to keep the event loop responsive. The
//! gateway owns at most one open port at a time behind a mutex.

use std::fmt::Write as _;
use std::io::{Read as _, Write as _};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use kiln_core::config::KilnConfig;
use kiln_core::error::{KilnError, Result};
use kiln_core::gateway::DeviceGateway;
use serialport::{SerialPort, SerialPortType};

type SharedPort = Arc<Mutex<Option<Box<dyn SerialPort>>>>;

/// The production [`DeviceGateway`], backed by a real serial port.
pub struct SerialPortGateway {
    port: SharedPort,
    baud_rate: u32,
    read_timeout: Duration,
}

impl SerialPortGateway {
    pub fn new(config: &KilnConfig) -> Self {
        Self {
            port: Arc::new(Mutex::new(None)),
            baud_rate: config.baud_rate,
            read_timeout: Duration::from_millis(config.read_timeout_ms),
        }
    }

    fn lock(port: &SharedPort) -> Result<std::sync::MutexGuard<'_, Option<Box<dyn SerialPort>>>> {
        port.lock()
            .map_err(|_| KilnError::internal("serial port lock poisoned"))
    }
}

#[async_trait]
impl DeviceGateway for SerialPortGateway {
    async fn list_ports(&self) -> Result<Vec<String>> {
        tokio::task::spawn_blocking(|| {
            serialport::available_ports()
                .map(|ports| ports.into_iter().map(|p| p.port_name).collect())
                .map_err(|e| KilnError::device(format!("Failed to enumerate ports: {e}")))
        })
        .await
        .map_err(|e| KilnError::internal(e.to_string()))?
    }

    async fn open_port(&self, port: &str) -> Result<()> {
        let shared = self.port.clone();
        let name = port.to_string();
        let baud_rate = self.baud_rate;
        let timeout = self.read_timeout;
        tokio::task::spawn_blocking(move || {
            let mut slot = Self::lock(&shared)?;
            if slot.is_some() {
                return Err(KilnError::device("a port is already open"));
            }
            let opened = serialport::new(&name, baud_rate)
                .timeout(timeout)
                .open()
                .map_err(|e| KilnError::device(format!("Failed to open port: {e}")))?;
            *slot = Some(opened);
            Ok(())
        })
        .await
        .map_err(|e| KilnError::internal(e.to_string()))?
    }

    async fn close_port(&self) -> Result<()> {
        let shared = self.port.clone();
        tokio::task::spawn_blocking(move || {
            let mut slot = Self::lock(&shared)?;
            match slot.take() {
                // Dropping the handle closes the port.
                Some(port) => {
                    drop(port);
                    Ok(())
                }
                None => Err(KilnError::device("No port is open")),
            }
        })
        .await
        .map_err(|e| KilnError::internal(e.to_string()))?
    }

    async fn read_chunk(&self) -> Result<String> {
        let shared = self.port.clone();
        tokio::task::spawn_blocking(move || {
            let mut slot = Self::lock(&shared)?;
            let port = slot
                .as_mut()
                .ok_or_else(|| KilnError::device("No port is open"))?;
            let mut buf = [0u8; 1024];
            match port.read(&mut buf) {
                Ok(bytes) => Ok(String::from_utf8_lossy(&buf[..bytes]).to_string()),
                Err(e) => Err(KilnError::device(format!("Failed to read from port: {e}"))),
            }
        })
        .await
        .map_err(|e| KilnError::internal(e.to_string()))?
    }

    async fn write_chunk(&self, data: &str) -> Result<()> {
        let shared = self.port.clone();
        let data = data.as_bytes().to_vec();
        tokio::task::spawn_blocking(move || {
            let mut slot = Self::lock(&shared)?;
            let port = slot
                .as_mut()
                .ok_or_else(|| KilnError::device("No port is open"))?;
            port.write_all(&data)
                .map_err(|e| KilnError::device(format!("Failed to write to port: {e}")))
        })
        .await
        .map_err(|e| KilnError::internal(e.to_string()))?
    }

    async fn board_info(&self) -> Result<String> {
        tokio::task::spawn_blocking(|| {
            let ports = serialport::available_ports()
                .map_err(|e| KilnError::device(e.to_string()))?;
            let first = ports
                .first()
                .ok_or_else(|| KilnError::device("No ports available"))?;
            Ok(describe_port(first))
        })
        .await
        .map_err(|e| KilnError::internal(e.to_string()))?
    }
}

/// Formats the descriptive text shown in the board-info dialog.
fn describe_port(info: &serialport::SerialPortInfo) -> String {
    let mut text = String::new();
    writeln!(text, "Device Name: {}", info.port_name).ok();
    match &info.port_type {
        SerialPortType::UsbPort(usb) => {
            writeln!(text, "VID: {:04x}", usb.vid).ok();
            writeln!(text, "PID: {:04x}", usb.pid).ok();
            if let Some(product) = &usb.product {
                writeln!(text, "Product: {product}").ok();
            }
            if let Some(serial_number) = &usb.serial_number {
                writeln!(text, "Serial Number: {serial_number}").ok();
            }
        }
        SerialPortType::BluetoothPort => {
            writeln!(text, "BN: Bluetooth device").ok();
        }
        SerialPortType::PciPort | SerialPortType::Unknown => {
            writeln!(text, "BN: Unknown board").ok();
        }
    }
    text
}
