use domain::DomainError;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio_serial::{SerialPortBuilderExt, SerialPortType, SerialStream};
use tracing::{debug, info, warn};

/// Serial link configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Explicit port; auto-detected when absent
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

fn default_baud_rate() -> u32 {
    115200
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: default_baud_rate(),
        }
    }
}

/// A port reported by the operating system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortCandidate {
    pub path: String,
    pub manufacturer: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionReason {
    /// Configured explicitly
    Configured,
    /// Looks like a USB-serial bridge chip
    Detected,
    /// Nothing matched; first port in the list
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSelection {
    pub path: String,
    pub reason: SelectionReason,
}

const MANUFACTURER_HINTS: [&str; 2] = ["Silicon", "CH340"];
const PATH_HINTS: [&str; 3] = ["usbserial", "ttyUSB", "tty.usbserial"];

impl PortCandidate {
    fn looks_like_reader(&self) -> bool {
        let by_manufacturer = self
            .manufacturer
            .as_deref()
            .is_some_and(|m| MANUFACTURER_HINTS.iter().any(|hint| m.contains(hint)));
        by_manufacturer || PATH_HINTS.iter().any(|hint| self.path.contains(hint))
    }
}

/// Pick the port the reader is most likely attached to
pub fn discover_port(candidates: &[PortCandidate]) -> Result<PortSelection, DomainError> {
    if let Some(port) = candidates.iter().find(|c| c.looks_like_reader()) {
        return Ok(PortSelection {
            path: port.path.clone(),
            reason: SelectionReason::Detected,
        });
    }

    candidates
        .first()
        .map(|port| PortSelection {
            path: port.path.clone(),
            reason: SelectionReason::Fallback,
        })
        .ok_or(DomainError::PortNotFound)
}

/// Enumerate the serial ports visible to this host
pub fn list_ports() -> Result<Vec<PortCandidate>, DomainError> {
    let ports = tokio_serial::available_ports()
        .map_err(|e| DomainError::TransportError(format!("Failed to list serial ports: {}", e)))?;

    Ok(ports
        .into_iter()
        .map(|info| PortCandidate {
            manufacturer: match info.port_type {
                SerialPortType::UsbPort(usb) => usb.manufacturer,
                _ => None,
            },
            path: info.port_name,
        })
        .collect())
}

/// Resolve the port to open: the configured one, else auto-detection
pub fn select_port(config: &SerialConfig) -> Result<PortSelection, DomainError> {
    if let Some(port) = config.port.as_deref().filter(|p| !p.trim().is_empty()) {
        return Ok(PortSelection {
            path: port.trim().to_string(),
            reason: SelectionReason::Configured,
        });
    }

    let candidates = list_ports()?;
    info!(count = candidates.len(), "Serial ports available");
    for (i, port) in candidates.iter().enumerate() {
        info!(
            "  {}. {} - {}",
            i + 1,
            port.path,
            port.manufacturer.as_deref().unwrap_or("Unknown")
        );
    }

    let selection = discover_port(&candidates)?;
    match selection.reason {
        SelectionReason::Fallback => {
            warn!(port = %selection.path, "No reader detected, using first available port")
        }
        _ => info!(port = %selection.path, "Reader port detected"),
    }
    Ok(selection)
}

/// Opens the reader's serial port and feeds its lines to the bridge
pub struct SerialLineReader {
    port_name: String,
    config: SerialConfig,
}

impl SerialLineReader {
    pub fn new(port_name: impl Into<String>, config: SerialConfig) -> Self {
        Self {
            port_name: port_name.into(),
            config,
        }
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Open the port as 8N1 at the configured baud rate
    pub fn open(&self) -> Result<SerialStream, DomainError> {
        // Normalize port name for Windows (e.g., COM7 -> \\.\COM7)
        let port_name = if cfg!(target_os = "windows")
            && !self.port_name.to_uppercase().starts_with(r"\\.\")
        {
            format!(r"\\.\{}", self.port_name)
        } else {
            self.port_name.clone()
        };

        debug!(
            port = %port_name,
            baud_rate = self.config.baud_rate,
            "Opening serial port"
        );

        let stream = tokio_serial::new(&port_name, self.config.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .open_native_async()
            .map_err(|e| {
                DomainError::TransportError(format!(
                    "Failed to open serial port {}: {}. Tip: Ensure the port is not used by another application and that you have sufficient permissions.",
                    port_name, e
                ))
            })?;

        info!(port = %self.port_name, "Serial port opened");
        Ok(stream)
    }
}

/// Longest line kept from the reader; longer ones are dropped whole
pub const MAX_LINE_LENGTH: usize = 1024;

/// Forward trimmed, non-empty lines from `reader` until it ends or the
/// receiver goes away. Returns the number of lines forwarded.
///
/// A line over [`MAX_LINE_LENGTH`] bytes is discarded up to its newline, so
/// a noisy link never grows the buffer past that bound.
pub async fn forward_lines<R>(reader: R, tx: mpsc::Sender<String>) -> Result<u64, DomainError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::with_capacity(256);
    let mut overflow = false;
    let mut forwarded = 0u64;

    loop {
        let (consumed, complete) = {
            let available = reader
                .fill_buf()
                .await
                .map_err(|e| DomainError::TransportError(format!("Read error: {}", e)))?;

            if available.is_empty() {
                debug!("Serial stream reached end of input");
                if !overflow && send_line(&buffer, &tx, &mut forwarded).await.is_err() {
                    debug!("Line receiver dropped, stopping serial reader");
                }
                return Ok(forwarded);
            }

            match available.iter().position(|b| *b == b'\n') {
                Some(i) => {
                    append_bounded(&mut buffer, &available[..i], &mut overflow);
                    (i + 1, true)
                }
                None => {
                    append_bounded(&mut buffer, available, &mut overflow);
                    (available.len(), false)
                }
            }
        };
        reader.consume(consumed);

        if !complete {
            continue;
        }

        if overflow {
            warn!(max = MAX_LINE_LENGTH, "Discarded overlong serial line");
        } else if send_line(&buffer, &tx, &mut forwarded).await.is_err() {
            debug!("Line receiver dropped, stopping serial reader");
            return Ok(forwarded);
        }
        buffer.clear();
        overflow = false;
    }
}

fn append_bounded(buffer: &mut Vec<u8>, chunk: &[u8], overflow: &mut bool) {
    if *overflow {
        return;
    }
    if buffer.len() + chunk.len() > MAX_LINE_LENGTH {
        *overflow = true;
        buffer.clear();
        return;
    }
    buffer.extend_from_slice(chunk);
}

/// Send one raw line if it has content. Errs only when the receiver is gone.
async fn send_line(
    raw: &[u8],
    tx: &mpsc::Sender<String>,
    forwarded: &mut u64,
) -> Result<(), mpsc::error::SendError<String>> {
    let text = String::from_utf8_lossy(raw);
    let line = text.trim();
    if line.is_empty() {
        return Ok(());
    }
    tx.send(line.to_string()).await?;
    *forwarded += 1;
    Ok(())
}
