mod serial;

pub use serial::{
    PortCandidate, PortSelection, SelectionReason, SerialConfig, SerialLineReader,
    discover_port, forward_lines, list_ports, select_port,
};
