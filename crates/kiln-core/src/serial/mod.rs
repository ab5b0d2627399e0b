//! Serial session domain module.
//!
//! - `framing`: the pure line-mode framing rule
//! - `session`: the connection state value (`SerialSession`)
//! - `manager`: connect/disconnect/read/write orchestration and auto-poll
//!   scheduling (`SerialManager`)

mod framing;
mod manager;
mod session;

pub use framing::frame_lines;
pub use manager::SerialManager;
pub use session::{ConnectionStatus, SerialSession};
