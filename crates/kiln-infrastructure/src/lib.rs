//! Concrete gateway implementations for the Kiln session core.
//!
//! - [`TokioFsGateway`]: workspace file access over `tokio::fs`
//! - [`SerialPortGateway`]: device access over the `serialport` crate
//! - [`CargoToolchainGateway`]: build/run over `cargo` subprocesses
//! - [`ConfigService`]: cached loading of `config.toml`

mod config_service;
mod fs_gateway;
mod serial_gateway;
mod toolchain_gateway;

pub use config_service::ConfigService;
pub use fs_gateway::TokioFsGateway;
pub use serial_gateway::SerialPortGateway;
pub use toolchain_gateway::CargoToolchainGateway;
