//! Logging setup.
//!
//! The engine only emits through the `log` facade. Hosts that don't install
//! their own logger can call [`init_logging`] once at startup.

mod init;

pub use init::{init_logging, LoggingConfig};
