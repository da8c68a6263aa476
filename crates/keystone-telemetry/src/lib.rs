//! Logging setup for the Keystone extension host.
//!
//! Installs a single global `tracing` subscriber built from a [`LogConfig`]:
//! a base level, optional per-target directives, any `RUST_LOG` directives
//! on top, and one of four line formats written to stdout, stderr or a
//! daily-rotated file.
//!
//! # Example
//!
//! ```rust,no_run
//! use keystone_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), keystone_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Pretty)
//!     .with_directive("keystone_plugin=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("Host started");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
