//! Packsmith Telemetry - structured logging for the packsmith CLI.
//!
//! Diagnostics are written to stderr (or a rolling log file) so that the
//! progress lines printed on stdout stay clean.
//!
//! # Example
//!
//! ```rust,no_run
//! use packsmith_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), packsmith_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("reqwest=warn");
//!
//! setup_logging(&config)?;
//! tracing::debug!("logging ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LOG_DIR_ENV, LOG_ENV, LogConfig, LogFormat, LogTarget, setup_logging};
