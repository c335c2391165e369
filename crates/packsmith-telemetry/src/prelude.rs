//! Prelude module - commonly used types for convenient import.
//!
//! Use `use packsmith_telemetry::prelude::*;` to import all essential types.

pub use crate::{LogConfig, LogFormat, LogTarget};
pub use crate::{TelemetryError, TelemetryResult};
pub use crate::setup_logging;
