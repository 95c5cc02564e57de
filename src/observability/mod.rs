//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!
//! The log level is itself configuration:
//!     ConfigurationRoot change event
//!     → log-level change handler
//!     → filter reload, no restart
//! ```
//!
//! # Design Decisions
//! - JSON output in production, pretty output in development
//! - `RUST_LOG` wins over configured levels when set

pub mod logging;

pub use logging::{init, LogLevelHandle};
