//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Executors, deployer, scenario runner produce:
//!     → logging.rs (structured log events on stderr)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Terminal / log aggregation
//!     → Prometheus textfile collector (written once at exit)
//! ```

pub mod logging;
pub mod metrics;
