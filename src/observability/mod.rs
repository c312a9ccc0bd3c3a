//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout log lines
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Every session logs inside a span carrying its connection id
//! - Metrics are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
