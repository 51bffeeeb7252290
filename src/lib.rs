//! Transparent filesystem operation metrics
//!
//! This crate measures the cost of filesystem operations without changing how
//! callers invoke them: code routes its filesystem work through a shared
//! [`facility::FsFacility`], and an [`monitor::FsMonitor`] transparently swaps
//! measuring shims over the facility's operations, attributing call counts and
//! elapsed time to a shared [`registry::MetricsRegistry`]. At most one monitor
//! records per session; duplicate instances degrade to idle with a warning so
//! operations are never double-counted.

pub mod callsite;
pub mod error;
pub mod facility;
pub mod metric;
pub mod monitor;
pub mod registry;
pub mod session;

// Re-export commonly used types
pub use callsite::CallSite;
pub use error::{MonitorError, MonitorResult};
pub use facility::{
    FileStat, FsFacility, FsOperation, OpCall, OpError, OpOutput, global_facility,
};
pub use metric::{MetricSnapshot, OpMetric};
pub use monitor::{FsMonitor, MonitorState};
pub use registry::{CategorySnapshot, CategoryStats, MetricsRegistry, global_registry};
pub use session::{FS_CATEGORY, Session, global_session};
