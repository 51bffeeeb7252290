//! Shared metrics registry
//!
//! The registry groups metrics by category (all filesystem operations live
//! under one category) and hands out the mutable stats table a monitor
//! records into. Category tables are created lazily and keep a stable
//! identity for the lifetime of the session.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::metric::{MetricSnapshot, OpMetric};

/// Registry of metric categories shared across a session
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    monitors: Mutex<HashSet<String>>,
    categories: Mutex<HashMap<String, Arc<CategoryStats>>>,
}

impl MetricsRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a monitor has been registered for the category
    pub fn has_monitor(&self, category: &str) -> bool {
        self.monitors.lock().contains(category)
    }

    /// Register a monitor for the category
    ///
    /// Idempotent per category per session; returns true when this call was
    /// the one that performed the registration.
    pub fn register_monitor(&self, category: &str) -> bool {
        self.monitors.lock().insert(category.to_string())
    }

    /// Mutable stats table for the category, created lazily
    ///
    /// The returned table keeps a stable identity across calls within a
    /// session.
    pub fn stats_for(&self, category: &str) -> Arc<CategoryStats> {
        let mut categories = self.categories.lock();
        categories
            .entry(category.to_string())
            .or_insert_with(|| Arc::new(CategoryStats::new(category)))
            .clone()
    }

    /// Snapshot of every category
    pub fn snapshot(&self) -> BTreeMap<String, CategorySnapshot> {
        let categories = self.categories.lock();
        categories
            .iter()
            .map(|(name, stats)| (name.clone(), stats.snapshot()))
            .collect()
    }
}

/// Per-category table of operation metrics
#[derive(Debug)]
pub struct CategoryStats {
    name: String,
    created_at: DateTime<Utc>,
    metrics: Mutex<HashMap<String, Arc<OpMetric>>>,
}

impl CategoryStats {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            created_at: Utc::now(),
            metrics: Mutex::new(HashMap::new()),
        }
    }

    /// Category name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// When this category table was created
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Metric for the operation, created on first use
    pub fn metric(&self, operation: &str) -> Arc<OpMetric> {
        self.metrics
            .lock()
            .entry(operation.to_string())
            .or_insert_with(|| Arc::new(OpMetric::new()))
            .clone()
    }

    /// Metric for the operation, if one has been recorded
    pub fn get(&self, operation: &str) -> Option<Arc<OpMetric>> {
        self.metrics.lock().get(operation).cloned()
    }

    /// Names of all operations with recorded metrics
    pub fn operation_names(&self) -> Vec<String> {
        self.metrics.lock().keys().cloned().collect()
    }

    /// Snapshot of every operation metric
    pub fn snapshot(&self) -> CategorySnapshot {
        let metrics = self.metrics.lock();
        CategorySnapshot {
            category: self.name.clone(),
            created_at: self.created_at,
            taken_at: Utc::now(),
            operations: metrics
                .iter()
                .map(|(name, metric)| (name.clone(), metric.snapshot()))
                .collect(),
        }
    }

    /// Human-readable one-line summary
    pub fn summary(&self) -> String {
        let snapshot = self.snapshot();
        let calls: u64 = snapshot.operations.values().map(|m| m.count).sum();
        let total_ns: u64 = snapshot.operations.values().map(|m| m.time_ns).sum();
        format!(
            "{}: {} operations, {} calls, {:.3}ms total",
            self.name,
            snapshot.operations.len(),
            calls,
            total_ns as f64 / 1e6,
        )
    }
}

/// Snapshot of a category at a point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySnapshot {
    /// Category name
    pub category: String,
    /// When the category table was created
    pub created_at: DateTime<Utc>,
    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,
    /// Snapshot per operation name, sorted by name
    pub operations: BTreeMap<String, MetricSnapshot>,
}

/// Process-global registry shared by every monitor in the session
static GLOBAL_REGISTRY: LazyLock<Arc<MetricsRegistry>> =
    LazyLock::new(|| Arc::new(MetricsRegistry::new()));

/// The session-global metrics registry
pub fn global_registry() -> Arc<MetricsRegistry> {
    GLOBAL_REGISTRY.clone()
}
