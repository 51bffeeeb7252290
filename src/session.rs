//! Process-wide activation guard
//!
//! A session owns two facts: whether this crate was the first to register
//! its category in the registry (the registrant), and whether some monitor
//! currently holds the single active-recorder slot. Duplicate initialization
//! of the same category in one process (e.g. two copies of this crate linked
//! through different dependency paths) leaves the later session permanently
//! unable to activate its monitors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

use crate::registry::{MetricsRegistry, global_registry};

/// Category under which filesystem metrics are grouped
pub const FS_CATEGORY: &str = "fs";

/// Registration guard plus the single active-monitor slot for one session
#[derive(Debug)]
pub struct Session {
    category: String,
    registrant: bool,
    active: AtomicBool,
}

impl Session {
    /// Initialize a session against a registry
    ///
    /// The first session to initialize for a category becomes its registrant;
    /// monitors of any later session for the same category can never
    /// activate.
    pub fn initialize(registry: &MetricsRegistry, category: &str) -> Self {
        let registrant = if registry.has_monitor(category) {
            false
        } else {
            registry.register_monitor(category)
        };
        Self {
            category: category.to_string(),
            registrant,
            active: AtomicBool::new(false),
        }
    }

    /// Category this session guards
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Whether this session performed the category registration
    pub fn is_registrant(&self) -> bool {
        self.registrant
    }

    /// Whether some monitor currently holds the active slot
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Claim the active slot
    ///
    /// Succeeds only for the registrant session and only while no monitor
    /// holds the slot.
    pub fn try_activate(&self) -> bool {
        self.registrant
            && self
                .active
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
    }

    /// Release the active slot so a later start may claim it
    pub fn release(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Clear activation state; intended for test isolation
    pub fn reset(&self) {
        self.release();
    }
}

/// Process-global session, initialized on first use
static GLOBAL_SESSION: LazyLock<Arc<Session>> =
    LazyLock::new(|| Arc::new(Session::initialize(&global_registry(), FS_CATEGORY)));

/// The process-global session for the filesystem category
pub fn global_session() -> Arc<Session> {
    GLOBAL_SESSION.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_session_is_registrant() {
        let registry = MetricsRegistry::new();

        let first = Session::initialize(&registry, FS_CATEGORY);
        let second = Session::initialize(&registry, FS_CATEGORY);

        assert!(first.is_registrant());
        assert!(!second.is_registrant());
    }

    #[test]
    fn test_activation_is_exclusive() {
        let registry = MetricsRegistry::new();
        let session = Session::initialize(&registry, FS_CATEGORY);

        assert!(session.try_activate());
        assert!(session.is_active());
        assert!(!session.try_activate());

        session.release();
        assert!(!session.is_active());
        assert!(session.try_activate());
    }

    #[test]
    fn test_non_registrant_cannot_activate() {
        let registry = MetricsRegistry::new();
        let _first = Session::initialize(&registry, FS_CATEGORY);
        let second = Session::initialize(&registry, FS_CATEGORY);

        assert!(!second.try_activate());
        assert!(!second.is_active());
    }

    #[test]
    fn test_reset_clears_activation() {
        let registry = MetricsRegistry::new();
        let session = Session::initialize(&registry, FS_CATEGORY);

        assert!(session.try_activate());
        session.reset();
        assert!(!session.is_active());
    }

    #[test]
    fn test_sessions_for_distinct_categories_are_independent() {
        let registry = MetricsRegistry::new();

        let fs = Session::initialize(&registry, "fs");
        let net = Session::initialize(&registry, "net");

        assert!(fs.is_registrant());
        assert!(net.is_registrant());
        assert!(fs.try_activate());
        assert!(net.try_activate());
    }
}
