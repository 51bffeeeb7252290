//! The monitor: exclusivity, interception, measurement
//!
//! A monitor attaches measuring shims over the facility's operations and
//! records per-operation counts and elapsed time into the registry. Only one
//! monitor may record per session; any other instance that tries to start
//! degrades to permanently idle with a logged warning rather than an error,
//! so a duplicate installation never double-counts.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use tracing::{debug, warn};

use crate::callsite::CallSite;
use crate::error::MonitorError;
use crate::facility::{FsFacility, FsOperation, OpCall, OpError, OpOutput, global_facility, names};
use crate::metric::MeasureGuard;
use crate::registry::{MetricsRegistry, global_registry};
use crate::session::{Session, global_session};

/// Activation state of a monitor instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Not recording; wrapped operations pass straight through
    Idle,
    /// Recording; wrapped operations are measured
    Active,
}

const STATE_IDLE: u8 = 0;
const STATE_ACTIVE: u8 = 1;

/// Monitor internals shared with every installed shim
#[derive(Debug)]
struct MonitorCore {
    state: AtomicU8,
    capture_call_sites: AtomicBool,
    category: String,
    registry: Arc<MetricsRegistry>,
}

impl MonitorCore {
    fn state(&self) -> MonitorState {
        match self.state.load(Ordering::SeqCst) {
            STATE_ACTIVE => MonitorState::Active,
            _ => MonitorState::Idle,
        }
    }

    /// Consulted on every invocation of every wrapped operation
    fn should_measure(&self) -> bool {
        self.state.load(Ordering::SeqCst) == STATE_ACTIVE
    }

    /// Measure one invocation of `original` under the operation's metric
    ///
    /// The metric's stop runs on every exit path; the original's result or
    /// failure is passed through unchanged.
    fn measure(
        &self,
        name: &str,
        original: &Arc<dyn FsOperation>,
        call: &OpCall,
        site: Option<CallSite>,
    ) -> Result<OpOutput, OpError> {
        if !self.should_measure() {
            return Err(MonitorError::NotActive.into());
        }

        let stats = self.registry.stats_for(&self.category);
        let metric = stats.metric(name);

        metric.start(site);
        let _guard = MeasureGuard::new(&metric);
        original.invoke(call)
    }
}

/// Shim installed in place of an original operation for one attach cycle
struct MeasuredOp {
    name: String,
    original: Arc<dyn FsOperation>,
    core: Arc<MonitorCore>,
}

impl FsOperation for MeasuredOp {
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, call: &OpCall) -> Result<OpOutput, OpError> {
        if self.core.should_measure() {
            let site = if self.core.capture_call_sites.load(Ordering::SeqCst) {
                CallSite::capture()
            } else {
                None
            };
            self.core.measure(&self.name, &self.original, call, site)
        } else {
            self.original.invoke(call)
        }
    }

    fn restore_target(&self) -> Option<Arc<dyn FsOperation>> {
        Some(self.original.clone())
    }
}

/// Records call counts and elapsed time for facility operations
pub struct FsMonitor {
    core: Arc<MonitorCore>,
    session: Arc<Session>,
    facility: Arc<FsFacility>,
    blacklist: HashSet<String>,
}

impl FsMonitor {
    /// Monitor over the process-global facility, registry and session
    pub fn new() -> Self {
        Self::with_collaborators(global_facility(), global_registry(), global_session())
    }

    /// Monitor over explicit collaborators, for embedding and tests
    pub fn with_collaborators(
        facility: Arc<FsFacility>,
        registry: Arc<MetricsRegistry>,
        session: Arc<Session>,
    ) -> Self {
        Self {
            core: Arc::new(MonitorCore {
                state: AtomicU8::new(STATE_IDLE),
                capture_call_sites: AtomicBool::new(true),
                category: session.category().to_string(),
                registry,
            }),
            session,
            facility,
            blacklist: default_blacklist(),
        }
    }

    /// Enable or disable per-invocation call-site capture
    pub fn set_capture_call_sites(&self, capture: bool) {
        self.core.capture_call_sites.store(capture, Ordering::SeqCst);
    }

    /// Operation names excluded from interception
    pub fn blacklist(&self) -> &HashSet<String> {
        &self.blacklist
    }

    /// Exclude an operation name from interception
    ///
    /// Takes effect at the next start.
    pub fn blacklist_operation(&mut self, name: impl Into<String>) {
        self.blacklist.insert(name.into());
    }

    /// Current activation state
    pub fn state(&self) -> MonitorState {
        self.core.state()
    }

    /// Whether invocations are currently measured
    pub fn should_measure(&self) -> bool {
        self.core.should_measure()
    }

    /// Begin recording
    ///
    /// The first start on the registrant session claims the session's single
    /// active slot and attaches instrumentation. Any other start leaves the
    /// instance idle and logs a warning; starting an already-active instance
    /// is a no-op.
    pub fn start(&self) {
        if self.should_measure() {
            return;
        }

        if self.session.try_activate() {
            self.core.state.store(STATE_ACTIVE, Ordering::SeqCst);
            self.attach();
        } else {
            warn!(
                "Multiple monitor instances have been created in the same session. \
                 Since this can cause filesystem operations to be counted multiple \
                 times, this instance has been disabled."
            );
        }
    }

    /// Stop recording and restore the original operations
    ///
    /// Releases the session slot so a later start, possibly by a different
    /// instance, may claim it. A no-op while idle.
    pub fn stop(&self) {
        if !self.should_measure() {
            return;
        }

        self.core.state.store(STATE_IDLE, Ordering::SeqCst);
        self.detach();
        self.session.release();
    }

    fn attach(&self) {
        let mut wrapped = 0usize;
        for (name, original) in self.facility.entries() {
            if self.blacklist.contains(&name) {
                continue;
            }
            let shim = MeasuredOp {
                name: name.clone(),
                original,
                core: self.core.clone(),
            };
            self.facility.replace(&name, Arc::new(shim));
            wrapped += 1;
        }
        debug!(category = %self.core.category, wrapped, "installed measuring shims");
    }

    fn detach(&self) {
        let mut restored = 0usize;
        for (name, op) in self.facility.entries() {
            if let Some(original) = op.restore_target() {
                self.facility.replace(&name, original);
                restored += 1;
            }
        }
        debug!(category = %self.core.category, restored, "restored original operations");
    }
}

impl Default for FsMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FsMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Handle-producing operation names that are never wrapped
fn default_blacklist() -> HashSet<String> {
    [names::OPEN, names::CREATE, names::WATCH]
        .into_iter()
        .map(String::from)
        .collect()
}
