//! Lifecycle and exclusivity coverage for the monitor

use std::sync::Arc;

use fsmetrics::facility::{FsFacility, names};
use fsmetrics::monitor::{FsMonitor, MonitorState};
use fsmetrics::registry::MetricsRegistry;
use fsmetrics::session::{FS_CATEGORY, Session};
use serial_test::serial;
use tempfile::TempDir;

fn monitor_parts() -> (Arc<FsFacility>, Arc<MetricsRegistry>, Arc<Session>) {
    let registry = Arc::new(MetricsRegistry::new());
    let session = Arc::new(Session::initialize(&registry, FS_CATEGORY));
    let facility = Arc::new(FsFacility::with_builtin_ops());
    (facility, registry, session)
}

#[test]
fn only_one_active_instance_at_a_time() {
    let (facility, registry, session) = monitor_parts();
    let monitor0 =
        FsMonitor::with_collaborators(facility.clone(), registry.clone(), session.clone());
    let monitor1 = FsMonitor::with_collaborators(facility, registry, session);

    monitor0.start();
    monitor1.start();

    assert_eq!(monitor0.state(), MonitorState::Active);
    assert_eq!(monitor1.state(), MonitorState::Idle);

    monitor0.stop();

    monitor1.start();
    monitor0.start();

    assert_eq!(monitor0.state(), MonitorState::Idle);
    assert_eq!(monitor1.state(), MonitorState::Active);
}

#[test]
fn stopping_frees_the_slot_for_the_next_starter() {
    let (facility, registry, session) = monitor_parts();
    let monitor0 =
        FsMonitor::with_collaborators(facility.clone(), registry.clone(), session.clone());
    let monitor1 = FsMonitor::with_collaborators(facility, registry, session.clone());

    monitor0.start();
    monitor0.stop();
    assert!(!session.is_active());

    monitor1.start();
    assert_eq!(monitor1.state(), MonitorState::Active);
    monitor1.stop();

    monitor0.start();
    assert_eq!(monitor0.state(), MonitorState::Active);
}

#[test]
fn stop_while_idle_is_a_no_op() {
    let (facility, registry, session) = monitor_parts();
    let monitor = FsMonitor::with_collaborators(facility, registry, session.clone());

    monitor.stop();
    assert_eq!(monitor.state(), MonitorState::Idle);
    assert!(!session.is_active());
}

#[test]
fn monitors_of_a_non_registrant_session_never_activate() {
    let registry = Arc::new(MetricsRegistry::new());
    let first = Arc::new(Session::initialize(&registry, FS_CATEGORY));
    let second = Arc::new(Session::initialize(&registry, FS_CATEGORY));
    assert!(first.is_registrant());
    assert!(!second.is_registrant());

    let facility = Arc::new(FsFacility::with_builtin_ops());
    let monitor = FsMonitor::with_collaborators(facility, registry, second);

    monitor.start();
    assert_eq!(monitor.state(), MonitorState::Idle);

    // The slot was never free for the registrant either; prove it still is.
    assert!(first.try_activate());
}

#[test]
#[serial]
fn global_monitor_round_trip() {
    let monitor = FsMonitor::new();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("global.txt");
    let facility = fsmetrics::global_facility();

    monitor.start();
    assert!(monitor.should_measure());

    facility.write(&path, b"ping".to_vec()).unwrap();
    assert_eq!(facility.read(&path).unwrap(), b"ping");

    let stats = fsmetrics::global_registry().stats_for(FS_CATEGORY);
    assert!(stats.get(names::READ).is_some());
    assert!(stats.get(names::WRITE).is_some());

    monitor.stop();
    assert_eq!(monitor.state(), MonitorState::Idle);
}

#[test]
#[serial]
fn global_duplicate_instance_stays_idle() {
    let first = FsMonitor::new();
    let second = FsMonitor::new();

    first.start();
    second.start();

    assert!(first.should_measure());
    assert!(!second.should_measure());

    first.stop();
}
