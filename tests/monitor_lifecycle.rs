//! End-to-end behaviour of the power monitor under a paused Tokio clock.

use std::time::Duration;

use tokio::sync::broadcast;
use wattphase_monitor::config::Config;
use wattphase_monitor::controller::{Action, MonitorEvent, PowerMonitor, StopReason, Transition};
use wattphase_monitor::domain::{FaultType, StatusLevel};
use wattphase_monitor::simulation::SignalGenerator;

fn config(seed_history_hours: u32) -> Config {
    let mut cfg = Config::default();
    cfg.monitor.seed_history_hours = seed_history_hours;
    cfg.monitor.random_seed = Some(2024);
    cfg
}

fn monitor(seed_history_hours: u32) -> PowerMonitor {
    PowerMonitor::create(
        &config(seed_history_hours),
        Box::new(SignalGenerator::seeded(7)),
    )
    .expect("monitor starts")
}

fn drain(rx: &mut broadcast::Receiver<MonitorEvent>) -> Vec<MonitorEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn stop_reasons(events: &[MonitorEvent]) -> Vec<StopReason> {
    events
        .iter()
        .filter_map(|e| match e {
            MonitorEvent::SimulationStopped { reason } => Some(*reason),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn tick_loop_ingests_every_two_seconds() {
    let monitor = monitor(0);
    assert!(monitor.snapshot().current_reading.is_none());

    tokio::time::sleep(Duration::from_millis(2_100)).await;
    assert_eq!(monitor.snapshot().history.len(), 1);

    tokio::time::sleep(Duration::from_secs(8)).await;
    let snap = monitor.snapshot();
    assert_eq!(snap.history.len(), 5);
    assert_eq!(snap.current_reading, snap.history.last().copied());
    assert_eq!(snap.status.status, StatusLevel::Normal);
    assert!(snap.alerts.is_empty());

    monitor.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn create_backfills_bounded_history() {
    let monitor = monitor(24);
    let history = monitor.snapshot().history;

    assert_eq!(history.len(), 288);
    for pair in history.windows(2) {
        assert_eq!(
            pair[1].timestamp - pair[0].timestamp,
            chrono::Duration::minutes(5)
        );
    }

    monitor.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn simulation_auto_stops_after_thirty_seconds() {
    let monitor = monitor(0);
    let mut rx = monitor.subscribe();

    monitor.start_simulation(FaultType::PowerLoss).unwrap();
    tokio::time::sleep(Duration::from_millis(2_100)).await;

    let snap = monitor.snapshot();
    assert!(snap.simulation_active);
    assert_eq!(snap.status.status, StatusLevel::PowerLoss);
    assert_eq!(snap.alerts.len(), 1);

    tokio::time::sleep(Duration::from_secs(28)).await;
    assert!(!monitor.snapshot().simulation_active);

    // Readings recover once injection stops
    tokio::time::sleep(Duration::from_secs(2)).await;
    let snap = monitor.snapshot();
    assert_eq!(snap.status.status, StatusLevel::Normal);
    // Alert still open, so no second alert was raised
    assert_eq!(snap.alerts.len(), 1);

    assert_eq!(stop_reasons(&drain(&mut rx)), vec![StopReason::Timeout]);
    monitor.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn manual_stop_disarms_auto_stop() {
    let monitor = monitor(0);
    let mut rx = monitor.subscribe();

    monitor.start_simulation(FaultType::VoltageDrop).unwrap();
    assert_eq!(monitor.stop_simulation().unwrap(), Transition::SimulationStopped);

    tokio::time::sleep(Duration::from_secs(31)).await;
    let snap = monitor.snapshot();
    assert!(!snap.simulation_active);
    assert_eq!(snap.fault_type, None);

    let events = drain(&mut rx);
    assert_eq!(stop_reasons(&events), vec![StopReason::Manual]);
    assert!(events
        .iter()
        .any(|e| matches!(e, MonitorEvent::SimulationStarted { fault: FaultType::VoltageDrop })));

    monitor.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn restart_supersedes_previous_timer() {
    let monitor = monitor(0);
    let mut rx = monitor.subscribe();

    monitor.dispatch(Action::StartSimulation(FaultType::VoltageDrop)).unwrap();
    tokio::time::sleep(Duration::from_secs(20)).await;
    monitor.dispatch(Action::StartSimulation(FaultType::PowerLoss)).unwrap();

    tokio::time::sleep(Duration::from_secs(15)).await;
    let snap = monitor.snapshot();
    assert!(snap.simulation_active);
    assert_eq!(snap.fault_type, Some(FaultType::PowerLoss));

    tokio::time::sleep(Duration::from_secs(16)).await;
    assert!(!monitor.snapshot().simulation_active);

    assert_eq!(stop_reasons(&drain(&mut rx)), vec![StopReason::Timeout]);
    monitor.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn acknowledge_and_clear_through_monitor() {
    let monitor = monitor(0);

    monitor.start_simulation(FaultType::PowerLoss).unwrap();
    tokio::time::sleep(Duration::from_millis(4_100)).await;
    let alerts = monitor.snapshot().alerts;
    assert_eq!(alerts.len(), 1);

    monitor.acknowledge_alert(alerts[0].id).unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    let alerts = monitor.snapshot().alerts;
    assert_eq!(alerts.len(), 2);
    assert!(alerts[0].acknowledged);
    assert!(!alerts[1].acknowledged);

    monitor.clear_alerts().unwrap();
    let snap = monitor.snapshot();
    assert!(snap.alerts.is_empty());
    assert_eq!(snap.history.len(), 3);

    monitor.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn dispose_halts_ticks_and_timers() {
    let monitor = monitor(0);
    let mut rx = monitor.subscribe();
    monitor.start_simulation(FaultType::PowerLoss).unwrap();

    tokio::time::sleep(Duration::from_millis(2_100)).await;
    monitor.dispose().await;
    let frozen = monitor.snapshot();
    assert!(!frozen.simulation_active);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(monitor.snapshot().history.len(), frozen.history.len());
    assert_eq!(stop_reasons(&drain(&mut rx)), vec![StopReason::Disposed]);
    assert!(monitor.dispatch(Action::ClearAlerts).is_err());
}
