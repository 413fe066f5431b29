//! Alert → electrician selection → job confirmation timeline.

use std::time::Duration;

use wattphase_monitor::config::Config;
use wattphase_monitor::controller::{MonitorEvent, PowerMonitor};
use wattphase_monitor::domain::{
    available_by_eta, emergency_site, mock_electricians, FaultType, JobStatus, Severity,
};
use wattphase_monitor::simulation::SignalGenerator;

#[tokio::test(start_paused = true)]
async fn power_loss_alert_leads_to_completed_job() {
    let mut cfg = Config::default();
    cfg.monitor.seed_history_hours = 0;
    cfg.dispatch.completed_after_ms = 15_000;
    let monitor = PowerMonitor::create(&cfg, Box::new(SignalGenerator::seeded(99))).unwrap();
    let mut rx = monitor.subscribe();

    monitor.start_simulation(FaultType::PowerLoss).unwrap();
    tokio::time::sleep(Duration::from_millis(2_100)).await;

    let alert = monitor.snapshot().alerts.remove(0);
    assert_eq!(alert.severity, Severity::High);

    let nearest = available_by_eta(&mock_electricians()).remove(0);
    assert_eq!(nearest.eta_minutes, 8);

    let job = monitor
        .dispatch_job(nearest.clone(), "Power Loss", alert.message.clone())
        .unwrap();
    monitor.acknowledge_alert(alert.id).unwrap();

    let ticket = job.ticket();
    assert_eq!(ticket.priority, Severity::High);
    assert_eq!(ticket.status, JobStatus::Created);
    assert_eq!(ticket.assigned_electrician.as_ref(), Some(&nearest));
    assert_eq!(ticket.site, emergency_site());
    assert_eq!(monitor.snapshot().selected_electrician, Some(nearest));

    assert!(job.wait_for(JobStatus::Completed).await);

    let statuses: Vec<JobStatus> = std::iter::from_fn(|| rx.try_recv().ok())
        .filter_map(|e| match e {
            MonitorEvent::JobStatusChanged { status, .. } => Some(status),
            _ => None,
        })
        .collect();
    assert_eq!(
        statuses,
        vec![
            JobStatus::Dispatched,
            JobStatus::OnSite,
            JobStatus::InProgress,
            JobStatus::Completed
        ]
    );

    monitor.clear_selected_electrician().unwrap();
    assert!(monitor.snapshot().selected_electrician.is_none());
    monitor.dispose().await;
}
