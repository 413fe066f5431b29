use anyhow::Result;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use wattphase_monitor::{config, controller, domain, simulation, telemetry};

use config::Config;
use controller::{JobTracker, MonitorEvent, PowerMonitor};
use domain::{available_by_eta, mock_electricians, Severity};
use simulation::SignalGenerator;
use telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cfg = Config::load()?;
    init_tracing(cfg.logging.format);

    // Live feed must not replay the backfill sequence
    let live_seed = cfg.monitor.random_seed.map(|seed| seed.wrapping_add(1));
    let monitor = PowerMonitor::create(&cfg, Box::new(SignalGenerator::new(live_seed)))?;

    if let Some(fault) = cfg.simulation.demo_fault {
        let monitor = monitor.clone();
        let delay = std::time::Duration::from_secs(cfg.simulation.demo_start_after_seconds);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = monitor.start_simulation(fault) {
                warn!(error = %e, "demo fault not started");
            }
        });
    }

    let reporter = tokio::spawn(report_events(monitor.clone()));

    info!(
        tick_seconds = cfg.monitor.tick_seconds,
        demo_fault = ?cfg.simulation.demo_fault,
        "starting Wattphase monitor"
    );

    telemetry::shutdown_signal().await;
    monitor.dispose().await;
    reporter.abort();

    warn!("shutdown complete");
    Ok(())
}

/// Log state changes and walk high-severity alerts through dispatch
async fn report_events(monitor: PowerMonitor) {
    let mut events = monitor.subscribe();
    let mut jobs: Vec<JobTracker> = Vec::new();

    loop {
        match events.recv().await {
            Ok(MonitorEvent::ReadingApplied { reading, status }) => info!(
                l1_v = reading.voltage.l1_v,
                l2_v = reading.voltage.l2_v,
                l3_v = reading.voltage.l3_v,
                frequency_hz = reading.frequency_hz,
                frequency_deviation_hz = reading.frequency_deviation_hz(),
                status = %status.status,
                "reading"
            ),
            Ok(MonitorEvent::AlertRaised { alert }) if alert.severity == Severity::High => {
                let Some(electrician) = available_by_eta(&mock_electricians()).into_iter().next()
                else {
                    warn!(alert_id = %alert.id, "no electrician available");
                    continue;
                };
                info!(
                    alert_id = %alert.id,
                    electrician = %electrician.id,
                    eta_minutes = electrician.eta_minutes,
                    "dispatching electrician"
                );
                let issue = alert.alert_type.to_string();
                match monitor.dispatch_job(electrician, issue, alert.message.clone()) {
                    Ok(job) => jobs.push(job),
                    Err(e) => warn!(error = %e, "dispatch failed"),
                }
                if let Err(e) = monitor.acknowledge_alert(alert.id) {
                    warn!(error = %e, "acknowledge failed");
                }
                jobs.retain(|job| !job.is_finished());
            }
            Ok(event) => info!(?event, "monitor event"),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "event stream lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}
