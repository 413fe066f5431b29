//! Drives a dispatch job through its scripted status timeline.

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::events::MonitorEvent;
use crate::domain::{JobStatus, JobTicket, JobTimeline};

pub struct JobTracker {
    ticket: JobTicket,
    status_rx: watch::Receiver<JobStatus>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl JobTracker {
    /// Start advancing `ticket` along `timeline`. Must be called within a Tokio runtime.
    pub fn spawn(
        ticket: JobTicket,
        timeline: &JobTimeline,
        cancel: CancellationToken,
        events: Option<broadcast::Sender<MonitorEvent>>,
    ) -> Self {
        let (status_tx, status_rx) = watch::channel(ticket.status);
        let stages: Vec<_> = timeline
            .stages()
            .filter(|(status, _)| *status > ticket.status)
            .collect();
        let ticket_id = ticket.id.clone();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let started = Instant::now();
            for (status, offset) in stages {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!(ticket_id = %ticket_id, "job timeline cancelled");
                        return;
                    }
                    _ = sleep_until(started + offset) => {
                        status_tx.send_replace(status);
                        info!(
                            ticket_id = %ticket_id,
                            status = %status,
                            label = status.label(),
                            progress = status.progress_percent(),
                            "job status advanced"
                        );
                        if let Some(events) = &events {
                            // No subscribers is fine
                            let _ = events.send(MonitorEvent::JobStatusChanged {
                                ticket_id: ticket_id.clone(),
                                status,
                            });
                        }
                    }
                }
            }
        });

        Self {
            ticket,
            status_rx,
            cancel,
            handle,
        }
    }

    pub fn status(&self) -> JobStatus {
        *self.status_rx.borrow()
    }

    /// Ticket with its current status
    pub fn ticket(&self) -> JobTicket {
        JobTicket {
            status: self.status(),
            ..self.ticket.clone()
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<JobStatus> {
        self.status_rx.clone()
    }

    /// Wait until the job reaches `status`; false if the timeline ended first
    pub async fn wait_for(&self, status: JobStatus) -> bool {
        let mut rx = self.status_rx.clone();
        let reached = rx.wait_for(|s| *s >= status).await.is_ok();
        reached
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for JobTracker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{emergency_site, Severity};
    use rand::{rngs::StdRng, SeedableRng};
    use std::time::Duration;

    fn ticket() -> JobTicket {
        let mut rng = StdRng::seed_from_u64(4);
        JobTicket::open(
            &mut rng,
            chrono::Utc::now(),
            "Power Loss - Phase 2",
            "Critical power loss detected on Phase 2",
            Severity::High,
            None,
            emergency_site(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeline_advances() {
        let (tx, mut rx) = broadcast::channel(16);
        let tracker = JobTracker::spawn(
            ticket(),
            &JobTimeline::default(),
            CancellationToken::new(),
            Some(tx),
        );
        assert_eq!(tracker.status(), JobStatus::Created);

        tokio::time::sleep(Duration::from_millis(3_100)).await;
        assert_eq!(tracker.status(), JobStatus::Dispatched);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(tracker.status(), JobStatus::OnSite);

        assert!(tracker.wait_for(JobStatus::Completed).await);
        assert_eq!(tracker.ticket().status, JobStatus::Completed);

        let mut seen = Vec::new();
        while let Ok(MonitorEvent::JobStatusChanged { status, .. }) = rx.try_recv() {
            seen.push(status);
        }
        assert_eq!(
            seen,
            vec![
                JobStatus::Dispatched,
                JobStatus::OnSite,
                JobStatus::InProgress,
                JobStatus::Completed
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_freezes_status() {
        let tracker = JobTracker::spawn(
            ticket(),
            &JobTimeline::default(),
            CancellationToken::new(),
            None,
        );
        tokio::time::sleep(Duration::from_secs(4)).await;
        tracker.cancel();

        assert!(!tracker.wait_for(JobStatus::Completed).await);
        assert_eq!(tracker.status(), JobStatus::Dispatched);
        assert!(tracker.is_finished());
    }
}
