use serde::{Deserialize, Serialize};

use crate::domain::{Alert, AlertId, FaultType, JobStatus, PowerStatus, Reading};

/// Why fault injection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Manual,
    Timeout,
    Disposed,
}

/// Broadcast to subscribers after each state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MonitorEvent {
    ReadingApplied { reading: Reading, status: PowerStatus },
    AlertRaised { alert: Alert },
    AlertAcknowledged { id: AlertId },
    AlertsCleared,
    SimulationStarted { fault: FaultType },
    SimulationStopped { reason: StopReason },
    JobStatusChanged { ticket_id: String, status: JobStatus },
}
