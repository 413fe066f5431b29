//! # Power State Store
//!
//! Owns the latest reading, the bounded history, the derived status, the
//! alert list, the fault-injection toggle and the electrician selected for
//! dispatch. Every mutation goes through [`PowerStore::apply`].
//!
//! Alert invariant: at most one unacknowledged alert exists at any time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info};

use crate::domain::{Alert, AlertId, Electrician, FaultType, PowerStatus, Reading};
use crate::simulation::classify_status;

/// 24 hours of readings at 5-minute spacing
pub const DEFAULT_HISTORY_CAPACITY: usize = 288;

/// State transitions accepted by the store
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    NewReading(Reading),
    /// Replace history wholesale (startup backfill)
    SeedHistory(Vec<Reading>),
    /// Append an externally built alert; rejected while another is open
    AddAlert(Alert),
    AcknowledgeAlert(AlertId),
    StartSimulation(FaultType),
    StopSimulation,
    ClearAlerts,
    SelectElectrician(Electrician),
    ClearSelectedElectrician,
}

/// Fault-injection toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "fault", rename_all = "snake_case")]
pub enum SimulationToggle {
    #[default]
    Idle,
    Simulating(FaultType),
}

impl SimulationToggle {
    pub fn is_active(&self) -> bool {
        matches!(self, SimulationToggle::Simulating(_))
    }

    pub fn fault(&self) -> Option<FaultType> {
        match self {
            SimulationToggle::Idle => None,
            SimulationToggle::Simulating(fault) => Some(*fault),
        }
    }
}

/// Read-only view handed to consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerSnapshot {
    pub current_reading: Option<Reading>,
    pub history: Vec<Reading>,
    pub status: PowerStatus,
    pub alerts: Vec<Alert>,
    pub simulation_active: bool,
    pub fault_type: Option<FaultType>,
    pub selected_electrician: Option<Electrician>,
}

/// Observable effect of a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Reading folded in; carries the alert it raised, if any
    ReadingApplied {
        status: PowerStatus,
        raised: Option<Alert>,
    },
    AlertAcknowledged(AlertId),
    SimulationStarted(FaultType),
    SimulationStopped,
    AlertsCleared,
    /// State touched without anything worth announcing
    Updated,
    /// Nothing changed
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct PowerStore {
    capacity: usize,
    current_reading: Option<Reading>,
    history: VecDeque<Reading>,
    status: PowerStatus,
    alerts: Vec<Alert>,
    toggle: SimulationToggle,
    selected_electrician: Option<Electrician>,
}

impl Default for PowerStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl PowerStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            current_reading: None,
            history: VecDeque::with_capacity(capacity),
            status: PowerStatus::initializing(),
            alerts: Vec::new(),
            toggle: SimulationToggle::Idle,
            selected_electrician: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn current_reading(&self) -> Option<&Reading> {
        self.current_reading.as_ref()
    }

    pub fn history(&self) -> impl ExactSizeIterator<Item = &Reading> {
        self.history.iter()
    }

    pub fn status(&self) -> &PowerStatus {
        &self.status
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn toggle(&self) -> SimulationToggle {
        self.toggle
    }

    pub fn selected_electrician(&self) -> Option<&Electrician> {
        self.selected_electrician.as_ref()
    }

    pub fn has_unacknowledged_alert(&self) -> bool {
        self.alerts.iter().any(|a| !a.acknowledged)
    }

    pub fn snapshot(&self) -> PowerSnapshot {
        PowerSnapshot {
            current_reading: self.current_reading,
            history: self.history.iter().copied().collect(),
            status: self.status.clone(),
            alerts: self.alerts.clone(),
            simulation_active: self.toggle.is_active(),
            fault_type: self.toggle.fault(),
            selected_electrician: self.selected_electrician.clone(),
        }
    }

    /// Apply an action stamped with the current wall clock
    pub fn apply(&mut self, action: Action) -> Transition {
        self.apply_at(action, Utc::now())
    }

    /// Apply an action; `now` stamps any alert it raises
    pub fn apply_at(&mut self, action: Action, now: DateTime<Utc>) -> Transition {
        match action {
            Action::NewReading(reading) => self.ingest(reading, now),
            Action::SeedHistory(readings) => {
                let skip = readings.len().saturating_sub(self.capacity);
                self.history = readings.into_iter().skip(skip).collect();
                debug!(entries = self.history.len(), "history seeded");
                Transition::Updated
            }
            Action::AddAlert(alert) => {
                if !alert.acknowledged && self.has_unacknowledged_alert() {
                    debug!(alert_id = %alert.id, "alert dropped, another is still open");
                    return Transition::Unchanged;
                }
                self.alerts.push(alert);
                Transition::Updated
            }
            Action::AcknowledgeAlert(id) => {
                match self.alerts.iter_mut().find(|a| a.id == id) {
                    Some(alert) if !alert.acknowledged => {
                        alert.acknowledged = true;
                        info!(alert_id = %id, "alert acknowledged");
                        Transition::AlertAcknowledged(id)
                    }
                    _ => Transition::Unchanged,
                }
            }
            Action::StartSimulation(fault) => {
                self.toggle = SimulationToggle::Simulating(fault);
                Transition::SimulationStarted(fault)
            }
            Action::StopSimulation => {
                if self.toggle.is_active() {
                    self.toggle = SimulationToggle::Idle;
                    Transition::SimulationStopped
                } else {
                    Transition::Unchanged
                }
            }
            Action::ClearAlerts => {
                self.alerts.clear();
                Transition::AlertsCleared
            }
            Action::SelectElectrician(electrician) => {
                self.selected_electrician = Some(electrician);
                Transition::Updated
            }
            Action::ClearSelectedElectrician => {
                if self.selected_electrician.take().is_some() {
                    Transition::Updated
                } else {
                    Transition::Unchanged
                }
            }
        }
    }

    fn ingest(&mut self, reading: Reading, now: DateTime<Utc>) -> Transition {
        self.history.push_back(reading);
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }

        let status = classify_status(&reading);
        let raised = if status.is_normal() || self.has_unacknowledged_alert() {
            None
        } else {
            Alert::from_status(&status, reading, now)
        };

        if let Some(alert) = &raised {
            info!(
                alert_id = %alert.id,
                alert_type = %alert.alert_type,
                severity = %alert.severity,
                message = %alert.message,
                "alert raised"
            );
            self.alerts.push(alert.clone());
        }

        self.current_reading = Some(reading);
        self.status = status.clone();
        Transition::ReadingApplied { status, raised }
    }
}
