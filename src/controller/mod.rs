//! # Power Monitor
//!
//! Runtime around the [`PowerStore`]: a periodic tick pulls readings from a
//! [`SignalSource`], fault injection is switched on and off with a
//! cancellable auto-stop timer, and dispatch jobs are tracked on their
//! scripted timeline.
//!
//! The monitor is an explicitly created handle (`create` / `dispose`). Clone
//! it to share it; every clone refers to the same store.

pub mod events;
pub mod job_tracker;
pub mod store;

use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domain::{
    emergency_site, AlertId, Electrician, FaultType, JobTicket, JobTimeline, Reading, Severity,
    StatusLevel,
};
use crate::error::{MonitorError, MonitorResult};
use crate::simulation::{SignalGenerator, SignalSource};

pub use events::{MonitorEvent, StopReason};
pub use job_tracker::JobTracker;
pub use store::{Action, PowerSnapshot, PowerStore, SimulationToggle, Transition};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Pending auto-stop for one simulation activation
struct AutoStop {
    activation: u64,
    cancel: CancellationToken,
}

struct MonitorState {
    store: PowerStore,
    auto_stop: Option<AutoStop>,
    activations: u64,
    disposed: bool,
}

struct Shared {
    tick_interval: Duration,
    auto_stop_after: Duration,
    timeline: JobTimeline,
    state: Mutex<MonitorState>,
    source: tokio::sync::Mutex<Box<dyn SignalSource>>,
    events: broadcast::Sender<MonitorEvent>,
    shutdown: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

#[derive(Clone)]
pub struct PowerMonitor {
    shared: Arc<Shared>,
}

impl PowerMonitor {
    /// Build a monitor without starting any task
    pub fn new(cfg: &Config, source: Box<dyn SignalSource>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let shared = Shared {
            tick_interval: cfg.monitor.tick_interval(),
            auto_stop_after: cfg.simulation.auto_stop_after(),
            timeline: cfg.dispatch.timeline(),
            state: Mutex::new(MonitorState {
                store: PowerStore::new(cfg.monitor.history_capacity),
                auto_stop: None,
                activations: 0,
                disposed: false,
            }),
            source: tokio::sync::Mutex::new(source),
            events,
            shutdown: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        };
        Self {
            shared: Arc::new(shared),
        }
    }

    /// Build a monitor, backfill history and start the tick loop.
    ///
    /// Must be called within a Tokio runtime.
    pub fn create(cfg: &Config, source: Box<dyn SignalSource>) -> MonitorResult<Self> {
        let monitor = Self::new(cfg, source);

        if cfg.monitor.seed_history_hours > 0 {
            let mut backfill = SignalGenerator::new(cfg.monitor.random_seed);
            let history = backfill.generate_history_window(cfg.monitor.seed_history_hours);
            monitor.apply(Action::SeedHistory(history))?;
        }

        monitor.spawn_tick_loop();
        info!(
            tick_seconds = cfg.monitor.tick_seconds,
            history_capacity = cfg.monitor.history_capacity,
            "power monitor created"
        );
        Ok(monitor)
    }

    /// Stop the tick loop and every pending timer. Idempotent.
    pub async fn dispose(&self) {
        let was_active = {
            let mut state = self.shared.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            if let Some(auto_stop) = state.auto_stop.take() {
                auto_stop.cancel.cancel();
            }
            let was_active = state.store.toggle().is_active();
            state.store.apply(Action::StopSimulation);
            was_active
        };
        if was_active {
            self.emit(MonitorEvent::SimulationStopped {
                reason: StopReason::Disposed,
            });
        }

        self.shared.shutdown.cancel();
        let tasks: Vec<JoinHandle<()>> = std::mem::take(&mut *self.shared.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "monitor task ended abnormally");
            }
        }
        info!("power monitor disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.state.lock().disposed
    }

    pub fn snapshot(&self) -> PowerSnapshot {
        self.shared.state.lock().store.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.shared.events.subscribe()
    }

    /// Route an action through the store.
    ///
    /// Simulation start/stop go through the timer-aware paths.
    pub fn dispatch(&self, action: Action) -> MonitorResult<Transition> {
        match action {
            Action::StartSimulation(fault) => self.start_simulation(fault),
            Action::StopSimulation => self.stop_simulation(),
            other => self.apply(other),
        }
    }

    pub fn acknowledge_alert(&self, id: AlertId) -> MonitorResult<Transition> {
        self.apply(Action::AcknowledgeAlert(id))
    }

    pub fn clear_alerts(&self) -> MonitorResult<Transition> {
        self.apply(Action::ClearAlerts)
    }

    pub fn select_electrician(&self, electrician: Electrician) -> MonitorResult<Transition> {
        self.apply(Action::SelectElectrician(electrician))
    }

    pub fn clear_selected_electrician(&self) -> MonitorResult<Transition> {
        self.apply(Action::ClearSelectedElectrician)
    }

    /// Start fault injection and arm the auto-stop timer.
    ///
    /// Restarting while active supersedes the previous timer. Must be called
    /// within a Tokio runtime.
    pub fn start_simulation(&self, fault: FaultType) -> MonitorResult<Transition> {
        let (transition, activation, cancel) = {
            let mut state = self.shared.state.lock();
            if state.disposed {
                return Err(MonitorError::Disposed);
            }
            if let Some(previous) = state.auto_stop.take() {
                previous.cancel.cancel();
            }
            state.activations += 1;
            let activation = state.activations;
            let cancel = self.shared.shutdown.child_token();
            state.auto_stop = Some(AutoStop {
                activation,
                cancel: cancel.clone(),
            });
            let transition = state.store.apply(Action::StartSimulation(fault));
            self.emit(MonitorEvent::SimulationStarted { fault });
            (transition, activation, cancel)
        };

        info!(fault = %fault, activation, "fault simulation started");

        let monitor = self.clone();
        let after = self.shared.auto_stop_after;
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(after) => monitor.expire_simulation(activation),
            }
        });

        Ok(transition)
    }

    /// Stop fault injection and cancel the pending auto-stop
    pub fn stop_simulation(&self) -> MonitorResult<Transition> {
        let mut state = self.shared.state.lock();
        if state.disposed {
            return Err(MonitorError::Disposed);
        }
        if let Some(auto_stop) = state.auto_stop.take() {
            auto_stop.cancel.cancel();
        }
        let transition = state.store.apply(Action::StopSimulation);
        if transition == Transition::SimulationStopped {
            info!("fault simulation stopped");
            self.emit(MonitorEvent::SimulationStopped {
                reason: StopReason::Manual,
            });
        }
        Ok(transition)
    }

    /// Auto-stop callback; ignored unless `activation` is still the armed one
    fn expire_simulation(&self, activation: u64) {
        let mut state = self.shared.state.lock();
        match &state.auto_stop {
            Some(armed) if armed.activation == activation && !state.disposed => {
                state.auto_stop = None;
                if state.store.apply(Action::StopSimulation) == Transition::SimulationStopped {
                    info!(activation, "fault simulation timed out");
                    self.emit(MonitorEvent::SimulationStopped {
                        reason: StopReason::Timeout,
                    });
                }
            }
            _ => debug!(activation, "stale auto-stop ignored"),
        }
    }

    /// Pull one reading from the source and fold it into the store.
    ///
    /// The source stays locked until the reading is applied, so concurrent
    /// ticks land in generation order. A reading drawn for a fault that was
    /// stopped or swapped mid-read is dropped.
    pub async fn tick(&self) -> MonitorResult<Transition> {
        let fault = {
            let state = self.shared.state.lock();
            if state.disposed {
                return Err(MonitorError::Disposed);
            }
            state.store.toggle().fault()
        };

        let mut source = self.shared.source.lock().await;
        let reading = source
            .next_reading(fault)
            .await
            .map_err(|e| MonitorError::Source(e.to_string()))?;
        let transition = self.ingest(reading, fault);
        drop(source);
        transition
    }

    fn ingest(&self, reading: Reading, fault: Option<FaultType>) -> MonitorResult<Transition> {
        let mut state = self.shared.state.lock();
        if state.disposed {
            return Err(MonitorError::Disposed);
        }
        let current = state.store.toggle().fault();
        if fault.is_some() && current != fault {
            debug!(?fault, ?current, "fault reading dropped, simulation changed");
            return Ok(Transition::Unchanged);
        }
        self.apply_locked(&mut state, Action::NewReading(reading))
    }

    /// Select an electrician and open a tracked job for the current incident
    pub fn dispatch_job(
        &self,
        electrician: Electrician,
        issue_type: impl Into<String>,
        description: impl Into<String>,
    ) -> MonitorResult<JobTracker> {
        let priority = {
            let state = self.shared.state.lock();
            let status = state.store.status();
            match status.status {
                StatusLevel::PowerLoss => Severity::High,
                _ => status.severity,
            }
        };
        self.apply(Action::SelectElectrician(electrician.clone()))?;

        let ticket = JobTicket::open(
            &mut rand::thread_rng(),
            Utc::now(),
            issue_type,
            description,
            priority,
            Some(electrician),
            emergency_site(),
        );
        info!(
            ticket_id = %ticket.id,
            priority = %ticket.priority,
            "dispatch job opened"
        );

        Ok(JobTracker::spawn(
            ticket,
            &self.shared.timeline,
            self.shared.shutdown.child_token(),
            Some(self.shared.events.clone()),
        ))
    }

    fn apply(&self, action: Action) -> MonitorResult<Transition> {
        let mut state = self.shared.state.lock();
        if state.disposed {
            return Err(MonitorError::Disposed);
        }
        self.apply_locked(&mut state, action)
    }

    fn apply_locked(&self, state: &mut MonitorState, action: Action) -> MonitorResult<Transition> {
        let reading = match &action {
            Action::NewReading(reading) => Some(*reading),
            _ => None,
        };
        let transition = state.store.apply(action);

        match &transition {
            Transition::ReadingApplied { status, raised } => {
                if let Some(reading) = reading {
                    self.emit(MonitorEvent::ReadingApplied {
                        reading,
                        status: status.clone(),
                    });
                }
                if let Some(alert) = raised {
                    self.emit(MonitorEvent::AlertRaised {
                        alert: alert.clone(),
                    });
                }
            }
            Transition::AlertAcknowledged(id) => {
                self.emit(MonitorEvent::AlertAcknowledged { id: *id })
            }
            Transition::AlertsCleared => self.emit(MonitorEvent::AlertsCleared),
            _ => {}
        }
        Ok(transition)
    }

    fn emit(&self, event: MonitorEvent) {
        // Sending fails only when nobody is subscribed
        let _ = self.shared.events.send(event);
    }

    fn spawn_tick_loop(&self) {
        let monitor = self.clone();
        let shutdown = self.shared.shutdown.clone();
        let period = self.shared.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        match monitor.tick().await {
                            Ok(Transition::ReadingApplied { status, .. }) => {
                                debug!(status = %status.status, "tick");
                            }
                            Ok(_) => {}
                            Err(MonitorError::Disposed) => break,
                            Err(e) => warn!(error = %e, "tick failed"),
                        }
                    }
                }
            }
            debug!("tick loop stopped");
        });

        self.shared.tasks.lock().push(handle);
    }
}
