//! Dispatch job tickets and their scripted progress timeline.

use chrono::{DateTime, Datelike, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{EnumIter, IntoEnumIterator};

use super::electrician::{Electrician, Site};
use super::types::Severity;

/// Job priority uses the same low/medium/high scale as alerts
pub type Priority = Severity;

/// How long a job is expected to take from creation
pub const ESTIMATED_JOB_DURATION_HOURS: i64 = 2;

/// Lifecycle of a dispatch job, in progression order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Created,
    Dispatched,
    OnSite,
    InProgress,
    Completed,
}

impl JobStatus {
    /// Completion percentage shown on the confirmation timeline
    pub fn progress_percent(self) -> u8 {
        match self {
            JobStatus::Created => 20,
            JobStatus::Dispatched => 40,
            JobStatus::OnSite => 60,
            JobStatus::InProgress => 80,
            JobStatus::Completed => 100,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Created => "Job Created",
            JobStatus::Dispatched => "Electrician Dispatched",
            JobStatus::OnSite => "On Site",
            JobStatus::InProgress => "Work in Progress",
            JobStatus::Completed => "Job Completed",
        }
    }

    pub fn next(self) -> Option<JobStatus> {
        JobStatus::iter().skip_while(|s| *s != self).nth(1)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Created => write!(f, "created"),
            JobStatus::Dispatched => write!(f, "dispatched"),
            JobStatus::OnSite => write!(f, "on_site"),
            JobStatus::InProgress => write!(f, "in_progress"),
            JobStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Emergency job raised for a site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobTicket {
    pub id: String,
    pub issue_type: String,
    pub priority: Priority,
    pub status: JobStatus,
    pub assigned_electrician: Option<Electrician>,
    pub created_at: DateTime<Utc>,
    pub estimated_completion: Option<DateTime<Utc>>,
    pub description: String,
    pub site: Site,
}

impl JobTicket {
    /// Open a new ticket in `Created` state
    pub fn open<R: Rng + ?Sized>(
        rng: &mut R,
        now: DateTime<Utc>,
        issue_type: impl Into<String>,
        description: impl Into<String>,
        priority: Priority,
        electrician: Option<Electrician>,
        site: Site,
    ) -> Self {
        Self {
            id: generate_job_ticket_id(now, rng),
            issue_type: issue_type.into(),
            priority,
            status: JobStatus::Created,
            assigned_electrician: electrician,
            created_at: now,
            estimated_completion: Some(now + Duration::hours(ESTIMATED_JOB_DURATION_HOURS)),
            description: description.into(),
            site,
        }
    }
}

/// Ticket identifier of the form `WP-<year>-<NNNN>`
pub fn generate_job_ticket_id<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> String {
    let n: u32 = rng.gen_range(0..9999);
    format!("WP-{}-{:04}", now.year(), n)
}

/// Offsets from job creation at which each later status is reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTimeline {
    stages: Vec<(JobStatus, std::time::Duration)>,
}

impl Default for JobTimeline {
    fn default() -> Self {
        Self::from_offsets_ms(3_000, 8_000, 12_000, 20_000)
    }
}

impl JobTimeline {
    pub fn from_offsets_ms(
        dispatched: u64,
        on_site: u64,
        in_progress: u64,
        completed: u64,
    ) -> Self {
        use std::time::Duration as StdDuration;
        Self {
            stages: vec![
                (JobStatus::Dispatched, StdDuration::from_millis(dispatched)),
                (JobStatus::OnSite, StdDuration::from_millis(on_site)),
                (JobStatus::InProgress, StdDuration::from_millis(in_progress)),
                (JobStatus::Completed, StdDuration::from_millis(completed)),
            ],
        }
    }

    /// Status reached after `elapsed` since creation
    pub fn status_at(&self, elapsed: std::time::Duration) -> JobStatus {
        self.stages
            .iter()
            .filter(|(_, at)| elapsed >= *at)
            .map(|(status, _)| *status)
            .max()
            .unwrap_or(JobStatus::Created)
    }

    /// Stages in firing order
    pub fn stages(&self) -> impl Iterator<Item = (JobStatus, std::time::Duration)> + '_ {
        let mut ordered = self.stages.clone();
        ordered.sort_by_key(|(_, at)| *at);
        ordered.into_iter()
    }

    /// Offset of the final stage
    pub fn total(&self) -> std::time::Duration {
        self.stages.iter().map(|(_, at)| *at).max().unwrap_or_default()
    }
}
