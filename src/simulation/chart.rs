//! Chart-ready projection of readings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Reading;

/// One point on the voltage/current/frequency charts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// `HH:MM` label for the x axis
    pub time: String,
    pub timestamp: DateTime<Utc>,
    pub phase1_v: f64,
    pub phase2_v: f64,
    pub phase3_v: f64,
    pub phase1_a: f64,
    pub phase2_a: f64,
    pub phase3_a: f64,
    pub frequency: f64,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

impl From<&Reading> for ChartPoint {
    fn from(reading: &Reading) -> Self {
        Self {
            time: reading.timestamp.format("%H:%M").to_string(),
            timestamp: reading.timestamp,
            phase1_v: round_to(reading.voltage.l1_v, 1),
            phase2_v: round_to(reading.voltage.l2_v, 1),
            phase3_v: round_to(reading.voltage.l3_v, 1),
            phase1_a: round_to(reading.current.l1_a, 1),
            phase2_a: round_to(reading.current.l2_a, 1),
            phase3_a: round_to(reading.current.l3_a, 1),
            frequency: round_to(reading.frequency_hz, 2),
        }
    }
}

/// Project readings onto chart points, preserving order
pub fn format_chart_data<'a>(readings: impl IntoIterator<Item = &'a Reading>) -> Vec<ChartPoint> {
    readings.into_iter().map(ChartPoint::from).collect()
}
