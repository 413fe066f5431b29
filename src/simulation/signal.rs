//! # Synthetic Signal Generator
//!
//! Produces three-phase readings around a 230V / 50Hz baseline, optionally
//! perturbed to simulate a voltage drop or a power loss, and classifies
//! readings into a status ladder.
//!
//! All randomness comes from a single `StdRng` so a seeded generator yields
//! a reproducible sequence.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::domain::{
    FaultType, Phase, PowerStatus, Reading, Severity, StatusLevel, ThreePhaseCurrent,
    ThreePhaseVoltage, NOMINAL_FREQUENCY_HZ, NOMINAL_VOLTAGE_V,
};

/// Half-width of the baseline voltage jitter (V)
pub const VOLTAGE_JITTER_V: f64 = 5.0;
/// Per-phase voltage jitter multipliers (L1, L2, L3)
pub const VOLTAGE_JITTER_MULTIPLIERS: [f64; 3] = [1.0, 0.8, 1.2];
/// Baseline current range (A)
pub const CURRENT_RANGE_A: std::ops::Range<f64> = 10.0..60.0;
/// Per-phase current multipliers (L1, L2, L3)
pub const CURRENT_MULTIPLIERS: [f64; 3] = [1.0, 0.9, 1.1];
/// Half-width of the baseline frequency jitter (Hz)
pub const FREQUENCY_JITTER_HZ: f64 = 0.1;
/// Voltage factor range applied by a simulated voltage drop
pub const VOLTAGE_DROP_FACTOR: std::ops::Range<f64> = 0.75..0.80;
/// Spacing of retrospective history samples (minutes)
pub const HISTORY_STEP_MINUTES: i64 = 5;

/// Below this on any phase the supply is considered lost (V)
pub const POWER_LOSS_THRESHOLD_V: f64 = 50.0;
/// Below this on any phase the supply is considered sagging (V)
pub const VOLTAGE_DROP_THRESHOLD_V: f64 = 200.0;
/// Phase-to-phase spread considered an imbalance (V)
pub const IMBALANCE_THRESHOLD_V: f64 = 10.0;

/// Source of live readings.
///
/// The monitor only depends on this trait, so a real sensor feed can stand
/// in for the simulator. Sources that cannot inject faults ignore `fault`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SignalSource: Send + Sync {
    async fn next_reading(&mut self, fault: Option<FaultType>) -> Result<Reading>;
}

/// Random three-phase signal simulator
pub struct SignalGenerator {
    rng: StdRng,
}

impl Default for SignalGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl SignalGenerator {
    /// Generator with a reproducible sequence
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded when `seed` is set, random otherwise
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    /// Baseline reading stamped now
    pub fn generate_reading(&mut self) -> Reading {
        self.generate_reading_at(Utc::now())
    }

    /// Baseline reading stamped at `timestamp`
    pub fn generate_reading_at(&mut self, timestamp: DateTime<Utc>) -> Reading {
        let jitter_v = self.rng.gen_range(-VOLTAGE_JITTER_V..VOLTAGE_JITTER_V);
        let current_a = self.rng.gen_range(CURRENT_RANGE_A);
        let jitter_hz = self.rng.gen_range(-FREQUENCY_JITTER_HZ..FREQUENCY_JITTER_HZ);

        let [m1, m2, m3] = VOLTAGE_JITTER_MULTIPLIERS;
        let [c1, c2, c3] = CURRENT_MULTIPLIERS;

        Reading::new(
            timestamp,
            ThreePhaseVoltage::new(
                NOMINAL_VOLTAGE_V + jitter_v * m1,
                NOMINAL_VOLTAGE_V + jitter_v * m2,
                NOMINAL_VOLTAGE_V + jitter_v * m3,
            ),
            ThreePhaseCurrent::new(current_a * c1, current_a * c2, current_a * c3),
            NOMINAL_FREQUENCY_HZ + jitter_hz,
        )
    }

    /// Baseline reading with `fault` injected
    pub fn generate_reading_with_fault(&mut self, fault: FaultType) -> Reading {
        let reading = self.generate_reading();
        self.inject_fault(reading, fault)
    }

    /// Reading for the given fault, or a baseline one when `fault` is `None`
    pub fn generate(&mut self, fault: Option<FaultType>) -> Reading {
        match fault {
            Some(fault) => self.generate_reading_with_fault(fault),
            None => self.generate_reading(),
        }
    }

    fn inject_fault(&mut self, reading: Reading, fault: FaultType) -> Reading {
        match fault {
            FaultType::VoltageDrop => {
                let factor = self.rng.gen_range(VOLTAGE_DROP_FACTOR);
                apply_voltage_drop(reading, factor)
            }
            FaultType::PowerLoss => {
                let phases_lost = self.rng.gen_range(1..=3);
                apply_power_loss(reading, phases_lost)
            }
        }
    }

    /// Readings every 5 minutes from `hours` ago up to now, oldest first
    pub fn generate_history_window(&mut self, hours: u32) -> Vec<Reading> {
        self.generate_history_window_at(Utc::now(), hours)
    }

    /// Readings every 5 minutes from `now - hours` to `now` inclusive, oldest first
    pub fn generate_history_window_at(&mut self, now: DateTime<Utc>, hours: u32) -> Vec<Reading> {
        let window_minutes = i64::from(hours) * 60;
        (0..=window_minutes / HISTORY_STEP_MINUTES)
            .rev()
            .map(|step| {
                let timestamp = now - Duration::minutes(step * HISTORY_STEP_MINUTES);
                self.generate_reading_at(timestamp)
            })
            .collect()
    }
}

#[async_trait]
impl SignalSource for SignalGenerator {
    async fn next_reading(&mut self, fault: Option<FaultType>) -> Result<Reading> {
        Ok(self.generate(fault))
    }
}

/// Scale all three phase voltages by `factor`
pub fn apply_voltage_drop(reading: Reading, factor: f64) -> Reading {
    Reading {
        voltage: reading.voltage.scaled(factor),
        ..reading
    }
}

/// Zero voltage and current on the first `phases_lost` phases, in L1, L2, L3 order.
///
/// Loss is cumulative by phase index: L2 is never lost without L1.
pub fn apply_power_loss(mut reading: Reading, phases_lost: usize) -> Reading {
    for phase in Phase::ALL.into_iter().take(phases_lost) {
        reading.voltage.set(phase, 0.0);
        reading.current.set(phase, 0.0);
    }
    reading
}

/// Classify a reading; the first matching rule wins
pub fn classify_status(reading: &Reading) -> PowerStatus {
    let min_v = reading.voltage.min_phase();

    if min_v < POWER_LOSS_THRESHOLD_V {
        return PowerStatus::new(
            StatusLevel::PowerLoss,
            "Critical: Power loss detected on one or more phases",
            Severity::High,
        );
    }

    if min_v < VOLTAGE_DROP_THRESHOLD_V {
        return PowerStatus::new(
            StatusLevel::VoltageDrop,
            "Warning: Voltage drop detected",
            Severity::Medium,
        );
    }

    if reading.voltage.spread() > IMBALANCE_THRESHOLD_V {
        return PowerStatus::new(
            StatusLevel::VoltageDrop,
            "Caution: Voltage imbalance detected",
            Severity::Low,
        );
    }

    PowerStatus::new(
        StatusLevel::Normal,
        "All systems operating normally",
        Severity::Low,
    )
}
