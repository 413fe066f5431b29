//! # 3-Phase Measurements
//!
//! Per-phase voltage and current triples as reported by a three-phase
//! supply (L1, L2, L3 + N). Nominal supply is 230V phase-to-neutral at 50Hz.
//!
//! Phases are always addressed in the fixed order L1, L2, L3. Fault
//! injection and status classification both rely on that ordering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Nominal phase-to-neutral voltage (V)
pub const NOMINAL_VOLTAGE_V: f64 = 230.0;

/// Nominal grid frequency (Hz)
pub const NOMINAL_FREQUENCY_HZ: f64 = 50.0;

/// Supply phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    L1,
    L2,
    L3,
}

impl Phase {
    /// All phases in supply order
    pub const ALL: [Phase; 3] = [Phase::L1, Phase::L2, Phase::L3];

    /// 1-based phase number
    pub fn number(self) -> usize {
        match self {
            Phase::L1 => 1,
            Phase::L2 => 2,
            Phase::L3 => 3,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.number())
    }
}

/// 3-phase voltage measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreePhaseVoltage {
    /// Phase L1-N voltage (V)
    pub l1_v: f64,
    /// Phase L2-N voltage (V)
    pub l2_v: f64,
    /// Phase L3-N voltage (V)
    pub l3_v: f64,
}

impl ThreePhaseVoltage {
    pub fn new(l1_v: f64, l2_v: f64, l3_v: f64) -> Self {
        Self { l1_v, l2_v, l3_v }
    }

    /// Create balanced voltages
    pub fn balanced(voltage_v: f64) -> Self {
        Self::new(voltage_v, voltage_v, voltage_v)
    }

    pub fn set(&mut self, phase: Phase, voltage_v: f64) {
        match phase {
            Phase::L1 => self.l1_v = voltage_v,
            Phase::L2 => self.l2_v = voltage_v,
            Phase::L3 => self.l3_v = voltage_v,
        }
    }

    /// Lowest phase voltage
    pub fn min_phase(&self) -> f64 {
        self.l1_v.min(self.l2_v).min(self.l3_v)
    }

    /// Highest phase voltage
    pub fn max_phase(&self) -> f64 {
        self.l1_v.max(self.l2_v).max(self.l3_v)
    }

    /// Spread between the highest and lowest phase (V)
    pub fn spread(&self) -> f64 {
        self.max_phase() - self.min_phase()
    }

    /// Scale every phase by the same factor
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.l1_v * factor, self.l2_v * factor, self.l3_v * factor)
    }
}

/// 3-phase current measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreePhaseCurrent {
    /// Phase L1 current (A)
    pub l1_a: f64,
    /// Phase L2 current (A)
    pub l2_a: f64,
    /// Phase L3 current (A)
    pub l3_a: f64,
}

impl ThreePhaseCurrent {
    pub fn new(l1_a: f64, l2_a: f64, l3_a: f64) -> Self {
        Self { l1_a, l2_a, l3_a }
    }

    pub fn set(&mut self, phase: Phase, current_a: f64) {
        match phase {
            Phase::L1 => self.l1_a = current_a,
            Phase::L2 => self.l2_a = current_a,
            Phase::L3 => self.l3_a = current_a,
        }
    }

    /// Total current across all phases
    pub fn total(&self) -> f64 {
        self.l1_a + self.l2_a + self.l3_a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voltage_spread() {
        let v = ThreePhaseVoltage::new(235.0, 230.0, 221.0);
        assert!((v.spread() - 14.0).abs() < 1e-9);
        assert!((v.min_phase() - 221.0).abs() < 1e-9);
        assert!((v.max_phase() - 235.0).abs() < 1e-9);
    }

    #[test]
    fn test_phase_accessors_follow_supply_order() {
        let mut v = ThreePhaseVoltage::balanced(230.0);
        let mut i = ThreePhaseCurrent::new(10.0, 20.0, 30.0);
        v.set(Phase::L2, 0.0);
        i.set(Phase::L2, 0.0);

        assert_eq!(v, ThreePhaseVoltage::new(230.0, 0.0, 230.0));
        assert_eq!(i, ThreePhaseCurrent::new(10.0, 0.0, 30.0));
        assert_eq!(Phase::ALL.map(Phase::number), [1, 2, 3]);
        assert_eq!(Phase::L3.to_string(), "L3");
    }

    #[test]
    fn test_current_totals() {
        let i = ThreePhaseCurrent::new(10.0, 9.0, 11.0);
        assert!((i.total() - 30.0).abs() < 1e-9);
    }
}
