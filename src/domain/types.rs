use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::three_phase::{ThreePhaseCurrent, ThreePhaseVoltage, NOMINAL_FREQUENCY_HZ};

// ============================================================================
// Readings
// ============================================================================

/// One sample of three-phase voltage/current plus grid frequency
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub voltage: ThreePhaseVoltage,
    pub current: ThreePhaseCurrent,
    pub frequency_hz: f64,
}

impl Reading {
    pub fn new(
        timestamp: DateTime<Utc>,
        voltage: ThreePhaseVoltage,
        current: ThreePhaseCurrent,
        frequency_hz: f64,
    ) -> Self {
        Self {
            timestamp,
            voltage,
            current,
            frequency_hz,
        }
    }

    /// Absolute deviation from nominal frequency (Hz)
    pub fn frequency_deviation_hz(&self) -> f64 {
        (self.frequency_hz - NOMINAL_FREQUENCY_HZ).abs()
    }
}

// ============================================================================
// Status
// ============================================================================

/// Classification level of a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Normal,
    VoltageDrop,
    PowerLoss,
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusLevel::Normal => write!(f, "normal"),
            StatusLevel::VoltageDrop => write!(f, "voltage_drop"),
            StatusLevel::PowerLoss => write!(f, "power_loss"),
        }
    }
}

/// Severity shared by statuses, alerts and job priorities
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// Derived status of a reading. Never stored apart from the reading that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerStatus {
    pub status: StatusLevel,
    pub message: String,
    pub severity: Severity,
}

impl PowerStatus {
    pub fn new(status: StatusLevel, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            status,
            message: message.into(),
            severity,
        }
    }

    /// Placeholder shown before the first reading arrives
    pub fn initializing() -> Self {
        Self::new(StatusLevel::Normal, "Initializing system...", Severity::Low)
    }

    pub fn is_normal(&self) -> bool {
        self.status == StatusLevel::Normal
    }
}

// ============================================================================
// Fault injection
// ============================================================================

/// Simulated fault that can be injected into generated readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultType {
    VoltageDrop,
    PowerLoss,
}

impl std::str::FromStr for FaultType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "voltage_drop" => Ok(FaultType::VoltageDrop),
            "power_loss" => Ok(FaultType::PowerLoss),
            _ => Err(format!("Unknown fault type: {}", s)),
        }
    }
}

impl fmt::Display for FaultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultType::VoltageDrop => write!(f, "voltage_drop"),
            FaultType::PowerLoss => write!(f, "power_loss"),
        }
    }
}

// ============================================================================
// Alerts
// ============================================================================

/// Alert category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    VoltageDrop,
    PowerLoss,
    /// Declared for consumers; the status classifier never yields it.
    FrequencyDeviation,
}

impl AlertType {
    /// Alert type for an abnormal status, `None` for normal
    pub fn from_status(status: StatusLevel) -> Option<Self> {
        match status {
            StatusLevel::Normal => None,
            StatusLevel::VoltageDrop => Some(AlertType::VoltageDrop),
            StatusLevel::PowerLoss => Some(AlertType::PowerLoss),
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertType::VoltageDrop => write!(f, "voltage_drop"),
            AlertType::PowerLoss => write!(f, "power_loss"),
            AlertType::FrequencyDeviation => write!(f, "frequency_deviation"),
        }
    }
}

/// Alert identifier, unique per creation event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(pub Uuid);

impl AlertId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "alert-{}", self.0)
    }
}

/// Store-level record of an abnormal status awaiting acknowledgement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub alert_type: AlertType,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub acknowledged: bool,
    pub reading: Reading,
}

impl Alert {
    /// Build an unacknowledged alert from an abnormal status.
    ///
    /// Returns `None` when the status is normal.
    pub fn from_status(status: &PowerStatus, reading: Reading, now: DateTime<Utc>) -> Option<Self> {
        let alert_type = AlertType::from_status(status.status)?;
        Some(Self {
            id: AlertId::new(),
            alert_type,
            message: status.message.clone(),
            timestamp: now,
            severity: status.severity,
            acknowledged: false,
            reading,
        })
    }
}

// ============================================================================
// Gauges
// ============================================================================

/// Display level of a single gauge on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GaugeLevel {
    Normal,
    Warning,
    Critical,
}

impl GaugeLevel {
    pub fn for_voltage(voltage_v: f64) -> Self {
        if voltage_v < 50.0 {
            GaugeLevel::Critical
        } else if voltage_v < 200.0 {
            GaugeLevel::Warning
        } else {
            GaugeLevel::Normal
        }
    }

    pub fn for_current(current_a: f64) -> Self {
        if current_a > 100.0 {
            GaugeLevel::Critical
        } else if current_a > 80.0 {
            GaugeLevel::Warning
        } else {
            GaugeLevel::Normal
        }
    }

    pub fn for_frequency(frequency_hz: f64) -> Self {
        if (frequency_hz - NOMINAL_FREQUENCY_HZ).abs() > 0.5 {
            GaugeLevel::Warning
        } else {
            GaugeLevel::Normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(l1: f64, l2: f64, l3: f64) -> Reading {
        Reading::new(
            Utc::now(),
            ThreePhaseVoltage::new(l1, l2, l3),
            ThreePhaseCurrent::new(20.0, 18.0, 22.0),
            50.0,
        )
    }

    #[test]
    fn test_alert_type_from_status() {
        assert_eq!(AlertType::from_status(StatusLevel::Normal), None);
        assert_eq!(
            AlertType::from_status(StatusLevel::VoltageDrop),
            Some(AlertType::VoltageDrop)
        );
        assert_eq!(
            AlertType::from_status(StatusLevel::PowerLoss),
            Some(AlertType::PowerLoss)
        );
    }

    #[test]
    fn test_alert_copies_status() {
        let status = PowerStatus::new(StatusLevel::PowerLoss, "lost", Severity::High);
        let r = reading(0.0, 230.0, 230.0);
        let alert = Alert::from_status(&status, r, Utc::now()).unwrap();

        assert_eq!(alert.alert_type, AlertType::PowerLoss);
        assert_eq!(alert.message, "lost");
        assert_eq!(alert.severity, Severity::High);
        assert!(!alert.acknowledged);
        assert_eq!(alert.reading, r);

        let normal = PowerStatus::new(StatusLevel::Normal, "ok", Severity::Low);
        assert!(Alert::from_status(&normal, r, Utc::now()).is_none());
    }

    #[test]
    fn test_alert_ids_are_unique() {
        assert_ne!(AlertId::new(), AlertId::new());
        assert!(AlertId::new().to_string().starts_with("alert-"));
    }

    #[test]
    fn test_fault_type_parse() {
        assert_eq!("voltage_drop".parse::<FaultType>().unwrap(), FaultType::VoltageDrop);
        assert_eq!("Power-Loss".parse::<FaultType>().unwrap(), FaultType::PowerLoss);
        assert!("brownout".parse::<FaultType>().is_err());
        assert_eq!(FaultType::PowerLoss.to_string(), "power_loss");
    }

    #[test]
    fn test_serde_names_are_snake_case() {
        let json = serde_json::to_string(&StatusLevel::VoltageDrop).unwrap();
        assert_eq!(json, "\"voltage_drop\"");
        let json = serde_json::to_string(&AlertType::FrequencyDeviation).unwrap();
        assert_eq!(json, "\"frequency_deviation\"");
    }

    #[test]
    fn test_gauge_levels() {
        assert_eq!(GaugeLevel::for_voltage(40.0), GaugeLevel::Critical);
        assert_eq!(GaugeLevel::for_voltage(180.0), GaugeLevel::Warning);
        assert_eq!(GaugeLevel::for_voltage(230.0), GaugeLevel::Normal);

        assert_eq!(GaugeLevel::for_current(120.0), GaugeLevel::Critical);
        assert_eq!(GaugeLevel::for_current(90.0), GaugeLevel::Warning);
        assert_eq!(GaugeLevel::for_current(45.0), GaugeLevel::Normal);

        assert_eq!(GaugeLevel::for_frequency(50.6), GaugeLevel::Warning);
        assert_eq!(GaugeLevel::for_frequency(49.4), GaugeLevel::Warning);
        assert_eq!(GaugeLevel::for_frequency(50.05), GaugeLevel::Normal);
    }

    #[test]
    fn test_frequency_deviation() {
        let r = Reading { frequency_hz: 49.8, ..reading(230.0, 230.0, 230.0) };
        assert!((r.frequency_deviation_hz() - 0.2).abs() < 1e-9);
    }
}
