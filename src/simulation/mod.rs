//! # Signal Simulation Module
//!
//! Synthetic stand-in for a three-phase sensor feed.
//!
//! ## Components
//!
//! - **Signal**: baseline reading generator, fault injection, status classifier
//!   and retrospective history window
//! - **Chart**: rounding/labelling of readings for dashboard charts
//!
//! ## Usage
//!
//! ```rust
//! use wattphase_monitor::domain::{FaultType, StatusLevel};
//! use wattphase_monitor::simulation::{classify_status, SignalGenerator};
//!
//! let mut generator = SignalGenerator::seeded(42);
//!
//! let reading = generator.generate_reading();
//! assert_eq!(classify_status(&reading).status, StatusLevel::Normal);
//!
//! let faulty = generator.generate_reading_with_fault(FaultType::PowerLoss);
//! assert_eq!(classify_status(&faulty).status, StatusLevel::PowerLoss);
//! ```

pub mod chart;
pub mod signal;

pub use chart::{format_chart_data, ChartPoint};
pub use signal::{
    apply_power_loss, apply_voltage_drop, classify_status, SignalGenerator, SignalSource,
};
