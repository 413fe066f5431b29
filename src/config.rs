use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use validator::{Validate, ValidationError};

use crate::domain::{FaultType, JobTimeline};
use crate::error::MonitorResult;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    pub monitor: MonitorConfig,
    #[validate(nested)]
    pub simulation: SimulationConfig,
    #[validate(nested)]
    pub dispatch: DispatchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MonitorConfig {
    /// Reading ingestion period
    #[validate(range(min = 1, max = 3600))]
    pub tick_seconds: u64,
    /// Retained readings (288 = 24h at 5-minute spacing)
    #[validate(range(min = 1, max = 100000))]
    pub history_capacity: usize,
    /// Hours of synthetic history loaded at startup (0 disables)
    #[validate(range(max = 168))]
    pub seed_history_hours: u32,
    pub random_seed: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_seconds: 2,
            history_capacity: 288,
            seed_history_hours: 24,
            random_seed: None,
        }
    }
}

impl MonitorConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SimulationConfig {
    /// Fault injection stops on its own after this long
    #[validate(range(min = 1, max = 3600))]
    pub auto_stop_seconds: u64,
    /// Fault the demo binary injects on its own, if any
    pub demo_fault: Option<FaultType>,
    pub demo_start_after_seconds: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            auto_stop_seconds: 30,
            demo_fault: None,
            demo_start_after_seconds: 10,
        }
    }
}

impl SimulationConfig {
    pub fn auto_stop_after(&self) -> Duration {
        Duration::from_secs(self.auto_stop_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_stage_order"))]
pub struct DispatchConfig {
    pub dispatched_after_ms: u64,
    pub on_site_after_ms: u64,
    pub in_progress_after_ms: u64,
    pub completed_after_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            dispatched_after_ms: 3_000,
            on_site_after_ms: 8_000,
            in_progress_after_ms: 12_000,
            completed_after_ms: 20_000,
        }
    }
}

impl DispatchConfig {
    pub fn timeline(&self) -> JobTimeline {
        JobTimeline::from_offsets_ms(
            self.dispatched_after_ms,
            self.on_site_after_ms,
            self.in_progress_after_ms,
            self.completed_after_ms,
        )
    }
}

fn validate_stage_order(cfg: &DispatchConfig) -> Result<(), ValidationError> {
    let offsets = [
        cfg.dispatched_after_ms,
        cfg.on_site_after_ms,
        cfg.in_progress_after_ms,
        cfg.completed_after_ms,
    ];
    if offsets.windows(2).all(|w| w[0] <= w[1]) {
        Ok(())
    } else {
        Err(ValidationError::new("dispatch_stages_out_of_order"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl Config {
    pub fn load() -> MonitorResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Defaults, then the TOML file (if present), then `WATTPHASE__SECTION__KEY` env vars
    pub fn load_from(path: impl AsRef<Path>) -> MonitorResult<Self> {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("WATTPHASE__").split("__"));
        Self::from_figment(figment)
    }

    pub fn from_figment(figment: Figment) -> MonitorResult<Self> {
        let cfg: Config = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }
}
