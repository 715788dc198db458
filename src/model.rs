use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MIN_DELAY: Duration = Duration::from_millis(100);
pub const MAX_DELAY: Duration = Duration::from_millis(2000);
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);
/// Slider increment used by the dashboard.
pub const DELAY_STEP: Duration = Duration::from_millis(100);

/// Clamp a tick delay into the operator-adjustable range.
pub fn clamp_delay(delay: Duration) -> Duration {
    delay.clamp(MIN_DELAY, MAX_DELAY)
}

/// Validated inputs for one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthParams {
    pub initial: f64,
    pub factor: f64,
    pub step_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub params: GrowthParams,
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthMode {
    Raw,
    LogDollars,
}

/// One full parameter set and its derived value sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthRun {
    pub initial: f64,
    pub factor: f64,
    pub step_count: usize,
    pub mode: GrowthMode,
    /// `step_count + 1` entries, dollars in `Raw` mode and log10(dollars) in `LogDollars` mode.
    pub values: Vec<f64>,
}

/// Axis ranges for the growth chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotBounds {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AnimEvent {
    RunStarted {
        run: Box<GrowthRun>,
        bounds: PlotBounds,
    },
    Tick {
        step: usize,
        value: f64,
        line: String,
    },
    Info(InfoEvent),
    RunCompleted {
        run: Box<GrowthRun>,
    },
}

/// Structured info events emitted by the engine and consumed by UI/CLI layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InfoEvent {
    Message(String),
    Paused(bool),
    DelayChanged(#[serde(with = "humantime_serde")] Duration),
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::Paused(true) => "Paused".to_string(),
            InfoEvent::Paused(false) => "Resumed".to_string(),
            InfoEvent::DelayChanged(d) => format!("Step delay: {} ms", d.as_millis()),
        }
    }
}

/// Non-animated report printed by `--json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
    pub status: String,
    pub run: GrowthRun,
    pub lines: Vec<String>,
}
