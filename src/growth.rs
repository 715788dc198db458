//! Growth calculator.
//!
//! Produces `initial * factor^n` for every step, falling back to log10(dollars)
//! for the whole run when any raw term would overflow.

use crate::model::{GrowthMode, GrowthParams, GrowthRun, PlotBounds};
use std::fmt;

/// Raw terms above this switch the run to `GrowthMode::LogDollars`.
pub const OVERFLOW_THRESHOLD: f64 = 1e308;

/// Largest accepted step count.
pub const MAX_STEPS: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Initial,
    Factor,
    Steps,
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputField::Initial => "initial amount",
            InputField::Factor => "growth factor",
            InputField::Steps => "number of steps",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GrowthError {
    /// Rejected input; nothing was computed.
    #[error("Invalid input: {field} {reason}")]
    InvalidInput {
        field: InputField,
        reason: &'static str,
    },

    /// The animation was cancelled before reaching its last step.
    #[error("animation cancelled")]
    Cancelled,
}

impl GrowthError {
    fn invalid(field: InputField, reason: &'static str) -> Self {
        GrowthError::InvalidInput { field, reason }
    }
}

impl GrowthParams {
    pub fn new(initial: f64, factor: f64, step_count: usize) -> Result<Self, GrowthError> {
        validate_amount(InputField::Initial, initial)?;
        validate_amount(InputField::Factor, factor)?;
        if step_count > MAX_STEPS {
            return Err(GrowthError::invalid(InputField::Steps, "is too large"));
        }
        Ok(Self {
            initial,
            factor,
            step_count,
        })
    }

    pub fn compute(&self) -> Result<GrowthRun, GrowthError> {
        compute(self.initial, self.factor, self.step_count)
    }
}

fn validate_amount(field: InputField, v: f64) -> Result<(), GrowthError> {
    if !v.is_finite() {
        return Err(GrowthError::invalid(field, "must be a finite number"));
    }
    if v <= 0.0 {
        return Err(GrowthError::invalid(field, "must be positive"));
    }
    Ok(())
}

/// Parse the three text inputs of the dashboard form.
pub fn parse_inputs(initial: &str, factor: &str, steps: &str) -> Result<GrowthParams, GrowthError> {
    let initial = parse_amount(InputField::Initial, initial)?;
    let factor = parse_amount(InputField::Factor, factor)?;
    let steps = steps.trim();
    let step_count = match steps.parse::<i64>() {
        Ok(n) if n < 0 => return Err(GrowthError::invalid(InputField::Steps, "must not be negative")),
        Ok(n) => usize::try_from(n)
            .map_err(|_| GrowthError::invalid(InputField::Steps, "is too large"))?,
        Err(_) => return Err(GrowthError::invalid(InputField::Steps, "must be a whole number")),
    };
    GrowthParams::new(initial, factor, step_count)
}

fn parse_amount(field: InputField, s: &str) -> Result<f64, GrowthError> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| GrowthError::invalid(field, "must be a number"))
}

/// Compute the value sequence for a run.
pub fn compute(initial: f64, factor: f64, step_count: usize) -> Result<GrowthRun, GrowthError> {
    GrowthParams::new(initial, factor, step_count)?;

    let mut values = Vec::with_capacity(step_count + 1);
    let mut mode = GrowthMode::Raw;
    for n in 0..=step_count {
        let v = initial * pow(factor, n);
        if !v.is_finite() || v > OVERFLOW_THRESHOLD {
            mode = GrowthMode::LogDollars;
            break;
        }
        values.push(v);
    }

    if mode == GrowthMode::LogDollars {
        tracing::info!(
            initial,
            factor,
            step_count,
            "raw values overflow, switching run to log10(dollars)"
        );
        let log_initial = initial.log10();
        let log_factor = factor.log10();
        values = (0..=step_count)
            .map(|n| log_initial + n as f64 * log_factor)
            .collect();
    }

    Ok(GrowthRun {
        initial,
        factor,
        step_count,
        mode,
        values,
    })
}

fn pow(base: f64, n: usize) -> f64 {
    match i32::try_from(n) {
        Ok(n) => base.powi(n),
        Err(_) => base.powf(n as f64),
    }
}

impl GrowthRun {
    /// x spans every step; y starts at zero for dollars and at the smallest value for logs.
    pub fn plot_bounds(&self) -> PlotBounds {
        let max = self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let y = match self.mode {
            GrowthMode::Raw => [0.0, max],
            GrowthMode::LogDollars => {
                let min = self.values.iter().copied().fold(f64::INFINITY, f64::min);
                [min, max]
            }
        };
        PlotBounds {
            x: [0.0, self.step_count as f64],
            y,
        }
    }
}
