//! Text formatting for step lines, status messages and chart labels.

use crate::model::GrowthMode;

pub const CHART_TITLE: &str = "Exponential Growth";
pub const X_AXIS_TITLE: &str = "Step";

/// Dollar amount: grouped with two decimals below one million, scientific above.
pub fn format_dollars(value: f64) -> String {
    if value < 1e6 {
        format!("${}", group_thousands(&format!("{value:.2}")))
    } else {
        format!("${}", scientific(value))
    }
}

/// Display for a log10(dollars) value; no conversion back to linear scale.
pub fn format_log_dollars(log_value: f64) -> String {
    format!("value ≈ $10^{log_value:.2}")
}

pub fn format_value(mode: GrowthMode, value: f64) -> String {
    match mode {
        GrowthMode::Raw => format_dollars(value),
        GrowthMode::LogDollars => format_log_dollars(value),
    }
}

/// One line of the step log.
pub fn step_line(mode: GrowthMode, step: usize, value: f64) -> String {
    format!("Step {step}: {}", format_value(mode, value))
}

pub fn mode_status(mode: GrowthMode) -> &'static str {
    match mode {
        GrowthMode::Raw => "Showing raw dollar values",
        GrowthMode::LogDollars => "Values too large → showing log₁₀(dollars)",
    }
}

pub fn y_axis_title(mode: GrowthMode) -> &'static str {
    match mode {
        GrowthMode::Raw => "Dollars ($)",
        GrowthMode::LogDollars => "log₁₀(Dollars)",
    }
}

/// Short label for a y-axis bound.
pub fn format_axis_value(mode: GrowthMode, value: f64) -> String {
    match mode {
        GrowthMode::Raw => format_dollars(value),
        GrowthMode::LogDollars => format!("{value:.2}"),
    }
}

/// Insert commas into the integer part of an already-rounded decimal string.
fn group_thousands(fixed: &str) -> String {
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// `1.50e+06` style: two decimals, signed exponent of at least two digits.
fn scientific(value: f64) -> String {
    let s = format!("{value:.2e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        None => s,
    }
}
