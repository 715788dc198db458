use crate::engine::AnimationEngine;
use crate::engine::AnimationSession;
use crate::format;
use crate::growth::GrowthError;
use crate::model::{clamp_delay, AnimEvent, GrowthParams, RunConfig, RunReport};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
#[derive(Debug, PartialEq)]
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "exp-growth",
    version,
    about = "Animate exponential growth of a dollar amount, step by step"
)]
pub struct Cli {
    /// Initial amount in dollars (must be positive)
    #[arg(long, env = "EXP_GROWTH_INITIAL", default_value_t = 100.0, allow_negative_numbers = true)]
    pub initial: f64,

    /// Growth factor applied at every step (must be positive)
    #[arg(long, env = "EXP_GROWTH_FACTOR", default_value_t = 1.5, allow_negative_numbers = true)]
    pub factor: f64,

    /// Number of steps after the initial value
    #[arg(long, env = "EXP_GROWTH_STEPS", default_value_t = 20)]
    pub steps: u64,

    /// Delay between steps, clamped to 100ms..2s
    #[arg(long, env = "EXP_GROWTH_DELAY", default_value = "500ms")]
    pub delay: humantime::Duration,

    /// Print the computed run as JSON and exit (no animation, no TUI)
    #[arg(long, conflicts_with = "text")]
    pub json: bool,

    /// Animate in plain text on stdout (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Start animating the command-line values when the TUI launches
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub start_on_launch: bool,

    /// Write logs to this file (RUST_LOG controls the level)
    #[arg(long, env = "EXP_GROWTH_LOG_FILE")]
    pub log_file: Option<std::path::PathBuf>,
}

impl Cli {
    pub fn is_tui(&self) -> bool {
        cfg!(feature = "tui") && !self.json && !self.text
    }
}

pub async fn run(args: Cli) -> Result<()> {
    if args.json {
        return run_json(&args);
    }

    if !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
    }

    run_text(args).await
}

/// Build a validated `RunConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> Result<RunConfig> {
    let step_count = usize::try_from(args.steps).context("--steps is too large")?;
    let params = GrowthParams::new(args.initial, args.factor, step_count)?;
    Ok(RunConfig {
        params,
        delay: clamp_delay(Duration::from(args.delay)),
    })
}

/// Step a session to the end without waiting and collect the report.
fn build_report(cfg: RunConfig) -> Result<RunReport> {
    let mut session = AnimationSession::new();
    session.start(cfg.params)?;
    while session.tick().is_some() {}
    let run = session
        .run()
        .cloned()
        .context("run missing after start")?;

    Ok(RunReport {
        delay: cfg.delay,
        status: format::mode_status(run.mode).to_string(),
        lines: session.log().to_vec(),
        run,
    })
}

/// Compute the whole run at once and print it as a JSON report.
fn run_json(args: &Cli) -> Result<()> {
    let report = build_report(build_config(args)?)?;
    let out = serde_json::to_string_pretty(&report)?;
    println!("{out}");
    Ok(())
}

/// Step lines go to stdout; status and info go to stderr.
fn route_event(ev: AnimEvent) -> Option<OutputLine> {
    match ev {
        AnimEvent::RunStarted { run, .. } => Some(OutputLine::Stderr(
            format::mode_status(run.mode).to_string(),
        )),
        AnimEvent::Tick { line, .. } => Some(OutputLine::Stdout(line)),
        AnimEvent::Info(info) => Some(OutputLine::Stderr(info.to_message())),
        AnimEvent::RunCompleted { .. } => None,
    }
}

async fn run_text(args: Cli) -> Result<()> {
    let cfg = build_config(&args)?;
    let (out_tx, out_handle) = spawn_output_writer();
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<AnimEvent>();
    let (ctrl_tx, ctrl_rx) = mpsc::unbounded_channel();

    let engine = AnimationEngine::new(cfg);
    let handle = tokio::spawn(async move { engine.run(evt_tx, ctrl_rx).await });

    // Ctrl-C cancels the animation instead of killing the process mid-line.
    let ctrl_c_tx = ctrl_tx.clone();
    let signal_handle = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = ctrl_c_tx.send(crate::engine::EngineControl::Cancel);
        }
    });

    while let Some(ev) = evt_rx.recv().await {
        if let Some(line) = route_event(ev) {
            let _ = out_tx.send(line);
        }
    }
    signal_handle.abort();
    drop(ctrl_tx);

    let result = handle.await.context("animation task failed")?;
    match result {
        Ok(_) => {}
        Err(GrowthError::Cancelled) => {
            let _ = out_tx.send(OutputLine::Stderr("Cancelled".into()));
        }
        Err(e) => return Err(e.into()),
    }

    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GrowthMode, InfoEvent};

    #[test]
    fn defaults_build_valid_config() {
        let args = Cli::try_parse_from(["exp-growth"]).unwrap();
        let cfg = build_config(&args).unwrap();
        assert_eq!(cfg.params.initial, 100.0);
        assert_eq!(cfg.params.factor, 1.5);
        assert_eq!(cfg.params.step_count, 20);
        assert_eq!(cfg.delay, Duration::from_millis(500));
        assert!(args.start_on_launch);
    }

    #[test]
    fn delay_is_clamped() {
        let args = Cli::try_parse_from(["exp-growth", "--delay", "5s"]).unwrap();
        assert_eq!(build_config(&args).unwrap().delay, Duration::from_millis(2000));
        let args = Cli::try_parse_from(["exp-growth", "--delay", "10ms"]).unwrap();
        assert_eq!(build_config(&args).unwrap().delay, Duration::from_millis(100));
    }

    #[test]
    fn non_positive_values_are_rejected() {
        let args = Cli::try_parse_from(["exp-growth", "--initial", "-5"]).unwrap();
        let err = build_config(&args).unwrap_err();
        assert!(err.to_string().contains("initial amount must be positive"));

        let args = Cli::try_parse_from(["exp-growth", "--factor", "0"]).unwrap();
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn non_numeric_values_fail_to_parse() {
        assert!(Cli::try_parse_from(["exp-growth", "--initial", "lots"]).is_err());
        assert!(Cli::try_parse_from(["exp-growth", "--steps", "-1"]).is_err());
        assert!(Cli::try_parse_from(["exp-growth", "--json", "--text"]).is_err());
    }

    #[test]
    fn output_modes() {
        let args = Cli::try_parse_from(["exp-growth", "--json"]).unwrap();
        assert!(!args.is_tui());
        let args = Cli::try_parse_from(["exp-growth", "--text"]).unwrap();
        assert!(!args.is_tui());
    }

    #[test]
    fn json_report_for_overflowing_run() {
        let args = Cli::try_parse_from([
            "exp-growth", "--json", "--initial", "100", "--factor", "10", "--steps", "400",
        ])
        .unwrap();
        let report = build_report(build_config(&args).unwrap()).unwrap();
        assert_eq!(report.run.mode, GrowthMode::LogDollars);
        assert_eq!(report.lines.len(), 401);
        assert_eq!(report.lines[0], "Step 0: value ≈ $10^2.00");
        assert_eq!(report.status, format::mode_status(GrowthMode::LogDollars));

        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["run"]["mode"], "log_dollars");
        assert_eq!(json["delay"], "500ms");
        assert_eq!(json["lines"].as_array().unwrap().len(), 401);
    }

    #[test]
    fn json_report_for_raw_run() {
        let args = Cli::try_parse_from(["exp-growth", "--json", "--steps", "3", "--delay", "1s"]).unwrap();
        let report = build_report(build_config(&args).unwrap()).unwrap();
        assert_eq!(report.run.mode, GrowthMode::Raw);
        assert_eq!(report.lines.len(), 4);
        assert_eq!(report.lines[0], "Step 0: $100.00");
        assert_eq!(report.status, format::mode_status(GrowthMode::Raw));
        assert_eq!(serde_json::to_value(&report).unwrap()["delay"], "1s");
    }

    #[test]
    fn oversized_steps_fail_before_computing() {
        let args = Cli::try_parse_from(["exp-growth", "--json", "--steps", "100000000000"]).unwrap();
        let err = build_config(&args).unwrap_err();
        assert!(err.to_string().contains("number of steps is too large"));
    }

    #[test]
    fn text_mode_routes_lines_by_stream() {
        let run = crate::growth::compute(100.0, 10.0, 400).unwrap();
        let bounds = run.plot_bounds();
        assert_eq!(
            route_event(AnimEvent::RunStarted {
                run: Box::new(run.clone()),
                bounds,
            }),
            Some(OutputLine::Stderr(
                format::mode_status(GrowthMode::LogDollars).to_string()
            ))
        );
        assert_eq!(
            route_event(AnimEvent::Tick {
                step: 0,
                value: 2.0,
                line: "Step 0: value ≈ $10^2.00".into(),
            }),
            Some(OutputLine::Stdout("Step 0: value ≈ $10^2.00".into()))
        );
        let info = InfoEvent::Paused(true);
        assert_eq!(
            route_event(AnimEvent::Info(info.clone())),
            Some(OutputLine::Stderr(info.to_message()))
        );
        assert_eq!(
            route_event(AnimEvent::RunCompleted { run: Box::new(run) }),
            None
        );
    }
}
