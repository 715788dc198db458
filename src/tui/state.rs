use crate::engine::AnimatorState;
use crate::format;
use crate::growth::{self, GrowthError, InputField};
use crate::model::{
    clamp_delay, AnimEvent, GrowthMode, PlotBounds, RunConfig, DEFAULT_DELAY, DELAY_STEP,
};
use std::time::Duration;

pub const FIELDS: [InputField; 3] = [InputField::Initial, InputField::Factor, InputField::Steps];

pub struct UiState {
    pub tab: usize,
    pub paused: bool,
    pub info: String,

    // Form inputs, kept as typed text until Start parses them
    pub initial_input: String,
    pub factor_input: String,
    pub steps_input: String,
    pub focus: usize,
    pub delay: Duration,

    // Mirror of the engine's session
    pub phase: AnimatorState,
    pub mode: Option<GrowthMode>,
    pub step_count: usize,
    pub bounds: Option<PlotBounds>,
    pub log: Vec<String>,
    pub points: Vec<(f64, f64)>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tab: 0,
            paused: false,
            info: String::new(),
            initial_input: String::new(),
            factor_input: String::new(),
            steps_input: String::new(),
            focus: 0,
            delay: DEFAULT_DELAY,
            phase: AnimatorState::Idle,
            mode: None,
            step_count: 0,
            bounds: None,
            log: Vec::new(),
            points: Vec::new(),
        }
    }
}

/// Non-digit characters accepted by the numeric inputs.
pub const NUMERIC_SYMBOLS: [char; 5] = ['.', '+', '-', 'e', 'E'];

fn is_numeric_char(c: char) -> bool {
    c.is_ascii_digit() || NUMERIC_SYMBOLS.contains(&c)
}

impl UiState {
    pub fn focused_field(&self) -> InputField {
        FIELDS[self.focus % FIELDS.len()]
    }

    pub fn input(&self, field: InputField) -> &str {
        match field {
            InputField::Initial => &self.initial_input,
            InputField::Factor => &self.factor_input,
            InputField::Steps => &self.steps_input,
        }
    }

    fn input_mut(&mut self, field: InputField) -> &mut String {
        match field {
            InputField::Initial => &mut self.initial_input,
            InputField::Factor => &mut self.factor_input,
            InputField::Steps => &mut self.steps_input,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % FIELDS.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + FIELDS.len() - 1) % FIELDS.len();
    }

    /// Returns false for characters a numeric field does not accept.
    pub fn type_char(&mut self, c: char) -> bool {
        if !is_numeric_char(c) {
            return false;
        }
        let field = self.focused_field();
        self.input_mut(field).push(c);
        true
    }

    pub fn backspace(&mut self) {
        let field = self.focused_field();
        self.input_mut(field).pop();
    }

    /// Move the delay slider by whole steps, clamped to its range.
    pub fn nudge_delay(&mut self, faster: bool) -> Duration {
        self.delay = if faster {
            clamp_delay(self.delay.saturating_sub(DELAY_STEP))
        } else {
            clamp_delay(self.delay + DELAY_STEP)
        };
        self.delay
    }

    /// Parse the form into a run config. Leaves the current run untouched on error.
    pub fn build_run_config(&self) -> Result<RunConfig, GrowthError> {
        let params = growth::parse_inputs(&self.initial_input, &self.factor_input, &self.steps_input)?;
        Ok(RunConfig {
            params,
            delay: self.delay,
        })
    }

    pub fn apply_event(&mut self, ev: AnimEvent) {
        match ev {
            AnimEvent::RunStarted { run, bounds } => {
                self.phase = AnimatorState::Running;
                self.paused = false;
                self.mode = Some(run.mode);
                self.step_count = run.step_count;
                self.bounds = Some(bounds);
                self.log.clear();
                self.points.clear();
                self.info = format::mode_status(run.mode).to_string();
            }
            AnimEvent::Tick { step, value, line } => {
                self.log.push(line);
                self.points.push((step as f64, value));
            }
            AnimEvent::Info(info) => self.info = info.to_message(),
            AnimEvent::RunCompleted { run } => {
                self.phase = AnimatorState::Done;
                self.info = format!(
                    "{} (done, {} steps)",
                    format::mode_status(run.mode),
                    run.step_count
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::growth::compute;

    fn started(state: &mut UiState, initial: f64, factor: f64, steps: usize) {
        let run = compute(initial, factor, steps).unwrap();
        let bounds = run.plot_bounds();
        state.apply_event(AnimEvent::RunStarted {
            run: Box::new(run),
            bounds,
        });
    }

    #[test]
    fn typing_edits_focused_field() {
        let mut s = UiState::default();
        assert!(s.type_char('1'));
        assert!(s.type_char('.'));
        assert!(!s.type_char('x'));
        s.focus_next();
        s.type_char('2');
        s.focus_next();
        s.type_char('9');
        s.backspace();
        s.type_char('5');
        assert_eq!(s.initial_input, "1.");
        assert_eq!(s.factor_input, "2");
        assert_eq!(s.steps_input, "5");

        s.focus_next();
        assert_eq!(s.focused_field(), InputField::Initial);
        s.focus_prev();
        assert_eq!(s.focused_field(), InputField::Steps);
    }

    #[test]
    fn delay_slider_is_clamped() {
        let mut s = UiState::default();
        assert_eq!(s.nudge_delay(false), Duration::from_millis(600));
        for _ in 0..30 {
            s.nudge_delay(false);
        }
        assert_eq!(s.delay, Duration::from_millis(2000));
        for _ in 0..30 {
            s.nudge_delay(true);
        }
        assert_eq!(s.delay, Duration::from_millis(100));
    }

    #[test]
    fn build_run_config_validates_form() {
        let mut s = UiState {
            initial_input: "100".into(),
            factor_input: "2".into(),
            steps_input: "3".into(),
            ..Default::default()
        };
        let cfg = s.build_run_config().unwrap();
        assert_eq!(cfg.params.step_count, 3);
        assert_eq!(cfg.delay, DEFAULT_DELAY);

        s.factor_input = "-1".into();
        assert!(s.build_run_config().is_err());
    }

    #[test]
    fn run_started_resets_mirror() {
        let mut s = UiState::default();
        s.log.push("stale".into());
        s.points.push((0.0, 1.0));
        started(&mut s, 100.0, 10.0, 400);
        assert_eq!(s.phase, AnimatorState::Running);
        assert_eq!(s.mode, Some(GrowthMode::LogDollars));
        assert!(s.log.is_empty());
        assert!(s.points.is_empty());
        assert_eq!(s.info, "Values too large → showing log₁₀(dollars)");
    }

    #[test]
    fn ticks_and_completion() {
        let mut s = UiState::default();
        started(&mut s, 1.0, 2.0, 1);
        s.apply_event(AnimEvent::Tick {
            step: 0,
            value: 1.0,
            line: "Step 0: $1.00".into(),
        });
        s.apply_event(AnimEvent::Tick {
            step: 1,
            value: 2.0,
            line: "Step 1: $2.00".into(),
        });
        assert_eq!(s.points, vec![(0.0, 1.0), (1.0, 2.0)]);
        assert_eq!(s.log.len(), 2);

        let run = compute(1.0, 2.0, 1).unwrap();
        s.apply_event(AnimEvent::RunCompleted { run: Box::new(run) });
        assert_eq!(s.phase, AnimatorState::Done);
        assert!(s.info.contains("done"));
    }
}
