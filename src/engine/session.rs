//! Step animator state machine.
//!
//! `AnimationSession` holds everything one animation needs (run, cursor, log,
//! plotted curve) and is mutated only through `start` and `tick`.

use crate::format;
use crate::growth::GrowthError;
use crate::model::{GrowthParams, GrowthRun, PlotBounds};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimatorState {
    #[default]
    Idle,
    Running,
    Done,
}

/// Position of the next value to reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnimationCursor {
    pub position: usize,
    pub total: usize,
}

impl AnimationCursor {
    fn new(total: usize) -> Self {
        Self { position: 0, total }
    }

    pub fn is_terminal(&self) -> bool {
        self.position >= self.total
    }
}

/// Output of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickFrame {
    pub step: usize,
    pub value: f64,
    pub line: String,
}

#[derive(Debug, Default)]
pub struct AnimationSession {
    state: AnimatorState,
    run: Option<GrowthRun>,
    cursor: AnimationCursor,
    bounds: Option<PlotBounds>,
    log: Vec<String>,
    plotted: Vec<(f64, f64)>,
}

impl AnimationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a fresh run. On invalid input the session is left as it was.
    pub fn start(&mut self, params: GrowthParams) -> Result<&GrowthRun, GrowthError> {
        let run = params.compute()?;
        self.cursor = AnimationCursor::new(run.values.len());
        self.bounds = Some(run.plot_bounds());
        self.log.clear();
        self.plotted.clear();
        self.state = AnimatorState::Running;
        Ok(&*self.run.insert(run))
    }

    /// Reveal the next value. Returns `None` unless the session is running.
    pub fn tick(&mut self) -> Option<TickFrame> {
        if self.state != AnimatorState::Running {
            return None;
        }
        let run = self.run.as_ref()?;
        let step = self.cursor.position;
        let value = *run.values.get(step)?;
        let line = format::step_line(run.mode, step, value);

        self.log.push(line.clone());
        self.plotted.push((step as f64, value));
        self.cursor.position += 1;
        if self.cursor.is_terminal() {
            self.state = AnimatorState::Done;
        }

        Some(TickFrame { step, value, line })
    }

    pub fn state(&self) -> AnimatorState {
        self.state
    }

    pub fn cursor(&self) -> AnimationCursor {
        self.cursor
    }

    pub fn run(&self) -> Option<&GrowthRun> {
        self.run.as_ref()
    }

    pub fn bounds(&self) -> Option<PlotBounds> {
        self.bounds
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn plotted(&self) -> &[(f64, f64)] {
        &self.plotted
    }
}
