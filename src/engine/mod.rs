mod session;

pub use session::{AnimationSession, AnimatorState};

use crate::growth::GrowthError;
use crate::model::{clamp_delay, AnimEvent, GrowthRun, InfoEvent, RunConfig};
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Longest single sleep while waiting, so pause and cancel are noticed promptly.
const POLL_SLICE: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub enum EngineControl {
    /// Pause (true) or resume (false) between ticks
    Pause(bool),
    /// Delay before the next tick; applies from the next wait on
    SetDelay(Duration),
    /// Stop the animation; no further ticks
    Cancel,
}

pub struct AnimationEngine {
    cfg: RunConfig,
}

impl AnimationEngine {
    pub fn new(cfg: RunConfig) -> Self {
        Self { cfg }
    }

    pub async fn run(
        self,
        event_tx: mpsc::UnboundedSender<AnimEvent>,
        mut control_rx: mpsc::UnboundedReceiver<EngineControl>,
    ) -> Result<GrowthRun, GrowthError> {
        let mut session = AnimationSession::new();
        let run = session.start(self.cfg.params)?.clone();
        let bounds = session.bounds().unwrap_or_else(|| run.plot_bounds());

        tracing::info!(
            initial = run.initial,
            factor = run.factor,
            steps = run.step_count,
            mode = ?run.mode,
            "animation started"
        );
        let _ = event_tx.send(AnimEvent::RunStarted {
            run: Box::new(run.clone()),
            bounds,
        });

        let paused = Arc::new(AtomicBool::new(false));
        let cancel = Arc::new(AtomicBool::new(false));
        let delay_ms = Arc::new(AtomicU64::new(millis(clamp_delay(self.cfg.delay))));

        // Control listener.
        let paused2 = paused.clone();
        let cancel2 = cancel.clone();
        let delay2 = delay_ms.clone();
        let info_tx = event_tx.clone();
        let control_handle = tokio::spawn(async move {
            while let Some(msg) = control_rx.recv().await {
                match msg {
                    EngineControl::Pause(p) => {
                        paused2.store(p, Ordering::Relaxed);
                        let _ = info_tx.send(AnimEvent::Info(InfoEvent::Paused(p)));
                    }
                    EngineControl::SetDelay(d) => {
                        let d = clamp_delay(d);
                        delay2.store(millis(d), Ordering::Relaxed);
                        let _ = info_tx.send(AnimEvent::Info(InfoEvent::DelayChanged(d)));
                    }
                    EngineControl::Cancel => {
                        cancel2.store(true, Ordering::Relaxed);
                        break;
                    }
                }
            }
        });

        let outcome = loop {
            if cancel.load(Ordering::Relaxed) {
                break Err(GrowthError::Cancelled);
            }
            let Some(frame) = session.tick() else {
                break Ok(());
            };
            tracing::debug!(step = frame.step, value = frame.value, "tick");
            let _ = event_tx.send(AnimEvent::Tick {
                step: frame.step,
                value: frame.value,
                line: frame.line,
            });
            if session.state() == AnimatorState::Done {
                break Ok(());
            }

            // Delay is read fresh for every tick so slider moves apply mid-run.
            let delay = Duration::from_millis(delay_ms.load(Ordering::Relaxed));
            if !wait_for_next_tick(delay, &paused, &cancel).await {
                break Err(GrowthError::Cancelled);
            }
        };

        // Dropping a JoinHandle does not stop the task; abort it explicitly.
        control_handle.abort();

        match outcome {
            Ok(()) => {
                tracing::info!(steps = run.step_count, "animation finished");
                Ok(run)
            }
            Err(e) => {
                tracing::info!(
                    at_step = session.cursor().position,
                    revealed = session.plotted().len(),
                    "animation cancelled"
                );
                Err(e)
            }
        }
    }
}

/// Sleep for `delay`, holding while paused. Returns false if cancelled.
async fn wait_for_next_tick(delay: Duration, paused: &AtomicBool, cancel: &AtomicBool) -> bool {
    let deadline = Instant::now() + delay;
    loop {
        if cancel.load(Ordering::Relaxed) {
            return false;
        }
        if paused.load(Ordering::Relaxed) {
            tokio::time::sleep(POLL_SLICE).await;
            continue;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        tokio::time::sleep((deadline - now).min(POLL_SLICE)).await;
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GrowthMode, GrowthParams};

    fn cfg(step_count: usize, delay_ms: u64) -> RunConfig {
        RunConfig {
            params: GrowthParams {
                initial: 1.0,
                factor: 2.0,
                step_count,
            },
            delay: Duration::from_millis(delay_ms),
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<AnimEvent>) -> Vec<AnimEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    fn tick_steps(events: &[AnimEvent]) -> Vec<usize> {
        events
            .iter()
            .filter_map(|ev| match ev {
                AnimEvent::Tick { step, .. } => Some(*step),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn three_steps_emit_four_ticks() {
        let (evt_tx, mut evt_rx) = mpsc::unbounded_channel();
        let (_ctrl_tx, ctrl_rx) = mpsc::unbounded_channel();

        let run = AnimationEngine::new(cfg(3, 100))
            .run(evt_tx, ctrl_rx)
            .await
            .unwrap();
        assert_eq!(run.mode, GrowthMode::Raw);

        let events = drain(&mut evt_rx);
        assert!(matches!(events.first(), Some(AnimEvent::RunStarted { .. })));
        assert_eq!(tick_steps(&events), vec![0, 1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_are_spaced_by_delay() {
        let (evt_tx, _evt_rx) = mpsc::unbounded_channel();
        let (_ctrl_tx, ctrl_rx) = mpsc::unbounded_channel();

        let start = Instant::now();
        AnimationEngine::new(cfg(4, 500))
            .run(evt_tx, ctrl_rx)
            .await
            .unwrap();
        // Four waits between five ticks, none after the last.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(2000));
        assert!(elapsed < Duration::from_millis(2100));
    }

    #[tokio::test(start_paused = true)]
    async fn closed_control_channel_does_not_cancel() {
        let (evt_tx, mut evt_rx) = mpsc::unbounded_channel();
        let (_, ctrl_rx) = mpsc::unbounded_channel();

        AnimationEngine::new(cfg(2, 100))
            .run(evt_tx, ctrl_rx)
            .await
            .unwrap();
        assert_eq!(tick_steps(&drain(&mut evt_rx)), vec![0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_further_ticks() {
        let (evt_tx, mut evt_rx) = mpsc::unbounded_channel();
        let (ctrl_tx, ctrl_rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(AnimationEngine::new(cfg(10, 1000)).run(evt_tx, ctrl_rx));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        ctrl_tx.send(EngineControl::Cancel).unwrap();

        let res = handle.await.unwrap();
        assert_eq!(res, Err(GrowthError::Cancelled));
        assert_eq!(tick_steps(&drain(&mut evt_rx)), vec![0, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_change_applies_to_next_wait() {
        let (evt_tx, _evt_rx) = mpsc::unbounded_channel();
        let (ctrl_tx, ctrl_rx) = mpsc::unbounded_channel();

        let start = Instant::now();
        let handle = tokio::spawn(AnimationEngine::new(cfg(3, 1000)).run(evt_tx, ctrl_rx));
        ctrl_tx
            .send(EngineControl::SetDelay(Duration::from_millis(200)))
            .unwrap();
        handle.await.unwrap().unwrap();
        // Unchanged, the three waits would total 3000 ms.
        assert!(start.elapsed() < Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_holds_ticks() {
        let (evt_tx, mut evt_rx) = mpsc::unbounded_channel();
        let (ctrl_tx, ctrl_rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(AnimationEngine::new(cfg(3, 100)).run(evt_tx, ctrl_rx));
        ctrl_tx.send(EngineControl::Pause(true)).unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(tick_steps(&drain(&mut evt_rx)), vec![0]);

        ctrl_tx.send(EngineControl::Pause(false)).unwrap();
        handle.await.unwrap().unwrap();
        assert_eq!(tick_steps(&drain(&mut evt_rx)), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn invalid_params_fail_without_events() {
        let (evt_tx, mut evt_rx) = mpsc::unbounded_channel();
        let (_ctrl_tx, ctrl_rx) = mpsc::unbounded_channel();
        let mut c = cfg(3, 100);
        c.params.factor = 0.0;

        let res = AnimationEngine::new(c).run(evt_tx, ctrl_rx).await;
        assert!(matches!(res, Err(GrowthError::InvalidInput { .. })));
        assert!(evt_rx.try_recv().is_err());
    }
}
