//! Run lifecycle controller.
//!
//! Owns start/cancel/restart orchestration and emits events for presentation layers.

use crate::engine::{AnimationEngine, EngineControl};
use crate::growth::GrowthError;
use crate::model::{AnimEvent, GrowthRun, InfoEvent, RunConfig};
use anyhow::Result;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Commands emitted by UI layers to control the animation.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Start(RunConfig),
    SetDelay(Duration),
    Pause(bool),
    Quit,
}

/// Internal handle for a running animation task.
struct RunCtx {
    ctrl_tx: UnboundedSender<EngineControl>,
    handle: Option<tokio::task::JoinHandle<Result<GrowthRun, GrowthError>>>,
}

/// Spawn a new animation and return its control handle.
fn start_run(cfg: RunConfig, event_tx: UnboundedSender<AnimEvent>) -> RunCtx {
    let (ctrl_tx, ctrl_rx) = tokio::sync::mpsc::unbounded_channel::<EngineControl>();
    let engine = AnimationEngine::new(cfg);
    let handle = tokio::spawn(async move { engine.run(event_tx, ctrl_rx).await });
    RunCtx {
        ctrl_tx,
        handle: Some(handle),
    }
}

/// Orchestrate animations based on UI commands and emit events back to presentation layers.
pub(crate) async fn run_controller(
    launch: Option<RunConfig>,
    event_tx: UnboundedSender<AnimEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut run_ctx = launch.map(|cfg| start_run(cfg, event_tx.clone()));
    let mut pending_start: Option<RunConfig> = None;
    let mut quit_pending = false;
    // Last delay chosen by the operator; applies to every run started afterwards.
    let mut delay: Option<Duration> = None;

    let res = loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Start(mut cfg)) => {
                        if let Some(d) = delay {
                            cfg.delay = d;
                        }
                        // Restart is serialized: cancel the active run first, then start the new
                        // one once we observe completion. Two tick chains never overlap.
                        if let Some(ctx) = &run_ctx {
                            tracing::info!("cancelling active animation before restart");
                            let _ = ctx.ctrl_tx.send(EngineControl::Cancel);
                            pending_start = Some(cfg);
                        } else {
                            run_ctx = Some(start_run(cfg, event_tx.clone()));
                        }
                    }
                    Some(UiCommand::SetDelay(d)) => {
                        delay = Some(d);
                        if let Some(ctx) = &run_ctx {
                            let _ = ctx.ctrl_tx.send(EngineControl::SetDelay(d));
                        }
                        if let Some(cfg) = pending_start.as_mut() {
                            cfg.delay = d;
                        }
                    }
                    Some(UiCommand::Pause(p)) => {
                        if let Some(ctx) = &run_ctx {
                            let _ = ctx.ctrl_tx.send(EngineControl::Pause(p));
                        }
                    }
                    Some(UiCommand::Quit) | None => {
                        // Quit waits for the current run to finish so no task outlives the controller.
                        quit_pending = true;
                        pending_start = None;
                        if let Some(ctx) = &run_ctx {
                            let _ = ctx.ctrl_tx.send(EngineControl::Cancel);
                        } else {
                            break Ok(());
                        }
                    }
                }
            }
            // Do not take the JoinHandle before this branch wins; otherwise it can be dropped
            // if another select branch is chosen, and we'll never observe completion.
            maybe_done = async {
                if let Some(ctx) = &mut run_ctx {
                    if let Some(h) = ctx.handle.as_mut() {
                        return Some(h.await);
                    }
                }
                futures::future::pending().await
            } => {
                if let Some(join_res) = maybe_done {
                    if let Some(ctx) = &mut run_ctx {
                        ctx.handle.take();
                    }
                    match join_res {
                        Ok(Ok(run)) => {
                            let _ = event_tx.send(AnimEvent::RunCompleted { run: Box::new(run) });
                        }
                        Ok(Err(GrowthError::Cancelled)) => {
                            tracing::debug!("animation cancelled");
                        }
                        Ok(Err(e)) => {
                            let _ = event_tx.send(AnimEvent::Info(InfoEvent::Message(e.to_string())));
                        }
                        Err(e) => {
                            let _ = event_tx.send(AnimEvent::Info(InfoEvent::Message(format!(
                                "Animation task failed: {e}"
                            ))));
                        }
                    }
                    run_ctx = None;
                    if quit_pending {
                        break Ok(());
                    }
                    if let Some(cfg) = pending_start.take() {
                        tracing::info!("starting queued animation");
                        run_ctx = Some(start_run(cfg, event_tx.clone()));
                    }
                }
            }
        }
    };

    res
}
