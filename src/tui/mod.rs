mod charts;
mod help;
mod state;

use crate::cli::Cli;
use crate::engine::AnimatorState;
use crate::model::{AnimEvent, MAX_DELAY, MIN_DELAY};
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, LineGauge, Paragraph, Tabs, Wrap},
    Terminal,
};
use state::{UiState, FIELDS};
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    // Unbounded channels avoid backpressure between the animation task and the render loop.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<AnimEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let launch = if args.start_on_launch {
        Some(crate::cli::build_config(&args)?)
    } else {
        None
    };

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_args = args.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_args, event_rx, cmd_tx));

    let res = orchestrator::run_controller(launch, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    args: Cli,
    mut event_rx: UnboundedReceiver<AnimEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState {
        initial_input: args.initial.to_string(),
        factor_input: args.factor.to_string(),
        steps_input: args.steps.to_string(),
        delay: crate::model::clamp_delay(Duration::from(args.delay)),
        ..Default::default()
    };

    let tick_rate = Duration::from_millis(50);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep the UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match handle_key(&mut state, k) {
                    KeyOutcome::Quit => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    KeyOutcome::Command(cmd) => {
                        let _ = cmd_tx.send(cmd);
                    }
                    KeyOutcome::Handled => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();
    res
}

#[derive(Debug)]
enum KeyOutcome {
    Handled,
    Command(UiCommand),
    Quit,
}

fn handle_key(state: &mut UiState, k: KeyEvent) -> KeyOutcome {
    match (k.modifiers, k.code) {
        (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => KeyOutcome::Quit,
        (_, KeyCode::Tab) => {
            state.tab = (state.tab + 1) % 2;
            KeyOutcome::Handled
        }
        (_, KeyCode::Char('?')) => {
            state.tab = 1;
            KeyOutcome::Handled
        }
        (_, KeyCode::Enter) | (_, KeyCode::Char('s')) => match state.build_run_config() {
            Ok(cfg) => {
                state.tab = 0;
                state.info = if state.phase == AnimatorState::Running {
                    "Restarting…".into()
                } else {
                    "Starting…".into()
                };
                KeyOutcome::Command(UiCommand::Start(cfg))
            }
            Err(e) => {
                tracing::warn!(error = %e, "rejected form input");
                state.info = e.to_string();
                KeyOutcome::Handled
            }
        },
        (_, KeyCode::Char('p')) => {
            if state.phase != AnimatorState::Running {
                return KeyOutcome::Handled;
            }
            state.paused = !state.paused;
            KeyOutcome::Command(UiCommand::Pause(state.paused))
        }
        (_, KeyCode::Left) => KeyOutcome::Command(UiCommand::SetDelay(state.nudge_delay(true))),
        (_, KeyCode::Right) => KeyOutcome::Command(UiCommand::SetDelay(state.nudge_delay(false))),
        (_, KeyCode::Up) => {
            state.focus_prev();
            KeyOutcome::Handled
        }
        (_, KeyCode::Down) => {
            state.focus_next();
            KeyOutcome::Handled
        }
        (_, KeyCode::Backspace) => {
            state.backspace();
            KeyOutcome::Handled
        }
        (_, KeyCode::Char(c)) => {
            state.type_char(c);
            KeyOutcome::Handled
        }
        _ => KeyOutcome::Handled,
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let tabs = Tabs::new(vec![Line::from("Dashboard"), Line::from("Help")])
        .select(state.tab)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Exponential Growth Demo"),
        )
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        0 => draw_dashboard(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f),
    }
}

fn draw_dashboard(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(44), Constraint::Min(20)].as_ref())
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(8), // Inputs + delay slider + start action
                Constraint::Min(3),    // Step log
                Constraint::Length(4), // Status
            ]
            .as_ref(),
        )
        .split(columns[0]);

    draw_inputs(left[0], f, state);
    draw_log(left[1], f, state);
    draw_status(left[2], f, state);
    charts::render_growth_chart(f, columns[1], state);
}

fn draw_inputs(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let block = Block::default().borders(Borders::ALL).title("Inputs");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(inner);

    for (i, field) in FIELDS.iter().enumerate() {
        let focused = i == state.focus;
        let label = match field {
            crate::growth::InputField::Initial => "Initial Amount ($):",
            crate::growth::InputField::Factor => "Growth Factor:     ",
            crate::growth::InputField::Steps => "Number of Steps:   ",
        };
        let value_style = if focused {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default()
        };
        let cursor = if focused { "▏" } else { "" };
        let line = Line::from(vec![
            Span::styled(label, Style::default().fg(Color::Gray)),
            Span::raw(" "),
            Span::styled(state.input(*field).to_string(), value_style),
            Span::styled(cursor, Style::default().fg(Color::Yellow)),
        ]);
        f.render_widget(Paragraph::new(line), rows[i]);
    }

    let span_ms = (MAX_DELAY - MIN_DELAY).as_millis() as f64;
    let ratio = (state.delay.saturating_sub(MIN_DELAY).as_millis() as f64 / span_ms).clamp(0.0, 1.0);
    let slider = LineGauge::default()
        .filled_style(Style::default().fg(Color::Cyan))
        .label(format!("Step Speed {:>4} ms", state.delay.as_millis()))
        .ratio(ratio);
    f.render_widget(slider, rows[3]);

    let button_style = match state.phase {
        AnimatorState::Running => Style::default().fg(Color::Black).bg(Color::Green),
        _ => Style::default().fg(Color::Black).bg(Color::Cyan),
    };
    let button = Line::from(vec![Span::styled(" Start Animation (Enter) ", button_style)]);
    f.render_widget(Paragraph::new(button), rows[4]);
}

fn draw_log(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    // Follow the newest line like a text widget scrolled to the end.
    let visible = area.height.saturating_sub(2) as usize;
    let start = state.log.len().saturating_sub(visible);
    let lines: Vec<Line> = state.log[start..]
        .iter()
        .map(|l| Line::from(l.as_str()))
        .collect();
    let title = format!("Step Log ({} lines)", state.log.len());
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let phase = match (state.phase, state.paused) {
        (AnimatorState::Running, true) => Span::styled("Paused", Style::default().fg(Color::Yellow)),
        (AnimatorState::Running, false) => Span::styled("Running", Style::default().fg(Color::Green)),
        (AnimatorState::Done, _) => Span::styled("Done", Style::default().fg(Color::Cyan)),
        (AnimatorState::Idle, _) => Span::styled("Idle", Style::default().fg(Color::Gray)),
    };
    let lines = vec![
        Line::from(vec![
            Span::styled("State: ", Style::default().fg(Color::Gray)),
            phase,
        ]),
        Line::from(Span::styled(state.info.clone(), Style::default().fg(Color::Blue))),
    ];
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(p, area);
}
