use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use super::state::UiState;
use crate::format;
use crate::model::{GrowthMode, PlotBounds};

/// Widen a degenerate range so the chart always has something to scale against.
fn padded(range: [f64; 2]) -> [f64; 2] {
    let [lo, hi] = range;
    if hi > lo {
        range
    } else if lo == 0.0 {
        [0.0, 1.0]
    } else {
        let pad = lo.abs() * 0.05;
        [lo - pad, hi + pad]
    }
}

/// Render the growth curve revealed so far against the run's full axes.
pub fn render_growth_chart(f: &mut Frame, area: Rect, state: &UiState) {
    let title = Line::from(vec![
        Span::raw(format::CHART_TITLE),
        Span::raw(" ("),
        Span::styled(
            format!("{}/{}", state.points.len(), state.step_count + 1),
            Style::default().fg(Color::Green),
        ),
        Span::raw(")"),
    ]);
    let block = Block::default().borders(Borders::ALL).title(title);

    let (Some(mode), Some(bounds)) = (state.mode, state.bounds) else {
        let empty = Paragraph::new("Press Enter to start an animation")
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(empty, area);
        return;
    };

    let line_ds = Dataset::default()
        .graph_type(GraphType::Line)
        .marker(symbols::Marker::Braille)
        .style(Style::default().fg(Color::Green))
        .data(&state.points);
    let point_ds = Dataset::default()
        .graph_type(GraphType::Scatter)
        .marker(symbols::Marker::Dot)
        .style(Style::default().fg(Color::Yellow))
        .data(&state.points);

    let (x_axis, y_axis) = axes(mode, bounds);
    let chart = Chart::new(vec![line_ds, point_ds])
        .block(block)
        .x_axis(x_axis)
        .y_axis(y_axis);
    f.render_widget(chart, area);
}

fn axes(mode: GrowthMode, bounds: PlotBounds) -> (Axis<'static>, Axis<'static>) {
    let x = padded(bounds.x);
    let y = padded(bounds.y);
    let x_axis = Axis::default()
        .title(format::X_AXIS_TITLE)
        .style(Style::default().fg(Color::Gray))
        .bounds(x)
        .labels(vec![
            Span::raw(format!("{:.0}", x[0])),
            Span::raw(format!("{:.0}", x[1])),
        ]);
    let y_axis = Axis::default()
        .title(format::y_axis_title(mode))
        .style(Style::default().fg(Color::Gray))
        .bounds(y)
        .labels(vec![
            Span::raw(format::format_axis_value(mode, y[0])),
            Span::raw(format::format_axis_value(mode, y[1])),
        ]);
    (x_axis, y_axis)
}
