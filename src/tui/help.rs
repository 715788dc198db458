use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(key: &'static str, pad: usize, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(format!("{}{}", " ".repeat(pad), action)),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("q", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
            Span::raw("  Quit"),
        ]),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("Enter", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("s", Style::default().fg(Color::Magenta)),
            Span::raw("   Start animation (restarts a running one)"),
        ]),
        key_line("p", 11, "Pause/Resume"),
        key_line("tab", 9, "Switch tabs"),
        key_line("?", 11, "Show this help"),
        Line::from(""),
        Line::from("Inputs:"),
        key_line("↑/↓", 9, "Select field"),
        key_line("0-9 .+-eE", 3, "Edit selected field"),
        key_line("Backspace", 3, "Delete last character"),
        key_line("←/→", 9, "Step delay -/+ 100 ms (100-2000 ms)"),
        Line::from(""),
        Line::from("Values above 1e308 switch the whole run to log₁₀(dollars)."),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
