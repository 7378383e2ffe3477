//! Help overlay showing all keybindings
//!
//! Renders a centered modal overlay with keyboard shortcuts.

use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const OVERLAY_WIDTH: u16 = 50;

/// Key bindings grouped by section, in display order
const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("↑/k, ↓/j", "Move selection up/down"),
            ("Enter", "Open restaurant details"),
            ("m", "Show map of restaurants"),
            ("Esc", "Go back / Close"),
            ("q", "Quit application"),
        ],
    ),
    (
        "Filters",
        &[
            ("c", "Next cuisine (or all)"),
            ("n", "Next neighborhood (or all)"),
        ],
    ),
    (
        "Other",
        &[
            ("f", "Toggle favorite"),
            ("r", "Refresh from server"),
            ("?", "Toggle this help"),
        ],
    ),
];

/// Renders the help overlay on top of the current view
pub fn render(frame: &mut Frame) {
    let lines = help_lines();
    // Content plus the two border rows
    let height = lines.len() as u16 + 2;
    let overlay_area = centered(frame.area(), OVERLAY_WIDTH, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(Paragraph::new(lines).block(block), overlay_area);
}

fn help_lines() -> Vec<Line<'static>> {
    let heading = Style::default().add_modifier(Modifier::BOLD);

    let mut lines = vec![Line::from(Span::styled(
        "Keyboard Shortcuts",
        heading.fg(Color::Cyan),
    ))];
    for (title, bindings) in SECTIONS {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(*title, heading)));
        lines.extend(bindings.iter().map(|(key, description)| {
            Line::from(vec![
                Span::styled(format!("  {:<12}", key), Style::default().fg(Color::Yellow)),
                Span::raw(*description),
            ])
        }));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Press Esc or ? to close",
        Style::default().fg(Color::DarkGray),
    )));
    lines
}

/// Rect of at most `width` x `height` centered in `area`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(row);
    cell
}
