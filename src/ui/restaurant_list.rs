//! Restaurant list screen rendering
//!
//! Renders the main list view: the active cuisine and neighborhood filters,
//! the matching restaurants with the selection highlighted, and a footer.

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{filter_span, footer_line};
use crate::app::App;
use crate::data::Restaurant;

const HINTS: &str = "↑/↓ move  Enter open  c cuisine  n neighborhood  f favorite  m map  ? help  q quit";

/// Renders the restaurant list view
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let visible = app.visible_restaurants();

    let mut header = Vec::new();
    header.extend(filter_span("Cuisine", &app.filter.cuisine));
    header.extend(filter_span("Neighborhood", &app.filter.neighborhood));
    header.push(Span::styled(
        format!("{} of {} shown", visible.len(), app.restaurants.len()),
        Style::default().fg(Color::DarkGray),
    ));
    let header = Paragraph::new(Line::from(header)).block(
        Block::default()
            .title(" Restaurant Reviews ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(header, chunks[0]);

    let list_block = Block::default().borders(Borders::ALL);
    let inner_height = list_block.inner(chunks[1]).height as usize;

    let lines: Vec<Line> = if visible.is_empty() {
        vec![Line::from(Span::styled(
            "No restaurants match the current filters",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        let offset = scroll_offset(app.selected_index, inner_height);
        visible
            .iter()
            .enumerate()
            .skip(offset)
            .take(inner_height.max(1))
            .map(|(i, restaurant)| restaurant_line(restaurant, i == app.selected_index))
            .collect()
    };
    frame.render_widget(Paragraph::new(lines).block(list_block), chunks[1]);

    frame.render_widget(Paragraph::new(footer_line(app, HINTS)), chunks[2]);
}

/// First row to draw so the selected row stays on screen
fn scroll_offset(selected: usize, height: usize) -> usize {
    if height == 0 {
        return 0;
    }
    selected.saturating_sub(height - 1)
}

fn restaurant_line(restaurant: &Restaurant, selected: bool) -> Line<'static> {
    let base = if selected {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let marker = if selected { "▶ " } else { "  " };
    let favorite = if restaurant.is_favorite { "★" } else { " " };

    Line::from(vec![
        Span::styled(marker, base),
        Span::styled(format!("{} ", favorite), base.fg(Color::Yellow)),
        Span::styled(format!("{:<32}", restaurant.name), base),
        Span::styled(format!("{:<14}", restaurant.cuisine_type), base),
        Span::styled(restaurant.neighborhood.clone(), base),
    ])
}
