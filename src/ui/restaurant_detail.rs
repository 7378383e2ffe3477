//! Restaurant detail screen rendering
//!
//! Shows one restaurant: cuisine, neighborhood, address, favorite state,
//! opening hours, and the page and photograph links used by the web front end.

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::footer_line;
use crate::app::App;
use crate::data::{
    image_alt_for_restaurant, image_url_for_restaurant, url_for_restaurant, Restaurant,
    RestaurantId,
};

const HINTS: &str = "f favorite  m map  r refresh  Esc back  ? help  q quit";

/// Day order used for opening hours; other keys follow alphabetically
const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Renders the detail view for the restaurant with the given id
pub fn render(frame: &mut Frame, app: &App, restaurant_id: &RestaurantId) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    let (title, lines) = match app.restaurant_by_id(restaurant_id) {
        Some(restaurant) => (format!(" {} ", restaurant.name), detail_lines(restaurant)),
        None => (
            " Restaurant ".to_string(),
            vec![Line::from(Span::styled(
                format!("Restaurant {} is no longer available", restaurant_id),
                Style::default().fg(Color::Red),
            ))],
        ),
    };

    let body = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(body, chunks[0]);
    frame.render_widget(Paragraph::new(footer_line(app, HINTS)), chunks[1]);
}

fn detail_lines(restaurant: &Restaurant) -> Vec<Line<'static>> {
    let label = Style::default().add_modifier(Modifier::BOLD);
    let field = |name: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!("{:<14}", name), label),
            Span::raw(value),
        ])
    };

    let favorite = if restaurant.is_favorite {
        Span::styled("★ Favorite", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("☆ Not a favorite", Style::default().fg(Color::DarkGray))
    };

    let mut lines = vec![
        field("Cuisine", restaurant.cuisine_type.clone()),
        field("Neighborhood", restaurant.neighborhood.clone()),
        field(
            "Address",
            restaurant
                .address
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
        ),
        field(
            "Location",
            format!("{:.6}, {:.6}", restaurant.latlng.lat, restaurant.latlng.lng),
        ),
        Line::from(vec![Span::styled(format!("{:<14}", "Favorite"), label), favorite]),
        Line::from(""),
        Line::from(Span::styled("Opening hours", label)),
    ];

    if restaurant.operating_hours.is_empty() {
        lines.push(Line::from(Span::styled(
            "  Not listed",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        for (day, hours) in ordered_hours(restaurant) {
            lines.push(Line::from(format!("  {:<12}{}", day, hours)));
        }
    }

    lines.push(Line::from(""));
    lines.push(field("Page", url_for_restaurant(restaurant)));
    lines.push(field("Photo", image_url_for_restaurant(restaurant)));
    lines.push(field("Photo alt", image_alt_for_restaurant(restaurant)));

    lines
}

/// Opening hours with weekdays in calendar order
fn ordered_hours(restaurant: &Restaurant) -> Vec<(&str, &str)> {
    let hours = &restaurant.operating_hours;
    let mut ordered: Vec<(&str, &str)> = WEEKDAYS
        .iter()
        .filter_map(|day| hours.get(*day).map(|h| (*day, h.as_str())))
        .collect();
    ordered.extend(
        hours
            .iter()
            .filter(|(day, _)| !WEEKDAYS.iter().any(|weekday| *weekday == day.as_str()))
            .map(|(day, h)| (day.as_str(), h.as_str())),
    );
    ordered
}
