//! UI rendering module for restoview
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components.

pub mod help_overlay;
pub mod restaurant_detail;
pub mod restaurant_list;
pub mod restaurant_map;

pub use help_overlay::render as render_help_overlay;
pub use restaurant_detail::render as render_restaurant_detail;
pub use restaurant_list::render as render_restaurant_list;
pub use restaurant_map::render as render_restaurant_map;

use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};

use crate::app::App;
use crate::data::ALL;

/// Footer line: the status message if there is one, otherwise key hints
pub(crate) fn footer_line(app: &App, hints: &'static str) -> Line<'static> {
    match &app.status_message {
        Some(message) => Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Yellow),
        )),
        None => Line::from(Span::styled(hints, Style::default().fg(Color::DarkGray))),
    }
}

/// Renders one filter dimension, dimming the "all" value
pub(crate) fn filter_span(label: &'static str, value: &str) -> Vec<Span<'static>> {
    let value_style = if value == ALL {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan)
    };
    vec![
        Span::raw(format!("{}: ", label)),
        Span::styled(value.to_string(), value_style),
        Span::raw("   "),
    ]
}
