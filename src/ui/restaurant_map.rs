//! Restaurant map screen rendering
//!
//! Plots a marker for each filtered restaurant on a braille canvas, zoomed to
//! the markers' bounding box, and lists the selected marker's title and link.

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Map, MapResolution, Points},
        Block, Borders, Paragraph,
    },
    Frame,
};

use super::footer_line;
use crate::app::App;
use crate::map::{add_markers, MarkerHost, MarkerSpec};

const HINTS: &str = "↑/↓ select  Enter open  c cuisine  n neighborhood  Esc back  q quit";

/// Fraction of the marker span added around the bounding box
const PADDING_RATIO: f64 = 0.15;

/// Smallest padding in degrees, so a single marker is not on the border
const MIN_PADDING_DEG: f64 = 0.005;

/// Marker host that collects markers for a canvas
#[derive(Debug, Default)]
pub struct CanvasMap {
    markers: Vec<MarkerSpec>,
}

impl MarkerHost for CanvasMap {
    type Marker = usize;

    fn place_marker(&mut self, spec: MarkerSpec) -> usize {
        self.markers.push(spec);
        self.markers.len() - 1
    }
}

impl CanvasMap {
    /// Markers placed so far
    pub fn markers(&self) -> &[MarkerSpec] {
        &self.markers
    }

    /// `([min_lng, max_lng], [min_lat, max_lat])` covering every marker
    ///
    /// Without markers the whole world is shown.
    pub fn bounds(&self) -> ([f64; 2], [f64; 2]) {
        if self.markers.is_empty() {
            return ([-180.0, 180.0], [-90.0, 90.0]);
        }

        let (mut min_lng, mut max_lng) = (f64::MAX, f64::MIN);
        let (mut min_lat, mut max_lat) = (f64::MAX, f64::MIN);
        for marker in &self.markers {
            min_lng = min_lng.min(marker.position.lng);
            max_lng = max_lng.max(marker.position.lng);
            min_lat = min_lat.min(marker.position.lat);
            max_lat = max_lat.max(marker.position.lat);
        }

        let pad_lng = ((max_lng - min_lng) * PADDING_RATIO).max(MIN_PADDING_DEG);
        let pad_lat = ((max_lat - min_lat) * PADDING_RATIO).max(MIN_PADDING_DEG);
        (
            [min_lng - pad_lng, max_lng + pad_lng],
            [min_lat - pad_lat, max_lat + pad_lat],
        )
    }
}

/// Renders the map of the currently filtered restaurants
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let mut map = CanvasMap::default();
    add_markers(app.visible_restaurants(), &mut map);
    let (x_bounds, y_bounds) = map.bounds();
    let selected = app.selected_index;

    let canvas = Canvas::default()
        .block(
            Block::default()
                .title(format!(" Map ({} restaurants) ", map.markers().len()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(|ctx| {
            ctx.draw(&Map {
                color: Color::DarkGray,
                resolution: MapResolution::High,
            });
            ctx.layer();

            let others: Vec<(f64, f64)> = map
                .markers()
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != selected)
                .map(|(_, m)| (m.position.lng, m.position.lat))
                .collect();
            ctx.draw(&Points {
                coords: &others,
                color: Color::Red,
            });

            if let Some(marker) = map.markers().get(selected) {
                let coords = [(marker.position.lng, marker.position.lat)];
                ctx.draw(&Points {
                    coords: &coords,
                    color: Color::Yellow,
                });
                ctx.print(
                    marker.position.lng,
                    marker.position.lat,
                    Line::styled(format!(" {}", marker.title), Style::default().fg(Color::Yellow)),
                );
            }
        });
    frame.render_widget(canvas, chunks[0]);

    let info = match map.markers().get(selected) {
        Some(marker) => Line::from(vec![
            Span::styled(marker.title.clone(), Style::default().fg(Color::Yellow)),
            Span::raw("  "),
            Span::styled(marker.url.clone(), Style::default().fg(Color::DarkGray)),
        ]),
        None => Line::from(Span::styled(
            "No restaurants match the current filters",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(
        Paragraph::new(info).block(Block::default().borders(Borders::ALL)),
        chunks[1],
    );

    frame.render_widget(Paragraph::new(footer_line(app, HINTS)), chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppState;
    use crate::data::{sample_restaurant, Filter, GatewayConfig, LatLng, RestaurantGateway};
    use crate::map::marker_spec;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_bounds_without_markers_is_world() {
        let map = CanvasMap::default();
        assert_eq!(map.bounds(), ([-180.0, 180.0], [-90.0, 90.0]));
    }

    #[test]
    fn test_bounds_cover_all_markers_with_padding() {
        let mut map = CanvasMap::default();
        let mut a = sample_restaurant(1, "Thai", "Uptown");
        a.latlng = LatLng { lat: 40.0, lng: -74.0 };
        let mut b = sample_restaurant(2, "Thai", "Uptown");
        b.latlng = LatLng { lat: 41.0, lng: -73.0 };
        map.place_marker(marker_spec(&a));
        map.place_marker(marker_spec(&b));

        let ([x0, x1], [y0, y1]) = map.bounds();

        assert!(x0 < -74.0 && x1 > -73.0);
        assert!(y0 < 40.0 && y1 > 41.0);
    }

    #[test]
    fn test_bounds_for_single_marker_are_not_degenerate() {
        let mut map = CanvasMap::default();
        map.place_marker(marker_spec(&sample_restaurant(1, "Thai", "Uptown")));

        let ([x0, x1], [y0, y1]) = map.bounds();

        assert!(x1 - x0 > 0.0);
        assert!(y1 - y0 > 0.0);
    }

    #[test]
    fn test_map_renders_selected_marker_info() {
        let gateway = RestaurantGateway::with_config(GatewayConfig::default(), None).unwrap();
        let mut app = App::new(gateway, Filter::default());
        app.set_restaurants(vec![
            sample_restaurant(1, "Thai", "Uptown"),
            sample_restaurant(2, "Italian", "SoHo"),
        ]);
        app.state = AppState::Map;
        app.selected_index = 1;

        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();
        let content: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();

        assert!(content.contains("Map (2 restaurants)"));
        assert!(content.contains("./restaurant.html?id=2"));
    }
}
