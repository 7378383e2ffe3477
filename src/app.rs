//! Application state management for restoview
//!
//! This module contains the main application state, handling keyboard input,
//! data loading, and state transitions between the list, detail and map views.

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent};
use tracing::debug;

use crate::data::{
    distinct_cuisines, distinct_neighborhoods, FavoriteSync, Filter, Restaurant,
    RestaurantGateway, RestaurantId, ALL,
};

/// Application state enum representing the current view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// Initial loading state while fetching data
    Loading,
    /// The first load failed and there is nothing to show
    LoadFailed(String),
    /// List view showing the filtered restaurants
    RestaurantList,
    /// Detail view for a specific restaurant
    RestaurantDetail(RestaurantId),
    /// Map of the filtered restaurants
    Map,
}

/// Main application struct managing state and data
pub struct App {
    /// Current application state/view
    pub state: AppState,
    /// Every restaurant from the last successful load, in server order
    pub restaurants: Vec<Restaurant>,
    /// Distinct cuisines across `restaurants`
    pub cuisines: Vec<String>,
    /// Distinct neighborhoods across `restaurants`
    pub neighborhoods: Vec<String>,
    /// Current cuisine/neighborhood selection
    pub filter: Filter,
    /// Index of the selected restaurant within the filtered list
    pub selected_index: usize,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag indicating a refresh has been requested
    pub refresh_requested: bool,
    /// Flag indicating the selected restaurant's favorite flag should flip
    pub favorite_requested: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Timestamp of last data refresh
    pub last_refresh: Option<DateTime<Local>>,
    /// One-line message shown in the footer
    pub status_message: Option<String>,
    /// Restaurant data gateway
    gateway: RestaurantGateway,
}

impl App {
    /// Creates a new App instance starting with the given filter
    pub fn new(gateway: RestaurantGateway, filter: Filter) -> Self {
        Self {
            state: AppState::Loading,
            restaurants: Vec::new(),
            cuisines: Vec::new(),
            neighborhoods: Vec::new(),
            filter,
            selected_index: 0,
            should_quit: false,
            refresh_requested: false,
            favorite_requested: false,
            show_help: false,
            last_refresh: None,
            status_message: None,
            gateway,
        }
    }

    /// The gateway this app loads from
    pub fn gateway(&self) -> &RestaurantGateway {
        &self.gateway
    }

    /// Loads every restaurant through the gateway
    ///
    /// A failed first load moves to `LoadFailed`; a failed refresh keeps the
    /// restaurants already on screen and reports the error in the footer.
    pub async fn load_all_data(&mut self) {
        match self.gateway.fetch_all().await {
            Ok(restaurants) => {
                debug!(count = restaurants.len(), "Loaded restaurants");
                self.set_restaurants(restaurants);
                self.last_refresh = Some(Local::now());
                self.status_message = None;
                if matches!(self.state, AppState::Loading | AppState::LoadFailed(_)) {
                    self.state = AppState::RestaurantList;
                }
            }
            Err(error) => {
                if self.restaurants.is_empty() {
                    self.state = AppState::LoadFailed(error.to_string());
                } else {
                    self.status_message = Some(format!("Refresh failed: {}", error));
                }
            }
        }
    }

    /// Replaces the loaded restaurants and recomputes the filter options
    ///
    /// A filter value that no longer exists falls back to `all`.
    pub fn set_restaurants(&mut self, restaurants: Vec<Restaurant>) {
        self.cuisines = distinct_cuisines(&restaurants);
        self.neighborhoods = distinct_neighborhoods(&restaurants);
        self.restaurants = restaurants;

        if self.filter.cuisine != ALL && !self.cuisines.contains(&self.filter.cuisine) {
            self.filter.cuisine = ALL.to_string();
        }
        if self.filter.neighborhood != ALL
            && !self.neighborhoods.contains(&self.filter.neighborhood)
        {
            self.filter.neighborhood = ALL.to_string();
        }
        if let AppState::RestaurantDetail(id) = &self.state {
            if self.restaurant_by_id(id).is_none() {
                self.state = AppState::RestaurantList;
            }
        }
        self.clamp_selection();
    }

    /// Restaurants passing the current filter, in server order
    pub fn visible_restaurants(&self) -> Vec<&Restaurant> {
        self.filter.select(&self.restaurants).collect()
    }

    /// Returns the currently selected restaurant, if any
    pub fn selected_restaurant(&self) -> Option<&Restaurant> {
        self.visible_restaurants().get(self.selected_index).copied()
    }

    /// Looks up a loaded restaurant by id
    pub fn restaurant_by_id(&self, id: &RestaurantId) -> Option<&Restaurant> {
        self.restaurants.iter().find(|r| &r.id == id)
    }

    /// Handles pending refresh and favorite requests
    pub async fn process_requests(&mut self) {
        if self.refresh_requested {
            self.refresh_requested = false;
            self.load_all_data().await;
        }
        if self.favorite_requested {
            self.favorite_requested = false;
            self.toggle_favorite().await;
        }
    }

    /// Flips the favorite flag of the restaurant in focus
    ///
    /// In the detail view that is the restaurant shown; elsewhere the selection.
    pub async fn toggle_favorite(&mut self) {
        let target = match &self.state {
            AppState::RestaurantDetail(id) => Some(id.clone()),
            _ => self.selected_restaurant().map(|r| r.id.clone()),
        };
        let Some(index) = target.and_then(|id| self.restaurants.iter().position(|r| r.id == id))
        else {
            return;
        };

        let restaurant = &mut self.restaurants[index];
        let want = !restaurant.is_favorite;
        let sync = self.gateway.toggle_favorite(restaurant, want).await;

        let verb = if want { "Added to" } else { "Removed from" };
        self.status_message = Some(match sync {
            FavoriteSync::Confirmed => format!("{} favorites", verb),
            FavoriteSync::LocalOnly => format!("{} favorites (offline, saved locally)", verb),
        });
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Key Bindings
    /// - `q`: Quit the application (`Esc` also quits from the list)
    /// - `Up`/`k`, `Down`/`j`: Move selection
    /// - `Enter`: Open the selected restaurant
    /// - `c` / `n`: Cycle the cuisine / neighborhood filter
    /// - `f`: Toggle favorite
    /// - `m`: Open the map
    /// - `r`: Refresh data
    /// - `?`: Toggle help
    /// - `Esc` (in detail or map): Go back to list view
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Handle help overlay - intercepts all keys when shown
        if self.show_help {
            if matches!(
                key_event.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                self.show_help = false;
            }
            return;
        }

        match self.state {
            AppState::Loading => {
                if key_event.code == KeyCode::Char('q') {
                    self.should_quit = true;
                }
            }
            AppState::LoadFailed(_) => match key_event.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.should_quit = true;
                }
                KeyCode::Char('r') => {
                    self.refresh_requested = true;
                }
                _ => {}
            },
            AppState::RestaurantList => match key_event.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.should_quit = true;
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.move_selection_up();
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.move_selection_down();
                }
                KeyCode::Enter => {
                    if let Some(id) = self.selected_restaurant().map(|r| r.id.clone()) {
                        self.state = AppState::RestaurantDetail(id);
                    }
                }
                KeyCode::Char('c') => {
                    self.cycle_cuisine();
                }
                KeyCode::Char('n') => {
                    self.cycle_neighborhood();
                }
                KeyCode::Char('f') => {
                    self.favorite_requested = true;
                }
                KeyCode::Char('m') => {
                    self.state = AppState::Map;
                }
                KeyCode::Char('r') => {
                    self.refresh_requested = true;
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                _ => {}
            },
            AppState::RestaurantDetail(_) => match key_event.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                }
                KeyCode::Esc => {
                    self.state = AppState::RestaurantList;
                }
                KeyCode::Char('f') => {
                    self.favorite_requested = true;
                }
                KeyCode::Char('m') => {
                    self.state = AppState::Map;
                }
                KeyCode::Char('r') => {
                    self.refresh_requested = true;
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                _ => {}
            },
            AppState::Map => match key_event.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                }
                KeyCode::Esc => {
                    self.state = AppState::RestaurantList;
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.move_selection_up();
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.move_selection_down();
                }
                KeyCode::Enter => {
                    if let Some(id) = self.selected_restaurant().map(|r| r.id.clone()) {
                        self.state = AppState::RestaurantDetail(id);
                    }
                }
                KeyCode::Char('c') => {
                    self.cycle_cuisine();
                }
                KeyCode::Char('n') => {
                    self.cycle_neighborhood();
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                _ => {}
            },
        }
    }

    /// Moves the selection up in the list, wrapping to bottom if at top
    fn move_selection_up(&mut self) {
        let count = self.visible_restaurants().len();
        if count == 0 {
            return;
        }
        if self.selected_index == 0 {
            self.selected_index = count - 1;
        } else {
            self.selected_index -= 1;
        }
    }

    /// Moves the selection down in the list, wrapping to top if at bottom
    fn move_selection_down(&mut self) {
        let count = self.visible_restaurants().len();
        if count == 0 {
            return;
        }
        self.selected_index = (self.selected_index + 1) % count;
    }

    /// Advances the cuisine filter through `all` and each known cuisine
    fn cycle_cuisine(&mut self) {
        self.filter.cuisine = next_option(&self.filter.cuisine, &self.cuisines);
        self.selected_index = 0;
    }

    /// Advances the neighborhood filter through `all` and each known neighborhood
    fn cycle_neighborhood(&mut self) {
        self.filter.neighborhood = next_option(&self.filter.neighborhood, &self.neighborhoods);
        self.selected_index = 0;
    }

    fn clamp_selection(&mut self) {
        let count = self.visible_restaurants().len();
        if self.selected_index >= count {
            self.selected_index = count.saturating_sub(1);
        }
    }
}

/// Next value after `current` in the cycle `all, options[0], options[1], ...`
fn next_option(current: &str, options: &[String]) -> String {
    let next = match options.iter().position(|option| option == current) {
        None => options.first(),
        Some(index) => options.get(index + 1),
    };
    next.cloned().unwrap_or_else(|| ALL.to_string())
}
