//! Map markers for restaurants
//!
//! The gateway knows nothing about maps. Anything that can show a pin with a
//! title and a click-through link implements [`MarkerHost`], and the helpers
//! here turn restaurants into marker specifications for it.

use crate::data::{url_for_restaurant, LatLng, Restaurant};

/// Everything a host needs to place one marker
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    /// Where the marker goes
    pub position: LatLng,
    /// Label shown for the marker
    pub title: String,
    /// Page opened when the marker is activated
    pub url: String,
}

/// A map surface that can place markers
pub trait MarkerHost {
    /// Handle the host returns for a placed marker
    type Marker;

    /// Places a marker on this map
    fn place_marker(&mut self, spec: MarkerSpec) -> Self::Marker;
}

/// Builds the marker specification for a restaurant
pub fn marker_spec(restaurant: &Restaurant) -> MarkerSpec {
    MarkerSpec {
        position: restaurant.latlng,
        title: restaurant.name.clone(),
        url: url_for_restaurant(restaurant),
    }
}

/// Places a marker for the restaurant on the given map
pub fn marker_for_restaurant<H: MarkerHost>(restaurant: &Restaurant, map: &mut H) -> H::Marker {
    map.place_marker(marker_spec(restaurant))
}

/// Places one marker per restaurant, in order
pub fn add_markers<'a, H, I>(restaurants: I, map: &mut H) -> Vec<H::Marker>
where
    H: MarkerHost,
    I: IntoIterator<Item = &'a Restaurant>,
{
    restaurants
        .into_iter()
        .map(|restaurant| marker_for_restaurant(restaurant, map))
        .collect()
}
