//! Core data models for restoview
//!
//! This module contains the restaurant record as served by the reviews server,
//! together with the pure selection helpers (filters, distinct projections)
//! that the gateway and the terminal views are built from.

pub mod gateway;
mod id;
pub mod links;

pub use gateway::{FavoriteSync, GatewayConfig, GatewayError, RestaurantGateway};
pub use id::RestaurantId;
pub use links::{image_alt_for_restaurant, image_url_for_restaurant, url_for_restaurant};

use std::collections::{BTreeMap, HashSet};

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Filter value that disables filtering on a dimension
pub const ALL: &str = "all";

/// Geographic position of a restaurant
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
}

/// A restaurant record as returned by the reviews server
///
/// Fields the server sends that are not modelled here are kept in `extra`,
/// so a record written back to the cache is the server's full representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    /// Unique identifier, shared by the server and the local cache
    pub id: RestaurantId,
    /// Display name
    pub name: String,
    /// Neighborhood the restaurant is located in
    #[serde(default)]
    pub neighborhood: String,
    /// Cuisine served (e.g. "Italian")
    #[serde(default)]
    pub cuisine_type: String,
    /// Map position
    #[serde(default)]
    pub latlng: LatLng,
    /// Photograph file stem, if the restaurant has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photograph: Option<String>,
    /// Street address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Opening hours keyed by day name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub operating_hours: BTreeMap<String, String>,
    /// Whether the user marked this restaurant as a favorite
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_favorite: bool,
    /// Any other fields sent by the server
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accepts `true`/`false` as JSON booleans or strings; `null` means `false`.
///
/// The server echoes the `is_favorite` query parameter back verbatim after a
/// PUT, so the flag arrives as a string on that path.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Option::<Flag>::deserialize(deserializer)? {
        None => Ok(false),
        Some(Flag::Bool(value)) => Ok(value),
        Some(Flag::Text(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" | "" => Ok(false),
            _ => Err(de::Error::invalid_value(
                de::Unexpected::Str(&text),
                &"true or false",
            )),
        },
    }
}

/// Cuisine and neighborhood selection, where [`ALL`] means "any"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Cuisine to keep, or [`ALL`]
    pub cuisine: String,
    /// Neighborhood to keep, or [`ALL`]
    pub neighborhood: String,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            cuisine: ALL.to_string(),
            neighborhood: ALL.to_string(),
        }
    }
}

impl Filter {
    /// Creates a filter on both dimensions
    pub fn new(cuisine: impl Into<String>, neighborhood: impl Into<String>) -> Self {
        Self {
            cuisine: cuisine.into(),
            neighborhood: neighborhood.into(),
        }
    }

    /// Creates a filter on cuisine only
    pub fn cuisine(cuisine: impl Into<String>) -> Self {
        Self::new(cuisine, ALL)
    }

    /// Creates a filter on neighborhood only
    pub fn neighborhood(neighborhood: impl Into<String>) -> Self {
        Self::new(ALL, neighborhood)
    }

    /// Returns true if neither dimension is filtered
    pub fn is_unfiltered(&self) -> bool {
        self.cuisine == ALL && self.neighborhood == ALL
    }

    /// Returns true if the restaurant passes both dimensions
    pub fn matches(&self, restaurant: &Restaurant) -> bool {
        dimension_matches(&restaurant.cuisine_type, &self.cuisine)
            && dimension_matches(&restaurant.neighborhood, &self.neighborhood)
    }

    /// Iterates over the matching restaurants, preserving order
    pub fn select<'a>(
        &'a self,
        restaurants: &'a [Restaurant],
    ) -> impl Iterator<Item = &'a Restaurant> + 'a {
        restaurants.iter().filter(move |r| self.matches(r))
    }

    /// Returns owned copies of the matching restaurants, preserving order
    pub fn apply(&self, restaurants: &[Restaurant]) -> Vec<Restaurant> {
        self.select(restaurants).cloned().collect()
    }
}

fn dimension_matches(value: &str, wanted: &str) -> bool {
    wanted == ALL || value == wanted
}

/// Removes duplicates while keeping the first occurrence of each value
pub fn distinct<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(*value))
        .map(str::to_string)
        .collect()
}

/// Distinct cuisines in first-seen order
pub fn distinct_cuisines(restaurants: &[Restaurant]) -> Vec<String> {
    distinct(restaurants.iter().map(|r| r.cuisine_type.as_str()))
}

/// Distinct neighborhoods in first-seen order
pub fn distinct_neighborhoods(restaurants: &[Restaurant]) -> Vec<String> {
    distinct(restaurants.iter().map(|r| r.neighborhood.as_str()))
}

#[cfg(test)]
pub(crate) fn sample_restaurant(id: u64, cuisine: &str, neighborhood: &str) -> Restaurant {
    Restaurant {
        id: RestaurantId::from(id),
        name: format!("Restaurant {}", id),
        neighborhood: neighborhood.to_string(),
        cuisine_type: cuisine.to_string(),
        latlng: LatLng {
            lat: 40.7 + id as f64 * 0.01,
            lng: -73.9 - id as f64 * 0.01,
        },
        photograph: Some(id.to_string()),
        address: None,
        operating_hours: BTreeMap::new(),
        is_favorite: false,
        extra: Map::new(),
    }
}

/// Ids for test assertions
#[cfg(test)]
pub(crate) fn ids(values: &[u64]) -> Vec<RestaurantId> {
    values.iter().copied().map(RestaurantId::from).collect()
}
