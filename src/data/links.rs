//! Page and image locations for restaurants
//!
//! These mirror the paths used by the reviews web front end, so links shown
//! in the terminal can be pasted next to the server's base URL.

use super::Restaurant;

/// Image shown for restaurants without a photograph
const FALLBACK_IMAGE: &str = "/img/fallback.jpg";

/// Relative URL of the restaurant's detail page
pub fn url_for_restaurant(restaurant: &Restaurant) -> String {
    format!("./restaurant.html?id={}", restaurant.id)
}

/// Relative URL of the restaurant's photograph, or the fallback image
pub fn image_url_for_restaurant(restaurant: &Restaurant) -> String {
    match restaurant.photograph.as_deref() {
        Some(stem) if !stem.trim().is_empty() => format!("/img/{}.jpg", stem),
        _ => FALLBACK_IMAGE.to_string(),
    }
}

/// Alternative text for the restaurant's photograph
pub fn image_alt_for_restaurant(restaurant: &Restaurant) -> String {
    restaurant.name.clone()
}
