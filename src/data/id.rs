//! Restaurant identifiers
//!
//! The reviews server hands out numeric ids, but records that went through
//! other tools can carry the same id as a string. Both spellings map to one
//! key: `1` and `"1"` are the same restaurant.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Key identifying a restaurant on the server and in the cache
///
/// Numeric ids (including numeric strings) sort before textual ones and
/// compare by value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RestaurantId {
    /// Non-negative integer id, however it was spelled
    Number(u64),
    /// Any other id
    Text(String),
}

impl From<u64> for RestaurantId {
    fn from(id: u64) -> Self {
        RestaurantId::Number(id)
    }
}

impl From<&str> for RestaurantId {
    fn from(id: &str) -> Self {
        match id.parse::<u64>() {
            Ok(number) => RestaurantId::Number(number),
            Err(_) => RestaurantId::Text(id.to_string()),
        }
    }
}

impl From<String> for RestaurantId {
    fn from(id: String) -> Self {
        match id.parse::<u64>() {
            Ok(number) => RestaurantId::Number(number),
            Err(_) => RestaurantId::Text(id),
        }
    }
}

impl FromStr for RestaurantId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(RestaurantId::from(s))
    }
}

impl fmt::Display for RestaurantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestaurantId::Number(n) => fmt::Display::fmt(n, f),
            RestaurantId::Text(s) => f.pad(s),
        }
    }
}

impl Serialize for RestaurantId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RestaurantId::Number(n) => serializer.serialize_u64(*n),
            RestaurantId::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for RestaurantId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(IdVisitor)
    }
}

struct IdVisitor;

impl<'de> Visitor<'de> for IdVisitor {
    type Value = RestaurantId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a restaurant id (integer or string)")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<RestaurantId, E> {
        Ok(RestaurantId::Number(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<RestaurantId, E> {
        Ok(match u64::try_from(value) {
            Ok(number) => RestaurantId::Number(number),
            Err(_) => RestaurantId::Text(value.to_string()),
        })
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<RestaurantId, E> {
        if value.fract() == 0.0 && value >= 0.0 && value <= u64::MAX as f64 {
            Ok(RestaurantId::Number(value as u64))
        } else {
            Ok(RestaurantId::Text(value.to_string()))
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<RestaurantId, E> {
        Ok(RestaurantId::from(value))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<RestaurantId, E> {
        Ok(RestaurantId::from(value))
    }
}
