//! Application state - single source of truth

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Geographic coordinates, stored the way the backend emits them
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

/// A single visited-location entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityRecord {
    pub id: i64,
    pub city_name: String,
    pub country: String,
    pub emoji: String,
    pub date: DateTime<Utc>,
    pub notes: String,
    pub position: Position,
}

/// A city as submitted for creation; the backend assigns the id
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCity {
    pub city_name: String,
    pub country: String,
    pub emoji: String,
    pub date: DateTime<Utc>,
    pub notes: String,
    pub position: Position,
}

/// Everything a consumer needs: the list, the loading flag, the current
/// selection, and the last failure message
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    /// Visited cities in server/file order
    pub cities: Vec<CityRecord>,
    /// True only between a start transition and its completion/failure
    pub is_loading: bool,
    /// The currently selected city, if any lookup succeeded
    pub current_city: Option<CityRecord>,
    /// Empty until a request fails; a success never resets it
    pub error: String,
}

impl AppState {
    /// Id of the current selection, if there is one
    pub fn selected_id(&self) -> Option<i64> {
        self.current_city.as_ref().map(|city| city.id)
    }
}
