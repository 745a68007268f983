use serde::{Deserialize, Serialize};

pub const DEFAULT_TOTAL_ROOMS: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    pub location: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, alias = "star_rating", alias = "stars")]
    pub star_rating: u8,
    #[serde(default)]
    pub rating: f32,
    #[serde(alias = "price_per_night")]
    pub price_per_night: f64,
    #[serde(default, alias = "total_rooms", skip_serializing_if = "Option::is_none")]
    pub total_rooms: Option<u32>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default, alias = "image_url", alias = "image")]
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active", alias = "is_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Hotel {
    pub fn total_rooms(&self) -> u32 {
        self.total_rooms.unwrap_or(DEFAULT_TOTAL_ROOMS)
    }

    /// Case-insensitive containment in either direction.
    pub fn matches_location(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return false;
        }
        let location = self.location.trim().to_lowercase();
        if location.is_empty() {
            return false;
        }
        location.contains(&query) || query.contains(&location)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HotelQuery {
    pub location: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelStats {
    pub total_hotels: usize,
    pub average_rating: f64,
    pub average_price_per_night: f64,
}
