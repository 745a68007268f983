//! Read-only hotel catalog.
//!
//! Loaded once at startup and shared behind an `Arc`; a reload builds a new
//! catalog and swaps it in rather than mutating this one.

use std::fs;

use anyhow::Context;

use crate::models::{Hotel, HotelQuery, HotelStats};

const BUILTIN_HOTELS: &str = include_str!("../../data/hotels.json");

/// Most hotels offered as suggestions for one location.
pub const MAX_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct HotelCatalog {
    hotels: Vec<Hotel>,
}

impl HotelCatalog {
    pub fn new(hotels: Vec<Hotel>) -> Self {
        Self { hotels }
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let hotels: Vec<Hotel> = serde_json::from_str(json).context("invalid hotel catalog JSON")?;
        Ok(Self::new(hotels))
    }

    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_json(BUILTIN_HOTELS)
    }

    /// Loads from `path`, or the built-in catalog when no path is given.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("failed to read hotel catalog: {path}"))?;
                Self::from_json(&json)
            }
            None => Self::builtin(),
        }
    }

    pub fn len(&self) -> usize {
        self.hotels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hotels.is_empty()
    }

    pub fn active(&self) -> impl Iterator<Item = &Hotel> {
        self.hotels.iter().filter(|h| h.is_active)
    }

    /// Whether `id` names a catalog hotel that is switched off.
    pub fn is_inactive(&self, id: &str) -> bool {
        self.hotels.iter().any(|h| h.id == id && !h.is_active)
    }

    /// Active hotel by id.
    pub fn get(&self, id: &str) -> Option<&Hotel> {
        self.active().find(|h| h.id == id)
    }

    /// Up to three active hotels whose location contains the query or is
    /// contained in it, in catalog order.
    pub fn find_matching(&self, location: &str) -> Vec<Hotel> {
        self.active()
            .filter(|h| h.matches_location(location))
            .take(MAX_SUGGESTIONS)
            .cloned()
            .collect()
    }

    pub fn filter(&self, query: &HotelQuery) -> Vec<Hotel> {
        self.active()
            .filter(|h| {
                query
                    .location
                    .as_deref()
                    .map_or(true, |loc| h.location.eq_ignore_ascii_case(loc))
            })
            .filter(|h| {
                query
                    .brand
                    .as_deref()
                    .map_or(true, |brand| h.brand.eq_ignore_ascii_case(brand))
            })
            .filter(|h| within_price(h, query.min_price, query.max_price))
            .cloned()
            .collect()
    }

    /// Free-text search over name, location, city, address and brand.
    pub fn search(
        &self,
        term: Option<&str>,
        city: Option<&str>,
        min_price: Option<f64>,
        max_price: Option<f64>,
    ) -> Vec<Hotel> {
        let term = term.map(str::to_lowercase).filter(|t| !t.is_empty());
        let city = city.map(str::to_lowercase).filter(|c| !c.is_empty());

        self.active()
            .filter(|h| match &term {
                Some(t) => [&h.name, &h.location, &h.city, &h.address, &h.brand]
                    .iter()
                    .any(|field| field.to_lowercase().contains(t.as_str())),
                None => true,
            })
            .filter(|h| match &city {
                Some(c) => h.city.to_lowercase() == *c || h.location.to_lowercase() == *c,
                None => true,
            })
            .filter(|h| within_price(h, min_price, max_price))
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> HotelStats {
        let active: Vec<&Hotel> = self.active().collect();
        if active.is_empty() {
            return HotelStats::default();
        }
        let n = active.len() as f64;
        HotelStats {
            total_hotels: active.len(),
            average_rating: active.iter().map(|h| h.rating as f64).sum::<f64>() / n,
            average_price_per_night: active.iter().map(|h| h.price_per_night).sum::<f64>() / n,
        }
    }
}

fn within_price(hotel: &Hotel, min: Option<f64>, max: Option<f64>) -> bool {
    min.map_or(true, |m| hotel.price_per_night >= m) && max.map_or(true, |m| hotel.price_per_night <= m)
}
