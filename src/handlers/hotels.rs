use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::HotelQuery;
use crate::state::AppState;

use super::{check_auth, data, fail, list, ok};

// GET /api/hotels
pub async fn list_hotels(State(state): State<Arc<AppState>>, Query(query): Query<HotelQuery>) -> Response {
    list(state.catalog().filter(&query))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "minPrice")]
    pub min_price: Option<f64>,
    #[serde(rename = "maxPrice")]
    pub max_price: Option<f64>,
}

// GET /api/hotels/search
pub async fn search(State(state): State<Arc<AppState>>, Query(query): Query<SearchQuery>) -> Response {
    list(state.catalog().search(
        query.q.as_deref(),
        query.city.as_deref(),
        query.min_price,
        query.max_price,
    ))
}

// GET /api/hotels/stats
pub async fn stats(State(state): State<Arc<AppState>>) -> Response {
    data(StatusCode::OK, state.catalog().stats())
}

// GET /api/hotels/:id
pub async fn get_hotel(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let catalog = state.catalog();
    match catalog.get(&id) {
        Some(hotel) => data(StatusCode::OK, hotel),
        None => fail(&state, AppError::NotFound("Hotel".to_string())),
    }
}

#[derive(Serialize)]
struct Reloaded {
    hotels: usize,
}

// POST /api/hotels/reload
pub async fn reload(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Err(denied) = check_auth(&headers, &state.config.admin_token) {
        return denied;
    }

    match state.reload_catalog() {
        Ok(hotels) => ok(Reloaded { hotels }),
        Err(e) => fail(&state, AppError::Storage(e)),
    }
}
