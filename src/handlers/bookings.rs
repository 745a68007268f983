use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Availability, BookingFilter, BookingUpdate, NewBooking};
use crate::services::{availability, booking, pricing};
use crate::state::AppState;

use super::{data, fail, list, ok};

// GET /api/bookings
pub async fn list_bookings(State(state): State<Arc<AppState>>, Query(filter): Query<BookingFilter>) -> Response {
    match queries::list_bookings(&state.db(), &filter) {
        Ok(bookings) => list(bookings),
        Err(e) => fail(&state, e.into()),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

// GET /api/bookings/stats
pub async fn stats(State(state): State<Arc<AppState>>, Query(query): Query<StatsQuery>) -> Response {
    let range = match (query.start_date, query.end_date) {
        (Some(start), Some(end)) => start
            .and_hms_opt(0, 0, 0)
            .zip(end.and_hms_opt(23, 59, 59))
            .map(|(start, end)| (start.and_utc(), end.and_utc())),
        _ => None,
    };

    match queries::get_booking_stats(&state.db(), range) {
        Ok(stats) => data(StatusCode::OK, stats),
        Err(e) => fail(&state, e.into()),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub check_in: Option<String>,
    pub check_out: Option<String>,
}

fn hotel_availability(state: &AppState, hotel_id: &str, query: AvailabilityQuery) -> Result<Availability, AppError> {
    let (Some(check_in), Some(check_out)) = (query.check_in, query.check_out) else {
        return Err(AppError::Validation(
            "Check-in and check-out dates are required".to_string(),
        ));
    };
    let check_in = pricing::parse_stay_date_or_invalid(&check_in, "check-in")?;
    let check_out = pricing::parse_stay_date_or_invalid(&check_out, "check-out")?;
    pricing::nights(check_in, check_out)?;

    let total_rooms = state
        .catalog()
        .get(hotel_id)
        .map(|h| h.total_rooms())
        .ok_or_else(|| AppError::NotFound("Hotel".to_string()))?;

    Ok(availability::check_availability(
        &state.db(),
        hotel_id,
        total_rooms,
        check_in,
        check_out,
    )?)
}

// GET /api/bookings/availability/:hotel_id
pub async fn check_availability(
    State(state): State<Arc<AppState>>,
    Path(hotel_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Response {
    match hotel_availability(&state, &hotel_id, query) {
        Ok(availability) => data(StatusCode::OK, availability),
        Err(e) => fail(&state, e),
    }
}

// GET /api/bookings/:id
pub async fn get_booking(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match queries::get_booking_by_id(&state.db(), &id) {
        Ok(Some(booking)) => data(StatusCode::OK, booking),
        Ok(None) => fail(&state, AppError::NotFound("Booking".to_string())),
        Err(e) => fail(&state, e.into()),
    }
}

// POST /api/bookings
pub async fn create_booking(State(state): State<Arc<AppState>>, Json(body): Json<NewBooking>) -> Response {
    match booking::create_booking(&state, body) {
        Ok(booking) => data(StatusCode::CREATED, booking),
        Err(e) => fail(&state, e),
    }
}

// PUT /api/bookings/:id
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<BookingUpdate>,
) -> Response {
    match queries::update_booking(&state.db(), &id, &update) {
        Ok(Some(booking)) => {
            tracing::info!(booking_id = %id, status = booking.status.as_str(), "booking updated");
            data(StatusCode::OK, booking)
        }
        Ok(None) => fail(&state, AppError::NotFound("Booking".to_string())),
        Err(e) => fail(&state, e.into()),
    }
}

// DELETE /api/bookings/:id
pub async fn delete_booking(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match queries::delete_booking(&state.db(), &id) {
        Ok(true) => {
            tracing::info!(booking_id = %id, "booking deleted");
            ok(serde_json::json!({ "message": "Booking deleted successfully" }))
        }
        Ok(false) => fail(&state, AppError::NotFound("Booking".to_string())),
        Err(e) => fail(&state, e.into()),
    }
}
