//! Materializing bookings, from a conversation or a direct request.
//!
//! Every write goes through [`reserve`], which rechecks availability and
//! (for conversation completions) flips the conversation to completed in
//! the same transaction as the insert.

use chrono::{Days, NaiveDate, Utc};
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::config::BookingDefaults;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    Booking, BookingInfo, BookingStatus, Conversation, Hotel, MessageRole, NewBooking, DEFAULT_TOTAL_ROOMS,
};
use crate::services::ai::prompt;
use crate::services::availability;
use crate::services::catalog::HotelCatalog;
use crate::services::pricing;
use crate::state::AppState;

/// Hotel a booking is made against. Catalog entries carry their own price
/// and capacity; a hotel the catalog doesn't know falls back to defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedHotel {
    pub id: String,
    pub name: String,
    pub city: String,
    pub star_rating: u8,
    pub price_per_night: f64,
    pub total_rooms: u32,
}

impl From<&Hotel> for ResolvedHotel {
    fn from(hotel: &Hotel) -> Self {
        Self {
            id: hotel.id.clone(),
            name: hotel.name.clone(),
            city: if hotel.city.is_empty() {
                hotel.location.clone()
            } else {
                hotel.city.clone()
            },
            star_rating: hotel.star_rating,
            price_per_night: hotel.price_per_night,
            total_rooms: hotel.total_rooms(),
        }
    }
}

/// Picks the hotel for a completion.
///
/// An explicit hotel id wins unless it names an inactive hotel. Otherwise
/// the first catalog match for the location (or the default location),
/// then the configured fallback hotel.
pub fn resolve_hotel(catalog: &HotelCatalog, defaults: &BookingDefaults, info: &BookingInfo) -> ResolvedHotel {
    let location = info.location.as_deref().unwrap_or(&defaults.location);

    let explicit = info.hotel_id.as_deref().filter(|id| {
        let inactive = catalog.is_inactive(id);
        if inactive {
            tracing::warn!(hotel_id = %id, "chosen hotel is inactive, resolving from location");
        }
        !inactive
    });

    let hotel_id = match explicit {
        Some(id) => id.to_string(),
        None => match catalog.find_matching(location).first() {
            Some(hotel) => return ResolvedHotel::from(hotel),
            None => defaults.hotel_id.clone(),
        },
    };

    if let Some(hotel) = catalog.get(&hotel_id) {
        return ResolvedHotel::from(hotel);
    }

    ResolvedHotel {
        name: info
            .hotel_name
            .clone()
            .unwrap_or_else(|| format!("{location} Hotel")),
        id: hotel_id,
        city: location.to_string(),
        star_rating: 0,
        price_per_night: defaults.price_per_night,
        total_rooms: DEFAULT_TOTAL_ROOMS,
    }
}

/// Writes `booking` if the hotel still has room for it.
///
/// With `completes` set, the named conversation must still be active; it is
/// marked completed with the given snapshot in the same transaction. Nothing
/// is written on any error.
pub fn reserve(
    conn: &Connection,
    booking: &Booking,
    total_rooms: u32,
    completes: Option<(&str, &BookingInfo)>,
) -> Result<(), AppError> {
    let tx = conn.unchecked_transaction()?;

    if let Some((session_id, info)) = completes {
        if !queries::mark_conversation_completed(&tx, session_id, info)? {
            return Err(AppError::Validation(
                "This conversation has already been completed".to_string(),
            ));
        }
    }

    let availability =
        availability::check_availability(&tx, &booking.hotel_id, total_rooms, booking.check_in, booking.check_out)?;
    if !availability.can_fit(booking.rooms) {
        return Err(AppError::Validation(format!(
            "Sorry, only {} rooms are available for your selected dates.",
            availability.available
        )));
    }

    queries::insert_booking(&tx, booking)?;
    tx.commit()?;
    Ok(())
}

fn pending_booking(
    session_id: &str,
    hotel: &ResolvedHotel,
    info: &BookingInfo,
    guest_name: String,
    guest_email: String,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> Result<Booking, AppError> {
    let rooms = info.rooms_or_default();
    let total_amount = pricing::quote(hotel.price_per_night, check_in, check_out, rooms)?;
    let now = Utc::now();

    Ok(Booking {
        id: Uuid::new_v4().to_string(),
        session_id: session_id.to_string(),
        hotel_id: hotel.id.clone(),
        hotel_name: hotel.name.clone(),
        guest_name,
        guest_email,
        guest_phone: info.guest_phone.clone().unwrap_or_default(),
        check_in,
        check_out,
        guests: info.guests_or_default(),
        rooms,
        total_amount,
        status: BookingStatus::Pending,
        special_requests: info.special_requests.clone().unwrap_or_default(),
        created_at: now,
        updated_at: now,
    })
}

/// Stay dates for a conversational completion. Absent dates default to
/// today and tomorrow; present ones must parse.
fn stay_dates_or_default(info: &BookingInfo) -> Result<(NaiveDate, NaiveDate), AppError> {
    let today = Utc::now().date_naive();
    let check_in = match &info.check_in {
        Some(raw) => pricing::parse_stay_date_or_invalid(raw, "check-in")?,
        None => today,
    };
    let check_out = match &info.check_out {
        Some(raw) => pricing::parse_stay_date_or_invalid(raw, "check-out")?,
        None => today.checked_add_days(Days::new(1)).unwrap_or(today),
    };
    Ok((check_in, check_out))
}

/// Completes a conversation from whatever it has gathered, filling gaps
/// from the configured defaults. Used by the message turn, where the
/// model decided (or the fallback judged) that the guest is done.
///
/// The snapshot stored on the conversation records the hotel that was
/// actually booked.
pub fn complete_with_defaults(state: &AppState, session_id: &str, info: &BookingInfo) -> Result<Booking, AppError> {
    let defaults = &state.config.defaults;
    let hotel = resolve_hotel(&state.catalog(), defaults, info);
    let (check_in, check_out) = stay_dates_or_default(info)?;

    let booking = pending_booking(
        session_id,
        &hotel,
        info,
        info.guest_name.clone().unwrap_or_else(|| defaults.guest_name.clone()),
        info.guest_email.clone().unwrap_or_else(|| defaults.guest_email.clone()),
        check_in,
        check_out,
    )?;

    let mut snapshot = info.clone();
    snapshot.hotel_id = Some(hotel.id.clone());
    snapshot.hotel_name = Some(hotel.name.clone());

    let conn = state.db();
    reserve(&conn, &booking, hotel.total_rooms, Some((session_id, &snapshot)))?;
    Ok(booking)
}

#[derive(Debug, Serialize)]
pub struct CompletedBooking {
    pub booking: Booking,
    pub conversation: Conversation,
    pub message: String,
}

/// Completes a conversation whose booking info is already whole: guest
/// name and email, both dates and a catalog hotel.
pub async fn complete_booking(
    state: &AppState,
    session_id: &str,
    origin: Option<&str>,
) -> Result<CompletedBooking, AppError> {
    let _turn = state.lock_session(session_id).await;
    complete_locked(state, session_id, origin)
}

/// Like [`complete_booking`], but resolves the hotel from the location
/// first when none was chosen.
pub async fn force_complete(
    state: &AppState,
    session_id: &str,
    origin: Option<&str>,
) -> Result<CompletedBooking, AppError> {
    let _turn = state.lock_session(session_id).await;

    let conversation = load_conversation(state, session_id)?;
    let mut info = conversation.booking_info;

    let missing = info.missing_for_forced_completion();
    if !missing.is_empty() {
        return Err(AppError::MissingInformation(missing));
    }

    if info.hotel_id.is_none() {
        let location = info.location.clone().unwrap_or_default();
        if let Some(hotel) = state.catalog().find_matching(&location).first() {
            tracing::info!(session_id, hotel_id = %hotel.id, "hotel selected from location");
            info.hotel_id = Some(hotel.id.clone());
            info.hotel_name = Some(hotel.name.clone());
            queries::update_booking_info(&state.db(), session_id, &info)?;
        }
    }

    complete_locked(state, session_id, origin)
}

fn load_conversation(state: &AppState, session_id: &str) -> Result<Conversation, AppError> {
    queries::get_conversation(&state.db(), session_id)?
        .ok_or_else(|| AppError::NotFound("Conversation".to_string()))
}

fn complete_locked(state: &AppState, session_id: &str, origin: Option<&str>) -> Result<CompletedBooking, AppError> {
    let conversation = load_conversation(state, session_id)?;
    let info = conversation.booking_info;

    let missing = info.missing_for_completion();
    if !missing.is_empty() {
        return Err(AppError::MissingInformation(missing));
    }

    let hotel_id = info.hotel_id.as_deref().unwrap_or_default();
    let catalog = state.catalog();
    let hotel = catalog
        .get(hotel_id)
        .map(ResolvedHotel::from)
        .ok_or_else(|| AppError::NotFound("Hotel".to_string()))?;

    let check_in = pricing::parse_stay_date_or_invalid(info.check_in.as_deref().unwrap_or_default(), "check-in")?;
    let check_out = pricing::parse_stay_date_or_invalid(info.check_out.as_deref().unwrap_or_default(), "check-out")?;

    let booking = pending_booking(
        session_id,
        &hotel,
        &info,
        info.guest_name.clone().unwrap_or_default(),
        info.guest_email.clone().unwrap_or_default(),
        check_in,
        check_out,
    )?;

    let conn = state.db();
    reserve(&conn, &booking, hotel.total_rooms, Some((session_id, &info)))?;
    tracing::info!(session_id, booking_id = %booking.id, total = booking.total_amount, "booking completed");

    let link = prompt::payment_link(origin, &state.config.frontend_url, &booking.id);
    let confirmation = confirmation_message(&booking, &hotel, &link);
    let conversation = queries::append_message(&conn, session_id, MessageRole::Assistant, &confirmation)?
        .ok_or_else(|| AppError::NotFound("Conversation".to_string()))?;

    Ok(CompletedBooking {
        booking,
        conversation,
        message: "Booking completed successfully!".to_string(),
    })
}

fn confirmation_message(booking: &Booking, hotel: &ResolvedHotel, link: &str) -> String {
    format!(
        "🎉 Perfect! Your booking is ready for payment!\n\n\
         Booking Details:\n\
         • Hotel: {} ({} stars)\n\
         • Location: {}\n\
         • Check-in: {}\n\
         • Check-out: {}\n\
         • Guests: {}\n\
         • Rooms: {}\n\
         • Total: ${:.2}\n\n\
         Your booking reference is: {}\n\n\
         🔗 Complete Payment & Confirm Booking: {}\n\n\
         Please complete payment to confirm your reservation. A confirmation email will be sent to {} after payment.",
        hotel.name,
        hotel.star_rating,
        hotel.city,
        booking.check_in.format("%B %-d, %Y"),
        booking.check_out.format("%B %-d, %Y"),
        booking.guests,
        booking.rooms,
        booking.total_amount,
        booking.id,
        link,
        booking.guest_email,
    )
}

/// Books directly, outside any conversation. Created pending.
pub fn create_booking(state: &AppState, request: NewBooking) -> Result<Booking, AppError> {
    let missing = request.missing_fields();
    if !missing.is_empty() {
        return Err(AppError::MissingInformation(missing));
    }

    let hotel_id = request.hotel_id.clone().unwrap_or_default();
    let catalog = state.catalog();
    let hotel = catalog
        .get(&hotel_id)
        .map(ResolvedHotel::from)
        .ok_or_else(|| AppError::NotFound("Hotel".to_string()))?;

    let check_in = pricing::parse_stay_date_or_invalid(request.check_in.as_deref().unwrap_or_default(), "check-in")?;
    let check_out =
        pricing::parse_stay_date_or_invalid(request.check_out.as_deref().unwrap_or_default(), "check-out")?;

    let info = BookingInfo {
        guest_phone: request.guest_phone,
        guests: request.guests,
        rooms: request.rooms,
        special_requests: request.special_requests,
        ..Default::default()
    };
    let booking = pending_booking(
        request.session_id.as_deref().unwrap_or_default(),
        &hotel,
        &info,
        request.guest_name.unwrap_or_default(),
        request.guest_email.unwrap_or_default(),
        check_in,
        check_out,
    )?;

    reserve(&state.db(), &booking, hotel.total_rooms, None)?;
    tracing::info!(booking_id = %booking.id, hotel_id = %booking.hotel_id, "booking created");
    Ok(booking)
}
