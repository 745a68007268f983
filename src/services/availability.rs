use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{Availability, Booking};

/// Half-open overlap: a stay ending on a day frees the room for a stay
/// starting that same day.
pub fn dates_overlap(start1: NaiveDate, end1: NaiveDate, start2: NaiveDate, end2: NaiveDate) -> bool {
    start1 < end2 && start2 < end1
}

/// Rooms held by `bookings` across `[check_in, check_out)`, against
/// `total_rooms`.
pub fn tally(total_rooms: u32, bookings: &[Booking], check_in: NaiveDate, check_out: NaiveDate) -> Availability {
    let booked: u32 = bookings
        .iter()
        .filter(|b| b.occupies_rooms())
        .filter(|b| dates_overlap(b.check_in, b.check_out, check_in, check_out))
        .map(|b| b.rooms)
        .sum();
    Availability::new(total_rooms, booked)
}

/// Recomputed from the ledger on every call.
pub fn check_availability(
    conn: &Connection,
    hotel_id: &str,
    total_rooms: u32,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> anyhow::Result<Availability> {
    let bookings = queries::get_active_bookings_for_hotel(conn, hotel_id)?;
    Ok(tally(total_rooms, &bookings, check_in, check_out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::BookingStatus;
    use chrono::Utc;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn booking(id: &str, check_in: &str, check_out: &str, rooms: u32, status: BookingStatus) -> Booking {
        let now = Utc::now();
        Booking {
            id: id.to_string(),
            session_id: "s1".to_string(),
            hotel_id: "H1".to_string(),
            hotel_name: "Harbour View".to_string(),
            guest_name: "Alice".to_string(),
            guest_email: "alice@example.com".to_string(),
            guest_phone: String::new(),
            check_in: d(check_in),
            check_out: d(check_out),
            guests: 1,
            rooms,
            total_amount: 100.0,
            status,
            special_requests: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_overlapping_ranges() {
        assert!(dates_overlap(d("2024-10-01"), d("2024-10-05"), d("2024-10-04"), d("2024-10-08")));
        assert!(dates_overlap(d("2024-10-04"), d("2024-10-08"), d("2024-10-01"), d("2024-10-05")));
        // containment
        assert!(dates_overlap(d("2024-10-01"), d("2024-10-10"), d("2024-10-03"), d("2024-10-04")));
    }

    #[test]
    fn test_adjacent_ranges_do_not_overlap() {
        assert!(!dates_overlap(d("2024-10-01"), d("2024-10-05"), d("2024-10-05"), d("2024-10-08")));
        assert!(!dates_overlap(d("2024-10-05"), d("2024-10-08"), d("2024-10-01"), d("2024-10-05")));
    }

    #[test]
    fn test_pending_booking_reduces_availability() {
        let conn = setup_db();
        queries::insert_booking(&conn, &booking("b1", "2024-10-24", "2024-10-26", 2, BookingStatus::Pending))
            .unwrap();

        let availability = check_availability(&conn, "H1", 10, d("2024-10-25"), d("2024-10-28")).unwrap();
        assert_eq!(
            availability,
            Availability {
                available: 8,
                total_rooms: 10,
                booked_rooms: 2
            }
        );
    }

    #[test]
    fn test_cancelled_and_other_hotels_are_ignored() {
        let conn = setup_db();
        queries::insert_booking(&conn, &booking("b1", "2024-10-25", "2024-10-28", 3, BookingStatus::Cancelled))
            .unwrap();
        let mut elsewhere = booking("b2", "2024-10-25", "2024-10-28", 4, BookingStatus::Confirmed);
        elsewhere.hotel_id = "H2".to_string();
        queries::insert_booking(&conn, &elsewhere).unwrap();

        let availability = check_availability(&conn, "H1", 10, d("2024-10-25"), d("2024-10-28")).unwrap();
        assert_eq!(availability.available, 10);
        assert_eq!(availability.booked_rooms, 0);
    }

    #[test]
    fn test_available_never_negative() {
        let bookings = vec![
            booking("b1", "2024-10-25", "2024-10-28", 6, BookingStatus::Confirmed),
            booking("b2", "2024-10-26", "2024-10-27", 7, BookingStatus::Pending),
        ];
        let availability = tally(10, &bookings, d("2024-10-25"), d("2024-10-28"));
        assert_eq!(availability.booked_rooms, 13);
        assert_eq!(availability.available, 0);
        assert!(!availability.can_fit(1));
    }

    #[test]
    fn test_adjacent_booking_does_not_count() {
        let bookings = vec![booking("b1", "2024-10-20", "2024-10-25", 5, BookingStatus::Confirmed)];
        let availability = tally(10, &bookings, d("2024-10-25"), d("2024-10-28"));
        assert_eq!(availability.available, 10);
    }
}
