use chrono::NaiveDate;

use crate::errors::AppError;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"];

/// Parses a stay date as typed by a guest: ISO first, then US, then
/// day-first slashes.
pub fn parse_stay_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

pub fn parse_stay_date_or_invalid(raw: &str, field: &str) -> Result<NaiveDate, AppError> {
    parse_stay_date(raw).ok_or_else(|| AppError::Validation(format!("Invalid {field} date: {raw}")))
}

/// Nights between two dates. Check-out must come after check-in.
pub fn nights(check_in: NaiveDate, check_out: NaiveDate) -> Result<u32, AppError> {
    let days = (check_out - check_in).num_days();
    if days < 1 {
        return Err(AppError::Validation(
            "Check-out date must be after check-in date".to_string(),
        ));
    }
    Ok(days as u32)
}

/// Total for a stay: nightly price × nights × rooms, with rooms floored at 1.
pub fn quote(price_per_night: f64, check_in: NaiveDate, check_out: NaiveDate, rooms: u32) -> Result<f64, AppError> {
    let nights = nights(check_in, check_out)?;
    Ok(price_per_night * nights as f64 * rooms.max(1) as f64)
}
