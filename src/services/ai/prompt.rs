use crate::models::Hotel;

/// First assistant message of every conversation.
pub const GREETING: &str =
    "Hi there! Tell me what kind of hotel you're looking for and where. I'll handle the rest.";

/// Literal token the model emits once it believes the booking is ready.
pub const COMPLETION_MARKER: &str = "BOOKING_COMPLETE";

const SYSTEM_PROMPT: &str = r#"You are a friendly hotel booking assistant. You help guests reserve hotel rooms through a natural conversation.

The conversation always opens with: "Hi there! Tell me what kind of hotel you're looking for and where. I'll handle the rest."

Information to gather, in whatever order the guest offers it:
- Location (city)
- Check-in and check-out dates (ask for YYYY-MM-DD if the guest is vague)
- Number of guests and rooms
- Preferences (optional: near the airport, pool, pet-friendly, ...)
- Full name
- Email address (the confirmation goes there)
- Phone number

How to run the conversation:
1. Pick up the location and intent from the first message.
2. Ask for dates if they are missing.
3. Suggest 2-3 hotels from the list below with their name, star rating and nightly price, formatted like: "🏨 [Hotel Name] ⭐⭐⭐⭐ (4 stars) - $XXX/night".
4. Collect the guest's name, email and phone.
5. Once you have the location, dates, a hotel choice, the guest's name and email, write BOOKING_COMPLETE followed by a short booking summary.

Rules:
- Never mention a checkout or payment link; the system appends it to your message.
- Never say the reservation is confirmed; it is only confirmed after payment.
- If the guest gives their name and email after choosing a hotel, write BOOKING_COMPLETE.
- Keep replies short and friendly."#;

/// Builds the system prompt, listing catalog hotels for the known location.
pub fn system_prompt(location: Option<&str>, hotels: &[Hotel]) -> String {
    let mut prompt = SYSTEM_PROMPT.to_string();

    if let Some(location) = location {
        if hotels.is_empty() {
            prompt.push_str(&format!(
                "\n\nNo hotels in our catalog match \"{location}\". Offer nearby alternatives or ask for another city."
            ));
        } else {
            prompt.push_str(&format!("\n\nHotels available in {location}:"));
            for hotel in hotels {
                prompt.push_str(&format!(
                    "\n- {} ({}, {} stars, rated {:.1}) - ${:.0}/night. {}",
                    hotel.name,
                    hotel.location,
                    hotel.star_rating,
                    hotel.rating,
                    hotel.price_per_night,
                    hotel.description,
                ));
            }
        }
    }

    prompt
}

pub fn signals_completion(response: &str) -> bool {
    response.contains(COMPLETION_MARKER)
}

/// Removes every occurrence of the marker so the user never sees it.
pub fn strip_completion_marker(response: &str) -> String {
    if !signals_completion(response) {
        return response.to_string();
    }
    response.replace(COMPLETION_MARKER, "").trim().to_string()
}

pub fn with_payment_link(response: &str, link: &str) -> String {
    format!("{response}\n\n🔗 **Complete Your Booking:** {link}")
}

/// Checkout URL for a booking, rooted at the caller's origin when known.
pub fn payment_link(origin: Option<&str>, frontend_url: &str, booking_id: &str) -> String {
    let base = origin
        .filter(|o| !o.trim().is_empty())
        .unwrap_or(frontend_url)
        .trim_end_matches('/');
    format!("{base}/Frontend/checkout.html?bookingId={booking_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_detection() {
        assert!(signals_completion("All set! BOOKING_COMPLETE"));
        assert!(!signals_completion("booking complete"));
        assert!(!signals_completion("Which dates work for you?"));
    }

    #[test]
    fn test_strip_marker() {
        let stripped = strip_completion_marker("BOOKING_COMPLETE Here is your summary.");
        assert_eq!(stripped, "Here is your summary.");
        assert!(!strip_completion_marker("a BOOKING_COMPLETE b BOOKING_COMPLETE").contains(COMPLETION_MARKER));
        assert_eq!(strip_completion_marker("  untouched  "), "  untouched  ");
    }

    #[test]
    fn test_payment_link_prefers_origin() {
        assert_eq!(
            payment_link(Some("https://book.example.com/"), "http://localhost:5500", "b1"),
            "https://book.example.com/Frontend/checkout.html?bookingId=b1"
        );
        assert_eq!(
            payment_link(None, "http://localhost:5500/", "b2"),
            "http://localhost:5500/Frontend/checkout.html?bookingId=b2"
        );
    }

    #[test]
    fn test_system_prompt_lists_hotels() {
        let hotel: Hotel = serde_json::from_str(
            r#"{"id":"H1","name":"Harbour View","location":"Lagos","starRating":4,"rating":4.2,"pricePerNight":210}"#,
        )
        .unwrap();
        let prompt = system_prompt(Some("lagos"), &[hotel]);
        assert!(prompt.contains("Hotels available in lagos"));
        assert!(prompt.contains("Harbour View"));
        assert!(prompt.contains("$210/night"));

        let bare = system_prompt(None, &[]);
        assert!(!bare.contains("Hotels available"));
        assert!(bare.contains(COMPLETION_MARKER));
    }
}
