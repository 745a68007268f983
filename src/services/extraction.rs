//! Pattern-based extraction of booking details from conversation text.
//!
//! Each rule is independent: several may fire on one call, and a rule that
//! finds nothing leaves its field unset so a merge keeps the prior value.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{BookingInfo, ConversationMessage, MessageRole};

/// Messages scanned for dates, contact details and names.
pub const GENERAL_WINDOW: usize = 10;
/// Messages scanned for a location.
pub const LOCATION_WINDOW: usize = 5;

/// Recognized location names, matched case-insensitively on word boundaries.
pub const GAZETTEER: &[&str] = &[
    "lagos", "new york", "london", "paris", "tokyo", "dubai", "singapore", "miami",
    "los angeles", "chicago", "toronto", "sydney", "navi mumbai", "mumbai", "delhi",
    "bangalore", "kolkata", "chennai", "hyderabad", "pune", "ahmedabad", "jaipur", "lucknow",
    "kanpur", "nagpur", "indore", "thane", "bhopal", "visakhapatnam", "pimpri", "patna",
    "vadodara", "ghaziabad", "ludhiana", "agra", "nashik", "faridabad", "meerut", "rajkot",
    "kalyan", "vasai", "varanasi", "srinagar", "aurangabad", "solapur", "vijayawada",
    "kolhapur", "amritsar", "noida", "ranchi", "howrah", "coimbatore", "raipur", "jabalpur",
    "gwalior", "jodhpur", "madurai", "mysore", "tiruchirappalli", "kota", "chandigarh",
    "bhubaneswar", "salem", "warangal", "guntur", "bhiwandi", "amravati", "nanded", "sangli",
    "malegaon", "ulhasnagar", "jalgaon", "akola", "latur", "ahmednagar", "dhule",
    "ichalkaranji", "parbhani", "jalna", "bhusawal", "panvel", "satara", "beed", "yavatmal",
    "kamptee", "gondia", "barshi", "achalpur", "osmanabad", "nandurbar", "wardha", "udgir",
    "hinganghat",
];

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,2}/\d{1,2}/\d{4}\b|\b\d{4}-\d{2}-\d{2}\b").unwrap());

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+?1[-.\s]?)?\(?\b[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}\b").unwrap()
});

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:my name is|i'm|i am|call me|name is)\s+([a-z]+(?:[ \t]+[a-z]+)*)").unwrap()
});

static LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    let names: Vec<String> = GAZETTEER.iter().map(|n| regex::escape(n)).collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", names.join("|"))).unwrap()
});

/// Words that end a captured name ("I'm Ada and my email is ..." -> "Ada").
const NAME_STOP_WORDS: &[&str] = &[
    "and", "my", "email", "phone", "number", "from", "with", "but", "here", "looking", "going",
    "traveling", "travelling", "staying", "interested", "planning", "trying", "in", "at", "for",
];

/// Turns conversation text into a partial booking record.
///
/// Kept behind a trait so the state machine doesn't depend on how the
/// parsing is done.
pub trait BookingExtractor: Send + Sync {
    /// Everything extractable from the recent window of `messages`.
    fn extract(&self, messages: &[ConversationMessage]) -> BookingInfo;

    /// Location only, from the shorter location window.
    fn locate(&self, messages: &[ConversationMessage]) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PatternExtractor;

impl BookingExtractor for PatternExtractor {
    fn extract(&self, messages: &[ConversationMessage]) -> BookingInfo {
        let text = guest_text(messages, GENERAL_WINDOW);
        let (check_in, check_out) = match extract_dates(&text) {
            Some((a, b)) => (Some(a), Some(b)),
            None => (None, None),
        };

        BookingInfo {
            location: self.locate(messages),
            check_in,
            check_out,
            guest_name: extract_name(&text),
            guest_email: extract_email(&text),
            guest_phone: extract_phone(&text),
            ..Default::default()
        }
    }

    fn locate(&self, messages: &[ConversationMessage]) -> Option<String> {
        extract_location(&window_text(messages, LOCATION_WINDOW))
    }
}

fn window(messages: &[ConversationMessage], n: usize) -> &[ConversationMessage] {
    &messages[messages.len().saturating_sub(n)..]
}

/// Contents of the last `n` messages joined by spaces, oldest first.
pub fn window_text(messages: &[ConversationMessage], n: usize) -> String {
    window(messages, n)
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Like [`window_text`], keeping only what the guest wrote. Assistant
/// phrasing such as "I am happy to help" must not become a guest name.
pub fn guest_text(messages: &[ConversationMessage], n: usize) -> String {
    window(messages, n)
        .iter()
        .filter(|m| m.role == MessageRole::User)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// First two date tokens in order of appearance. No ordering check: an
/// inverted pair is caught when the booking is priced.
pub fn extract_dates(text: &str) -> Option<(String, String)> {
    let mut dates = DATE_RE.find_iter(text).map(|m| m.as_str().to_string());
    let first = dates.next()?;
    let second = dates.next()?;
    Some((first, second))
}

pub fn extract_email(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_string())
}

pub fn extract_phone(text: &str) -> Option<String> {
    PHONE_RE.find(text).map(|m| m.as_str().trim().to_string())
}

pub fn extract_name(text: &str) -> Option<String> {
    let captured = NAME_RE.captures(text)?.get(1)?.as_str();
    let words: Vec<&str> = captured
        .split_whitespace()
        .take_while(|w| !NAME_STOP_WORDS.contains(&w.to_lowercase().as_str()))
        .collect();
    if words.is_empty() {
        return None;
    }
    Some(words.join(" "))
}

pub fn extract_location(text: &str) -> Option<String> {
    LOCATION_RE.find(text).map(|m| m.as_str().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn msgs(contents: &[&str]) -> Vec<ConversationMessage> {
        contents
            .iter()
            .enumerate()
            .map(|(i, c)| ConversationMessage {
                role: if i % 2 == 0 { MessageRole::User } else { MessageRole::Assistant },
                content: c.to_string(),
                timestamp: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn test_dates_first_two_win() {
        assert_eq!(
            extract_dates("from 2024-10-25 to 2024-10-28, maybe 2024-11-01"),
            Some(("2024-10-25".to_string(), "2024-10-28".to_string()))
        );
        assert_eq!(
            extract_dates("10/25/2024 until 2024-10-28"),
            Some(("10/25/2024".to_string(), "2024-10-28".to_string()))
        );
        // no ordering validation here
        assert_eq!(
            extract_dates("2024-10-28 then 2024-10-25"),
            Some(("2024-10-28".to_string(), "2024-10-25".to_string()))
        );
    }

    #[test]
    fn test_single_date_is_not_enough() {
        assert_eq!(extract_dates("arriving 2024-10-25"), None);
    }

    #[test]
    fn test_email_first_match() {
        assert_eq!(
            extract_email("reach me at a@b.com or backup@example.org").as_deref(),
            Some("a@b.com")
        );
        assert_eq!(extract_email("no email here"), None);
    }

    #[test]
    fn test_phone_formats() {
        assert_eq!(extract_phone("call 555-123-4567 please").as_deref(), Some("555-123-4567"));
        assert_eq!(extract_phone("(555) 123-4567").as_deref(), Some("(555) 123-4567"));
        assert_eq!(extract_phone("+1 555.123.4567").as_deref(), Some("+1 555.123.4567"));
        assert_eq!(extract_phone("room 12"), None);
    }

    #[test]
    fn test_name_needs_cue_phrase() {
        assert_eq!(extract_name("My name is John Smith").as_deref(), Some("John Smith"));
        assert_eq!(extract_name("call me Ada.").as_deref(), Some("Ada"));
        assert_eq!(
            extract_name("I'm Grace Hopper and my email is g@h.com").as_deref(),
            Some("Grace Hopper")
        );
        assert_eq!(extract_name("John Smith here"), None);
        assert_eq!(extract_name("I'm looking for a hotel"), None);
    }

    #[test]
    fn test_location_gazetteer() {
        assert_eq!(extract_location("A hotel in LAGOS please").as_deref(), Some("lagos"));
        assert_eq!(extract_location("visiting New York soon").as_deref(), Some("new york"));
        assert_eq!(extract_location("near navi mumbai").as_deref(), Some("navi mumbai"));
        assert_eq!(extract_location("somewhere in Atlantis"), None);
        // word boundaries: "parish" is not paris
        assert_eq!(extract_location("the parish hall"), None);
    }

    #[test]
    fn test_extract_combines_rules() {
        let messages = msgs(&[
            "I want a hotel in Lagos",
            "Great choice! Which dates?",
            "2024-10-25 to 2024-10-28. My name is John Smith, email john@example.com, phone 555-123-4567",
        ]);
        let info = PatternExtractor.extract(&messages);
        assert_eq!(info.location.as_deref(), Some("lagos"));
        assert_eq!(info.check_in.as_deref(), Some("2024-10-25"));
        assert_eq!(info.check_out.as_deref(), Some("2024-10-28"));
        assert_eq!(info.guest_name.as_deref(), Some("John Smith"));
        assert_eq!(info.guest_email.as_deref(), Some("john@example.com"));
        assert_eq!(info.guest_phone.as_deref(), Some("555-123-4567"));
        assert!(info.hotel_id.is_none());
    }

    #[test]
    fn test_extract_is_idempotent() {
        let messages = msgs(&["Lagos, 2024-10-25 to 2024-10-28, a@b.com"]);
        let first = PatternExtractor.extract(&messages);
        let second = PatternExtractor.extract(&messages);
        assert_eq!(first, second);

        let mut info = BookingInfo::default();
        info.merge(&first);
        let once = info.clone();
        info.merge(&second);
        assert_eq!(info, once);
    }

    #[test]
    fn test_windows_limit_what_is_scanned() {
        let mut contents = vec!["I need a room in Paris"];
        contents.extend(std::iter::repeat("ok").take(LOCATION_WINDOW));
        let messages = msgs(&contents);
        assert_eq!(PatternExtractor.locate(&messages), None);

        let mut contents = vec!["email me at old@example.com"];
        contents.extend(std::iter::repeat("ok").take(GENERAL_WINDOW));
        assert_eq!(PatternExtractor.extract(&msgs(&contents)).guest_email, None);
    }

    #[test]
    fn test_assistant_wording_is_not_guest_detail() {
        let messages = msgs(&["Lagos please", "I am happy to help! Write to help@hotel.com"]);
        let info = PatternExtractor.extract(&messages);
        assert_eq!(info.guest_name, None);
        assert_eq!(info.guest_email, None);
        assert_eq!(info.location.as_deref(), Some("lagos"));
    }

    #[test]
    fn test_nothing_found_is_empty() {
        let info = PatternExtractor.extract(&msgs(&["hello there"]));
        assert!(info.is_empty());
    }
}
