use serde::{Deserialize, Serialize};

/// Partial booking record accumulated across the turns of a conversation.
///
/// Every field is optional until completion. Fields are only ever replaced by
/// a newer extraction that actually matched something; see [`BookingInfo::merge`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_in: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_out: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotel_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guests: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
}

impl BookingInfo {
    /// Overlays every field present in `update` onto `self`.
    ///
    /// Present fields in `update` win; absent fields never clear a value.
    pub fn merge(&mut self, update: &BookingInfo) {
        fn take<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if let Some(v) = value {
                *slot = Some(v.clone());
            }
        }

        take(&mut self.location, &update.location);
        take(&mut self.check_in, &update.check_in);
        take(&mut self.check_out, &update.check_out);
        take(&mut self.guest_name, &update.guest_name);
        take(&mut self.guest_email, &update.guest_email);
        take(&mut self.guest_phone, &update.guest_phone);
        take(&mut self.hotel_id, &update.hotel_id);
        take(&mut self.hotel_name, &update.hotel_name);
        take(&mut self.guests, &update.guests);
        take(&mut self.rooms, &update.rooms);
        take(&mut self.special_requests, &update.special_requests);
    }

    pub fn merged(&self, update: &BookingInfo) -> BookingInfo {
        let mut out = self.clone();
        out.merge(update);
        out
    }

    pub fn is_empty(&self) -> bool {
        *self == BookingInfo::default()
    }

    /// Email plus both stay dates: enough to start attempting completion.
    pub fn has_booking_info(&self) -> bool {
        self.guest_email.is_some() && self.check_in.is_some() && self.check_out.is_some()
    }

    /// Relaxed predicate used when the model never emitted the completion marker.
    pub fn has_guest_identity(&self) -> bool {
        self.guest_name.is_some() && self.guest_email.is_some()
    }

    pub fn guests_or_default(&self) -> u32 {
        self.guests.unwrap_or(1).max(1)
    }

    pub fn rooms_or_default(&self) -> u32 {
        self.rooms.unwrap_or(1).max(1)
    }

    /// Names of the fields a direct completion needs but doesn't have.
    pub fn missing_for_completion(&self) -> Vec<&'static str> {
        let mut missing = vec![];
        if self.guest_name.is_none() {
            missing.push("guestName");
        }
        if self.guest_email.is_none() {
            missing.push("guestEmail");
        }
        if self.check_in.is_none() {
            missing.push("checkIn");
        }
        if self.check_out.is_none() {
            missing.push("checkOut");
        }
        if self.hotel_id.is_none() {
            missing.push("hotelId");
        }
        missing
    }

    /// Like [`missing_for_completion`](Self::missing_for_completion), but a
    /// location stands in for the hotel since one can be resolved from it.
    pub fn missing_for_forced_completion(&self) -> Vec<&'static str> {
        let mut missing: Vec<&'static str> = self
            .missing_for_completion()
            .into_iter()
            .filter(|field| *field != "hotelId")
            .collect();
        if self.hotel_id.is_none() && self.location.is_none() {
            missing.push("location");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overwrites_present_fields_only() {
        let mut info = BookingInfo {
            location: Some("lagos".to_string()),
            guest_email: Some("old@example.com".to_string()),
            ..Default::default()
        };
        let update = BookingInfo {
            guest_email: Some("new@example.com".to_string()),
            check_in: Some("2024-10-25".to_string()),
            ..Default::default()
        };

        info.merge(&update);

        assert_eq!(info.location.as_deref(), Some("lagos"));
        assert_eq!(info.guest_email.as_deref(), Some("new@example.com"));
        assert_eq!(info.check_in.as_deref(), Some("2024-10-25"));
        assert!(info.check_out.is_none());
    }

    #[test]
    fn test_merge_with_empty_update_is_noop() {
        let info = BookingInfo {
            guest_name: Some("Ada".to_string()),
            rooms: Some(2),
            ..Default::default()
        };
        assert_eq!(info.merged(&BookingInfo::default()), info);
    }

    #[test]
    fn test_has_booking_info_requires_email_and_dates() {
        let mut info = BookingInfo {
            guest_email: Some("a@b.com".to_string()),
            check_in: Some("2024-10-25".to_string()),
            ..Default::default()
        };
        assert!(!info.has_booking_info());

        info.check_out = Some("2024-10-28".to_string());
        assert!(info.has_booking_info());
        // name, location and hotel are not part of the predicate
        assert!(info.guest_name.is_none() && info.location.is_none() && info.hotel_id.is_none());
    }

    #[test]
    fn test_missing_fields_lists() {
        let info = BookingInfo {
            guest_name: Some("Ada".to_string()),
            location: Some("lagos".to_string()),
            ..Default::default()
        };
        assert_eq!(
            info.missing_for_completion(),
            vec!["guestEmail", "checkIn", "checkOut", "hotelId"]
        );
        assert_eq!(
            info.missing_for_forced_completion(),
            vec!["guestEmail", "checkIn", "checkOut"]
        );

        let nowhere = BookingInfo::default();
        assert!(nowhere.missing_for_forced_completion().contains(&"location"));
    }

    #[test]
    fn test_serializes_only_present_fields() {
        let info = BookingInfo {
            location: Some("lagos".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json, serde_json::json!({"location": "lagos"}));
    }

    #[test]
    fn test_room_and_guest_defaults() {
        let info = BookingInfo {
            rooms: Some(0),
            ..Default::default()
        };
        assert_eq!(info.rooms_or_default(), 1);
        assert_eq!(info.guests_or_default(), 1);
    }
}
