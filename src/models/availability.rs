use serde::Serialize;

/// Room availability for one hotel over one date range.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub available: u32,
    pub total_rooms: u32,
    pub booked_rooms: u32,
}

impl Availability {
    pub fn new(total_rooms: u32, booked_rooms: u32) -> Self {
        Self {
            available: total_rooms.saturating_sub(booked_rooms),
            total_rooms,
            booked_rooms,
        }
    }

    pub fn can_fit(&self, rooms: u32) -> bool {
        self.available >= rooms
    }
}
