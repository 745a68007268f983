pub mod availability;
pub mod booking;
pub mod booking_info;
pub mod conversation;
pub mod hotel;

pub use availability::Availability;
pub use booking::{Booking, BookingFilter, BookingStats, BookingStatus, BookingUpdate, NewBooking, StatusCounts};
pub use booking_info::BookingInfo;
pub use conversation::{Conversation, ConversationMessage, ConversationStatus, MessageRole};
pub use hotel::{Hotel, HotelQuery, HotelStats, DEFAULT_TOTAL_ROOMS};
