pub mod ai;
pub mod availability;
pub mod booking;
pub mod catalog;
pub mod conversation;
pub mod extraction;
pub mod pricing;
pub mod speech;
