pub mod affirmations;
pub mod analytics;
pub mod calendar;
pub mod chat;
pub mod inference;
pub mod safety;
pub mod streak;
