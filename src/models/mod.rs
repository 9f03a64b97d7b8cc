pub mod chat;
pub mod habit;
pub mod mood;
pub mod user;
