pub mod chat;
pub mod error;
pub mod profile;
pub mod session;
