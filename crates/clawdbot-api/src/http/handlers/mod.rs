//! HTTP request handlers.

pub mod health;
pub mod message;
pub mod status;
