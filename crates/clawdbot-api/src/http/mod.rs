//! HTTP surface for the relay.
//!
//! Liveness and status endpoints for the hosting platform plus an
//! authenticated inbound-message endpoint at `/api/v1/` for transport
//! adapters.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
