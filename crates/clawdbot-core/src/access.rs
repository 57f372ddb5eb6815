//! Allow-list access control.

use std::collections::HashSet;

use clawdbot_types::message::Principal;

/// Fixed reply for principals outside the allow-set.
pub const DENIED_REPLY: &str = "⛔ Unauthorized access.";

/// Membership test against the configured allow-set.
///
/// The set is fixed for the process lifetime.
#[derive(Debug, Clone)]
pub struct AccessGate {
    allowed: HashSet<Principal>,
}

impl AccessGate {
    pub fn new(allowed: impl IntoIterator<Item = Principal>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn authorize(&self, principal: &Principal) -> bool {
        self.allowed.contains(principal)
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}
