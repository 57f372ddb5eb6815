//! Principals and the `(principal, text)` pairs exchanged with the
//! external chat transport.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a chat user or channel subject to access control.
///
/// Serialized as a bare string. Deserialization goes through
/// [`Principal::new`], so surrounding whitespace never reaches the allow-set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Principal {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<Principal> for String {
    fn from(principal: Principal) -> Self {
        principal.0
    }
}

impl From<i64> for Principal {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// A message delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub principal: Principal,
    pub text: String,
}

impl InboundMessage {
    pub fn new(principal: impl Into<Principal>, text: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            text: text.into(),
        }
    }
}

/// A reply handed back to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub principal: Principal,
    pub text: String,
}
