//! Error types for the Simpy API client.
//!
//! # Design
//! Structural XML failures are fatal for the whole parse call and carry the
//! underlying parser message. Numeric failures get their own variant because
//! they name the exact field that was non-numeric (a tag count, a watchlist
//! id, a status code), which is what a caller debugging a server response
//! wants to see. `Invalid` is raised before any request is built, so a
//! validation failure never reaches the network.

use std::fmt;

/// Errors returned by `SimpyClient` build and parse methods.
#[derive(Debug)]
pub enum ApiError {
    /// The response XML was structurally malformed. No partial results
    /// are returned.
    Xml(String),

    /// A field or attribute that must be numeric did not parse as an
    /// integer. `context` names the field, `value` is the offending text.
    Number { context: &'static str, value: String },

    /// A record failed its validity predicate before a save or delete
    /// request could be built.
    Invalid { entity: &'static str, reason: &'static str },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Xml(msg) => write!(f, "malformed XML response: {msg}"),
            ApiError::Number { context, value } => {
                write!(f, "non-numeric {context}: {value:?}")
            }
            ApiError::Invalid { entity, reason } => {
                write!(f, "invalid {entity}: {reason}")
            }
        }
    }
}

impl std::error::Error for ApiError {}
