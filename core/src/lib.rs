//! Synchronous API client core for the Simpy bookmarking service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses raw XML response bodies without
//! touching the network (host-does-IO pattern). The caller executes the
//! actual HTTP round-trip — GET with query parameters, POST with a form
//! body, Basic Auth from the [`Config`] — making the core fully
//! deterministic and testable.
//!
//! # Design
//! - `SimpyClient` is stateless — it holds only a [`Config`].
//! - Each API operation is split into `build_*` (produces a request) and
//!   `parse_*` (consumes the response body), so the I/O boundary is
//!   explicit.
//! - Response payloads are interpreted by a streaming XML parser that keeps
//!   a stack of open element names instead of building a tree; the stack
//!   disambiguates `<note>` as a Link annotation from `<note>` as a
//!   standalone record (see [`parse`]).
//! - Each parse call owns its own stack and record list, so independent
//!   calls never share state.

pub mod client;
pub mod config;
pub mod date;
pub mod error;
pub mod http;
pub mod parse;
pub mod types;

pub use client::{LinkQuery, SimpyClient};
pub use config::Config;
pub use date::{parse_simpy_date, SimpyDate};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest};
pub use parse::{parse_links, parse_notes, parse_status, parse_tags, parse_watchlists};
pub use types::{
    Link, Note, StatusResponse, TagCount, Watchlist, WatchlistFilter, STATUS_MISSING_PARAMETER,
    STATUS_NONEXISTENT_ENTITY, STATUS_QUOTA_REACHED, STATUS_RETRIEVAL_ERROR, STATUS_STORAGE_ERROR,
    STATUS_SUCCESS,
};
