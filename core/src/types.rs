//! Record types for the Simpy API.
//!
//! # Design
//! Records are passive value objects with explicit named fields and empty
//! defaults. The interpreter in [`crate::parse`] fills them by appending
//! character data, so every text field starts as an empty `String`.
//! `access_type` stays the string the service sent (`"public"` or
//! `"private"`); only the save-form conversion collapses it to `1`/`0`.
//! Date fields keep the raw response text next to the parsed value so an
//! unparseable date is still visible to the caller.

use crate::date::SimpyDate;
use crate::error::ApiError;

/// A bookmarked link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Link {
    pub title: String,
    pub url: String,
    /// Free-text annotation. Distinct from the standalone [`Note`] entity.
    pub note: String,
    pub nickname: String,
    /// `"public"` or `"private"`, as received.
    pub access_type: String,
    /// Order-preserving.
    pub tags: Vec<String>,
    pub add_date: Option<SimpyDate>,
    pub mod_date: Option<SimpyDate>,
    /// Raw date text as received, retained even when parsing fails.
    pub add_date_str: String,
    pub mod_date_str: String,
}

impl Link {
    /// A link can be saved once title, url, and access type are set.
    pub fn is_valid(&self) -> bool {
        !self.title.is_empty() && !self.url.is_empty() && !self.access_type.is_empty()
    }

    pub(crate) fn validate(&self) -> Result<(), ApiError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ApiError::Invalid {
                entity: "Link",
                reason: "title, url, and accessType must be non-empty before saving",
            })
        }
    }

    /// Form parameters for `SaveLink.do`.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let access_type = if self.access_type == "public" { "1" } else { "0" };
        vec![
            ("title".to_string(), self.title.clone()),
            ("href".to_string(), self.url.clone()),
            ("note".to_string(), self.note.clone()),
            ("urlNickname".to_string(), self.nickname.clone()),
            ("tags".to_string(), self.tags.join(",")),
            ("accessType".to_string(), access_type.to_string()),
        ]
    }
}

/// A standalone note entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Note {
    pub title: String,
    pub uri: String,
    pub description: String,
    pub nickname: String,
    /// Server-assigned identifier; required for deletion, empty for a
    /// note that has never been saved.
    pub id: String,
    pub access_type: String,
    pub tags: Vec<String>,
    pub add_date: Option<SimpyDate>,
    pub mod_date: Option<SimpyDate>,
    pub add_date_str: String,
    pub mod_date_str: String,
}

impl Note {
    /// A note can be saved once it has a title.
    pub fn is_valid(&self) -> bool {
        !self.title.is_empty()
    }

    pub(crate) fn validate(&self) -> Result<(), ApiError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ApiError::Invalid {
                entity: "Note",
                reason: "title must be non-empty before saving",
            })
        }
    }

    /// Form parameters for `SaveNote.do`. The identifier is sent under
    /// both names the endpoint accepts.
    pub fn to_params(&self) -> Vec<(String, String)> {
        vec![
            ("title".to_string(), self.title.clone()),
            ("id".to_string(), self.id.clone()),
            ("noteId".to_string(), self.id.clone()),
            ("description".to_string(), self.description.clone()),
            ("tags".to_string(), self.tags.join(",")),
        ]
    }
}

/// A named filter attached to a watchlist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchlistFilter {
    pub name: String,
    pub query: String,
}

/// A watchlist over other users' bookmarks. Watchlists cannot be created
/// through the API, so there is no validity predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watchlist {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub new_links: u64,
    pub add_date: Option<SimpyDate>,
    pub users: Vec<String>,
    pub filters: Vec<WatchlistFilter>,
}

/// A tag with its usage count, from `GetTags.do`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagCount {
    pub name: String,
    pub count: u64,
}

/// Status code: success.
pub const STATUS_SUCCESS: i32 = 0;
/// Status code: a required parameter was missing from the request.
pub const STATUS_MISSING_PARAMETER: i32 = 100;
/// Status code: the addressed entity does not exist.
pub const STATUS_NONEXISTENT_ENTITY: i32 = 200;
/// Status code: transient entity retrieval error.
pub const STATUS_RETRIEVAL_ERROR: i32 = 300;
/// Status code: entity storage error.
pub const STATUS_STORAGE_ERROR: i32 = 301;
/// Status code: storage quota reached.
pub const STATUS_QUOTA_REACHED: i32 = 500;

/// The service's generic acknowledgment for mutating calls.
///
/// The core never branches on the code; callers interpret it against the
/// `STATUS_*` constants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusResponse {
    pub code: i32,
    pub message: String,
}

impl StatusResponse {
    pub fn is_success(&self) -> bool {
        self.code == STATUS_SUCCESS
    }
}
