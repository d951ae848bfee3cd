//! Stateless request builder and response parser for the Simpy REST API.
//!
//! # Design
//! `SimpyClient` holds a [`Config`] and carries no mutable state between
//! calls. Each API operation is split into a `build_*` method that produces
//! an [`HttpRequest`] and a `parse_*` method that consumes the raw response
//! body text. The caller executes the actual HTTP round-trip (GET with the
//! params as a query string, POST with the params as a form body, Basic
//! Auth from the config), keeping the core deterministic and free of I/O
//! dependencies.
//!
//! Records are validated before their save/delete request is built, so an
//! incomplete record fails with [`ApiError::Invalid`] without any network
//! interaction.

use crate::config::Config;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::parse;
use crate::types::{Link, Note, StatusResponse, TagCount, Watchlist};

const GET_TAGS: &str = "/GetTags.do";
const REMOVE_TAG: &str = "/RemoveTag.do";
const RENAME_TAG: &str = "/RenameTag.do";
const MERGE_TAGS: &str = "/MergeTags.do";
const SPLIT_TAG: &str = "/SplitTag.do";

const GET_LINKS: &str = "/GetLinks.do";
const SAVE_LINK: &str = "/SaveLink.do";
const DELETE_LINK: &str = "/DeleteLink.do";

const GET_NOTES: &str = "/GetNotes.do";
const SAVE_NOTE: &str = "/SaveNote.do";
const DELETE_NOTE: &str = "/DeleteNote.do";

const GET_WATCHLISTS: &str = "/GetWatchlists.do";
const GET_WATCHLIST: &str = "/GetWatchlist.do";

/// Search parameters for `GetLinks.do`. Only set fields are sent.
///
/// `date` must not be combined with `after_date`/`before_date`; the two
/// range parameters belong together. Dates use the `YYYY-MM-DD` form.
#[derive(Debug, Clone, Default)]
pub struct LinkQuery {
    /// Simpy search syntax, e.g. `+tags:"rust" +tags:"xml"`.
    pub q: Option<String>,
    pub limit: Option<u32>,
    pub date: Option<String>,
    pub after_date: Option<String>,
    pub before_date: Option<String>,
}

impl LinkQuery {
    fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(q) = &self.q {
            params.push(("q".to_string(), q.clone()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(date) = &self.date {
            params.push(("date".to_string(), date.clone()));
        }
        if let Some(after_date) = &self.after_date {
            params.push(("afterDate".to_string(), after_date.clone()));
        }
        if let Some(before_date) = &self.before_date {
            params.push(("beforeDate".to_string(), before_date.clone()));
        }
        params
    }
}

/// Synchronous, stateless client for the Simpy REST API.
///
/// Builds `HttpRequest` values and parses response bodies without touching
/// the network. The caller is responsible for executing the HTTP round-trip
/// between `build_*` and `parse_*`.
#[derive(Debug, Clone)]
pub struct SimpyClient {
    config: Config,
}

impl SimpyClient {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    fn get(&self, endpoint: &str, params: Vec<(String, String)>) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: self.url(endpoint),
            params,
        }
    }

    fn post(&self, endpoint: &str, params: Vec<(String, String)>) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            path: self.url(endpoint),
            params,
        }
    }

    // --- tags ---

    /// `GetTags.do`. A limit of 0 retrieves all tags.
    pub fn build_get_tags(&self, limit: u32) -> HttpRequest {
        self.get(GET_TAGS, vec![("limit".to_string(), limit.to_string())])
    }

    pub fn parse_get_tags(&self, body: &str) -> Result<Vec<TagCount>, ApiError> {
        parse::parse_tags(body)
    }

    /// `RemoveTag.do` — removes the tag from every record carrying it.
    pub fn build_remove_tag(&self, tag: &str) -> HttpRequest {
        self.post(REMOVE_TAG, vec![("tag".to_string(), tag.to_string())])
    }

    /// `RenameTag.do`.
    pub fn build_rename_tag(&self, from_tag: &str, to_tag: &str) -> HttpRequest {
        self.post(
            RENAME_TAG,
            vec![
                ("fromTag".to_string(), from_tag.to_string()),
                ("toTag".to_string(), to_tag.to_string()),
            ],
        )
    }

    /// `MergeTags.do` — both source tags collapse into the target.
    pub fn build_merge_tags(&self, from_tag1: &str, from_tag2: &str, to_tag: &str) -> HttpRequest {
        self.post(
            MERGE_TAGS,
            vec![
                ("fromTag1".to_string(), from_tag1.to_string()),
                ("fromTag2".to_string(), from_tag2.to_string()),
                ("toTag".to_string(), to_tag.to_string()),
            ],
        )
    }

    /// `SplitTag.do` — the source tag becomes the two targets.
    pub fn build_split_tag(&self, tag: &str, to_tag1: &str, to_tag2: &str) -> HttpRequest {
        self.post(
            SPLIT_TAG,
            vec![
                ("tag".to_string(), tag.to_string()),
                ("toTag1".to_string(), to_tag1.to_string()),
                ("toTag2".to_string(), to_tag2.to_string()),
            ],
        )
    }

    /// Parse the `<status>` acknowledgment all mutating calls return.
    pub fn parse_status(&self, body: &str) -> Result<StatusResponse, ApiError> {
        parse::parse_status(body)
    }

    // --- links ---

    /// `GetLinks.do`.
    pub fn build_get_links(&self, query: &LinkQuery) -> HttpRequest {
        self.get(GET_LINKS, query.to_params())
    }

    pub fn parse_get_links(&self, body: &str) -> Result<Vec<Link>, ApiError> {
        parse::parse_links(body)
    }

    /// `SaveLink.do`. Fails with [`ApiError::Invalid`] when the link is
    /// missing title, url, or access type.
    pub fn build_save_link(&self, link: &Link) -> Result<HttpRequest, ApiError> {
        link.validate()?;
        Ok(self.post(SAVE_LINK, link.to_params()))
    }

    /// `DeleteLink.do` — deletes the bookmark addressed by its URL.
    pub fn build_delete_link(&self, href: &str) -> Result<HttpRequest, ApiError> {
        if href.is_empty() {
            return Err(ApiError::Invalid {
                entity: "Link",
                reason: "href must be non-empty before deletion",
            });
        }
        Ok(self.post(DELETE_LINK, vec![("href".to_string(), href.to_string())]))
    }

    // --- notes ---

    /// `GetNotes.do`. A limit of 0 retrieves all matching notes.
    pub fn build_get_notes(&self, query: &str, limit: u32) -> HttpRequest {
        self.get(
            GET_NOTES,
            vec![
                ("q".to_string(), query.to_string()),
                ("limit".to_string(), limit.to_string()),
            ],
        )
    }

    pub fn parse_get_notes(&self, body: &str) -> Result<Vec<Note>, ApiError> {
        parse::parse_notes(body)
    }

    /// `SaveNote.do`. Fails with [`ApiError::Invalid`] when the note has
    /// no title.
    pub fn build_save_note(&self, note: &Note) -> Result<HttpRequest, ApiError> {
        note.validate()?;
        Ok(self.post(SAVE_NOTE, note.to_params()))
    }

    /// `DeleteNote.do`. The note needs the server-assigned identifier.
    pub fn build_delete_note(&self, note: &Note) -> Result<HttpRequest, ApiError> {
        if note.id.is_empty() {
            return Err(ApiError::Invalid {
                entity: "Note",
                reason: "id must be non-empty before deletion",
            });
        }
        Ok(self.post(DELETE_NOTE, vec![("noteId".to_string(), note.id.clone())]))
    }

    // --- watchlists ---

    /// `GetWatchlists.do`.
    pub fn build_get_watchlists(&self) -> HttpRequest {
        self.get(GET_WATCHLISTS, Vec::new())
    }

    pub fn parse_get_watchlists(&self, body: &str) -> Result<Vec<Watchlist>, ApiError> {
        parse::parse_watchlists(body)
    }

    /// `GetWatchlist.do`.
    pub fn build_get_watchlist(&self, watchlist_id: u64) -> HttpRequest {
        self.get(
            GET_WATCHLIST,
            vec![("watchlistId".to_string(), watchlist_id.to_string())],
        )
    }

    /// The first watchlist in the response, or `None` when the id did not
    /// match anything (the service answers with an empty document).
    pub fn parse_get_watchlist(&self, body: &str) -> Result<Option<Watchlist>, ApiError> {
        Ok(parse::parse_watchlists(body)?.into_iter().next())
    }
}
