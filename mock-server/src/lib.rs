//! In-memory imitation of the Simpy REST API for integration testing.
//!
//! Serves the `*.do` endpoints under `/simpy/api/rest`, reading GET query
//! parameters and POST form bodies, and answering with the same XML shapes
//! the real service uses. Links are keyed by `href` (saving an existing
//! href updates it), notes get sequential numeric ids, and tag operations
//! rewrite the tag lists of links and notes alike. One watchlist is seeded
//! because the API offers no way to create one.

use std::{collections::BTreeMap, collections::HashMap, sync::Arc};

use axum::{
    extract::{Form, Query, State},
    http::header,
    routing::{get, post},
    Router,
};
use quick_xml::escape::escape;
use tokio::{net::TcpListener, sync::RwLock};

type Params = HashMap<String, String>;
type Xml = ([(header::HeaderName, &'static str); 1], String);

#[derive(Clone, Debug)]
pub struct StoredLink {
    pub title: String,
    pub url: String,
    pub note: String,
    pub nickname: String,
    pub access_type: String,
    pub tags: Vec<String>,
    pub add_date: String,
    pub mod_date: String,
}

#[derive(Clone, Debug)]
pub struct StoredNote {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub add_date: String,
    pub mod_date: String,
}

#[derive(Clone, Debug)]
pub struct StoredWatchlist {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub add_date: String,
    pub new_links: u64,
    pub users: Vec<String>,
    pub filters: Vec<(String, String)>,
}

#[derive(Debug)]
pub struct Store {
    links: Vec<StoredLink>,
    notes: Vec<StoredNote>,
    next_note_id: u64,
    watchlists: Vec<StoredWatchlist>,
}

impl Store {
    fn new() -> Self {
        Self {
            links: Vec::new(),
            notes: Vec::new(),
            next_note_id: 1,
            watchlists: vec![StoredWatchlist {
                id: 1,
                name: "Rust watchers".to_string(),
                description: "People bookmarking Rust material".to_string(),
                add_date: "2007-03-01".to_string(),
                new_links: 2,
                users: vec!["alice".to_string(), "bob".to_string()],
                filters: vec![("rust".to_string(), "tags:rust".to_string())],
            }],
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::new()));
    Router::new()
        .route("/simpy/api/rest/GetTags.do", get(get_tags))
        .route("/simpy/api/rest/RemoveTag.do", post(remove_tag))
        .route("/simpy/api/rest/RenameTag.do", post(rename_tag))
        .route("/simpy/api/rest/MergeTags.do", post(merge_tags))
        .route("/simpy/api/rest/SplitTag.do", post(split_tag))
        .route("/simpy/api/rest/GetLinks.do", get(get_links))
        .route("/simpy/api/rest/SaveLink.do", post(save_link))
        .route("/simpy/api/rest/DeleteLink.do", post(delete_link))
        .route("/simpy/api/rest/GetNotes.do", get(get_notes))
        .route("/simpy/api/rest/SaveNote.do", post(save_note))
        .route("/simpy/api/rest/DeleteNote.do", post(delete_note))
        .route("/simpy/api/rest/GetWatchlists.do", get(get_watchlists))
        .route("/simpy/api/rest/GetWatchlist.do", get(get_watchlist))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// --- response helpers ---

fn xml(body: String) -> Xml {
    ([(header::CONTENT_TYPE, "text/xml")], body)
}

fn status(code: i32, message: &str) -> Xml {
    xml(format!(
        "<status><code>{code}</code><message>{}</message></status>",
        escape(message)
    ))
}

fn missing_parameter() -> Xml {
    status(100, "Required parameter missing.")
}

fn nonexistent_entity() -> Xml {
    status(200, "Non-existent entity.")
}

fn now() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M").to_string()
}

fn required<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
    params.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

fn limit_of(params: &Params) -> usize {
    params
        .get("limit")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn render_link(link: &StoredLink) -> String {
    let tags: String = link
        .tags
        .iter()
        .map(|t| format!("<tag>{}</tag>", escape(t)))
        .collect();
    format!(
        "<link accessType=\"{}\"><title>{}</title><url>{}</url><nickname>{}</nickname><note>{}</note><tags>{}</tags><addDate>{}</addDate><modDate>{}</modDate></link>",
        escape(&link.access_type),
        escape(&link.title),
        escape(&link.url),
        escape(&link.nickname),
        escape(&link.note),
        tags,
        link.add_date,
        link.mod_date,
    )
}

fn render_note(note: &StoredNote) -> String {
    let tags: String = note
        .tags
        .iter()
        .map(|t| format!("<tag>{}</tag>", escape(t)))
        .collect();
    format!(
        "<note accessType=\"private\"><id>{}</id><uri>http://www.simpy.com/notes/{}</uri><title>{}</title><description>{}</description><tags>{}</tags><addDate>{}</addDate><modDate>{}</modDate></note>",
        note.id,
        note.id,
        escape(&note.title),
        escape(&note.description),
        tags,
        note.add_date,
        note.mod_date,
    )
}

fn render_watchlist(watchlist: &StoredWatchlist) -> String {
    let users: String = watchlist
        .users
        .iter()
        .map(|u| format!("<user username=\"{}\"/>", escape(u)))
        .collect();
    let filters: String = watchlist
        .filters
        .iter()
        .map(|(name, query)| {
            format!(
                "<filter name=\"{}\" query=\"{}\"/>",
                escape(name),
                escape(query)
            )
        })
        .collect();
    format!(
        "<watchlist id=\"{}\" name=\"{}\" description=\"{}\" addDate=\"{}\" newLinks=\"{}\">{users}{filters}</watchlist>",
        watchlist.id,
        escape(&watchlist.name),
        escape(&watchlist.description),
        watchlist.add_date,
        watchlist.new_links,
    )
}

// --- tags ---

async fn get_tags(State(db): State<Db>, Query(params): Query<Params>) -> Xml {
    let store = db.read().await;
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for link in &store.links {
        for tag in &link.tags {
            *counts.entry(tag.clone()).or_default() += 1;
        }
    }
    for note in &store.notes {
        for tag in &note.tags {
            *counts.entry(tag.clone()).or_default() += 1;
        }
    }
    let limit = limit_of(&params);
    let mut body = String::from("<tags>");
    for (i, (name, count)) in counts.iter().enumerate() {
        if limit > 0 && i >= limit {
            break;
        }
        body.push_str(&format!(
            "<tag name=\"{}\" count=\"{count}\"/>",
            escape(name)
        ));
    }
    body.push_str("</tags>");
    xml(body)
}

/// Apply a tag rewrite to every link and note in the store.
async fn rewrite_tags(db: &Db, rewrite: impl Fn(&mut Vec<String>)) {
    let mut store = db.write().await;
    for link in &mut store.links {
        rewrite(&mut link.tags);
    }
    for note in &mut store.notes {
        rewrite(&mut note.tags);
    }
}

fn dedup(tags: &mut Vec<String>) {
    let mut seen = Vec::new();
    tags.retain(|t| {
        if seen.contains(t) {
            false
        } else {
            seen.push(t.clone());
            true
        }
    });
}

async fn remove_tag(State(db): State<Db>, Form(params): Form<Params>) -> Xml {
    let Some(tag) = required(&params, "tag") else {
        return missing_parameter();
    };
    let tag = tag.to_string();
    rewrite_tags(&db, |tags| tags.retain(|t| *t != tag)).await;
    status(0, "Tag removed successfully.")
}

async fn rename_tag(State(db): State<Db>, Form(params): Form<Params>) -> Xml {
    let (Some(from_tag), Some(to_tag)) = (required(&params, "fromTag"), required(&params, "toTag"))
    else {
        return missing_parameter();
    };
    let (from_tag, to_tag) = (from_tag.to_string(), to_tag.to_string());
    rewrite_tags(&db, |tags| {
        for tag in tags.iter_mut() {
            if *tag == from_tag {
                *tag = to_tag.clone();
            }
        }
        dedup(tags);
    })
    .await;
    status(0, "Tag renamed successfully.")
}

async fn merge_tags(State(db): State<Db>, Form(params): Form<Params>) -> Xml {
    let (Some(from1), Some(from2), Some(to_tag)) = (
        required(&params, "fromTag1"),
        required(&params, "fromTag2"),
        required(&params, "toTag"),
    ) else {
        return missing_parameter();
    };
    let (from1, from2, to_tag) = (from1.to_string(), from2.to_string(), to_tag.to_string());
    rewrite_tags(&db, |tags| {
        if tags.iter().any(|t| *t == from1 || *t == from2) {
            tags.retain(|t| *t != from1 && *t != from2);
            tags.push(to_tag.clone());
            dedup(tags);
        }
    })
    .await;
    status(0, "Tags merged successfully.")
}

async fn split_tag(State(db): State<Db>, Form(params): Form<Params>) -> Xml {
    let (Some(tag), Some(to1), Some(to2)) = (
        required(&params, "tag"),
        required(&params, "toTag1"),
        required(&params, "toTag2"),
    ) else {
        return missing_parameter();
    };
    let (tag, to1, to2) = (tag.to_string(), to1.to_string(), to2.to_string());
    rewrite_tags(&db, |tags| {
        if tags.iter().any(|t| *t == tag) {
            tags.retain(|t| *t != tag);
            tags.push(to1.clone());
            tags.push(to2.clone());
            dedup(tags);
        }
    })
    .await;
    status(0, "Tag split successfully.")
}

// --- links ---

fn link_matches(link: &StoredLink, q: &str) -> bool {
    q.is_empty()
        || link.title.contains(q)
        || link.url.contains(q)
        || link.note.contains(q)
        || link.tags.iter().any(|t| t == q)
}

async fn get_links(State(db): State<Db>, Query(params): Query<Params>) -> Xml {
    let store = db.read().await;
    let q = params.get("q").map(String::as_str).unwrap_or("");
    let limit = limit_of(&params);
    let mut body = String::from("<links>");
    for (i, link) in store
        .links
        .iter()
        .filter(|l| link_matches(l, q))
        .enumerate()
    {
        if limit > 0 && i >= limit {
            break;
        }
        body.push_str(&render_link(link));
    }
    body.push_str("</links>");
    xml(body)
}

async fn save_link(State(db): State<Db>, Form(params): Form<Params>) -> Xml {
    let Some(href) = required(&params, "href") else {
        return missing_parameter();
    };
    let access_type = match params.get("accessType").map(String::as_str) {
        Some("1") => "public",
        _ => "private",
    };
    let tags = split_tags(params.get("tags").map(String::as_str).unwrap_or(""));
    let mut store = db.write().await;
    let timestamp = now();
    if let Some(existing) = store.links.iter_mut().find(|l| l.url == href) {
        existing.title = params.get("title").cloned().unwrap_or_default();
        existing.note = params.get("note").cloned().unwrap_or_default();
        existing.nickname = params.get("urlNickname").cloned().unwrap_or_default();
        existing.access_type = access_type.to_string();
        existing.tags = tags;
        existing.mod_date = timestamp;
    } else {
        store.links.push(StoredLink {
            title: params.get("title").cloned().unwrap_or_default(),
            url: href.to_string(),
            note: params.get("note").cloned().unwrap_or_default(),
            nickname: params.get("urlNickname").cloned().unwrap_or_default(),
            access_type: access_type.to_string(),
            tags,
            add_date: timestamp.clone(),
            mod_date: timestamp,
        });
    }
    status(0, "Link saved successfully.")
}

async fn delete_link(State(db): State<Db>, Form(params): Form<Params>) -> Xml {
    let Some(href) = required(&params, "href") else {
        return missing_parameter();
    };
    let mut store = db.write().await;
    let before = store.links.len();
    store.links.retain(|l| l.url != href);
    if store.links.len() == before {
        nonexistent_entity()
    } else {
        status(0, "Link deleted successfully.")
    }
}

// --- notes ---

fn note_matches(note: &StoredNote, q: &str) -> bool {
    q.is_empty()
        || note.title.contains(q)
        || note.description.contains(q)
        || note.tags.iter().any(|t| t == q)
}

async fn get_notes(State(db): State<Db>, Query(params): Query<Params>) -> Xml {
    let store = db.read().await;
    let q = params.get("q").map(String::as_str).unwrap_or("");
    let limit = limit_of(&params);
    let mut body = String::from("<notes>");
    for (i, note) in store
        .notes
        .iter()
        .filter(|n| note_matches(n, q))
        .enumerate()
    {
        if limit > 0 && i >= limit {
            break;
        }
        body.push_str(&render_note(note));
    }
    body.push_str("</notes>");
    xml(body)
}

async fn save_note(State(db): State<Db>, Form(params): Form<Params>) -> Xml {
    let Some(title) = required(&params, "title") else {
        return missing_parameter();
    };
    let description = params.get("description").cloned().unwrap_or_default();
    let tags = split_tags(params.get("tags").map(String::as_str).unwrap_or(""));
    let mut store = db.write().await;
    let timestamp = now();
    if let Some(id_param) = required(&params, "noteId") {
        let Ok(id) = id_param.parse::<u64>() else {
            return missing_parameter();
        };
        let Some(existing) = store.notes.iter_mut().find(|n| n.id == id) else {
            return nonexistent_entity();
        };
        existing.title = title.to_string();
        existing.description = description;
        existing.tags = tags;
        existing.mod_date = timestamp;
    } else {
        let id = store.next_note_id;
        store.next_note_id += 1;
        store.notes.push(StoredNote {
            id,
            title: title.to_string(),
            description,
            tags,
            add_date: timestamp.clone(),
            mod_date: timestamp,
        });
    }
    status(0, "Note saved successfully.")
}

async fn delete_note(State(db): State<Db>, Form(params): Form<Params>) -> Xml {
    let Some(id_param) = required(&params, "noteId") else {
        return missing_parameter();
    };
    let Ok(id) = id_param.parse::<u64>() else {
        return missing_parameter();
    };
    let mut store = db.write().await;
    let before = store.notes.len();
    store.notes.retain(|n| n.id != id);
    if store.notes.len() == before {
        nonexistent_entity()
    } else {
        status(0, "Note deleted successfully.")
    }
}

// --- watchlists ---

async fn get_watchlists(State(db): State<Db>) -> Xml {
    let store = db.read().await;
    let mut body = String::from("<watchlists>");
    for watchlist in &store.watchlists {
        body.push_str(&render_watchlist(watchlist));
    }
    body.push_str("</watchlists>");
    xml(body)
}

async fn get_watchlist(State(db): State<Db>, Query(params): Query<Params>) -> Xml {
    let store = db.read().await;
    let id: Option<u64> = params.get("watchlistId").and_then(|v| v.parse().ok());
    let mut body = String::from("<watchlists>");
    if let Some(watchlist) = id.and_then(|id| store.watchlists.iter().find(|w| w.id == id)) {
        body.push_str(&render_watchlist(watchlist));
    }
    body.push_str("</watchlists>");
    xml(body)
}
