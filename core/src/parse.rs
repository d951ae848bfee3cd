//! Streaming XML interpreter for Simpy response payloads.
//!
//! # Design
//! The service's responses are flat enough that no tree is built: a handler
//! object owns a stack of currently open element names and a list of
//! in-progress records, and three event methods (element start, character
//! data, element end) fill the records in as quick-xml walks the document.
//! The stack is what disambiguates same-named elements — most importantly
//! `<note>`, which is a standalone record directly under `<notes>` but a
//! free-text annotation field inside a `<link>`.
//!
//! Character data is appended, never assigned: a single text value can
//! arrive split across several events (e.g. around CDATA sections), and the
//! accumulated buffer is only interpreted once its element closes.
//!
//! Error policy: structural XML errors fail the whole call and return no
//! partial results. An unparseable date leaves the typed field unset (the
//! raw text is retained on the record) and parsing continues.

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::date::{parse_simpy_date, SimpyDate};
use crate::error::ApiError;
use crate::types::{Link, Note, StatusResponse, TagCount, Watchlist, WatchlistFilter};

/// Receiver for the three streaming events the interpreters care about.
trait ElementHandler {
    fn start_element(&mut self, name: &str, element: &BytesStart) -> Result<(), ApiError>;
    fn characters(&mut self, _text: &str) {}
    fn end_element(&mut self, _name: &str) {}
}

/// Walk `xml` with quick-xml and feed the handler. Self-closing elements
/// are delivered as a start immediately followed by an end.
fn drive<H: ElementHandler>(xml: &str, handler: &mut H) -> Result<(), ApiError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = element_name(&e);
                handler.start_element(&name, &e)?;
            }
            Ok(Event::Empty(e)) => {
                let name = element_name(&e);
                handler.start_element(&name, &e)?;
                handler.end_element(&name);
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                handler.end_element(&name);
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| ApiError::Xml(e.to_string()))?;
                handler.characters(&text);
            }
            Ok(Event::CData(t)) => {
                let raw = t.into_inner();
                handler.characters(&String::from_utf8_lossy(&raw));
            }
            Ok(Event::Eof) => return Ok(()),
            Ok(_) => {}
            Err(e) => return Err(ApiError::Xml(e.to_string())),
        }
    }
}

fn element_name(element: &BytesStart) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

/// Decoded attribute value, or `None` when the attribute is absent.
fn attr(element: &BytesStart, name: &str) -> Result<Option<String>, ApiError> {
    match element.try_get_attribute(name) {
        Ok(Some(a)) => {
            let value = a
                .unescape_value()
                .map_err(|e| ApiError::Xml(e.to_string()))?;
            Ok(Some(value.into_owned()))
        }
        Ok(None) => Ok(None),
        Err(e) => Err(ApiError::Xml(e.to_string())),
    }
}

/// Numeric attribute; absent counts as 0, present-but-non-numeric is fatal.
fn numeric_attr(
    element: &BytesStart,
    name: &str,
    context: &'static str,
) -> Result<u64, ApiError> {
    match attr(element, name)? {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ApiError::Number { context, value }),
        None => Ok(0),
    }
}

/// Parse an accumulated date buffer, warning when non-empty text does not
/// match either date format.
fn parse_date_field(raw: &str) -> Option<SimpyDate> {
    let parsed = parse_simpy_date(raw);
    if parsed.is_none() && !raw.trim().is_empty() {
        log::warn!("unparseable date {raw:?}, leaving field unset");
    }
    parsed
}

// ---------------------------------------------------------------------------
// Links and notes (combined payload)
// ---------------------------------------------------------------------------

enum Item {
    Link(Link),
    Note(Note),
}

/// Interpreter for `<links>` / `<notes>` payloads. Both containers share
/// one element vocabulary, so the two record kinds are parsed together and
/// split afterwards.
#[derive(Default)]
struct ItemHandler {
    stack: Vec<String>,
    items: Vec<Item>,
}

impl ElementHandler for ItemHandler {
    fn start_element(&mut self, name: &str, element: &BytesStart) -> Result<(), ApiError> {
        match name {
            "tag" => {
                // Open an empty slot; character data fills it.
                if let Some(item) = self.items.last_mut() {
                    match item {
                        Item::Link(link) => link.tags.push(String::new()),
                        Item::Note(note) => note.tags.push(String::new()),
                    }
                }
            }
            "link" => {
                let access_type = attr(element, "accessType")?.unwrap_or_default();
                self.items.push(Item::Link(Link {
                    access_type,
                    ..Default::default()
                }));
            }
            // A <note> is a record only directly under the notes container;
            // inside a <link> it is the annotation field.
            "note" if self.stack.last().map(String::as_str) == Some("notes") => {
                let access_type = attr(element, "accessType")?.unwrap_or_default();
                self.items.push(Item::Note(Note {
                    access_type,
                    ..Default::default()
                }));
            }
            _ => {}
        }
        self.stack.push(name.to_string());
        Ok(())
    }

    fn characters(&mut self, text: &str) {
        let Some(current) = self.stack.last() else { return };
        let Some(item) = self.items.last_mut() else { return };
        match item {
            Item::Link(link) => match current.as_str() {
                "title" => link.title.push_str(text),
                "url" => link.url.push_str(text),
                "nickname" => link.nickname.push_str(text),
                "note" => link.note.push_str(text),
                "tag" => {
                    if let Some(tag) = link.tags.last_mut() {
                        tag.push_str(text);
                    }
                }
                "addDate" => link.add_date_str.push_str(text),
                "modDate" => link.mod_date_str.push_str(text),
                _ => {}
            },
            Item::Note(note) => match current.as_str() {
                "title" => note.title.push_str(text),
                "uri" => note.uri.push_str(text),
                "id" => note.id.push_str(text),
                "nickname" => note.nickname.push_str(text),
                "description" => note.description.push_str(text),
                "tag" => {
                    if let Some(tag) = note.tags.last_mut() {
                        tag.push_str(text);
                    }
                }
                "addDate" => note.add_date_str.push_str(text),
                "modDate" => note.mod_date_str.push_str(text),
                _ => {}
            },
        }
    }

    fn end_element(&mut self, name: &str) {
        self.stack.pop();
        if name != "addDate" && name != "modDate" {
            return;
        }
        let Some(item) = self.items.last_mut() else { return };
        match item {
            Item::Link(link) => {
                if name == "addDate" {
                    link.add_date = parse_date_field(&link.add_date_str);
                } else {
                    link.mod_date = parse_date_field(&link.mod_date_str);
                }
            }
            Item::Note(note) => {
                if name == "addDate" {
                    note.add_date = parse_date_field(&note.add_date_str);
                } else {
                    note.mod_date = parse_date_field(&note.mod_date_str);
                }
            }
        }
    }
}

fn parse_items(xml: &str) -> Result<Vec<Item>, ApiError> {
    let mut handler = ItemHandler::default();
    drive(xml, &mut handler)?;
    Ok(handler.items)
}

/// Parse a `GetLinks.do` response. Empty input yields an empty vector.
pub fn parse_links(xml: &str) -> Result<Vec<Link>, ApiError> {
    let links: Vec<Link> = parse_items(xml)?
        .into_iter()
        .filter_map(|item| match item {
            Item::Link(link) => Some(link),
            Item::Note(_) => None,
        })
        .collect();
    debug!("parsed {} links", links.len());
    Ok(links)
}

/// Parse a `GetNotes.do` response. Empty input yields an empty vector.
pub fn parse_notes(xml: &str) -> Result<Vec<Note>, ApiError> {
    let notes: Vec<Note> = parse_items(xml)?
        .into_iter()
        .filter_map(|item| match item {
            Item::Note(note) => Some(note),
            Item::Link(_) => None,
        })
        .collect();
    debug!("parsed {} notes", notes.len());
    Ok(notes)
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

/// Interpreter for `GetTags.do` responses. Everything lives in attributes,
/// so no stack is needed.
#[derive(Default)]
struct TagHandler {
    tags: Vec<TagCount>,
}

impl ElementHandler for TagHandler {
    fn start_element(&mut self, name: &str, element: &BytesStart) -> Result<(), ApiError> {
        if name == "tag" {
            let tag_name = attr(element, "name")?.unwrap_or_default();
            let count = match attr(element, "count")? {
                Some(value) => value.trim().parse().map_err(|_| ApiError::Number {
                    context: "tag count",
                    value,
                })?,
                None => {
                    return Err(ApiError::Number {
                        context: "tag count",
                        value: String::new(),
                    })
                }
            };
            self.tags.push(TagCount {
                name: tag_name,
                count,
            });
        }
        Ok(())
    }
}

/// Parse a `GetTags.do` response. Empty input yields an empty vector.
pub fn parse_tags(xml: &str) -> Result<Vec<TagCount>, ApiError> {
    let mut handler = TagHandler::default();
    drive(xml, &mut handler)?;
    debug!("parsed {} tags", handler.tags.len());
    Ok(handler.tags)
}

// ---------------------------------------------------------------------------
// Watchlists
// ---------------------------------------------------------------------------

/// Interpreter for watchlist payloads. `<user>` and `<filter>` children
/// append to the most recently opened watchlist.
#[derive(Default)]
struct WatchlistHandler {
    watchlists: Vec<Watchlist>,
}

impl ElementHandler for WatchlistHandler {
    fn start_element(&mut self, name: &str, element: &BytesStart) -> Result<(), ApiError> {
        match name {
            "watchlist" => {
                let add_date_raw = attr(element, "addDate")?.unwrap_or_default();
                self.watchlists.push(Watchlist {
                    id: numeric_attr(element, "id", "watchlist id")?,
                    name: attr(element, "name")?.unwrap_or_default(),
                    description: attr(element, "description")?.unwrap_or_default(),
                    new_links: numeric_attr(element, "newLinks", "watchlist newLinks")?,
                    add_date: parse_date_field(&add_date_raw),
                    ..Default::default()
                });
            }
            "user" => {
                let username = attr(element, "username")?.unwrap_or_default();
                if let Some(watchlist) = self.watchlists.last_mut() {
                    watchlist.users.push(username);
                }
            }
            "filter" => {
                let filter = WatchlistFilter {
                    name: attr(element, "name")?.unwrap_or_default(),
                    query: attr(element, "query")?.unwrap_or_default(),
                };
                if let Some(watchlist) = self.watchlists.last_mut() {
                    watchlist.filters.push(filter);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Parse a `GetWatchlists.do` / `GetWatchlist.do` response. Empty input
/// yields an empty vector.
pub fn parse_watchlists(xml: &str) -> Result<Vec<Watchlist>, ApiError> {
    let mut handler = WatchlistHandler::default();
    drive(xml, &mut handler)?;
    debug!("parsed {} watchlists", handler.watchlists.len());
    Ok(handler.watchlists)
}

// ---------------------------------------------------------------------------
// Status responses
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StatusHandler {
    stack: Vec<String>,
    code: String,
    message: String,
}

impl ElementHandler for StatusHandler {
    fn start_element(&mut self, name: &str, _element: &BytesStart) -> Result<(), ApiError> {
        self.stack.push(name.to_string());
        Ok(())
    }

    fn characters(&mut self, text: &str) {
        match self.stack.last().map(String::as_str) {
            Some("code") => self.code.push_str(text),
            Some("message") => self.message.push_str(text),
            _ => {}
        }
    }

    fn end_element(&mut self, _name: &str) {
        self.stack.pop();
    }
}

/// Parse the `<status><code>..</code><message>..</message></status>`
/// acknowledgment of a mutating call. A code that is not an integer is a
/// hard parse error, never a default.
pub fn parse_status(xml: &str) -> Result<StatusResponse, ApiError> {
    let mut handler = StatusHandler::default();
    drive(xml, &mut handler)?;
    let code = handler
        .code
        .trim()
        .parse()
        .map_err(|_| ApiError::Number {
            context: "status code",
            value: handler.code.clone(),
        })?;
    Ok(StatusResponse {
        code,
        message: handler.message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::SimpyDate;
    use chrono::NaiveDate;

    // --- tags ---

    #[test]
    fn tags_one_record_per_element() {
        let xml = r#"<tags>
            <tag name="rust" count="12"/>
            <tag name="xml" count="0"/>
            <tag name="caf&#233;" count="3"/>
        </tags>"#;
        let tags = parse_tags(xml).unwrap();
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[0], TagCount { name: "rust".to_string(), count: 12 });
        assert_eq!(tags[1].count, 0);
        assert_eq!(tags[2].name, "café");
    }

    #[test]
    fn tags_non_numeric_count_is_fatal() {
        let err = parse_tags(r#"<tags><tag name="x" count="many"/></tags>"#).unwrap_err();
        assert!(matches!(err, ApiError::Number { context: "tag count", .. }));
    }

    #[test]
    fn tags_missing_count_is_fatal() {
        let err = parse_tags(r#"<tags><tag name="x"/></tags>"#).unwrap_err();
        assert!(matches!(err, ApiError::Number { .. }));
    }

    #[test]
    fn tags_empty_input_yields_empty_list() {
        assert!(parse_tags("").unwrap().is_empty());
        assert!(parse_tags("<tags></tags>").unwrap().is_empty());
    }

    // --- links / notes disambiguation ---

    #[test]
    fn note_inside_link_is_the_annotation_field() {
        let xml = r#"<links><link accessType="public"><note>inline annotation</note></link></links>"#;
        let links = parse_links(xml).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].note, "inline annotation");
        assert_eq!(links[0].access_type, "public");

        // No standalone Note record may come out of a links document.
        assert!(parse_notes(xml).unwrap().is_empty());
    }

    #[test]
    fn note_under_notes_container_is_a_record() {
        let xml = r#"<notes><note accessType="private"><title>T</title></note></notes>"#;
        let notes = parse_notes(xml).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "T");
        assert_eq!(notes[0].access_type, "private");
        assert!(parse_links(xml).unwrap().is_empty());
    }

    #[test]
    fn link_fields_and_ordered_tags() {
        let xml = r#"<links>
            <link accessType="public">
              <title>Example</title>
              <url>http://example.com/</url>
              <nickname>ex</nickname>
              <tags><tag>b</tag><tag>a</tag><tag>c</tag></tags>
            </link>
        </links>"#;
        let links = parse_links(xml).unwrap();
        assert_eq!(links.len(), 1);
        let link = &links[0];
        assert_eq!(link.title, "Example");
        assert_eq!(link.url, "http://example.com/");
        assert_eq!(link.nickname, "ex");
        assert_eq!(link.tags, vec!["b", "a", "c"]);
    }

    #[test]
    fn note_fields_including_identifier() {
        let xml = r#"<notes>
            <note accessType="private">
              <id>17</id>
              <uri>http://www.simpy.com/notes/17</uri>
              <title>Shopping</title>
              <description>milk, eggs</description>
              <tags><tag>todo</tag></tags>
            </note>
        </notes>"#;
        let notes = parse_notes(xml).unwrap();
        assert_eq!(notes.len(), 1);
        let note = &notes[0];
        assert_eq!(note.id, "17");
        assert_eq!(note.uri, "http://www.simpy.com/notes/17");
        assert_eq!(note.description, "milk, eggs");
        assert_eq!(note.tags, vec!["todo"]);
    }

    #[test]
    fn dates_are_parsed_when_their_element_closes() {
        let xml = r#"<links>
            <link accessType="public">
              <title>T</title>
              <addDate>2007-03-01</addDate>
              <modDate>2007-03-02 14:30</modDate>
            </link>
        </links>"#;
        let links = parse_links(xml).unwrap();
        let link = &links[0];
        assert_eq!(
            link.add_date,
            Some(SimpyDate::Date(NaiveDate::from_ymd_opt(2007, 3, 1).unwrap()))
        );
        assert!(matches!(link.mod_date, Some(SimpyDate::DateTime(_))));
        assert_eq!(link.add_date_str, "2007-03-01");
    }

    #[test]
    fn malformed_date_leaves_field_unset_and_keeps_raw() {
        let xml = r#"<links>
            <link accessType="public">
              <addDate>not-a-date</addDate>
            </link>
        </links>"#;
        let links = parse_links(xml).unwrap();
        assert_eq!(links[0].add_date, None);
        assert_eq!(links[0].add_date_str, "not-a-date");
    }

    #[test]
    fn character_data_is_appended_across_chunks() {
        // CDATA splits the title text into multiple character events.
        let xml = r#"<links><link accessType="public"><title>A<![CDATA[ & ]]>B</title></link></links>"#;
        let links = parse_links(xml).unwrap();
        assert_eq!(links[0].title, "A & B");
    }

    #[test]
    fn entities_are_unescaped() {
        let xml = r#"<links><link accessType="public"><title>Rust &amp; XML</title></link></links>"#;
        let links = parse_links(xml).unwrap();
        assert_eq!(links[0].title, "Rust & XML");
    }

    #[test]
    fn surrounding_whitespace_does_not_leak_into_fields() {
        let xml = "<links>\n  <link accessType=\"public\">\n    <title>T</title>\n    <url>http://x</url>\n  </link>\n</links>";
        let links = parse_links(xml).unwrap();
        assert_eq!(links[0].title, "T");
        assert_eq!(links[0].url, "http://x");
    }

    #[test]
    fn multiple_records_fill_independently() {
        let xml = r#"<links>
            <link accessType="public"><title>one</title><tags><tag>a</tag></tags></link>
            <link accessType="private"><title>two</title><tags><tag>b</tag></tags></link>
        </links>"#;
        let links = parse_links(xml).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].title, "one");
        assert_eq!(links[0].tags, vec!["a"]);
        assert_eq!(links[1].title, "two");
        assert_eq!(links[1].tags, vec!["b"]);
        assert_eq!(links[1].access_type, "private");
    }

    #[test]
    fn missing_access_type_defaults_to_empty() {
        let links = parse_links("<links><link><title>T</title></link></links>").unwrap();
        assert_eq!(links[0].access_type, "");
        assert!(!links[0].is_valid());
    }

    #[test]
    fn malformed_xml_is_fatal() {
        let err = parse_links("<links><link></links>").unwrap_err();
        assert!(matches!(err, ApiError::Xml(_)));
    }

    // --- watchlists ---

    #[test]
    fn watchlist_with_nested_users_and_filters() {
        let xml = r#"<watchlists>
            <watchlist id="42" name="friends" description="people I follow"
                       addDate="2007-03-01" newLinks="2">
              <user username="alice"/>
              <user username="bob"/>
              <filter name="rust" query="tags:rust"/>
            </watchlist>
        </watchlists>"#;
        let watchlists = parse_watchlists(xml).unwrap();
        assert_eq!(watchlists.len(), 1);
        let watchlist = &watchlists[0];
        assert_eq!(watchlist.id, 42);
        assert_eq!(watchlist.name, "friends");
        assert_eq!(watchlist.new_links, 2);
        assert_eq!(watchlist.users, vec!["alice", "bob"]);
        assert_eq!(
            watchlist.filters,
            vec![WatchlistFilter { name: "rust".to_string(), query: "tags:rust".to_string() }]
        );
        assert_eq!(
            watchlist.add_date,
            Some(SimpyDate::Date(NaiveDate::from_ymd_opt(2007, 3, 1).unwrap()))
        );
    }

    #[test]
    fn watchlist_non_numeric_id_is_fatal() {
        let err = parse_watchlists(r#"<watchlists><watchlist id="abc"/></watchlists>"#).unwrap_err();
        assert!(matches!(err, ApiError::Number { context: "watchlist id", .. }));
    }

    #[test]
    fn watchlist_bad_add_date_leaves_field_unset() {
        let xml = r#"<watchlists><watchlist id="1" addDate="yesterday"/></watchlists>"#;
        let watchlists = parse_watchlists(xml).unwrap();
        assert_eq!(watchlists[0].add_date, None);
    }

    #[test]
    fn watchlists_empty_input_yields_empty_list() {
        assert!(parse_watchlists("").unwrap().is_empty());
    }

    // --- status ---

    #[test]
    fn status_code_and_message() {
        let xml = "<status><code>100</code><message>Required parameter missing.</message></status>";
        let status = parse_status(xml).unwrap();
        assert_eq!(status.code, 100);
        assert_eq!(status.message, "Required parameter missing.");
        assert!(!status.is_success());
    }

    #[test]
    fn status_success() {
        let xml = "<status><code>0</code><message>Link saved successfully.</message></status>";
        let status = parse_status(xml).unwrap();
        assert!(status.is_success());
    }

    #[test]
    fn status_non_numeric_code_is_fatal() {
        let xml = "<status><code>oops</code><message>m</message></status>";
        let err = parse_status(xml).unwrap_err();
        assert!(matches!(err, ApiError::Number { context: "status code", .. }));
    }

    #[test]
    fn status_tolerates_surrounding_whitespace_in_code() {
        let xml = "<status>\n  <code>\n    301\n  </code>\n  <message>Entity storage error.</message>\n</status>";
        let status = parse_status(xml).unwrap();
        assert_eq!(status.code, 301);
    }
}
