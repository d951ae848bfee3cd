//! Full lifecycle test against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises every client
//! operation over real HTTP using ureq. The host executes each
//! `HttpRequest` — query parameters for GET, a form body for POST — and
//! hands the raw body text back to the matching `parse_*` method,
//! validating the build/parse split end-to-end.

use simpy_core::{
    ApiError, Config, HttpMethod, HttpRequest, Link, LinkQuery, Note, SimpyClient,
    STATUS_NONEXISTENT_ENTITY,
};

/// Execute an `HttpRequest` using ureq and return the response body text.
///
/// Disables ureq's automatic status-code-as-error behavior; the Simpy
/// protocol reports errors inside the XML body, not via HTTP status.
fn execute(req: HttpRequest) -> String {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let mut response = match req.method {
        HttpMethod::Get => {
            let mut builder = agent.get(&req.path);
            for (key, value) in &req.params {
                builder = builder.query(key, value);
            }
            builder.call()
        }
        HttpMethod::Post => agent.post(&req.path).send_form(req.params.clone()),
    }
    .expect("HTTP transport error");

    response.body_mut().read_to_string().unwrap_or_default()
}

#[test]
fn api_lifecycle() {
    // Step 1: start mock server on a random port.
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    let config =
        Config::new("user", "secret").with_base_url(&format!("http://{addr}/simpy/api/rest"));
    let client = SimpyClient::new(config);

    // Step 2: link listing starts empty.
    let body = execute(client.build_get_links(&LinkQuery::default()));
    assert!(client.parse_get_links(&body).unwrap().is_empty());

    // Step 3: an incomplete link fails validation before any request.
    let incomplete = Link {
        title: "No URL".to_string(),
        ..Default::default()
    };
    assert!(matches!(
        client.build_save_link(&incomplete).unwrap_err(),
        ApiError::Invalid { entity: "Link", .. }
    ));

    // Step 4: save a complete link.
    let link = Link {
        title: "The Rust Book".to_string(),
        url: "https://doc.rust-lang.org/book/".to_string(),
        note: "read me".to_string(),
        access_type: "public".to_string(),
        tags: vec!["rust".to_string(), "books".to_string()],
        ..Default::default()
    };
    let status = client
        .parse_status(&execute(client.build_save_link(&link).unwrap()))
        .unwrap();
    assert!(status.is_success(), "save failed: {}", status.message);

    // Step 5: it comes back with its fields and tag order intact.
    let body = execute(client.build_get_links(&LinkQuery::default()));
    let links = client.parse_get_links(&body).unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].title, link.title);
    assert_eq!(links[0].url, link.url);
    assert_eq!(links[0].note, link.note);
    assert_eq!(links[0].access_type, "public");
    assert_eq!(links[0].tags, link.tags);
    assert!(links[0].add_date.is_some());

    // Step 6: tag counts reflect the saved link.
    let tags = client
        .parse_get_tags(&execute(client.build_get_tags(0)))
        .unwrap();
    assert_eq!(tags.len(), 2);
    assert!(tags.iter().any(|t| t.name == "rust" && t.count == 1));

    // Step 7: rename a tag and watch it change on the link.
    let status = client
        .parse_status(&execute(client.build_rename_tag("books", "reading")))
        .unwrap();
    assert!(status.is_success());
    let body = execute(client.build_get_links(&LinkQuery {
        q: Some("reading".to_string()),
        ..Default::default()
    }));
    let links = client.parse_get_links(&body).unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].tags, vec!["rust", "reading"]);

    // Step 8: note lifecycle — save, find, delete.
    let note = Note {
        title: "test note title".to_string(),
        description: "test note description".to_string(),
        tags: vec!["fortestonly".to_string()],
        ..Default::default()
    };
    let status = client
        .parse_status(&execute(client.build_save_note(&note).unwrap()))
        .unwrap();
    assert!(status.is_success());

    let body = execute(client.build_get_notes("fortestonly", 0));
    let notes = client.parse_get_notes(&body).unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "test note title");
    assert!(!notes[0].id.is_empty());

    let status = client
        .parse_status(&execute(client.build_delete_note(&notes[0]).unwrap()))
        .unwrap();
    assert!(status.is_success());
    let body = execute(client.build_get_notes("", 0));
    assert!(client.parse_get_notes(&body).unwrap().is_empty());

    // Step 9: watchlists — seeded list, lookup hit and miss.
    let watchlists = client
        .parse_get_watchlists(&execute(client.build_get_watchlists()))
        .unwrap();
    assert_eq!(watchlists.len(), 1);
    assert_eq!(watchlists[0].users.len(), 2);
    assert_eq!(watchlists[0].filters.len(), 1);

    let found = client
        .parse_get_watchlist(&execute(client.build_get_watchlist(1)))
        .unwrap();
    assert_eq!(found.unwrap().name, "Rust watchers");

    let missing = client
        .parse_get_watchlist(&execute(client.build_get_watchlist(99)))
        .unwrap();
    assert!(missing.is_none());

    // Step 10: delete the link, then delete again — non-existent entity.
    let status = client
        .parse_status(&execute(client.build_delete_link(&link.url).unwrap()))
        .unwrap();
    assert!(status.is_success());

    let status = client
        .parse_status(&execute(client.build_delete_link(&link.url).unwrap()))
        .unwrap();
    assert_eq!(status.code, STATUS_NONEXISTENT_ENTITY);

    // Step 11: listing is empty again.
    let body = execute(client.build_get_links(&LinkQuery::default()));
    assert!(client.parse_get_links(&body).unwrap().is_empty());
}
