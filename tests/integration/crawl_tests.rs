//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl, extract, chunk and persist cycle end-to-end.

use page_harvest::config::{Config, FeedEntry, SiteEntry};
use page_harvest::crawler::Coordinator;
use page_harvest::output::{EmissionLedger, OutputRecord};
use page_harvest::state::SkipReason;
use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENGLISH: &str = "The municipality offers a wide range of services for families who \
    have recently moved here. You can read more about schools, healthcare and housing on \
    the following pages, and contact us if you have any questions about your situation.";

const SWEDISH: &str = "Kommunen erbjuder många olika tjänster för familjer som nyligen har \
    flyttat hit. Här kan du läsa mer om skolor, sjukvård och boende på de följande sidorna, \
    och du är välkommen att kontakta oss om du har frågor om din situation.";

fn html_page(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, body
        ),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, route: &str, title: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(title, body))
        .mount(server)
        .await;
}

async fn mount_unreachable(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page("Unreachable", "<p>never fetched</p>"))
        .expect(0)
        .mount(server)
        .await;
}

/// Creates a test configuration crawling one site from `seed`
fn create_test_config(dir: &TempDir, seed: String, max_depth: u32) -> Config {
    let mut config = Config::with_output(path_string(dir, "records.jsonl"));
    config.output.visited_path = Some(path_string(dir, "visited.txt"));
    config.crawler.max_depth = max_depth;
    config.crawler.politeness_jitter_ms = 0;
    config.http.max_retries = 0;
    // Short fixture texts are not reliably detectable
    config.language.supported = Vec::new();
    config.sites = vec![SiteEntry {
        seeds: vec![seed],
        base_url: None,
        exclude_urls: Vec::new(),
    }];
    config
}

fn path_string(dir: &TempDir, name: &str) -> String {
    dir.path().join(name).to_string_lossy().into_owned()
}

fn read_records(dir: &TempDir) -> Vec<OutputRecord> {
    std::fs::read_to_string(dir.path().join("records.jsonl"))
        .unwrap_or_default()
        .lines()
        .map(|line| serde_json::from_str(line).expect("record line is valid JSON"))
        .collect()
}

fn read_visited(dir: &TempDir) -> Vec<String> {
    std::fs::read_to_string(dir.path().join("visited.txt"))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_single_page_at_depth_one() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "Test Page",
        r#"<p>First paragraph of the test page.</p><p>Second paragraph.</p><a href="/next">Next</a>"#,
    )
    .await;
    mount_unreachable(&server, "/next").await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, format!("{}/", server.uri()), 1);
    let stats = Coordinator::new(config).unwrap().run().await.unwrap();

    let records = read_records(&dir);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].chunk_id, "0");
    assert_eq!(records[0].title, "Test Page");
    assert_eq!(records[0].source, format!("{}/", server.uri()));
    assert_eq!(
        records[0].chunk,
        "First paragraph of the test page.\nSecond paragraph."
    );
    assert_eq!(records[0].chunk.replace('\n', "").chars().count(), 50);
    assert_eq!(records[0].updated.len(), 10);

    assert_eq!(stats.pages_fetched, 1);
    assert_eq!(stats.pages_persisted, 1);
    assert_eq!(stats.skipped_for(SkipReason::DepthExhausted), 1);
}

#[tokio::test]
async fn test_depth_first_order() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "Home",
        r#"<p>Home</p><a href="/a">A</a><a href="/b">B</a>"#,
    )
    .await;
    mount_page(&server, "/a", "A", r#"<p>A</p><a href="/a/deep">Deep</a>"#).await;
    mount_page(&server, "/a/deep", "Deep", "<p>Deep</p>").await;
    mount_page(&server, "/b", "B", r#"<p>B</p><a href="/">Home</a>"#).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, format!("{}/", server.uri()), 3);
    let stats = Coordinator::new(config).unwrap().run().await.unwrap();

    let base = server.uri();
    assert_eq!(
        read_visited(&dir),
        vec![
            format!("{}/", base),
            format!("{}/a", base),
            format!("{}/a/deep", base),
            format!("{}/b", base),
        ]
    );

    let titles: Vec<String> = read_records(&dir).into_iter().map(|r| r.title).collect();
    assert_eq!(titles, vec!["Home", "A", "Deep", "B"]);
    assert_eq!(stats.pages_fetched, 4);
}

#[tokio::test]
async fn test_relative_links_on_directory_page() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Home", r#"<p>Home</p><a href="/docs/">Docs</a>"#).await;
    mount_page(
        &server,
        "/docs/",
        "Docs",
        r#"<p>Docs</p><p><a href="guide">Guide</a></p>"#,
    )
    .await;
    mount_page(&server, "/docs/guide", "Guide", "<p>Guide</p>").await;
    mount_unreachable(&server, "/guide").await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, format!("{}/", server.uri()), 3);
    Coordinator::new(config).unwrap().run().await.unwrap();

    let base = server.uri();
    assert_eq!(
        read_visited(&dir),
        vec![
            format!("{}/", base),
            format!("{}/docs", base),
            format!("{}/docs/guide", base),
        ]
    );

    let records = read_records(&dir);
    assert_eq!(records[1].source, format!("{}/docs", base));
    assert_eq!(records[1].chunk, "Docs\nGuide");
}

#[tokio::test]
async fn test_redirect_aliases_emit_page_once() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "Home",
        r#"<p>Home</p><a href="/old">Old</a><a href="/alias">Alias</a>"#,
    )
    .await;
    for alias in ["/old", "/alias"] {
        Mock::given(method("GET"))
            .and(path(alias))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/target"))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/target"))
        .respond_with(html_page("Target", "<p>Target</p>"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, format!("{}/", server.uri()), 2);
    let stats = Coordinator::new(config).unwrap().run().await.unwrap();

    let targets = read_records(&dir)
        .into_iter()
        .filter(|r| r.title == "Target")
        .count();
    assert_eq!(targets, 1);
    assert_eq!(stats.pages_persisted, 2);
    assert_eq!(stats.skipped_for(SkipReason::AlreadyVisited), 1);
}

#[tokio::test]
async fn test_links_outside_site_are_not_followed() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "Home",
        r#"<p>Home</p>
           <a href="https://elsewhere.invalid/page">Elsewhere</a>
           <a href="/private/area">Private</a>
           <a href="/brochure.pdf">Brochure</a>
           <a href="mailto:info@example.com">Mail</a>
           <a href="/local">Local</a>"#,
    )
    .await;
    mount_page(&server, "/local", "Local", "<p>Local</p>").await;
    mount_unreachable(&server, "/private/area").await;
    mount_unreachable(&server, "/brochure.pdf").await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir, format!("{}/", server.uri()), 2);
    config.sites[0].exclude_urls = vec![format!("{}/private", server.uri())];
    let stats = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(
        read_visited(&dir),
        vec![format!("{}/", server.uri()), format!("{}/local", server.uri())]
    );
    assert_eq!(stats.links_queued, 1);
}

#[tokio::test]
async fn test_unsupported_language_still_followed_when_not_gated() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "Start",
        &format!(r#"<p>{}</p><a href="/english">English</a>"#, SWEDISH),
    )
    .await;
    mount_page(&server, "/english", "English", &format!("<p>{}</p>", ENGLISH)).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir, format!("{}/", server.uri()), 2);
    config.language.supported = vec!["en".to_string()];
    config.crawler.gate_link_discovery = false;
    let stats = Coordinator::new(config).unwrap().run().await.unwrap();

    let records = read_records(&dir);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "English");
    assert_eq!(stats.skipped_for(SkipReason::UnsupportedLanguage), 1);
}

#[tokio::test]
async fn test_unsupported_language_stops_discovery_when_gated() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "Start",
        &format!(r#"<p>{}</p><a href="/english">English</a>"#, SWEDISH),
    )
    .await;
    mount_unreachable(&server, "/english").await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir, format!("{}/", server.uri()), 2);
    config.language.supported = vec!["en".to_string()];
    let stats = Coordinator::new(config).unwrap().run().await.unwrap();

    assert!(read_records(&dir).is_empty());
    assert_eq!(stats.skipped_for(SkipReason::UnsupportedLanguage), 1);
    assert_eq!(stats.links_queued, 0);
}

#[tokio::test]
async fn test_url_list_extracts_without_discovery() {
    let server = MockServer::start().await;
    mount_page(&server, "/one", "One", r#"<p>One</p><a href="/three">3</a>"#).await;
    mount_page(&server, "/two", "Two", r#"<p>Two</p><a href="/three">3</a>"#).await;
    mount_unreachable(&server, "/three").await;

    let dir = TempDir::new().unwrap();
    let list: PathBuf = dir.path().join("urls.txt");
    std::fs::write(
        &list,
        format!(
            "# pages to refresh\n{base}/one\n\n{base}/two\n{base}/one\n",
            base = server.uri()
        ),
    )
    .unwrap();

    let mut config = create_test_config(&dir, format!("{}/", server.uri()), 5);
    config.sites.clear();
    let stats = Coordinator::new(config)
        .unwrap()
        .extract_url_list(&list)
        .await
        .unwrap();

    let titles: Vec<String> = read_records(&dir).into_iter().map(|r| r.title).collect();
    assert_eq!(titles, vec!["One", "Two"]);
    assert_eq!(stats.skipped_for(SkipReason::AlreadyVisited), 1);
    assert_eq!(stats.links_queued, 0);
}

#[tokio::test]
async fn test_ledger_skips_pages_emitted_by_earlier_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Home", "<p>Home page</p>"))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir, format!("{}/", server.uri()), 1);
    config.output.ledger_path = Some(path_string(&dir, "state/ledger.db"));

    let first = Coordinator::new(config.clone())
        .unwrap()
        .with_config_hash("hash")
        .run()
        .await
        .unwrap();
    assert_eq!(first.pages_persisted, 1);

    let second = Coordinator::new(config)
        .unwrap()
        .with_config_hash("hash")
        .run()
        .await
        .unwrap();
    assert_eq!(second.pages_persisted, 0);
    assert_eq!(second.skipped_for(SkipReason::AlreadyEmitted), 1);

    assert_eq!(read_records(&dir).len(), 1);
    let ledger = EmissionLedger::open(&dir.path().join("state/ledger.db")).unwrap();
    assert_eq!(ledger.count_emitted().unwrap(), 1);
}

#[tokio::test]
async fn test_feed_posts_become_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "link": "https://news.example/first",
                "title": { "rendered": "First post" },
                "content": { "rendered": "<p>Opening hours change in May.</p>" },
                "date": "2024-04-30T09:00:00"
            },
            {
                "link": "https://news.example/second",
                "title": { "rendered": "Second post" },
                "content": { "rendered": "<p>New library card rules.</p>" },
                "date": "2024-05-02T10:15:00"
            }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir, format!("{}/", server.uri()), 1);
    config.sites.clear();
    config.feeds = vec![FeedEntry {
        url_template: format!("{}/wp-json/wp/v2/posts?page={{}}", server.uri()),
    }];
    let stats = Coordinator::new(config).unwrap().run().await.unwrap();

    let records = read_records(&dir);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].source, "https://news.example/first");
    assert_eq!(records[0].chunk, "Opening hours change in May.");
    assert_eq!(records[0].updated, "2024-04-30");
    assert_eq!(records[1].title, "Second post");
    assert_eq!(stats.feed_items, 2);
}

#[tokio::test]
async fn test_chunks_are_translated_to_english() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Välkommen", &format!("<p>{}</p>", SWEDISH)).await;
    Mock::given(method("POST"))
        .and(path("/translate"))
        .and(body_partial_json(json!({ "source": "sv", "target": "en" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "translatedText": "Welcome to the municipality." })),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir, format!("{}/", server.uri()), 1);
    config.language.supported = vec!["sv".to_string(), "en".to_string()];
    config.translate.enabled = true;
    config.translate.endpoint = Some(format!("{}/translate", server.uri()));
    config.translate.max_retries = 0;
    let stats = Coordinator::new(config).unwrap().run().await.unwrap();

    let records = read_records(&dir);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].chunk, "Welcome to the municipality.");
    assert_eq!(stats.chunks_untranslated, 0);
}
