//! Integration tests for the ingestion pipeline
//!
//! These tests use wiremock to stand in for publisher listing pages and
//! feeds, and drive the full run path: fallback chain, pagination,
//! extraction, normalization, tagging, and merge.

use paper_tide::config::{
    Config, HeaderProfile, IngestConfig, ItemOrder, OutputConfig, SourceConfig, StrategyConfig,
    TopicEntry,
};
use paper_tide::harvester::{run_ingest, AccessMethod, SourceOutcome};
use paper_tide::store::{MemoryStore, PaperStore, SqliteStore};
use std::collections::BTreeMap;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test source with the shared listing strategy
fn test_source(id: &str, list_url: &str) -> SourceConfig {
    SourceConfig {
        id: id.to_string(),
        name: format!("Test Journal {}", id),
        list_url: list_url.to_string(),
        page_param: None,
        max_pages: 1,
        order: ItemOrder::NewestFirst,
        feed_url: None,
        request_delay_ms: Some(100), // Very short for testing
        headers: HeaderProfile {
            user_agent: "TestBot/1.0".to_string(),
            accept: Some("text/html".to_string()),
            accept_language: None,
            accept_encoding: None,
            referer: None,
            cache_control: None,
            extra: BTreeMap::new(),
        },
        strategies: vec![StrategyConfig {
            rank: 0,
            item: ".article".to_string(),
            title: ".title".to_string(),
            link: Some("a[href]".to_string()),
            authors: Some(".authors".to_string()),
            date: Some(".pub-date".to_string()),
            doi: None,
            abstract_text: Some(".preview".to_string()),
            section: None,
        }],
    }
}

fn test_config(sources: Vec<SourceConfig>) -> Config {
    Config {
        ingest: IngestConfig {
            max_concurrent_sources: 4,
            request_delay_ms: 100,
            max_retries: 1,
            retry_backoff_ms: 10,
            source_timeout_secs: 30,
        },
        output: OutputConfig {
            database_path: ":memory:".to_string(),
        },
        sources,
        topics: vec![TopicEntry {
            name: "Bayesian Statistics".to_string(),
            keywords: vec!["bayesian".to_string(), "posterior".to_string()],
        }],
    }
}

fn article(title: &str, authors: &str) -> String {
    format!(
        r#"<div class="article">
            <h5 class="title"><a href="/doi/{id}">{title}</a></h5>
            <div class="authors">{authors}</div>
        </div>"#,
        id = title.to_lowercase().replace(' ', "-"),
        title = title,
        authors = authors,
    )
}

fn page(articles: &[String]) -> String {
    format!("<html><body>{}</body></html>", articles.concat())
}

#[tokio::test]
async fn test_full_ingest_into_sqlite() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(&[
            article("Posterior Sampling at Scale", "Alice Zhang and Bob Li"),
            article("A Second Paper", "Carol Stone"),
        ])))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("papers.db");

    let config = test_config(vec![test_source("alpha", &format!("{}/list", server.uri()))]);
    let store = Arc::new(SqliteStore::new(&db_path).expect("Failed to open DB"));

    let summary = run_ingest(&config, store.clone()).await;

    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.exit_code(), 0);
    assert_eq!(store.count_papers("alpha").unwrap(), 2);

    // Second run over identical content inserts nothing
    let again = run_ingest(&config, store.clone()).await;
    assert_eq!(again.total_inserted(), 0);
    match &again.reports[0].outcome {
        SourceOutcome::Ingested {
            inserted, skipped, ..
        } => {
            assert_eq!(*inserted, 0);
            assert_eq!(*skipped, 2);
        }
        other => panic!("expected success, got {:?}", other),
    }
    assert_eq!(store.count_papers("alpha").unwrap(), 2);
}

#[tokio::test]
async fn test_pagination_walk_and_ordinals() {
    let server = MockServer::start().await;

    // Page 0 carries the newest papers, page 1 older ones, page 2 is empty
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("startPage", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(&[
            article("Newest", "A"),
            article("Second", "B"),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("startPage", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(page(&[article("Oldest", "C")])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("startPage", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(&[])))
        .mount(&server)
        .await;

    let mut source = test_source("paged", &format!("{}/list", server.uri()));
    source.page_param = Some("startPage".to_string());
    source.max_pages = 10;

    let store = Arc::new(MemoryStore::new());
    let summary = run_ingest(&test_config(vec![source]), store.clone()).await;
    assert_eq!(summary.succeeded(), 1);

    let papers = store.papers_for("paged");
    let titles: Vec<_> = papers.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Newest", "Second", "Oldest"]);
    assert_eq!(papers[0].ordinal, 0);
    assert_eq!(papers[2].ordinal, 2);
}

#[tokio::test]
async fn test_oldest_first_source_is_reversed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(&[
            article("Oldest Accepted", "A"),
            article("Newest Accepted", "B"),
        ])))
        .mount(&server)
        .await;

    let mut source = test_source("aos", &format!("{}/list", server.uri()));
    source.order = ItemOrder::OldestFirst;

    let store = Arc::new(MemoryStore::new());
    run_ingest(&test_config(vec![source]), store.clone()).await;

    let papers = store.papers_for("aos");
    // Ordinal 0 is the item that appeared last on the page
    assert_eq!(papers[0].title, "Newest Accepted");
    assert_eq!(papers[0].ordinal, 0);
    assert_eq!(papers[1].title, "Oldest Accepted");
    assert_eq!(papers[1].ordinal, 1);
}

#[tokio::test]
async fn test_blocked_source_ingests_via_feed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<?xml version="1.0"?>
            <rss version="2.0"><channel><title>t</title>
            <item><title>Feed Only Paper</title>
            <link>https://journals.example.com/doi/1</link></item>
            </channel></rss>"#,
        ))
        .expect(1) // The fallback must be invoked exactly once
        .mount(&server)
        .await;

    let mut source = test_source("blocked", &format!("{}/list", server.uri()));
    source.feed_url = Some(format!("{}/feed", server.uri()));

    let store = Arc::new(MemoryStore::new());
    let summary = run_ingest(&test_config(vec![source]), store.clone()).await;

    assert_eq!(summary.succeeded(), 1);
    match &summary.reports[0].outcome {
        SourceOutcome::Ingested { method, records, .. } => {
            assert_eq!(*method, AccessMethod::Feed);
            assert_eq!(*records, 1);
        }
        other => panic!("expected feed ingestion, got {:?}", other),
    }

    // Reduced fields are expected, not an error
    let papers = store.papers_for("blocked");
    assert_eq!(papers[0].title, "Feed Only Paper");
    assert!(papers[0].authors.is_empty());
    assert_eq!(papers[0].abstract_text, None);
}

#[tokio::test]
async fn test_partial_fields_and_author_normalization() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(&[
            // No abstract, "others" listed first by the publisher
            article("Bayesian Shrinkage Priors", "others, Lee, K."),
        ])))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let config = test_config(vec![test_source("oup", &format!("{}/list", server.uri()))]);
    run_ingest(&config, store.clone()).await;

    let papers = store.papers_for("oup");
    assert_eq!(papers.len(), 1);

    let paper = &papers[0];
    assert_eq!(paper.abstract_text, None);
    assert_eq!(paper.authors, vec!["Lee, K.", "others"]);
    // Tagged from the title keyword vocabulary
    assert_eq!(paper.topics, vec!["Bayesian Statistics"]);
}

#[tokio::test]
async fn test_mixed_run_reports_each_source() {
    let good = MockServer::start().await;
    let blocked = MockServer::start().await;
    let dead = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(page(&[article("Fine Paper", "A")])),
        )
        .mount(&good)
        .await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&blocked)
        .await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<?xml version="1.0"?>
            <rss version="2.0"><channel><title>t</title>
            <item><title>Degraded Paper</title></item>
            </channel></rss>"#,
        ))
        .mount(&blocked)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&dead)
        .await;

    let mut fallback_source = test_source("fallback", &format!("{}/list", blocked.uri()));
    fallback_source.feed_url = Some(format!("{}/feed", blocked.uri()));

    let config = test_config(vec![
        test_source("healthy", &format!("{}/list", good.uri())),
        fallback_source,
        test_source("failing", &format!("{}/list", dead.uri())),
    ]);

    let store = Arc::new(MemoryStore::new());
    let summary = run_ingest(&config, store.clone()).await;

    // The summary distinguishes full, degraded, and failed sources
    assert_eq!(summary.succeeded(), 2);
    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.exit_code(), 1);

    for report in &summary.reports {
        match (report.source.as_str(), &report.outcome) {
            ("healthy", SourceOutcome::Ingested { method, .. }) => {
                assert_eq!(*method, AccessMethod::Primary);
            }
            ("fallback", SourceOutcome::Ingested { method, warnings, .. }) => {
                assert_eq!(*method, AccessMethod::Feed);
                assert!(!warnings.is_empty());
            }
            ("failing", SourceOutcome::Failed { .. }) => {}
            (source, outcome) => panic!("unexpected outcome for {}: {:?}", source, outcome),
        }
    }

    // Failed source left no trace; the others have sync state
    assert!(store.sync_state("failing").unwrap().is_none());
    assert!(store.sync_state("healthy").unwrap().is_some());
    assert!(store.sync_state("fallback").unwrap().is_some());
}

#[tokio::test]
async fn test_incremental_run_picks_up_new_papers_only() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());

    let first_page = page(&[article("Existing Paper", "A")]);
    let guard = Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(first_page))
        .mount_as_scoped(&server)
        .await;

    let config = test_config(vec![test_source("inc", &format!("{}/list", server.uri()))]);
    run_ingest(&config, store.clone()).await;
    assert_eq!(store.count_papers("inc").unwrap(), 1);
    drop(guard);

    // A new paper appears at the top of the listing
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(&[
            article("Brand New Paper", "B"),
            article("Existing Paper", "A"),
        ])))
        .mount(&server)
        .await;

    let summary = run_ingest(&config, store.clone()).await;
    assert_eq!(summary.total_inserted(), 1);
    assert_eq!(store.count_papers("inc").unwrap(), 2);
}
