// Tests for crawl orchestration and fixtures

use skein_core::crawl::{CrawlOptions, execute_crawl, extract_url_path};
use skein_core::fixtures::{GOLANG_ROOT, diamond_fetcher, golang_fetcher, load_graph};
use skein_scanner::{FetchError, Fetcher, ScanError};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

fn options(roots: &[&str], max_depth: usize) -> CrawlOptions {
    CrawlOptions {
        roots: roots.iter().map(|r| r.to_string()).collect(),
        max_depth,
        ..CrawlOptions::default()
    }
}

// ============================================================================
// URL Path Extraction Tests
// ============================================================================

#[test]
fn test_extract_url_path_root() {
    assert_eq!(extract_url_path("http://example.com/"), "/");
    assert_eq!(extract_url_path("http://example.com"), "/");
}

#[test]
fn test_extract_url_path_nested() {
    assert_eq!(extract_url_path("http://golang.org/pkg/fmt/"), "/pkg/fmt/");
}

#[test]
fn test_extract_url_path_drops_query_and_fragment() {
    assert_eq!(extract_url_path("http://example.com/api?key=value#top"), "/api");
}

#[test]
fn test_extract_url_path_plain_id() {
    // Graph ids that are not URLs come back unchanged
    assert_eq!(extract_url_path("D1"), "D1");
}

// ============================================================================
// Crawl Execution Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_golang_fixture_full_depth() {
    let outcomes = execute_crawl(options(&[GOLANG_ROOT], 4), Arc::new(golang_fetcher()), None)
        .await
        .unwrap();

    let snapshot = &outcomes[0].snapshot;
    assert_eq!(snapshot.len(), 5);
    assert!(snapshot.is_complete());

    let cmd = snapshot.record(&"http://golang.org/cmd/".to_string()).unwrap();
    assert_eq!(
        cmd.error,
        Some(FetchError::NotFound("not found: http://golang.org/cmd/".to_string()))
    );
    let fmt = snapshot.record(&"http://golang.org/pkg/fmt/".to_string()).unwrap();
    assert_eq!(fmt.content, "Package fmt");
}

#[tokio::test]
async fn test_golang_fixture_depth_two() {
    let outcomes = execute_crawl(options(&[GOLANG_ROOT], 2), Arc::new(golang_fetcher()), None)
        .await
        .unwrap();

    let snapshot = &outcomes[0].snapshot;
    assert_eq!(snapshot.len(), 3);
    assert!(!snapshot.contains(&"http://golang.org/pkg/fmt/".to_string()));
}

#[tokio::test]
async fn test_diamond_depths() {
    let fetcher: Arc<dyn Fetcher<String>> = Arc::new(diamond_fetcher());
    let expected = [(1, 1), (2, 3), (3, 5), (4, 5)];

    for (depth, nodes) in expected {
        let outcomes = execute_crawl(options(&["A"], depth), fetcher.clone(), None)
            .await
            .unwrap();
        assert_eq!(outcomes[0].snapshot.len(), nodes, "depth {}", depth);
        assert_eq!(outcomes[0].max_depth, depth);
    }
}

#[tokio::test]
async fn test_no_roots_is_an_error() {
    let result = execute_crawl(options(&[], 3), Arc::new(diamond_fetcher()), None).await;
    assert!(matches!(result, Err(ScanError::Other(_))));
}

#[tokio::test]
async fn test_progress_callback_announces_each_root() {
    let messages: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let messages_clone = messages.clone();

    let outcomes = execute_crawl(
        options(&["A", "C"], 1),
        Arc::new(diamond_fetcher()),
        Some(Arc::new(move |msg: String| messages_clone.lock().unwrap().push(msg))),
    )
    .await
    .unwrap();

    assert_eq!(outcomes.len(), 2);
    let messages = messages.lock().unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].contains("1/2"));
    assert!(messages[1].contains("C"));
}

#[tokio::test]
async fn test_max_in_flight_still_visits_everything() {
    let mut opts = options(&[GOLANG_ROOT], 4);
    opts.max_in_flight = 1;

    let outcomes = execute_crawl(opts, Arc::new(golang_fetcher()), None).await.unwrap();
    assert_eq!(outcomes[0].snapshot.len(), 5);
}

// ============================================================================
// Graph Loading Tests
// ============================================================================

#[tokio::test]
async fn test_load_graph_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut file = NamedTempFile::new()?;
    write!(
        file,
        r#"{{"home": {{"content": "Home", "links": ["about", "gone"]}}, "about": {{"content": "About"}}}}"#
    )?;

    let fetcher = load_graph(file.path().to_str().unwrap())?;
    let outcomes = execute_crawl(options(&["home"], 3), Arc::new(fetcher), None).await?;

    let snapshot = &outcomes[0].snapshot;
    assert_eq!(snapshot.len(), 3);
    assert!(snapshot.record(&"gone".to_string()).unwrap().error.is_some());
    Ok(())
}

#[test]
fn test_load_graph_empty_object() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{}}").unwrap();

    let result = load_graph(file.path().to_str().unwrap());
    assert!(matches!(result, Err(ScanError::Other(_))));
}

#[test]
fn test_load_graph_missing_file() {
    let result = load_graph("/definitely/not/here.json");
    assert!(matches!(result, Err(ScanError::IoError(_))));
}
