use indicatif::{ProgressBar, ProgressStyle};
use skein_scanner::{Fetcher, ScanError, Snapshot, Traverser};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use url::Url;

/// Options for configuring a crawl operation
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub roots: Vec<String>,
    pub max_depth: usize,
    /// Concurrent fetch cap; 0 leaves fan-out unbounded.
    pub max_in_flight: usize,
    pub show_progress_bars: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            max_depth: 3,
            max_in_flight: 0,
            show_progress_bars: false,
        }
    }
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Everything one root's traversal produced.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub root: String,
    pub max_depth: usize,
    pub snapshot: Snapshot<String>,
    pub elapsed: Duration,
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Crawls every root with its own fresh tracker, one after another.
pub async fn execute_crawl(
    options: CrawlOptions,
    fetcher: Arc<dyn Fetcher<String>>,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<Vec<CrawlOutcome>, ScanError> {
    let CrawlOptions {
        roots,
        max_depth,
        max_in_flight,
        show_progress_bars,
    } = options;

    if roots.is_empty() {
        return Err(ScanError::Other("No roots to crawl".to_string()));
    }
    info!("Crawling {} root(s) with depth {}", roots.len(), max_depth);

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .map_err(|e| ScanError::Other(e.to_string()))?,
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let claimed_count = Arc::new(AtomicUsize::new(0));
    let count_clone = claimed_count.clone();
    let pb_clone = progress_bar.clone();

    let traverser = Traverser::new(fetcher)
        .with_max_in_flight(max_in_flight)
        .with_progress_callback(Arc::new(move |id: &String, _depth: usize| {
            let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref pb) = pb_clone {
                pb.set_message(format!("Crawling... {} nodes claimed: {}", count, extract_url_path(id)));
            }
        }));

    let mut outcomes = Vec::with_capacity(roots.len());
    for (idx, root) in roots.iter().enumerate() {
        if let Some(ref callback) = progress_callback
            && roots.len() > 1
        {
            callback(format!("Crawling root {}/{}: {}", idx + 1, roots.len(), root));
        }

        let started = Instant::now();
        let snapshot = traverser.run(root.clone(), max_depth).await;
        if snapshot.record(root).is_some_and(|record| !record.is_ok()) {
            warn!("Root {} could not be fetched", root);
        }
        outcomes.push(CrawlOutcome {
            root: root.clone(),
            max_depth,
            snapshot,
            elapsed: started.elapsed(),
        });
    }

    if let Some(ref pb) = progress_bar {
        let total = claimed_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Crawl complete! {} nodes visited", total));
    }

    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skein_scanner::StaticFetcher;

    #[tokio::test]
    async fn test_each_root_gets_a_fresh_tracker() {
        let fetcher: Arc<dyn Fetcher<String>> = Arc::new(
            StaticFetcher::new()
                .with_page("a", "A", ["b"])
                .with_page("b", "B", ["a"]),
        );
        let options = CrawlOptions {
            roots: vec!["a".to_string(), "b".to_string()],
            max_depth: 5,
            ..CrawlOptions::default()
        };

        let outcomes = execute_crawl(options, fetcher, None).await.unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].snapshot.len(), 2);
        assert_eq!(outcomes[1].snapshot.len(), 2);
    }
}
