// Canned graphs for demos and tests, plus loading graphs from disk

use skein_scanner::{ScanError, StaticFetcher};
use std::path::Path;
use tracing::info;

pub const GOLANG_ROOT: &str = "http://golang.org/";

/// A small snapshot of golang.org. `http://golang.org/cmd/` is linked to
/// but missing, so crawling it records a failure.
pub fn golang_fetcher() -> StaticFetcher {
    StaticFetcher::new()
        .with_page(
            "http://golang.org/",
            "The Go Programming Language",
            ["http://golang.org/pkg/", "http://golang.org/cmd/"],
        )
        .with_page(
            "http://golang.org/pkg/",
            "Packages",
            [
                "http://golang.org/",
                "http://golang.org/cmd/",
                "http://golang.org/pkg/fmt/",
                "http://golang.org/pkg/os/",
            ],
        )
        .with_page(
            "http://golang.org/pkg/fmt/",
            "Package fmt",
            ["http://golang.org/", "http://golang.org/pkg/"],
        )
        .with_page(
            "http://golang.org/pkg/os/",
            "Package os",
            ["http://golang.org/", "http://golang.org/pkg/"],
        )
}

/// A -> {B, C}, B -> {A, C, D1, D2}, C -> {A, B}. D1 and D2 are dangling.
pub fn diamond_fetcher() -> StaticFetcher {
    StaticFetcher::new()
        .with_page("A", "Page A", ["B", "C"])
        .with_page("B", "Page B", ["A", "C", "D1", "D2"])
        .with_page("C", "Page C", ["A", "B"])
}

/// Loads a JSON graph file. A leading `~` expands to the home directory.
pub fn load_graph(path: &str) -> Result<StaticFetcher, ScanError> {
    let expanded = shellexpand::tilde(path);
    let fetcher = StaticFetcher::from_file(Path::new(expanded.as_ref()))?;
    if fetcher.is_empty() {
        return Err(ScanError::Other(format!("Graph file {} has no nodes", path)));
    }
    info!("Loaded graph {} with {} nodes", path, fetcher.len());
    Ok(fetcher)
}
