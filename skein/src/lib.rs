// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    build_report,
    load_roots_from_file,
    load_roots_from_source,
    parse_report_format,
    parse_url_line,
};

// Re-export crawl functionality from skein-core
pub use skein_core::crawl::{
    execute_crawl, extract_url_path, CrawlOptions, CrawlOutcome, CrawlProgressCallback,
};
