pub mod crawl;
pub mod fixtures;
pub mod report;

pub use crawl::{CrawlOptions, CrawlOutcome, CrawlProgressCallback, execute_crawl};
pub use report::{ReportData, ReportFormat};
